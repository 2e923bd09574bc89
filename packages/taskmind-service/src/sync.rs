use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use taskmind_storage::{models::PendingEmbedding, queries};

use crate::{Result, TodoService};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
	Success,
	/// The todo changed while its vector was computed; the next sync picks it up again.
	Stale,
	Failed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncResult {
	pub todo_id: Uuid,
	pub status: SyncStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SyncReport {
	pub total: usize,
	pub success: usize,
	pub failed: usize,
	pub processed: usize,
	pub results: Vec<SyncResult>,
}

impl TodoService {
	/// Computes vectors for the user's todos that are not yet searchable.
	pub async fn sync_embeddings(&self, user_id: &str) -> Result<SyncReport> {
		let pending =
			queries::list_pending_embeddings(&self.db, user_id, self.cfg.sync.batch_size).await?;
		let mut report = SyncReport { total: pending.len(), ..Default::default() };

		if pending.is_empty() {
			return Ok(report);
		}

		let version = crate::embedding_version(&self.cfg);

		for row in &pending {
			let result = match self.sync_one(row, &version).await {
				Ok(true) => {
					report.success += 1;

					SyncResult { todo_id: row.todo_id, status: SyncStatus::Success, error: None }
				},
				Ok(false) =>
					SyncResult { todo_id: row.todo_id, status: SyncStatus::Stale, error: None },
				Err(err) => {
					tracing::warn!(
						user_id,
						todo_id = %row.todo_id,
						error = %err,
						"Embedding sync failed for todo."
					);

					report.failed += 1;

					SyncResult {
						todo_id: row.todo_id,
						status: SyncStatus::Failed,
						error: Some(err.to_string()),
					}
				},
			};

			report.results.push(result);
		}

		report.processed = report.results.len();

		tracing::info!(
			user_id,
			total = report.total,
			success = report.success,
			failed = report.failed,
			"Embedding sync finished."
		);

		Ok(report)
	}

	async fn sync_one(&self, row: &PendingEmbedding, version: &str) -> Result<bool> {
		let texts = [embedding_text(&row.title, row.notes.as_deref())];
		let vectors = self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await?;
		let Some(vec) = vectors.into_iter().next() else {
			return Err(crate::Error::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vec.len() != self.cfg.storage.vector.dim as usize {
			return Err(crate::Error::Provider {
				message: format!(
					"Embedding dimension mismatch: expected {}, got {}.",
					self.cfg.storage.vector.dim,
					vec.len()
				),
			});
		}

		let written =
			queries::write_embedding(&self.db, row, &vec, version, OffsetDateTime::now_utc())
				.await?;

		Ok(written)
	}
}

pub(crate) fn embedding_text(title: &str, notes: Option<&str>) -> String {
	format!("{title} {}", notes.unwrap_or_default()).trim().to_string()
}
