use std::time::Duration;

use color_eyre::Result;
use tokio::time;

use taskmind_service::TodoService;
use taskmind_storage::queries;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
	pub users: usize,
	pub success: usize,
	pub failed: usize,
}

pub async fn run_worker(service: TodoService) -> Result<()> {
	let interval = Duration::from_millis(service.cfg.sync.poll_interval_ms);

	tracing::info!(poll_interval_ms = service.cfg.sync.poll_interval_ms, "Embedding worker started.");

	loop {
		match sync_pending_once(&service).await {
			Ok(report) if report.users > 0 => {
				tracing::info!(
					users = report.users,
					success = report.success,
					failed = report.failed,
					"Embedding backfill tick finished."
				);
			},
			Ok(_) => {},
			Err(err) => {
				tracing::error!(error = %err, "Embedding backfill tick failed.");
			},
		}

		time::sleep(interval).await;
	}
}

/// Syncs every user that currently has todos without a vector, up to the per-tick cap.
pub async fn sync_pending_once(service: &TodoService) -> Result<TickReport> {
	let users =
		queries::list_users_with_pending_embeddings(&service.db, service.cfg.sync.max_users_per_tick)
			.await?;
	let mut tick = TickReport { users: users.len(), ..Default::default() };

	for user_id in &users {
		match service.sync_embeddings(user_id).await {
			Ok(report) => {
				tick.success += report.success;
				tick.failed += report.failed;
			},
			Err(err) => {
				tracing::error!(user_id = %user_id, error = %err, "Embedding sync failed for user.");
			},
		}
	}

	Ok(tick)
}
