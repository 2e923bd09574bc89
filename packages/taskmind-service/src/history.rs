use serde::{Deserialize, Serialize};

use taskmind_domain::messages::{self, ChatMessage, HistoryTurn};
use taskmind_storage::queries;

use crate::{Error, Result, TodoService};

pub const DEFAULT_HISTORY_LIMIT: u32 = 20;
pub const MAX_HISTORY_LIMIT: u32 = 100;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatHistoryResponse {
	pub messages: Vec<ChatMessage>,
}

impl TodoService {
	/// The last `limit` exchanges as a chronological transcript.
	pub async fn chat_history(&self, user_id: &str, limit: Option<u32>) -> Result<ChatHistoryResponse> {
		let limit = resolve_limit(limit)?;
		let turns = queries::recent_history(&self.db, user_id, limit)
			.await?
			.into_iter()
			.map(|row| HistoryTurn {
				id: row.id,
				query: row.query,
				response: row.response,
				created_at: row.created_at,
			})
			.collect::<Vec<_>>();

		Ok(ChatHistoryResponse { messages: messages::transcript(&turns) })
	}
}

fn resolve_limit(limit: Option<u32>) -> Result<u32> {
	match limit {
		None => Ok(DEFAULT_HISTORY_LIMIT),
		Some(0) => Err(Error::InvalidRequest { message: "limit must be greater than zero.".to_string() }),
		Some(limit) => Ok(limit.min(MAX_HISTORY_LIMIT)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn limit_defaults_and_clamps() {
		assert_eq!(resolve_limit(None).expect("default"), DEFAULT_HISTORY_LIMIT);
		assert_eq!(resolve_limit(Some(7)).expect("explicit"), 7);
		assert_eq!(resolve_limit(Some(500)).expect("clamped"), MAX_HISTORY_LIMIT);
		assert!(resolve_limit(Some(0)).is_err());
	}
}
