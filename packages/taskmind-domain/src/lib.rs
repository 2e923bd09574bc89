pub mod classify;
pub mod context;
pub mod date_range;
pub mod messages;
pub mod time_serde;
pub mod todo_context;

use time::OffsetDateTime;
use uuid::Uuid;

/// A todo as seen by the chat pipeline, paired with its retrieval score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTodo {
	pub id: Uuid,
	pub title: String,
	pub notes: Option<String>,
	pub is_completed: bool,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	/// In `[0, 1]`; `1.0` for todos fetched without similarity ranking.
	pub similarity: f32,
}
impl RankedTodo {
	pub fn was_updated(&self) -> bool {
		self.updated_at != self.created_at
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TodoStats {
	pub total: i64,
	pub completed: i64,
	pub pending: i64,
}
impl TodoStats {
	pub fn new(total: i64, completed: i64) -> Self {
		Self { total, completed, pending: (total - completed).max(0) }
	}
}
