use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Todo {
	pub id: Uuid,
	pub user_id: String,
	pub title: String,
	pub notes: Option<String>,
	pub is_completed: bool,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TodoEmbeddingRecord {
	pub id: Uuid,
	pub todo_id: Uuid,
	pub user_id: String,
	pub embedding_version: Option<String>,
	pub todo_context: Value,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

/// A todo whose embedding is still NULL, joined with the text to embed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingEmbedding {
	pub embedding_id: Uuid,
	pub todo_id: Uuid,
	pub title: String,
	pub notes: Option<String>,
	pub todo_updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TodoContextRow {
	pub todo_id: Uuid,
	pub todo_context: Value,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchRow {
	pub todo_id: Uuid,
	pub similarity: f32,
	pub title: String,
	pub notes: Option<String>,
	pub is_completed: bool,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatHistoryRow {
	pub id: Uuid,
	pub user_id: String,
	pub query: String,
	pub response: String,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct TodoCounts {
	pub total: i64,
	pub completed: i64,
}
