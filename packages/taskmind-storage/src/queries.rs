use serde_json::Value;
use sqlx::{PgExecutor, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	db::Db,
	models::{
		ChatHistoryRow, MatchRow, PendingEmbedding, Todo, TodoContextRow, TodoCounts,
		TodoEmbeddingRecord,
	},
};

const TODO_COLUMNS: &str = "id, user_id, title, notes, is_completed, created_at, updated_at";

pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}
		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

pub async fn insert_todo(tx: &mut Transaction<'_, Postgres>, todo: &Todo) -> Result<Todo> {
	let sql = format!(
		"\
INSERT INTO todos (id, user_id, title, notes, is_completed, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7)
RETURNING {TODO_COLUMNS}"
	);
	let row = sqlx::query_as::<_, Todo>(&sql)
		.bind(todo.id)
		.bind(todo.user_id.as_str())
		.bind(todo.title.as_str())
		.bind(todo.notes.as_deref())
		.bind(todo.is_completed)
		.bind(todo.created_at)
		.bind(todo.updated_at)
		.fetch_one(&mut **tx)
		.await?;

	Ok(row)
}

pub async fn insert_embedding_record(
	tx: &mut Transaction<'_, Postgres>,
	todo: &Todo,
) -> Result<TodoEmbeddingRecord> {
	let row = sqlx::query_as::<_, TodoEmbeddingRecord>(
		"\
INSERT INTO todo_embeddings (id, todo_id, user_id, embedding, todo_context, created_at, updated_at)
VALUES ($1, $2, $3, NULL, '{}'::jsonb, $4, $4)
RETURNING id, todo_id, user_id, embedding_version, todo_context, created_at, updated_at",
	)
	.bind(Uuid::new_v4())
	.bind(todo.id)
	.bind(todo.user_id.as_str())
	.bind(todo.created_at)
	.fetch_one(&mut **tx)
	.await?;

	Ok(row)
}

pub async fn fetch_todo<'e, E>(executor: E, user_id: &str, todo_id: Uuid) -> Result<Option<Todo>>
where
	E: PgExecutor<'e>,
{
	let sql = format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 AND user_id = $2");
	let row = sqlx::query_as::<_, Todo>(&sql)
		.bind(todo_id)
		.bind(user_id)
		.fetch_optional(executor)
		.await?;

	Ok(row)
}

/// Locks the row for the rest of the transaction.
pub async fn fetch_todo_for_update(
	tx: &mut Transaction<'_, Postgres>,
	user_id: &str,
	todo_id: Uuid,
) -> Result<Option<Todo>> {
	let sql =
		format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 AND user_id = $2 FOR UPDATE");
	let row = sqlx::query_as::<_, Todo>(&sql)
		.bind(todo_id)
		.bind(user_id)
		.fetch_optional(&mut **tx)
		.await?;

	Ok(row)
}

pub async fn update_todo(tx: &mut Transaction<'_, Postgres>, todo: &Todo) -> Result<Todo> {
	let sql = format!(
		"\
UPDATE todos
SET
	title = $1,
	notes = $2,
	is_completed = $3,
	updated_at = $4
WHERE id = $5 AND user_id = $6
RETURNING {TODO_COLUMNS}"
	);
	let row = sqlx::query_as::<_, Todo>(&sql)
		.bind(todo.title.as_str())
		.bind(todo.notes.as_deref())
		.bind(todo.is_completed)
		.bind(todo.updated_at)
		.bind(todo.id)
		.bind(todo.user_id.as_str())
		.fetch_one(&mut **tx)
		.await?;

	Ok(row)
}

/// Marks the todo as not yet searchable until the next sync.
pub async fn reset_embedding(
	tx: &mut Transaction<'_, Postgres>,
	todo_id: Uuid,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE todo_embeddings
SET embedding = NULL, embedding_version = NULL, updated_at = $1
WHERE todo_id = $2",
	)
	.bind(now)
	.bind(todo_id)
	.execute(&mut **tx)
	.await?;

	Ok(())
}

pub async fn delete_todo(db: &Db, user_id: &str, todo_id: Uuid) -> Result<bool> {
	let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
		.bind(todo_id)
		.bind(user_id)
		.execute(&db.pool)
		.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn list_todos(db: &Db, user_id: &str) -> Result<Vec<Todo>> {
	let sql = format!(
		"SELECT {TODO_COLUMNS} FROM todos WHERE user_id = $1 ORDER BY created_at DESC, id"
	);
	let rows = sqlx::query_as::<_, Todo>(&sql).bind(user_id).fetch_all(&db.pool).await?;

	Ok(rows)
}

pub async fn fetch_todos_by_ids(db: &Db, user_id: &str, ids: &[Uuid]) -> Result<Vec<Todo>> {
	if ids.is_empty() {
		return Ok(Vec::new());
	}

	let sql = format!("SELECT {TODO_COLUMNS} FROM todos WHERE user_id = $1 AND id = ANY($2)");
	let rows = sqlx::query_as::<_, Todo>(&sql)
		.bind(user_id)
		.bind(ids)
		.fetch_all(&db.pool)
		.await?;

	Ok(rows)
}

/// Both bounds are inclusive.
pub async fn fetch_todos_in_range(
	db: &Db,
	user_id: &str,
	start: OffsetDateTime,
	end: OffsetDateTime,
) -> Result<Vec<Todo>> {
	let sql = format!(
		"\
SELECT {TODO_COLUMNS}
FROM todos
WHERE user_id = $1 AND created_at >= $2 AND created_at <= $3
ORDER BY created_at DESC, id"
	);
	let rows = sqlx::query_as::<_, Todo>(&sql)
		.bind(user_id)
		.bind(start)
		.bind(end)
		.fetch_all(&db.pool)
		.await?;

	Ok(rows)
}

pub async fn todo_counts(db: &Db, user_id: &str) -> Result<TodoCounts> {
	let counts = sqlx::query_as::<_, TodoCounts>(
		"\
SELECT
	count(*) AS total,
	count(*) FILTER (WHERE is_completed) AS completed
FROM todos
WHERE user_id = $1",
	)
	.bind(user_id)
	.fetch_one(&db.pool)
	.await?;

	Ok(counts)
}

pub async fn match_todos(
	db: &Db,
	query_embedding: &[f32],
	user_id: &str,
	match_count: u32,
) -> Result<Vec<MatchRow>> {
	let match_count = i32::try_from(match_count).unwrap_or(i32::MAX);
	let rows = sqlx::query_as::<_, MatchRow>(
		"\
SELECT todo_id, similarity, title, notes, is_completed, created_at, updated_at
FROM match_todos($1::text::vector, $2, $3)",
	)
	.bind(vector_to_pg(query_embedding))
	.bind(user_id)
	.bind(match_count)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn fetch_todo_contexts(
	db: &Db,
	user_id: &str,
	todo_ids: &[Uuid],
) -> Result<Vec<TodoContextRow>> {
	if todo_ids.is_empty() {
		return Ok(Vec::new());
	}

	let rows = sqlx::query_as::<_, TodoContextRow>(
		"\
SELECT todo_id, todo_context
FROM todo_embeddings
WHERE user_id = $1 AND todo_id = ANY($2)",
	)
	.bind(user_id)
	.bind(todo_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Replaces the stored payload. Returns `false` when no record exists for the todo.
pub async fn update_todo_context(
	db: &Db,
	user_id: &str,
	todo_id: Uuid,
	todo_context: &Value,
	now: OffsetDateTime,
) -> Result<bool> {
	let result = sqlx::query(
		"\
UPDATE todo_embeddings
SET todo_context = $1, updated_at = $2
WHERE todo_id = $3 AND user_id = $4",
	)
	.bind(todo_context)
	.bind(now)
	.bind(todo_id)
	.bind(user_id)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}

/// The most recent `limit` rows, returned oldest first.
pub async fn recent_history(db: &Db, user_id: &str, limit: u32) -> Result<Vec<ChatHistoryRow>> {
	let rows = sqlx::query_as::<_, ChatHistoryRow>(
		"\
SELECT id, user_id, query, response, created_at
FROM (
	SELECT id, user_id, query, response, created_at
	FROM ai_chat_history
	WHERE user_id = $1
	ORDER BY created_at DESC, id DESC
	LIMIT $2
) recent
ORDER BY created_at ASC, id ASC",
	)
	.bind(user_id)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn insert_history(
	db: &Db,
	row: &ChatHistoryRow,
	query_embedding: Option<&[f32]>,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO ai_chat_history (id, user_id, query, response, embedding, created_at)
VALUES ($1, $2, $3, $4, $5::text::vector, $6)",
	)
	.bind(row.id)
	.bind(row.user_id.as_str())
	.bind(row.query.as_str())
	.bind(row.response.as_str())
	.bind(query_embedding.map(vector_to_pg))
	.bind(row.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn list_pending_embeddings(
	db: &Db,
	user_id: &str,
	limit: u32,
) -> Result<Vec<PendingEmbedding>> {
	let rows = sqlx::query_as::<_, PendingEmbedding>(
		"\
SELECT
	e.id AS embedding_id,
	t.id AS todo_id,
	t.title,
	t.notes,
	t.updated_at AS todo_updated_at
FROM todo_embeddings e
JOIN todos t ON t.id = e.todo_id
WHERE e.user_id = $1 AND t.user_id = $1 AND e.embedding IS NULL
ORDER BY e.created_at ASC, e.id ASC
LIMIT $2",
	)
	.bind(user_id)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Writes the vector only while the embedding is still NULL and the todo is unchanged since it
/// was read. Returns `false` when the guard rejected the write.
pub async fn write_embedding(
	db: &Db,
	pending: &PendingEmbedding,
	vec: &[f32],
	embedding_version: &str,
	now: OffsetDateTime,
) -> Result<bool> {
	let result = sqlx::query(
		"\
UPDATE todo_embeddings e
SET embedding = $1::text::vector, embedding_version = $2, updated_at = $3
FROM todos t
WHERE e.id = $4
	AND t.id = e.todo_id
	AND e.embedding IS NULL
	AND t.updated_at = $5",
	)
	.bind(vector_to_pg(vec))
	.bind(embedding_version)
	.bind(now)
	.bind(pending.embedding_id)
	.bind(pending.todo_updated_at)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn list_users_with_pending_embeddings(db: &Db, limit: u32) -> Result<Vec<String>> {
	let rows = sqlx::query_scalar::<_, String>(
		"\
SELECT user_id
FROM todo_embeddings
WHERE embedding IS NULL
GROUP BY user_id
ORDER BY min(created_at) ASC
LIMIT $1",
	)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn vector_text_is_bracketed_and_comma_separated() {
		assert_eq!(vector_to_pg(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
		assert_eq!(vector_to_pg(&[]), "[]");
	}
}
