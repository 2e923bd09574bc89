use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use taskmind_domain::time_serde;
use taskmind_storage::{models::Todo, queries};

use crate::{Error, Result, TodoService};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TodoItem {
	pub id: Uuid,
	pub title: String,
	pub notes: Option<String>,
	pub is_completed: bool,
	#[serde(with = "time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time_serde")]
	pub updated_at: OffsetDateTime,
}
impl From<Todo> for TodoItem {
	fn from(todo: Todo) -> Self {
		Self {
			id: todo.id,
			title: todo.title,
			notes: todo.notes,
			is_completed: todo.is_completed,
			created_at: todo.created_at,
			updated_at: todo.updated_at,
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListTodosResponse {
	pub todos: Vec<TodoItem>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateTodoRequest {
	pub title: String,
	#[serde(default)]
	pub notes: Option<String>,
}

/// Absent fields are left unchanged; an empty `notes` clears the notes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateTodoRequest {
	pub id: Uuid,
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub notes: Option<String>,
	#[serde(default)]
	pub is_completed: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToggleTodoRequest {
	pub id: Uuid,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteTodoRequest {
	pub id: Uuid,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteTodoResponse {
	pub id: Uuid,
	pub deleted: bool,
}

/// A written todo plus whether its searchable text changed.
#[derive(Clone, Debug)]
pub struct TodoMutation {
	pub todo: TodoItem,
	pub reindex: bool,
}

impl TodoService {
	pub async fn list_todos(&self, user_id: &str) -> Result<ListTodosResponse> {
		let todos = queries::list_todos(&self.db, user_id).await?;

		Ok(ListTodosResponse { todos: todos.into_iter().map(TodoItem::from).collect() })
	}

	pub async fn create_todo(&self, user_id: &str, req: CreateTodoRequest) -> Result<TodoMutation> {
		let title = required_title(&req.title)?;
		let now = OffsetDateTime::now_utc();
		let todo = Todo {
			id: Uuid::new_v4(),
			user_id: user_id.to_string(),
			title,
			notes: normalize_notes(req.notes.as_deref()),
			is_completed: false,
			created_at: now,
			updated_at: now,
		};
		let mut tx = self.db.pool.begin().await?;
		let todo = queries::insert_todo(&mut tx, &todo).await?;

		queries::insert_embedding_record(&mut tx, &todo).await?;
		tx.commit().await?;

		tracing::info!(user_id, todo_id = %todo.id, "Todo created.");

		Ok(TodoMutation { todo: todo.into(), reindex: true })
	}

	pub async fn update_todo(&self, user_id: &str, req: UpdateTodoRequest) -> Result<TodoMutation> {
		if req.title.is_none() && req.notes.is_none() && req.is_completed.is_none() {
			return Err(Error::InvalidRequest {
				message: "At least one of title, notes, or is_completed is required.".to_string(),
			});
		}

		let title = req.title.as_deref().map(required_title).transpose()?;
		let mut tx = self.db.pool.begin().await?;
		let Some(existing) = queries::fetch_todo_for_update(&mut tx, user_id, req.id).await? else {
			return Err(Error::NotFound { message: "Todo not found.".to_string() });
		};
		let mut next = existing.clone();

		if let Some(title) = title {
			next.title = title;
		}
		if let Some(notes) = req.notes.as_deref() {
			next.notes = normalize_notes(Some(notes));
		}
		if let Some(is_completed) = req.is_completed {
			next.is_completed = is_completed;
		}

		let reindex = next.title != existing.title || next.notes != existing.notes;

		next.updated_at = OffsetDateTime::now_utc();

		let updated = queries::update_todo(&mut tx, &next).await?;

		if reindex {
			queries::reset_embedding(&mut tx, updated.id, updated.updated_at).await?;
		}

		tx.commit().await?;

		tracing::info!(user_id, todo_id = %updated.id, reindex, "Todo updated.");

		Ok(TodoMutation { todo: updated.into(), reindex })
	}

	pub async fn toggle_todo(&self, user_id: &str, req: ToggleTodoRequest) -> Result<TodoItem> {
		let mut tx = self.db.pool.begin().await?;
		let Some(mut todo) = queries::fetch_todo_for_update(&mut tx, user_id, req.id).await? else {
			return Err(Error::NotFound { message: "Todo not found.".to_string() });
		};

		todo.is_completed = !todo.is_completed;
		todo.updated_at = OffsetDateTime::now_utc();

		let updated = queries::update_todo(&mut tx, &todo).await?;

		tx.commit().await?;

		Ok(updated.into())
	}

	pub async fn delete_todo(
		&self,
		user_id: &str,
		req: DeleteTodoRequest,
	) -> Result<DeleteTodoResponse> {
		if !queries::delete_todo(&self.db, user_id, req.id).await? {
			return Err(Error::NotFound { message: "Todo not found.".to_string() });
		}

		tracing::info!(user_id, todo_id = %req.id, "Todo deleted.");

		Ok(DeleteTodoResponse { id: req.id, deleted: true })
	}
}

fn required_title(raw: &str) -> Result<String> {
	let title = raw.trim();

	if title.is_empty() {
		return Err(Error::InvalidRequest { message: "title must be non-empty.".to_string() });
	}

	Ok(title.to_string())
}

fn normalize_notes(raw: Option<&str>) -> Option<String> {
	raw.map(str::trim).filter(|notes| !notes.is_empty()).map(str::to_string)
}
