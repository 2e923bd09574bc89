use std::sync::Arc;

use axum::{
	Json, Router,
	extract::{
		Query, State,
		rejection::{JsonRejection, QueryRejection},
	},
	http::{
		HeaderMap, HeaderName, Method, StatusCode,
		header::{AUTHORIZATION, CONTENT_TYPE},
	},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use taskmind_service::{
	ChatHistoryResponse, ChatRequest, ChatResponse, CreateTodoRequest, DeleteTodoRequest,
	DeleteTodoResponse, Error as ServiceError, ListTodosResponse, SyncReport, TodoItem,
	TodoService, ToggleTodoRequest, UpdateTodoRequest,
};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct HistoryQuery {
	limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None),
			ServiceError::Unauthorized { message } =>
				json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message, None),
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			ServiceError::Provider { message } => {
				tracing::error!(error = %message, "Provider error.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"PROVIDER_ERROR",
					"An upstream provider request failed.",
					None,
				)
			},
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage error.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"STORAGE_ERROR",
					"A storage request failed.",
					None,
				)
			},
		}
	}
}
impl From<JsonRejection> for ApiError {
	fn from(err: JsonRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.body_text(), None)
	}
}
impl From<QueryRejection> for ApiError {
	fn from(err: QueryRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.body_text(), None)
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	let cors = CorsLayer::new()
		.allow_origin(Any)
		.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
		.allow_headers([
			AUTHORIZATION,
			HeaderName::from_static("x-client-info"),
			HeaderName::from_static("apikey"),
			CONTENT_TYPE,
		]);

	Router::new()
		.route("/health", get(health))
		.route("/v1/chat", post(chat))
		.route("/v1/chat/history", get(chat_history))
		.route("/v1/embeddings/sync", get(sync_embeddings))
		.route("/v1/todos", get(list_todos).post(create_todo))
		.route("/v1/todos/update", post(update_todo))
		.route("/v1/todos/toggle", post(toggle_todo))
		.route("/v1/todos/delete", post(delete_todo))
		.layer(cors)
		.with_state(state)
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

/// Failures after authentication and validation answer with the configured fallback reply.
async fn chat(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
	let user_id = match authenticate(&state, &headers).await {
		Ok(user_id) => user_id,
		Err(err) => return err.into_response(),
	};
	let Json(payload) = match payload {
		Ok(payload) => payload,
		Err(err) => return ApiError::from(err).into_response(),
	};

	match state.service.chat(&user_id, payload).await {
		Ok(response) => Json(response).into_response(),
		Err(err @ (ServiceError::InvalidRequest { .. } | ServiceError::Unauthorized { .. })) =>
			ApiError::from(err).into_response(),
		Err(err) => {
			tracing::error!(user_id = %user_id, error = %err, "Chat turn failed.");

			(
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(ChatResponse { reply: state.service.cfg.chat.failure_reply.clone() }),
			)
				.into_response()
		},
	}
}

async fn chat_history(
	State(state): State<AppState>,
	headers: HeaderMap,
	query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<ChatHistoryResponse>, ApiError> {
	let user_id = authenticate(&state, &headers).await?;
	let Query(query) = query?;
	let response = state.service.chat_history(&user_id, query.limit).await?;

	Ok(Json(response))
}

async fn sync_embeddings(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<SyncReport>, ApiError> {
	let user_id = authenticate(&state, &headers).await?;
	let report = state.service.sync_embeddings(&user_id).await?;

	Ok(Json(report))
}

async fn list_todos(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<ListTodosResponse>, ApiError> {
	let user_id = authenticate(&state, &headers).await?;
	let response = state.service.list_todos(&user_id).await?;

	Ok(Json(response))
}

async fn create_todo(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<Json<TodoItem>, ApiError> {
	let user_id = authenticate(&state, &headers).await?;
	let Json(payload) = payload?;
	let mutation = state.service.create_todo(&user_id, payload).await?;

	spawn_sync(state.service.clone(), user_id);

	Ok(Json(mutation.todo))
}

async fn update_todo(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<TodoItem>, ApiError> {
	let user_id = authenticate(&state, &headers).await?;
	let Json(payload) = payload?;
	let mutation = state.service.update_todo(&user_id, payload).await?;

	if mutation.reindex {
		spawn_sync(state.service.clone(), user_id);
	}

	Ok(Json(mutation.todo))
}

async fn toggle_todo(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<ToggleTodoRequest>, JsonRejection>,
) -> Result<Json<TodoItem>, ApiError> {
	let user_id = authenticate(&state, &headers).await?;
	let Json(payload) = payload?;
	let todo = state.service.toggle_todo(&user_id, payload).await?;

	Ok(Json(todo))
}

async fn delete_todo(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<DeleteTodoRequest>, JsonRejection>,
) -> Result<Json<DeleteTodoResponse>, ApiError> {
	let user_id = authenticate(&state, &headers).await?;
	let Json(payload) = payload?;
	let response = state.service.delete_todo(&user_id, payload).await?;

	Ok(Json(response))
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
	let token = headers
		.get(AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix("Bearer "))
		.ok_or_else(|| {
			json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Missing bearer token.", None)
		})?;

	Ok(state.service.authenticate(token).await?)
}

/// Runs an embedding sync in the background; the caller does not wait for it.
fn spawn_sync(service: Arc<TodoService>, user_id: String) {
	tokio::spawn(async move {
		if let Err(err) = service.sync_embeddings(&user_id).await {
			tracing::warn!(user_id = %user_id, error = %err, "Background embedding sync failed.");
		}
	});
}
