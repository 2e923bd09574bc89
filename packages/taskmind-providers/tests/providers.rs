use std::net::SocketAddr;

use axum::{
	Json, Router,
	http::{HeaderMap, StatusCode},
	routing::{get, post},
};
use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};
use tokio::net::TcpListener;

use taskmind_config::{EmbeddingProviderConfig, IdentityProviderConfig, LlmProviderConfig};
use taskmind_domain::messages::{PromptMessage, Role};

async fn serve(app: Router) -> SocketAddr {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind fake provider.");
	let addr = listener.local_addr().expect("Failed to read fake provider address.");

	tokio::spawn(async move {
		let _ = axum::serve(listener, app).await;
	});

	addr
}

fn embedding_cfg(addr: SocketAddr) -> EmbeddingProviderConfig {
	EmbeddingProviderConfig {
		provider_id: "fake".to_string(),
		api_base: format!("http://{addr}"),
		api_key: "embed-key".to_string(),
		path: "/embeddings".to_string(),
		model: "fake-embed".to_string(),
		dimensions: 3,
		timeout_ms: 2_000,
		default_headers: Map::new(),
	}
}

fn llm_cfg(addr: SocketAddr) -> LlmProviderConfig {
	LlmProviderConfig {
		provider_id: "fake".to_string(),
		api_base: format!("http://{addr}"),
		api_key: "chat-key".to_string(),
		path: "/chat/completions".to_string(),
		model: "fake-chat".to_string(),
		temperature: 0.2,
		max_tokens: 64,
		timeout_ms: 2_000,
		default_headers: Map::new(),
	}
}

#[test]
fn builds_bearer_auth_header() {
	let headers =
		taskmind_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut extra = Map::new();

	extra.insert("x-retries".to_string(), Value::from(3));

	assert!(taskmind_providers::auth_headers("secret", &extra).is_err());
}

#[tokio::test]
async fn embeds_through_http() {
	let app = Router::new().route(
		"/embeddings",
		post(|headers: HeaderMap, Json(body): Json<Value>| async move {
			assert_eq!(headers[AUTHORIZATION], "Bearer embed-key");
			assert_eq!(body["model"], "fake-embed");
			assert_eq!(body["dimensions"], 3);

			Json(serde_json::json!({
				"data": [{ "index": 0, "embedding": [0.1, 0.2, 0.3] }]
			}))
		}),
	);
	let addr = serve(app).await;
	let vectors =
		taskmind_providers::embedding::embed(&embedding_cfg(addr), &["buy milk".to_string()])
			.await
			.expect("Embedding request failed.");

	assert_eq!(vectors, vec![vec![0.1, 0.2, 0.3]]);
}

#[tokio::test]
async fn completion_sends_ordered_messages() {
	let app = Router::new().route(
		"/chat/completions",
		post(|Json(body): Json<Value>| async move {
			let roles = body["messages"]
				.as_array()
				.map(|messages| messages.iter().map(|m| m["role"].clone()).collect::<Vec<_>>())
				.unwrap_or_default();

			assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
			assert_eq!(body["max_tokens"], 64);

			Json(serde_json::json!({
				"choices": [{ "message": { "role": "assistant", "content": "You have 5 todos." } }]
			}))
		}),
	);
	let addr = serve(app).await;
	let messages = [
		PromptMessage::new(Role::System, "rules"),
		PromptMessage::new(Role::User, "earlier"),
		PromptMessage::new(Role::Assistant, "reply"),
		PromptMessage::new(Role::User, "how many?"),
	];
	let reply = taskmind_providers::chat::complete(&llm_cfg(addr), &messages)
		.await
		.expect("Completion request failed.");

	assert_eq!(reply, "You have 5 todos.");
}

#[tokio::test]
async fn completion_surfaces_upstream_status() {
	let app = Router::new()
		.route("/chat/completions", post(|| async { StatusCode::TOO_MANY_REQUESTS }));
	let addr = serve(app).await;
	let err = taskmind_providers::chat::complete(
		&llm_cfg(addr),
		&[PromptMessage::new(Role::User, "hi")],
	)
	.await
	.expect_err("Expected upstream error.");

	assert!(matches!(err, taskmind_providers::Error::Reqwest(_)));
}

#[tokio::test]
async fn date_parser_requests_json_object() {
	let app = Router::new().route(
		"/chat/completions",
		post(|Json(body): Json<Value>| async move {
			assert_eq!(body["response_format"]["type"], "json_object");

			Json(serde_json::json!({
				"choices": [{ "message": { "content": "{\"needs_filtering\": true, \"start_date\": \"2026-03-02T00:00:00Z\", \"end_date\": \"2026-03-08T23:59:59Z\"}" } }]
			}))
		}),
	);
	let addr = serve(app).await;
	let now = time::macros::datetime!(2026-03-10 12:00 UTC);
	let range = taskmind_providers::date_parser::extract_range(&llm_cfg(addr), "last week", now)
		.await
		.expect("Date parser request failed.")
		.expect("Expected a range.");

	assert_eq!(range.start, time::macros::datetime!(2026-03-02 00:00 UTC));
}

#[tokio::test]
async fn identity_maps_rejection_to_none() {
	let app = Router::new().route(
		"/user",
		get(|headers: HeaderMap| async move {
			match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
				Some("Bearer good") => {
					assert_eq!(headers["apikey"], "anon");

					(StatusCode::OK, Json(serde_json::json!({ "id": "user-1" })))
				},
				_ => (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "msg": "invalid" }))),
			}
		}),
	);
	let addr = serve(app).await;
	let mut default_headers = Map::new();

	default_headers.insert("apikey".to_string(), Value::String("anon".to_string()));

	let cfg = IdentityProviderConfig {
		api_base: format!("http://{addr}"),
		path: "/user".to_string(),
		timeout_ms: 2_000,
		default_headers,
	};

	assert_eq!(
		taskmind_providers::identity::resolve_user(&cfg, "good")
			.await
			.expect("Identity request failed.")
			.as_deref(),
		Some("user-1")
	);
	assert_eq!(
		taskmind_providers::identity::resolve_user(&cfg, "bad")
			.await
			.expect("Identity request failed."),
		None
	);
}
