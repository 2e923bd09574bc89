//! Resolves a caller's bearer token to a user id through the BaaS auth endpoint.

use reqwest::{StatusCode, header::AUTHORIZATION};
use serde_json::Value;

use crate::{Error, Result};

/// `Ok(None)` means the token was rejected.
pub async fn resolve_user(
	cfg: &taskmind_config::IdentityProviderConfig,
	token: &str,
) -> Result<Option<String>> {
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let res = client
		.get(url)
		.headers(crate::extra_headers(&cfg.default_headers)?)
		.header(AUTHORIZATION, format!("Bearer {token}"))
		.send()
		.await?;

	if matches!(res.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
		return Ok(None);
	}

	let json: Value = res.error_for_status()?.json().await?;

	parse_user_id(&json)
}

fn parse_user_id(json: &Value) -> Result<Option<String>> {
	let user = json.get("user").unwrap_or(json);

	match user.get("id") {
		Some(Value::String(id)) if !id.trim().is_empty() => Ok(Some(id.trim().to_string())),
		Some(Value::String(_)) | Some(Value::Null) | None => Ok(None),
		Some(_) => Err(Error::InvalidResponse {
			message: "Identity response id must be a string.".to_string(),
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_top_level_or_nested_id() {
		let top = serde_json::json!({ "id": "u1", "email": "a@b.c" });
		let nested = serde_json::json!({ "user": { "id": "u2" } });

		assert_eq!(parse_user_id(&top).expect("parse failed").as_deref(), Some("u1"));
		assert_eq!(parse_user_id(&nested).expect("parse failed").as_deref(), Some("u2"));
		assert_eq!(parse_user_id(&serde_json::json!({})).expect("parse failed"), None);
		assert!(parse_user_id(&serde_json::json!({ "id": 7 })).is_err());
	}
}
