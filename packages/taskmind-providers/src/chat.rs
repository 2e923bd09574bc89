use serde_json::Value;

use taskmind_domain::messages::PromptMessage;

use crate::{Error, Result};

pub async fn complete(
	cfg: &taskmind_config::LlmProviderConfig,
	messages: &[PromptMessage],
) -> Result<String> {
	let json = request(cfg, messages, None).await?;

	parse_completion_content(&json)
}

/// Posts a chat-completions request; `response_format` is forwarded verbatim when set.
pub(crate) async fn request(
	cfg: &taskmind_config::LlmProviderConfig,
	messages: &[PromptMessage],
	response_format: Option<Value>,
) -> Result<Value> {
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": cfg.max_tokens,
		"messages": messages,
	});

	if let Some(format) = response_format {
		body["response_format"] = format;
	}

	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;

	Ok(res.error_for_status()?.json().await?)
}

pub(crate) fn parse_completion_content(json: &Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Completion response is missing message content.".to_string(),
		})?;
	let trimmed = content.trim();

	if trimmed.is_empty() {
		return Err(Error::InvalidResponse {
			message: "Completion response content is empty.".to_string(),
		});
	}

	Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_first_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "role": "assistant", "content": "  You have 5 todos.\n" } },
				{ "message": { "role": "assistant", "content": "ignored" } }
			]
		});

		assert_eq!(parse_completion_content(&json).expect("parse failed"), "You have 5 todos.");
	}

	#[test]
	fn blank_content_is_an_error() {
		let json = serde_json::json!({ "choices": [{ "message": { "content": "   " } }] });

		assert!(parse_completion_content(&json).is_err());
		assert!(parse_completion_content(&serde_json::json!({ "choices": [] })).is_err());
	}
}
