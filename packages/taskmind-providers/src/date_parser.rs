//! Asks a language model to turn date language in a question into a UTC window.

use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use taskmind_domain::{
	date_range::DateRange,
	messages::{PromptMessage, Role},
};

use crate::{Error, Result};

const INSTRUCTIONS: &str = "\
You extract date filters from questions about a todo list.
Reply with a single JSON object and nothing else:
{\"needs_filtering\": boolean, \"start_date\": string | null, \"end_date\": string | null}
Dates are RFC 3339 timestamps in UTC. start_date is the first instant of the period and end_date the last instant, both inclusive.
Set needs_filtering to false when the question does not restrict todos to a creation period.";

pub async fn extract_range(
	cfg: &taskmind_config::LlmProviderConfig,
	query: &str,
	now: OffsetDateTime,
) -> Result<Option<DateRange>> {
	let now_text = now.format(&Rfc3339).map_err(|err| Error::InvalidResponse {
		message: format!("Failed to format current time: {err}."),
	})?;
	let messages = [
		PromptMessage::new(Role::System, INSTRUCTIONS),
		PromptMessage::new(Role::User, format!("Current time: {now_text}\nQuestion: {query}")),
	];
	let json = crate::chat::request(
		cfg,
		&messages,
		Some(serde_json::json!({ "type": "json_object" })),
	)
	.await?;
	let content = crate::chat::parse_completion_content(&json)?;

	parse_range(&content)
}

fn parse_range(content: &str) -> Result<Option<DateRange>> {
	let cleaned = content
		.trim()
		.trim_start_matches("```json")
		.trim_start_matches("```")
		.trim_end_matches("```")
		.trim();
	let json: Value = serde_json::from_str(cleaned)?;

	if json.get("needs_filtering").and_then(Value::as_bool) == Some(false) {
		return Ok(None);
	}

	let start = bound(&json, &["start_date", "startDate"]);
	let end = bound(&json, &["end_date", "endDate"]);

	match (start, end) {
		(Some(start), Some(end)) => Ok(DateRange::new(start, end)),
		_ => Ok(None),
	}
}

fn bound(json: &Value, keys: &[&str]) -> Option<OffsetDateTime> {
	keys.iter()
		.filter_map(|key| json.get(*key).and_then(Value::as_str))
		.find_map(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok())
}
