use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	System,
	User,
	Assistant,
}

/// A role-tagged message sent to the completion model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
	pub role: Role,
	pub content: String,
}
impl PromptMessage {
	pub fn new(role: Role, content: impl Into<String>) -> Self {
		Self { role, content: content.into() }
	}
}

/// One stored exchange, oldest first when replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
	pub id: Uuid,
	pub query: String,
	pub response: String,
	pub created_at: OffsetDateTime,
}

/// A transcript line shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
	pub id: String,
	pub role: Role,
	pub content: String,
	#[serde(with = "crate::time_serde")]
	pub timestamp: OffsetDateTime,
}

/// `[system, user/assistant pairs..., user(context + question)]`.
pub fn build_prompt(system: String, history: &[HistoryTurn], user_turn: String) -> Vec<PromptMessage> {
	let mut messages = Vec::with_capacity(history.len() * 2 + 2);

	messages.push(PromptMessage::new(Role::System, system));

	for turn in history {
		messages.push(PromptMessage::new(Role::User, turn.query.as_str()));
		messages.push(PromptMessage::new(Role::Assistant, turn.response.as_str()));
	}

	messages.push(PromptMessage::new(Role::User, user_turn));

	messages
}

pub fn transcript(history: &[HistoryTurn]) -> Vec<ChatMessage> {
	history
		.iter()
		.flat_map(|turn| {
			[
				ChatMessage {
					id: format!("user-{}", turn.id),
					role: Role::User,
					content: turn.query.clone(),
					timestamp: turn.created_at,
				},
				ChatMessage {
					id: format!("assistant-{}", turn.id),
					role: Role::Assistant,
					content: turn.response.clone(),
					timestamp: turn.created_at,
				},
			]
		})
		.collect()
}
