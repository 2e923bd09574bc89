//! Per-todo accumulator of chat turns that retrieved the todo.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{RankedTodo, TodoStats};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodoContext {
	/// Newest first.
	pub query_history: Vec<QueryHistoryEntry>,
	pub times_queried: u64,
	#[serde(default, with = "crate::time_serde::option")]
	pub first_queried_at: Option<OffsetDateTime>,
	#[serde(default, with = "crate::time_serde::option")]
	pub last_queried_at: Option<OffsetDateTime>,
	pub avg_rank: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHistoryEntry {
	pub query: String,
	#[serde(with = "crate::time_serde")]
	pub timestamp: OffsetDateTime,
	pub my_rank: u32,
	pub my_similarity: f32,
	pub my_todo_id: Uuid,
	pub my_title: String,
	pub co_matched_todos: Vec<CoMatchedTodo>,
	pub stats_at_query: StatsAtQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoMatchedTodo {
	pub todo_id: Uuid,
	pub title: String,
	pub similarity_diff: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsAtQuery {
	pub total_todos: i64,
	pub completed_todos: i64,
	pub pending_todos: i64,
	pub results_returned: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct MergeLimits {
	pub query_history_cap: usize,
	pub co_match_cap: usize,
}

/// One chat turn, shared by every todo updated during that turn.
pub struct Turn<'a> {
	pub query: &'a str,
	pub now: OffsetDateTime,
	pub stats: TodoStats,
	pub ranked: &'a [RankedTodo],
}

impl TodoContext {
	/// Reads a stored payload, keeping only well-formed history entries.
	pub fn from_stored(value: &Value) -> Self {
		let query_history = value
			.get("query_history")
			.and_then(Value::as_array)
			.map(|entries| {
				entries
					.iter()
					.filter_map(|entry| serde_json::from_value(entry.clone()).ok())
					.collect::<Vec<QueryHistoryEntry>>()
			})
			.unwrap_or_default();
		let times_queried = value.get("times_queried").and_then(Value::as_u64).unwrap_or(0);
		let first_queried_at = value
			.get("first_queried_at")
			.and_then(|raw| serde_json::from_value::<Timestamp>(raw.clone()).ok())
			.map(|ts| ts.0);
		let last_queried_at = value
			.get("last_queried_at")
			.and_then(|raw| serde_json::from_value::<Timestamp>(raw.clone()).ok())
			.map(|ts| ts.0);
		let avg_rank = value.get("avg_rank").and_then(Value::as_f64).unwrap_or(0.0);

		Self { query_history, times_queried, first_queried_at, last_queried_at, avg_rank }
	}

	pub fn to_value(&self) -> serde_json::Result<Value> {
		serde_json::to_value(self)
	}
}

#[derive(Deserialize)]
struct Timestamp(#[serde(with = "crate::time_serde")] OffsetDateTime);

/// Folds the turn into `existing` for the todo ranked at `rank_index` (0-based).
pub fn merge_turn(
	existing: TodoContext,
	turn: &Turn<'_>,
	rank_index: usize,
	limits: MergeLimits,
) -> Option<TodoContext> {
	let current = turn.ranked.get(rank_index)?;
	let mut co_matched_todos = turn
		.ranked
		.iter()
		.filter(|other| other.id != current.id)
		.map(|other| CoMatchedTodo {
			todo_id: other.id,
			title: other.title.clone(),
			similarity_diff: (other.similarity - current.similarity).abs(),
		})
		.collect::<Vec<_>>();

	co_matched_todos.sort_by(|a, b| a.similarity_diff.total_cmp(&b.similarity_diff));
	co_matched_todos.truncate(limits.co_match_cap);

	let entry = QueryHistoryEntry {
		query: turn.query.to_string(),
		timestamp: turn.now,
		my_rank: (rank_index + 1) as u32,
		my_similarity: current.similarity,
		my_todo_id: current.id,
		my_title: current.title.clone(),
		co_matched_todos,
		stats_at_query: StatsAtQuery {
			total_todos: turn.stats.total,
			completed_todos: turn.stats.completed,
			pending_todos: turn.stats.pending,
			results_returned: turn.ranked.len(),
		},
	};
	let mut query_history = Vec::with_capacity(limits.query_history_cap);

	query_history.push(entry);
	query_history.extend(existing.query_history);
	query_history.truncate(limits.query_history_cap.max(1));

	let rank_sum = query_history.iter().map(|entry| f64::from(entry.my_rank)).sum::<f64>();
	let avg_rank = (rank_sum / query_history.len() as f64 * 100.0).round() / 100.0;

	Some(TodoContext {
		query_history,
		times_queried: existing.times_queried + 1,
		first_queried_at: existing.first_queried_at.or(Some(turn.now)),
		last_queried_at: Some(turn.now),
		avg_rank,
	})
}
