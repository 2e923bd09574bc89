//! Renders retrieved todos into the text block handed to the completion model.
//!
//! The output is deterministic for a given clock, stats and candidate list so that the
//! prompt can be asserted on directly.

use time::{OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros};

use crate::{RankedTodo, TodoStats};

const DISPLAY_FORMAT: &[BorrowedFormatItem<'static>] = macros::format_description!(
	"[month padding:none]/[day padding:none]/[year], [hour repr:12 padding:none]:[minute]:[second] [period]"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retrieval {
	/// Ranked by vector similarity; lines carry a match percentage.
	Similarity,
	/// Fetched by date window or listed wholesale.
	Listing,
}

pub fn display_timestamp(ts: OffsetDateTime) -> String {
	let utc = ts.to_offset(UtcOffset::UTC);

	utc.format(DISPLAY_FORMAT).unwrap_or_else(|_| utc.to_string())
}

pub fn format_todo_line(todo: &RankedTodo, index: usize, retrieval: Retrieval) -> String {
	let mut line = format!(
		"{}. \"{}\" | Created: {} | Updated: {}",
		index + 1,
		todo.title,
		display_timestamp(todo.created_at),
		display_timestamp(todo.updated_at),
	);

	if let Some(notes) = todo.notes.as_deref().filter(|notes| !notes.trim().is_empty()) {
		line.push_str(" | Notes: ");
		line.push_str(notes);
	}
	if retrieval == Retrieval::Similarity {
		line.push_str(&format!(" [{:.1}%]", todo.similarity * 100.0));
	}

	line.push_str(if todo.was_updated() { " [UPDATED]" } else { " [NOT UPDATED]" });

	line
}

pub fn assemble(
	now: OffsetDateTime,
	stats: TodoStats,
	todos: &[RankedTodo],
	retrieval: Retrieval,
) -> String {
	let updated = todos.iter().filter(|todo| todo.was_updated()).collect::<Vec<_>>();
	let not_updated = todos.iter().filter(|todo| !todo.was_updated()).collect::<Vec<_>>();
	let completed = todos.iter().filter(|todo| todo.is_completed).collect::<Vec<_>>();
	let pending = todos.iter().filter(|todo| !todo.is_completed).collect::<Vec<_>>();
	let mut out = String::new();

	out.push_str(&format!("CURRENT: {}\n", display_timestamp(now)));
	out.push_str(&format!(
		"STATS: Total={} | Completed={} | Pending={}\n",
		stats.total, stats.completed, stats.pending
	));

	for (label, section, empty) in [
		("UPDATED TASKS", &updated, "No updated tasks found"),
		("NOT UPDATED TASKS", &not_updated, "All tasks have been updated"),
		("COMPLETED", &completed, "None"),
		("PENDING", &pending, "None"),
	] {
		out.push_str(&format!("\n{label} ({}):\n", section.len()));

		if section.is_empty() {
			out.push_str(empty);
			out.push('\n');

			continue;
		}

		for (idx, todo) in section.iter().enumerate() {
			out.push_str(&format_todo_line(todo, idx, retrieval));
			out.push('\n');
		}
	}

	out.trim_end().to_string()
}

pub fn system_prompt(shown: usize, total: i64) -> String {
	format!(
		"\
You are a Todo Assistant using AI semantic search.
RULES:
1. Use STATS for counts.
2. Only reference todos listed in the provided sections.
3. Never invent titles.
4. UPDATED TASKS contains tasks modified after creation; NOT UPDATED TASKS contains tasks never modified.
5. When asked about updated tasks, use only the UPDATED TASKS section. If it is empty, say \"No tasks have been updated\".
6. COMPLETED and PENDING show completion status.
7. Use the conversation history to resolve references such as \"those\", \"them\" or \"the first one\".
8. Be concise and accurate.
CURRENT is the current time in UTC. Compare dates against it to answer \"today\", \"yesterday\" and similar questions.
Showing {shown} of {total} todos."
	)
}

pub fn user_turn(context: &str, query: &str) -> String {
	format!("{context}\n\nQ: {query}")
}
