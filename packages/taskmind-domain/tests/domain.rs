use time::{OffsetDateTime, macros::datetime};
use uuid::Uuid;

use taskmind_domain::{
	RankedTodo, TodoStats,
	classify::{self, QueryIntent},
	context::{self, Retrieval},
	messages::{self, HistoryTurn, Role},
	todo_context::{self, MergeLimits, TodoContext, Turn},
};

fn todo(title: &str, similarity: f32, completed: bool, edited: bool) -> RankedTodo {
	let created_at = datetime!(2026-03-10 09:15:00 UTC);

	RankedTodo {
		id: Uuid::new_v4(),
		title: title.to_string(),
		notes: None,
		is_completed: completed,
		created_at,
		updated_at: if edited { datetime!(2026-03-11 14:05:09 UTC) } else { created_at },
		similarity,
	}
}

fn limits() -> MergeLimits {
	MergeLimits { query_history_cap: 10, co_match_cap: 5 }
}

fn turn<'a>(query: &'a str, now: OffsetDateTime, ranked: &'a [RankedTodo]) -> Turn<'a> {
	Turn { query, now, stats: TodoStats::new(5, 2), ranked }
}

#[test]
fn classifier_routes_by_intent() {
	assert_eq!(classify::classify("tasks from today"), QueryIntent::DateRange);
	assert_eq!(classify::classify("what did I add last week?"), QueryIntent::DateRange);
	assert_eq!(classify::classify("todos created on 2026-03-01"), QueryIntent::DateRange);
	assert_eq!(classify::classify("anything due Friday"), QueryIntent::DateRange);
	assert_eq!(classify::classify("show me changed tasks"), QueryIntent::Metadata);
	assert_eq!(classify::classify("what should I cook?"), QueryIntent::Semantic);
}

#[test]
fn stats_question_context_carries_counts_and_only_retrieved_titles() {
	let ranked = vec![
		todo("Buy milk", 0.91, false, false),
		todo("File taxes", 0.42, true, true),
	];
	let block = context::assemble(
		datetime!(2026-03-12 08:00:00 UTC),
		TodoStats::new(5, 2),
		&ranked,
		Retrieval::Similarity,
	);

	assert!(block.starts_with("CURRENT: 3/12/2026, 8:00:00 AM\n"));
	assert!(block.contains("STATS: Total=5 | Completed=2 | Pending=3"));
	assert!(block.contains("UPDATED TASKS (1):\n1. \"File taxes\""));
	assert!(block.contains("NOT UPDATED TASKS (1):\n1. \"Buy milk\""));
	assert!(block.contains("COMPLETED (1):"));
	assert!(block.contains("PENDING (1):"));
	assert!(block.contains("[91.0%]"));

	let quoted = block.matches('"').count();

	// Each retrieved todo appears once per partition it belongs to: two partitions each.
	assert_eq!(quoted, 2 * 2 * 2);
}

#[test]
fn todo_line_layout() {
	let mut edited = todo("Plan trip", 0.5, false, true);

	edited.notes = Some("Book hotel".to_string());

	let line = context::format_todo_line(&edited, 2, Retrieval::Similarity);

	assert_eq!(
		line,
		"3. \"Plan trip\" | Created: 3/10/2026, 9:15:00 AM | Updated: 3/11/2026, 2:05:09 PM | Notes: Book hotel [50.0%] [UPDATED]"
	);

	let fresh = todo("Call mom", 1.0, false, false);
	let line = context::format_todo_line(&fresh, 0, Retrieval::Listing);

	assert_eq!(line, "1. \"Call mom\" | Created: 3/10/2026, 9:15:00 AM | Updated: 3/10/2026, 9:15:00 AM [NOT UPDATED]");
}

#[test]
fn empty_sections_use_placeholders() {
	let block =
		context::assemble(datetime!(2026-03-12 20:30:00 UTC), TodoStats::new(0, 0), &[], Retrieval::Listing);

	assert!(block.contains("UPDATED TASKS (0):\nNo updated tasks found"));
	assert!(block.contains("NOT UPDATED TASKS (0):\nAll tasks have been updated"));
	assert!(block.contains("COMPLETED (0):\nNone"));
	assert!(block.ends_with("PENDING (0):\nNone"));
}

#[test]
fn system_prompt_reports_coverage() {
	let prompt = context::system_prompt(3, 12);

	assert!(prompt.ends_with("Showing 3 of 12 todos."));
	assert!(prompt.contains("Never invent titles."));
}

#[test]
fn prompt_orders_system_history_then_question() {
	let history = vec![
		HistoryTurn {
			id: Uuid::new_v4(),
			query: "first?".to_string(),
			response: "one".to_string(),
			created_at: datetime!(2026-03-01 10:00 UTC),
		},
		HistoryTurn {
			id: Uuid::new_v4(),
			query: "second?".to_string(),
			response: "two".to_string(),
			created_at: datetime!(2026-03-01 10:05 UTC),
		},
	];
	let prompt = messages::build_prompt(
		"rules".to_string(),
		&history,
		context::user_turn("CTX", "third?"),
	);
	let roles = prompt.iter().map(|message| message.role).collect::<Vec<_>>();

	assert_eq!(
		roles,
		vec![Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant, Role::User]
	);
	assert_eq!(prompt[1].content, "first?");
	assert_eq!(prompt[4].content, "two");
	assert_eq!(prompt[5].content, "CTX\n\nQ: third?");

	let transcript = messages::transcript(&history);

	assert_eq!(transcript.len(), 4);
	assert_eq!(transcript[0].role, Role::User);
	assert_eq!(transcript[3].content, "two");
}

#[test]
fn merge_prepends_entry_and_tracks_counters() {
	let ranked = vec![
		todo("A", 0.90, false, false),
		todo("B", 0.80, false, false),
		todo("C", 0.88, false, false),
	];
	let first_at = datetime!(2026-03-01 10:00 UTC);
	let merged = todo_context::merge_turn(
		TodoContext::default(),
		&turn("groceries", first_at, &ranked),
		0,
		limits(),
	)
	.expect("rank 0 exists");

	assert_eq!(merged.times_queried, 1);
	assert_eq!(merged.first_queried_at, Some(first_at));
	assert_eq!(merged.last_queried_at, Some(first_at));
	assert_eq!(merged.avg_rank, 1.0);

	let entry = &merged.query_history[0];

	assert_eq!(entry.my_rank, 1);
	assert_eq!(entry.my_todo_id, ranked[0].id);
	assert_eq!(entry.stats_at_query.results_returned, 3);
	assert_eq!(entry.stats_at_query.pending_todos, 3);
	// Closest similarity first: C (0.02) before B (0.10).
	assert_eq!(entry.co_matched_todos[0].todo_id, ranked[2].id);
	assert_eq!(entry.co_matched_todos[1].todo_id, ranked[1].id);

	let later = datetime!(2026-03-02 10:00 UTC);
	let merged = todo_context::merge_turn(merged, &turn("dinner", later, &ranked), 1, limits())
		.expect("rank 1 exists");

	assert_eq!(merged.times_queried, 2);
	assert_eq!(merged.first_queried_at, Some(first_at));
	assert_eq!(merged.last_queried_at, Some(later));
	assert_eq!(merged.query_history[0].query, "dinner");
	assert_eq!(merged.avg_rank, 1.5);
}

#[test]
fn merge_evicts_oldest_beyond_cap() {
	let ranked = vec![todo("A", 0.9, false, false)];
	let mut ctx = TodoContext::default();

	for i in 0..15 {
		let now = datetime!(2026-03-01 00:00 UTC) + time::Duration::minutes(i);
		let query = format!("q{i}");

		ctx = todo_context::merge_turn(ctx, &turn(&query, now, &ranked), 0, limits())
			.expect("rank 0 exists");
	}

	assert_eq!(ctx.query_history.len(), 10);
	assert_eq!(ctx.times_queried, 15);
	assert_eq!(ctx.query_history[0].query, "q14");
	assert_eq!(ctx.query_history[9].query, "q5");
}

#[test]
fn co_matches_are_capped() {
	let ranked = (0..8).map(|i| todo(&format!("T{i}"), 0.9 - i as f32 * 0.01, false, false)).collect::<Vec<_>>();
	let merged = todo_context::merge_turn(
		TodoContext::default(),
		&turn("q", datetime!(2026-03-01 00:00 UTC), &ranked),
		0,
		MergeLimits { query_history_cap: 10, co_match_cap: 3 },
	)
	.expect("rank 0 exists");

	assert_eq!(merged.query_history[0].co_matched_todos.len(), 3);
}

#[test]
fn stored_payload_drops_malformed_entries() {
	let ranked = vec![todo("A", 0.9, false, false)];
	let good = todo_context::merge_turn(
		TodoContext::default(),
		&turn("valid", datetime!(2026-03-01 00:00 UTC), &ranked),
		0,
		limits(),
	)
	.expect("rank 0 exists");
	let mut stored = good.to_value().expect("payload serializes");
	let history = stored["query_history"].as_array_mut().expect("history array");

	history.push(serde_json::json!({ "query": "legacy", "timestamp": "2026-01-01T00:00:00Z" }));
	stored["extra_field"] = serde_json::json!("ignored");

	let parsed = TodoContext::from_stored(&stored);

	assert_eq!(parsed.query_history.len(), 1);
	assert_eq!(parsed.query_history[0].query, "valid");
	assert_eq!(parsed.times_queried, 1);
	assert_eq!(parsed.first_queried_at, Some(datetime!(2026-03-01 00:00 UTC)));
	assert_eq!(TodoContext::from_stored(&serde_json::json!({})), TodoContext::default());
}

#[test]
fn merge_out_of_range_rank_is_none() {
	let ranked = vec![todo("A", 0.9, false, false)];

	assert!(
		todo_context::merge_turn(
			TodoContext::default(),
			&turn("q", datetime!(2026-03-01 00:00 UTC), &ranked),
			1,
			limits(),
		)
		.is_none()
	);
}
