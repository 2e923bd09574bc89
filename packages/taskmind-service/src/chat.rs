//! The retrieval-augmented chat turn: classify, retrieve, assemble, complete, record.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use taskmind_domain::{
	RankedTodo, TodoStats,
	classify::{self, QueryIntent},
	context::{self, Retrieval},
	date_range::{self, DateRange},
	messages::{self, HistoryTurn},
	todo_context::{self, MergeLimits, TodoContext, Turn},
};
use taskmind_storage::{
	models::{ChatHistoryRow, MatchRow, Todo},
	queries,
};

use crate::{Error, Result, TodoService};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
	pub user_id: String,
	pub query: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatResponse {
	pub reply: String,
}

struct Retrieved {
	todos: Vec<RankedTodo>,
	retrieval: Retrieval,
	query_embedding: Option<Vec<f32>>,
}

impl TodoService {
	/// Answers one question for the authenticated `user_id`.
	///
	/// Returns the configured guidance reply, without calling the completion model or writing
	/// history, when similarity search has nothing to offer.
	pub async fn chat(&self, user_id: &str, req: ChatRequest) -> Result<ChatResponse> {
		if req.user_id.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "user_id must be non-empty.".to_string() });
		}
		if req.user_id.trim() != user_id {
			return Err(Error::Unauthorized {
				message: "user_id does not match the authenticated user.".to_string(),
			});
		}

		let query = req.query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}

		let now = OffsetDateTime::now_utc();
		let history = queries::recent_history(&self.db, user_id, self.cfg.chat.history_turns)
			.await?
			.into_iter()
			.map(|row| HistoryTurn {
				id: row.id,
				query: row.query,
				response: row.response,
				created_at: row.created_at,
			})
			.collect::<Vec<_>>();
		let counts = queries::todo_counts(&self.db, user_id).await?;
		let stats = TodoStats::new(counts.total, counts.completed);
		let Some(retrieved) = self.retrieve(user_id, query, now).await? else {
			tracing::info!(user_id, "No indexed todos matched the question.");

			return Ok(ChatResponse { reply: self.cfg.chat.no_index_reply.clone() });
		};
		let block = context::assemble(now, stats, &retrieved.todos, retrieved.retrieval);
		let prompt = messages::build_prompt(
			context::system_prompt(retrieved.todos.len(), stats.total),
			&history,
			context::user_turn(&block, query),
		);
		let reply = self.providers.chat.complete(&self.cfg.providers.chat, &prompt).await?;
		let row = ChatHistoryRow {
			id: Uuid::new_v4(),
			user_id: user_id.to_string(),
			query: query.to_string(),
			response: reply.clone(),
			created_at: now,
		};

		queries::insert_history(&self.db, &row, retrieved.query_embedding.as_deref()).await?;

		self.persist_contexts(user_id, &Turn { query, now, stats, ranked: &retrieved.todos }).await;

		tracing::info!(
			user_id,
			retrieved = retrieved.todos.len(),
			history_turns = history.len(),
			"Chat turn answered."
		);

		Ok(ChatResponse { reply })
	}

	/// `Ok(None)` means similarity search produced no candidates.
	async fn retrieve(
		&self,
		user_id: &str,
		query: &str,
		now: OffsetDateTime,
	) -> Result<Option<Retrieved>> {
		let mut intent = classify::classify(query);

		if intent == QueryIntent::DateRange {
			match self.resolve_range(query, now).await {
				Some(range) => {
					let todos =
						queries::fetch_todos_in_range(&self.db, user_id, range.start, range.end)
							.await?;

					return Ok(Some(listing(todos)));
				},
				None => intent = classify::fallback_intent(query),
			}
		}
		if intent == QueryIntent::Metadata {
			let todos = queries::list_todos(&self.db, user_id).await?;

			return Ok(Some(listing(todos)));
		}

		let Some(query_embedding) = self.embed_query(user_id, query).await else {
			return Ok(None);
		};
		let matches = queries::match_todos(
			&self.db,
			&query_embedding,
			user_id,
			self.cfg.chat.match_count,
		)
		.await?;

		if matches.is_empty() {
			return Ok(None);
		}

		let ids = matches.iter().map(|row| row.todo_id).collect::<Vec<_>>();
		let full = queries::fetch_todos_by_ids(&self.db, user_id, &ids).await?;
		let todos = join_ranked(matches, full);

		if todos.is_empty() {
			return Ok(None);
		}

		Ok(Some(Retrieved {
			todos,
			retrieval: Retrieval::Similarity,
			query_embedding: Some(query_embedding),
		}))
	}

	async fn resolve_range(&self, query: &str, now: OffsetDateTime) -> Option<DateRange> {
		if let Some(range) = date_range::resolve_relative(query, now) {
			return Some(range);
		}

		match self
			.providers
			.date_parser
			.extract_range(&self.cfg.providers.date_parser, query, now)
			.await
		{
			Ok(Some(range)) => Some(range),
			Ok(None) => None,
			Err(err) => {
				tracing::warn!(error = %err, "Date range extraction failed.");

				None
			},
		}
	}

	/// Any failure degrades to `None` so the caller can answer with guidance instead.
	async fn embed_query(&self, user_id: &str, query: &str) -> Option<Vec<f32>> {
		let texts = [query.to_string()];
		let vec = match self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await
		{
			Ok(vectors) => vectors.into_iter().next().unwrap_or_default(),
			Err(err) => {
				tracing::warn!(user_id, error = %err, "Query embedding failed.");

				return None;
			},
		};

		if vec.is_empty() || vec.len() != self.cfg.storage.vector.dim as usize {
			tracing::warn!(
				user_id,
				expected = self.cfg.storage.vector.dim,
				got = vec.len(),
				"Query embedding has the wrong dimension."
			);

			return None;
		}

		Some(vec)
	}

	async fn persist_contexts(&self, user_id: &str, turn: &Turn<'_>) {
		let limit = (self.cfg.chat.context_update_limit as usize).min(turn.ranked.len());
		let limits = MergeLimits {
			query_history_cap: self.cfg.chat.query_history_cap as usize,
			co_match_cap: self.cfg.chat.co_match_cap as usize,
		};
		let ids = turn.ranked[..limit].iter().map(|todo| todo.id).collect::<Vec<_>>();
		let stored = match queries::fetch_todo_contexts(&self.db, user_id, &ids).await {
			Ok(rows) => rows
				.into_iter()
				.map(|row| (row.todo_id, row.todo_context))
				.collect::<HashMap<_, _>>(),
			Err(err) => {
				tracing::warn!(user_id, error = %err, "Failed to load todo contexts.");

				return;
			},
		};

		for (rank_index, todo_id) in ids.iter().enumerate() {
			let existing =
				stored.get(todo_id).map(TodoContext::from_stored).unwrap_or_default();
			let Some(merged) = todo_context::merge_turn(existing, turn, rank_index, limits) else {
				continue;
			};
			let payload = match merged.to_value() {
				Ok(payload) => payload,
				Err(err) => {
					tracing::warn!(user_id, todo_id = %todo_id, error = %err, "Failed to encode todo context.");

					continue;
				},
			};

			match queries::update_todo_context(&self.db, user_id, *todo_id, &payload, turn.now)
				.await
			{
				Ok(true) => {},
				Ok(false) => {
					tracing::warn!(user_id, todo_id = %todo_id, "Todo context record is missing.");
				},
				Err(err) => {
					tracing::warn!(user_id, todo_id = %todo_id, error = %err, "Failed to write todo context.");
				},
			}
		}
	}
}

/// Listed todos keep their list order as rank and count as full matches.
fn listing(todos: Vec<Todo>) -> Retrieved {
	Retrieved {
		todos: todos.into_iter().map(|todo| ranked(todo, 1.0)).collect(),
		retrieval: Retrieval::Listing,
		query_embedding: None,
	}
}

fn ranked(todo: Todo, similarity: f32) -> RankedTodo {
	RankedTodo {
		id: todo.id,
		title: todo.title,
		notes: todo.notes,
		is_completed: todo.is_completed,
		created_at: todo.created_at,
		updated_at: todo.updated_at,
		similarity,
	}
}

/// Keeps match order; candidates without a full record are dropped.
fn join_ranked(matches: Vec<MatchRow>, full: Vec<Todo>) -> Vec<RankedTodo> {
	let mut by_id = full.into_iter().map(|todo| (todo.id, todo)).collect::<HashMap<_, _>>();

	matches
		.into_iter()
		.filter_map(|row| by_id.remove(&row.todo_id).map(|todo| ranked(todo, row.similarity)))
		.collect()
}
