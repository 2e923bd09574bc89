pub mod auth;
pub mod chat;
pub mod history;
pub mod sync;
pub mod todos;

mod error;

pub use chat::{ChatRequest, ChatResponse};
pub use error::{Error, Result};
pub use history::ChatHistoryResponse;
pub use sync::{SyncReport, SyncResult, SyncStatus};
pub use todos::{
	CreateTodoRequest, DeleteTodoRequest, DeleteTodoResponse, ListTodosResponse, TodoItem,
	TodoMutation, ToggleTodoRequest, UpdateTodoRequest,
};

use std::{future::Future, pin::Pin, sync::Arc};

use time::OffsetDateTime;

use taskmind_config::{Config, EmbeddingProviderConfig, IdentityProviderConfig, LlmProviderConfig};
use taskmind_domain::{date_range::DateRange, messages::PromptMessage};
use taskmind_providers::{chat as chat_api, date_parser, embedding, identity};
use taskmind_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, taskmind_providers::Result<Vec<Vec<f32>>>>;
}

pub trait ChatProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [PromptMessage],
	) -> BoxFuture<'a, taskmind_providers::Result<String>>;
}

pub trait DateRangeProvider
where
	Self: Send + Sync,
{
	fn extract_range<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, taskmind_providers::Result<Option<DateRange>>>;
}

pub trait IdentityProvider
where
	Self: Send + Sync,
{
	fn resolve_user<'a>(
		&'a self,
		cfg: &'a IdentityProviderConfig,
		token: &'a str,
	) -> BoxFuture<'a, taskmind_providers::Result<Option<String>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub chat: Arc<dyn ChatProvider>,
	pub date_parser: Arc<dyn DateRangeProvider>,
	pub identity: Arc<dyn IdentityProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		chat: Arc<dyn ChatProvider>,
		date_parser: Arc<dyn DateRangeProvider>,
		identity: Arc<dyn IdentityProvider>,
	) -> Self {
		Self { embedding, chat, date_parser, identity }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self {
			embedding: provider.clone(),
			chat: provider.clone(),
			date_parser: provider.clone(),
			identity: provider,
		}
	}
}

pub struct TodoService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
}
impl TodoService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		Self { cfg, db, providers }
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, taskmind_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl ChatProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [PromptMessage],
	) -> BoxFuture<'a, taskmind_providers::Result<String>> {
		Box::pin(chat_api::complete(cfg, messages))
	}
}

impl DateRangeProvider for DefaultProviders {
	fn extract_range<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		query: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, taskmind_providers::Result<Option<DateRange>>> {
		Box::pin(date_parser::extract_range(cfg, query, now))
	}
}

impl IdentityProvider for DefaultProviders {
	fn resolve_user<'a>(
		&'a self,
		cfg: &'a IdentityProviderConfig,
		token: &'a str,
	) -> BoxFuture<'a, taskmind_providers::Result<Option<String>>> {
		Box::pin(identity::resolve_user(cfg, token))
	}
}

pub(crate) fn embedding_version(cfg: &Config) -> String {
	format!(
		"{}:{}:{}",
		cfg.providers.embedding.provider_id, cfg.providers.embedding.model, cfg.storage.vector.dim
	)
}
