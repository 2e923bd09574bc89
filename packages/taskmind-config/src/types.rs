use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub security: Security,
	pub storage: Storage,
	pub providers: Providers,
	pub chat: Chat,
	pub sync: Sync,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub vector: Vector,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Vector {
	pub dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub chat: LlmProviderConfig,
	pub date_parser: LlmProviderConfig,
	pub identity: IdentityProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// The BaaS endpoint that turns a caller's bearer token into a user record.
#[derive(Debug, Deserialize)]
pub struct IdentityProviderConfig {
	pub api_base: String,
	pub path: String,
	pub timeout_ms: u64,
	/// Sent with every lookup, e.g. the project's public `apikey`.
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
	/// Prior turns replayed to the completion model.
	#[serde(default = "default_history_turns")]
	pub history_turns: u32,
	#[serde(default = "default_match_count")]
	pub match_count: u32,
	/// Ranked todos whose context payload is rewritten per turn.
	#[serde(default = "default_context_update_limit")]
	pub context_update_limit: u32,
	#[serde(default = "default_query_history_cap")]
	pub query_history_cap: u32,
	#[serde(default = "default_co_match_cap")]
	pub co_match_cap: u32,
	#[serde(default = "default_no_index_reply")]
	pub no_index_reply: String,
	#[serde(default = "default_failure_reply")]
	pub failure_reply: String,
}
impl Default for Chat {
	fn default() -> Self {
		Self {
			history_turns: default_history_turns(),
			match_count: default_match_count(),
			context_update_limit: default_context_update_limit(),
			query_history_cap: default_query_history_cap(),
			co_match_cap: default_co_match_cap(),
			no_index_reply: default_no_index_reply(),
			failure_reply: default_failure_reply(),
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Sync {
	pub batch_size: u32,
	pub poll_interval_ms: u64,
	pub max_users_per_tick: u32,
}

fn default_history_turns() -> u32 {
	5
}

fn default_match_count() -> u32 {
	100
}

fn default_context_update_limit() -> u32 {
	10
}

fn default_query_history_cap() -> u32 {
	10
}

fn default_co_match_cap() -> u32 {
	5
}

fn default_no_index_reply() -> String {
	"No indexed todos found. Your todos need embeddings to be searchable. Run the embedding sync or wait a moment and try again.".to_string()
}

fn default_failure_reply() -> String {
	"Something went wrong.".to_string()
}
