mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Chat, Config, EmbeddingProviderConfig, IdentityProviderConfig, LlmProviderConfig, Postgres,
	Providers, Security, Service, Storage, Sync, Vector,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.vector.dim > 2_000 {
		return Err(Error::Validation {
			message: "storage.vector.dim must be at most 2000 to stay indexable.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.vector.dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.vector.dim.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("chat", &cfg.providers.chat.api_key),
		("date_parser", &cfg.providers.date_parser.api_key),
	] {
		if key.is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}
	for (label, llm) in [("chat", &cfg.providers.chat), ("date_parser", &cfg.providers.date_parser)]
	{
		if !llm.temperature.is_finite() || !(0.0..=2.0).contains(&llm.temperature) {
			return Err(Error::Validation {
				message: format!("providers.{label}.temperature must be in the range 0.0-2.0."),
			});
		}
		if llm.max_tokens == 0 {
			return Err(Error::Validation {
				message: format!("providers.{label}.max_tokens must be greater than zero."),
			});
		}
	}

	if cfg.providers.identity.api_base.is_empty() {
		return Err(Error::Validation {
			message: "providers.identity.api_base must be non-empty.".to_string(),
		});
	}
	if !(1..=50).contains(&cfg.chat.history_turns) {
		return Err(Error::Validation {
			message: "chat.history_turns must be in the range 1-50.".to_string(),
		});
	}
	if cfg.chat.match_count == 0 {
		return Err(Error::Validation {
			message: "chat.match_count must be greater than zero.".to_string(),
		});
	}
	if cfg.chat.context_update_limit == 0 || cfg.chat.context_update_limit > cfg.chat.match_count
	{
		return Err(Error::Validation {
			message: "chat.context_update_limit must be between 1 and chat.match_count."
				.to_string(),
		});
	}
	if !(1..=50).contains(&cfg.chat.query_history_cap) {
		return Err(Error::Validation {
			message: "chat.query_history_cap must be in the range 1-50.".to_string(),
		});
	}
	if cfg.chat.no_index_reply.is_empty() || cfg.chat.failure_reply.is_empty() {
		return Err(Error::Validation {
			message: "chat.no_index_reply and chat.failure_reply must be non-empty.".to_string(),
		});
	}
	if cfg.sync.batch_size == 0 {
		return Err(Error::Validation {
			message: "sync.batch_size must be greater than zero.".to_string(),
		});
	}
	if cfg.sync.poll_interval_ms == 0 {
		return Err(Error::Validation {
			message: "sync.poll_interval_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.sync.max_users_per_tick == 0 {
		return Err(Error::Validation {
			message: "sync.max_users_per_tick must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for value in [
		&mut cfg.service.http_bind,
		&mut cfg.storage.postgres.dsn,
		&mut cfg.providers.embedding.api_key,
		&mut cfg.providers.chat.api_key,
		&mut cfg.providers.date_parser.api_key,
		&mut cfg.providers.identity.api_base,
		&mut cfg.chat.no_index_reply,
		&mut cfg.chat.failure_reply,
	] {
		let trimmed = value.trim();

		if trimmed.len() != value.len() {
			*value = trimmed.to_string();
		}
	}

	for api_base in [
		&mut cfg.providers.embedding.api_base,
		&mut cfg.providers.chat.api_base,
		&mut cfg.providers.date_parser.api_base,
		&mut cfg.providers.identity.api_base,
	] {
		while api_base.ends_with('/') {
			api_base.pop();
		}
	}
}
