mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Chat, Config, EmbeddingProviderConfig, Ingest, LlmProviderConfig, Providers, Qdrant, Retrieval,
	Service, Storage,
};

use std::{fs, path::Path};

/// Upper bound the embedding endpoint accepts per request.
pub const MAX_EMBED_BATCH: u32 = 64;

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
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if !cfg.providers.llm.temperature.is_finite() || cfg.providers.llm.temperature < 0.0 {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be a finite number, zero or greater."
				.to_string(),
		});
	}

	for (label, key) in
		[("embedding", &cfg.providers.embedding.api_key), ("llm", &cfg.providers.llm.api_key)]
	{
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}
	for (label, timeout_ms) in [
		("embedding", cfg.providers.embedding.timeout_ms),
		("llm", cfg.providers.llm.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
	}

	if cfg.retrieval.anchor_query.trim().is_empty() {
		return Err(Error::Validation {
			message: "retrieval.anchor_query must be non-empty.".to_string(),
		});
	}
	if cfg.retrieval.filtered_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.filtered_k must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.fallback_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.fallback_k must be greater than zero.".to_string(),
		});
	}
	if cfg.chat.termination_tokens.is_empty() {
		return Err(Error::Validation {
			message: "chat.termination_tokens must be non-empty.".to_string(),
		});
	}
	if cfg.chat.termination_message.trim().is_empty() {
		return Err(Error::Validation {
			message: "chat.termination_message must be non-empty.".to_string(),
		});
	}
	if !(1..=MAX_EMBED_BATCH).contains(&cfg.ingest.batch_size) {
		return Err(Error::Validation {
			message: format!("ingest.batch_size must be in the range 1-{MAX_EMBED_BATCH}."),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.chat.termination_tokens = cfg
		.chat
		.termination_tokens
		.iter()
		.map(|token| token.trim().to_lowercase())
		.filter(|token| !token.is_empty())
		.collect();
	cfg.retrieval.anchor_query = cfg.retrieval.anchor_query.trim().to_string();
}
