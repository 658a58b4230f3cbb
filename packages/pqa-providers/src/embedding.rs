use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
	data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
	#[serde(default)]
	index: Option<usize>,
	embedding: Vec<f32>,
}

/// One vector per input text, in input order.
pub async fn embed(
	cfg: &pqa_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	if texts.is_empty() {
		return Ok(Vec::new());
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let response: EmbeddingResponse = client
		.post(format!("{}{}", cfg.api_base, cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?
		.error_for_status()?
		.json()
		.await?;

	order_vectors(response, texts.len(), cfg.dimensions as usize)
}

/// Items carry an optional `index`; position in `data` is used when it is absent.
fn order_vectors(
	response: EmbeddingResponse,
	expected: usize,
	dimensions: usize,
) -> Result<Vec<Vec<f32>>> {
	if response.data.len() != expected {
		return Err(Error::InvalidResponse {
			message: format!(
				"Embedding response has {} vectors for {expected} inputs.",
				response.data.len()
			),
		});
	}

	let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];

	for (position, item) in response.data.into_iter().enumerate() {
		let index = item.index.unwrap_or(position);

		if item.embedding.len() != dimensions {
			return Err(Error::InvalidResponse {
				message: format!(
					"Embedding {index} has {} dimensions, expected {dimensions}.",
					item.embedding.len()
				),
			});
		}

		let Some(slot) = slots.get_mut(index).filter(|slot| slot.is_none()) else {
			return Err(Error::InvalidResponse {
				message: format!("Embedding index {index} is out of range or repeated."),
			});
		};

		*slot = Some(item.embedding);
	}

	Ok(slots.into_iter().flatten().collect())
}
