use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use tavola_config::EmbeddingProviderConfig;

use crate::{BoxFuture, EmbeddingProvider, Error, Result};

pub struct HttpEmbeddingProvider {
	cfg: EmbeddingProviderConfig,
	client: Client,
}
impl HttpEmbeddingProvider {
	pub fn new(cfg: EmbeddingProviderConfig) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { cfg, client })
	}

	async fn fetch_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		let url = format!("{}{}", self.cfg.api_base, self.cfg.path);
		let body = serde_json::json!({
			"model": self.cfg.model,
			"input": texts,
			"dimensions": self.cfg.dimensions,
		});
		let res = self
			.client
			.post(url)
			.headers(crate::auth_headers(&self.cfg.api_key, &self.cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;
		let vectors = parse_embedding_response(json)?;

		for vector in &vectors {
			if vector.len() != self.cfg.dimensions as usize {
				return Err(Error::Parse {
					message: format!(
						"Embedding dimension {} does not match configured {}.",
						vector.len(),
						self.cfg.dimensions
					),
				});
			}
		}

		Ok(vectors)
	}
}
impl EmbeddingProvider for HttpEmbeddingProvider {
	fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(self.fetch_embeddings(texts))
	}
}

/// Items come back with an index field; order by it rather than trusting the
/// wire order.
pub fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json.get("data").and_then(Value::as_array).ok_or_else(|| Error::Parse {
		message: "Embedding response is missing data array.".to_string(),
	})?;
	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(Value::as_u64)
			.map(|index| index as usize)
			.unwrap_or(fallback_index);
		let embedding = item.get("embedding").and_then(Value::as_array).ok_or_else(|| {
			Error::Parse { message: "Embedding item is missing embedding array.".to_string() }
		})?;
		let mut vector = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number = value.as_f64().ok_or_else(|| Error::Parse {
				message: "Embedding value must be numeric.".to_string(),
			})?;

			vector.push(number as f32);
		}

		indexed.push((index, vector));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vector)| vector).collect())
}
