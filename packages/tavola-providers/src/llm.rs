use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use tavola_config::LlmProviderConfig;

use crate::{BoxFuture, Error, LlmProvider, Result};

/// Constrained completion for one venue: a short free-text summary plus at
/// most two raw category labels. Vocabulary validation happens in the
/// enrichment worker, not here.
#[derive(Debug, Clone)]
pub struct SummaryCompletion {
	pub summary: String,
	pub categories: Vec<String>,
}

pub struct HttpLlmProvider {
	cfg: LlmProviderConfig,
	client: Client,
}
impl HttpLlmProvider {
	pub fn new(cfg: LlmProviderConfig) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { cfg, client })
	}

	async fn fetch_completion(&self, prompt: &str) -> Result<SummaryCompletion> {
		let url = format!("{}{}", self.cfg.api_base, self.cfg.path);
		let body = serde_json::json!({
			"model": self.cfg.model,
			"temperature": self.cfg.temperature,
			"response_format": { "type": "json_object" },
			"messages": [
				{ "role": "user", "content": prompt }
			],
		});
		let res = self
			.client
			.post(url)
			.headers(crate::auth_headers(&self.cfg.api_key, &self.cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_completion(json)
	}
}
impl LlmProvider for HttpLlmProvider {
	fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<SummaryCompletion>> {
		Box::pin(self.fetch_completion(prompt))
	}
}

pub fn parse_completion(json: Value) -> Result<SummaryCompletion> {
	let content = json
		.get("choices")
		.and_then(Value::as_array)
		.and_then(|choices| choices.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|message| message.get("content"))
		.and_then(Value::as_str)
		.ok_or_else(|| Error::Parse {
			message: "Completion response is missing message content.".to_string(),
		})?;
	let parsed: Value = serde_json::from_str(content)
		.map_err(|_| Error::Parse { message: "Completion content is not valid JSON.".to_string() })?;
	let summary = parsed
		.get("summary")
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|summary| !summary.is_empty())
		.ok_or_else(|| Error::Parse { message: "Completion is missing a summary.".to_string() })?
		.to_string();
	let categories = parsed
		.get("categories")
		.and_then(Value::as_array)
		.map(|values| values.iter().filter_map(Value::as_str).map(ToString::to_string).collect())
		.unwrap_or_default();

	Ok(SummaryCompletion { summary, categories })
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn parses_summary_and_categories_from_choice_content() {
		let json = json!({
			"choices": [
				{
					"message": {
						"content": "{\"summary\": \"Seafood spot by the market.\", \"categories\": [\"seafood\", \"bar\"]}"
					}
				}
			]
		});
		let completion = parse_completion(json).expect("parse failed");

		assert_eq!(completion.summary, "Seafood spot by the market.");
		assert_eq!(completion.categories, vec!["seafood", "bar"]);
	}

	#[test]
	fn missing_summary_is_a_parse_error() {
		let json = json!({
			"choices": [
				{ "message": { "content": "{\"categories\": [\"cafe\"]}" } }
			]
		});

		assert!(matches!(parse_completion(json), Err(Error::Parse { .. })));
	}

	#[test]
	fn non_json_content_is_a_parse_error() {
		let json = json!({
			"choices": [
				{ "message": { "content": "a lovely place" } }
			]
		});

		assert!(matches!(parse_completion(json), Err(Error::Parse { .. })));
	}
}
