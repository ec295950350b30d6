pub mod embedding;
pub mod llm;
pub mod places;
pub mod retry;

mod error;

pub use error::{Error, Result};

use std::{future::Future, pin::Pin, sync::Arc};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

use crate::{
	llm::SummaryCompletion,
	places::{NearbyPage, PlaceDetails},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Place-search provider seam. The ingestion pipeline and the tests both go
/// through this trait; the HTTP-backed implementation lives in [`places`].
pub trait PlaceProvider
where
	Self: Send + Sync,
{
	fn nearby_search<'a>(
		&'a self,
		lat: f64,
		lng: f64,
		radius_m: f64,
		page_token: Option<&'a str>,
	) -> BoxFuture<'a, Result<NearbyPage>>;

	fn place_details<'a>(
		&'a self,
		place_id: &'a str,
		language: &'a str,
	) -> BoxFuture<'a, Result<PlaceDetails>>;

	fn localized_name<'a>(
		&'a self,
		place_id: &'a str,
		language: &'a str,
	) -> BoxFuture<'a, Result<Option<String>>>;
}

pub trait LlmProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<SummaryCompletion>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

/// The three external collaborators, bundled for handing to the pipeline and
/// the service layer.
#[derive(Clone)]
pub struct ProviderSet {
	pub places: Arc<dyn PlaceProvider>,
	pub llm: Arc<dyn LlmProvider>,
	pub embedding: Arc<dyn EmbeddingProvider>,
}

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	let bearer = format!("Bearer {api_key}")
		.parse()
		.map_err(|_| Error::Header { message: "Invalid API key.".to_string() })?;

	headers.insert(AUTHORIZATION, bearer);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::Header {
				message: "Default header values must be strings.".to_string(),
			});
		};
		let name = HeaderName::from_bytes(key.as_bytes())
			.map_err(|err| Error::Header { message: err.to_string() })?;
		let value =
			raw.parse().map_err(|_| Error::Header { message: format!("Invalid value for {key}.") })?;

		headers.insert(name, value);
	}

	Ok(headers)
}
