//! Scripted provider implementations for pipeline and service tests. Each
//! fake counts its calls so tests can assert on how often the external
//! boundary was crossed.

use std::sync::{
	Arc, Mutex,
	atomic::{AtomicU32, Ordering},
};

use serde_json::json;

use tavola_providers::{
	BoxFuture, EmbeddingProvider, LlmProvider, PlaceProvider,
	Result as ProviderResult,
	llm::SummaryCompletion,
	places::{NearbyPage, PageStatus, PlaceCandidate, PlaceDetails},
};

type NearbyScript =
	dyn Fn(f64, f64, f64, Option<&str>) -> ProviderResult<NearbyPage> + Send + Sync;

pub struct FakePlaces {
	nearby: Arc<NearbyScript>,
	details: Mutex<PlaceDetails>,
	pub nearby_calls: AtomicU32,
	pub details_calls: AtomicU32,
}
impl FakePlaces {
	pub fn new<F>(nearby: F) -> Self
	where
		F: Fn(f64, f64, f64, Option<&str>) -> ProviderResult<NearbyPage> + Send + Sync + 'static,
	{
		Self {
			nearby: Arc::new(nearby),
			details: Mutex::new(PlaceDetails::default()),
			nearby_calls: AtomicU32::new(0),
			details_calls: AtomicU32::new(0),
		}
	}

	/// Returns the same page for every search, regardless of location.
	pub fn fixed(results: Vec<PlaceCandidate>) -> Self {
		Self::new(move |_, _, _, _| Ok(ok_page(results.clone(), None)))
	}

	pub fn with_details(self, details: PlaceDetails) -> Self {
		*self.details.lock().unwrap_or_else(|err| err.into_inner()) = details;

		self
	}

	pub fn nearby_call_count(&self) -> u32 {
		self.nearby_calls.load(Ordering::SeqCst)
	}

	pub fn details_call_count(&self) -> u32 {
		self.details_calls.load(Ordering::SeqCst)
	}
}
impl PlaceProvider for FakePlaces {
	fn nearby_search<'a>(
		&'a self,
		lat: f64,
		lng: f64,
		radius_m: f64,
		page_token: Option<&'a str>,
	) -> BoxFuture<'a, ProviderResult<NearbyPage>> {
		self.nearby_calls.fetch_add(1, Ordering::SeqCst);

		let page = (self.nearby)(lat, lng, radius_m, page_token);

		Box::pin(async move { page })
	}

	fn place_details<'a>(
		&'a self,
		_place_id: &'a str,
		_language: &'a str,
	) -> BoxFuture<'a, ProviderResult<PlaceDetails>> {
		self.details_calls.fetch_add(1, Ordering::SeqCst);

		let details = self.details.lock().unwrap_or_else(|err| err.into_inner()).clone();

		Box::pin(async move { Ok(details) })
	}

	fn localized_name<'a>(
		&'a self,
		_place_id: &'a str,
		_language: &'a str,
	) -> BoxFuture<'a, ProviderResult<Option<String>>> {
		let name = self.details.lock().unwrap_or_else(|err| err.into_inner()).name.clone();

		Box::pin(async move { Ok(name) })
	}
}

pub struct FakeLlm {
	completion: SummaryCompletion,
	pub calls: AtomicU32,
}
impl FakeLlm {
	pub fn new(summary: &str, categories: Vec<String>) -> Self {
		Self {
			completion: SummaryCompletion { summary: summary.to_string(), categories },
			calls: AtomicU32::new(0),
		}
	}

	pub fn call_count(&self) -> u32 {
		self.calls.load(Ordering::SeqCst)
	}
}
impl LlmProvider for FakeLlm {
	fn complete<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, ProviderResult<SummaryCompletion>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let completion = self.completion.clone();

		Box::pin(async move { Ok(completion) })
	}
}

pub struct FakeEmbedding {
	dimensions: usize,
	pub calls: AtomicU32,
}
impl FakeEmbedding {
	pub fn new(dimensions: usize) -> Self {
		Self { dimensions, calls: AtomicU32::new(0) }
	}

	pub fn call_count(&self) -> u32 {
		self.calls.load(Ordering::SeqCst)
	}
}
impl EmbeddingProvider for FakeEmbedding {
	fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, ProviderResult<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let embeddings = texts.iter().map(|_| vec![0.1; self.dimensions]).collect();

		Box::pin(async move { Ok(embeddings) })
	}
}

pub fn candidate(provider_id: &str, lat: f64, lng: f64, rating: f32) -> PlaceCandidate {
	PlaceCandidate {
		provider_id: provider_id.to_string(),
		name: format!("Venue {provider_id}"),
		lat,
		lng,
		rating: Some(rating),
		review_count: Some(100),
		types: vec!["restaurant".to_string()],
		raw: json!({ "place_id": provider_id }),
	}
}

pub fn ok_page(results: Vec<PlaceCandidate>, next_page_token: Option<&str>) -> NearbyPage {
	NearbyPage {
		results,
		next_page_token: next_page_token.map(ToString::to_string),
		status: PageStatus::Ok,
		raw_status: "OK".to_string(),
	}
}

pub fn empty_page() -> NearbyPage {
	NearbyPage {
		results: Vec::new(),
		next_page_token: None,
		status: PageStatus::ZeroResults,
		raw_status: "ZERO_RESULTS".to_string(),
	}
}
