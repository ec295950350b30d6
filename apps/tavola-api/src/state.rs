use std::sync::Arc;

use tavola_providers::{
	ProviderSet, embedding::HttpEmbeddingProvider, llm::HttpLlmProvider,
	places::HttpPlaceProvider,
};
use tavola_service::TavolaService;
use tavola_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<TavolaService>,
}
impl AppState {
	pub async fn new(config: tavola_config::Config) -> color_eyre::Result<Self> {
		let providers = ProviderSet {
			places: Arc::new(HttpPlaceProvider::new(config.providers.places.clone())?),
			llm: Arc::new(HttpLlmProvider::new(config.providers.llm.clone())?),
			embedding: Arc::new(HttpEmbeddingProvider::new(config.providers.embedding.clone())?),
		};

		Self::with_providers(config, providers).await
	}

	/// Used by tests to swap the HTTP providers for scripted fakes.
	pub async fn with_providers(
		config: tavola_config::Config,
		providers: ProviderSet,
	) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = TavolaService::new(config, db, providers);

		Ok(Self { service: Arc::new(service) })
	}
}
