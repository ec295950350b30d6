pub mod cache;
pub mod feed;
pub mod populate;
pub mod scoring;
pub mod search;
pub mod venue;

mod error;

pub use error::{Error, Result};

use std::sync::atomic::AtomicBool;

use tavola_config::Config;
use tavola_providers::ProviderSet;
use tavola_storage::db::Db;

/// Shared state behind the HTTP surface: configuration, the connection pool,
/// the provider set, the response cache, and the populate-run guard.
pub struct TavolaService {
	pub cfg: Config,
	pub db: Db,
	pub providers: ProviderSet,
	pub(crate) cache: cache::ResponseCache,
	pub(crate) populate_running: AtomicBool,
}
impl TavolaService {
	pub fn new(cfg: Config, db: Db, providers: ProviderSet) -> Self {
		Self {
			cfg,
			db,
			providers,
			cache: cache::ResponseCache::default(),
			populate_running: AtomicBool::new(false),
		}
	}
}
