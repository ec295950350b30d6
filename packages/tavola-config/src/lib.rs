mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Bounds, Cache, Config, DenseArea, EmbeddingProviderConfig, Feed, Ingestion, Landmark,
	LlmProviderConfig, Matching, PlacesProviderConfig, Postgres, Providers, Region, ScoreFallback,
	Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
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
	if cfg.providers.embedding.max_input_chars == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.max_input_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.places.page_cap == 0 {
		return Err(Error::Validation {
			message: "providers.places.page_cap must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.places.result_cap == 0 {
		return Err(Error::Validation {
			message: "providers.places.result_cap must be greater than zero.".to_string(),
		});
	}

	for (label, key) in [
		("places", &cfg.providers.places.api_key),
		("llm", &cfg.providers.llm.api_key),
		("embedding", &cfg.providers.embedding.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	validate_bounds(&cfg.region.bounds, "region.bounds")?;

	for dense in &cfg.region.dense_areas {
		validate_bounds(&dense.bounds, "region.dense_areas.bounds")?;

		if dense.step_deg <= 0.0 {
			return Err(Error::Validation {
				message: "region.dense_areas.step_deg must be greater than zero.".to_string(),
			});
		}
	}

	if cfg.region.canonical_names.is_empty() {
		return Err(Error::Validation {
			message: "region.canonical_names must be non-empty.".to_string(),
		});
	}
	if cfg.region.grid_step_deg <= 0.0 {
		return Err(Error::Validation {
			message: "region.grid_step_deg must be greater than zero.".to_string(),
		});
	}
	if cfg.region.default_radius_m <= 0.0 {
		return Err(Error::Validation {
			message: "region.default_radius_m must be greater than zero.".to_string(),
		});
	}
	if !matches!(
		cfg.region.membership_policy.as_str(),
		"coords_or_name" | "coords_and_name" | "coords_over_name"
	) {
		return Err(Error::Validation {
			message: "region.membership_policy must be one of coords_or_name, coords_and_name, or coords_over_name."
				.to_string(),
		});
	}

	if cfg.ingestion.freshness_days <= 0 {
		return Err(Error::Validation {
			message: "ingestion.freshness_days must be greater than zero.".to_string(),
		});
	}
	if cfg.ingestion.batch_size == 0 {
		return Err(Error::Validation {
			message: "ingestion.batch_size must be greater than zero.".to_string(),
		});
	}
	if cfg.ingestion.min_radius_m <= 0.0 {
		return Err(Error::Validation {
			message: "ingestion.min_radius_m must be greater than zero.".to_string(),
		});
	}
	if cfg.ingestion.max_retries == 0 {
		return Err(Error::Validation {
			message: "ingestion.max_retries must be greater than zero.".to_string(),
		});
	}

	let weights = [
		("matching.embedding_weight", cfg.matching.embedding_weight),
		("matching.rating_weight", cfg.matching.rating_weight),
		("matching.prior_weight", cfg.matching.prior_weight),
		("matching.prior", cfg.matching.prior),
	];

	for (label, weight) in weights {
		if !weight.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if !(0.0..=1.0).contains(&weight) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	let weight_sum = cfg.matching.embedding_weight
		+ cfg.matching.rating_weight
		+ cfg.matching.prior_weight;

	if (weight_sum - 1.0).abs() > 1e-3 {
		return Err(Error::Validation {
			message: "matching weights must sum to 1.0.".to_string(),
		});
	}

	if !matches!(cfg.matching.fallback.strategy.as_str(), "fixed" | "random_range") {
		return Err(Error::Validation {
			message: "matching.fallback.strategy must be one of fixed or random_range.".to_string(),
		});
	}
	if !(50..=100).contains(&cfg.matching.fallback.value) {
		return Err(Error::Validation {
			message: "matching.fallback.value must be in the range 50-100.".to_string(),
		});
	}
	if cfg.matching.fallback.min > cfg.matching.fallback.max {
		return Err(Error::Validation {
			message: "matching.fallback.min must not exceed matching.fallback.max.".to_string(),
		});
	}
	if !(50..=100).contains(&cfg.matching.fallback.min)
		|| !(50..=100).contains(&cfg.matching.fallback.max)
	{
		return Err(Error::Validation {
			message: "matching.fallback.min and max must be in the range 50-100.".to_string(),
		});
	}

	for (label, ttl) in [
		("cache.feed_ttl_seconds", cfg.cache.feed_ttl_seconds),
		("cache.search_ttl_seconds", cfg.cache.search_ttl_seconds),
		("cache.status_ttl_seconds", cfg.cache.status_ttl_seconds),
	] {
		if ttl <= 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if cfg.cache.coord_decimals > 6 {
		return Err(Error::Validation {
			message: "cache.coord_decimals must be 6 or less.".to_string(),
		});
	}

	if cfg.feed.default_limit == 0 {
		return Err(Error::Validation {
			message: "feed.default_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.feed.max_limit < cfg.feed.default_limit {
		return Err(Error::Validation {
			message: "feed.max_limit must be at least feed.default_limit.".to_string(),
		});
	}
	if cfg.feed.default_radius_m <= 0.0 {
		return Err(Error::Validation {
			message: "feed.default_radius_m must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_bounds(bounds: &Bounds, label: &str) -> Result<()> {
	if bounds.min_lat >= bounds.max_lat {
		return Err(Error::Validation {
			message: format!("{label}.min_lat must be less than {label}.max_lat."),
		});
	}
	if bounds.min_lng >= bounds.max_lng {
		return Err(Error::Validation {
			message: format!("{label}.min_lng must be less than {label}.max_lng."),
		});
	}

	Ok(())
}
