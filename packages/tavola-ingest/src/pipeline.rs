use std::time::Duration;

use futures::future;
use serde::Serialize;
use tokio::time;

use tavola_config::Config;
use tavola_domain::grid;
use tavola_providers::ProviderSet;
use tavola_storage::{db::Db, venues};

use crate::{
	Result,
	enrich::{Enricher, Outcome},
	subdivide::{self, GatherContext},
};

/// Per-request overrides of the configured ingestion defaults.
#[derive(Debug, Clone, Default)]
pub struct PopulateOptions {
	pub force_update: bool,
	pub batch_size: Option<usize>,
	pub delay_between_batches_ms: Option<u64>,
	pub delay_between_areas_ms: Option<u64>,
	pub radius_m: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PopulateStats {
	pub areas_scanned: u32,
	pub found: u64,
	pub processed: u64,
	pub added: u64,
	pub skipped: u64,
	pub filtered: u64,
	pub errors: u64,
}

/// Full populate run: scan every configured area, enrich the deduplicated
/// candidates in fixed-size parallel batches, and upsert the survivors.
/// Per-candidate failures are tallied, never fatal; partial progress is
/// already durable when an area fails.
pub async fn run(
	cfg: &Config,
	db: &Db,
	providers: &ProviderSet,
	options: &PopulateOptions,
) -> Result<PopulateStats> {
	let batch_size = options.batch_size.unwrap_or(cfg.ingestion.batch_size).max(1);
	let batch_delay = Duration::from_millis(
		options.delay_between_batches_ms.unwrap_or(cfg.ingestion.delay_between_batches_ms),
	);
	let area_delay = Duration::from_millis(
		options.delay_between_areas_ms.unwrap_or(cfg.ingestion.delay_between_areas_ms),
	);
	let mut areas = grid::region_scan_areas(&cfg.region);

	if let Some(radius_m) = options.radius_m {
		for area in &mut areas {
			area.radius_m = radius_m;
		}
	}

	tracing::info!(
		region = %cfg.region.name,
		areas = areas.len(),
		force_update = options.force_update,
		"Populate run starting.",
	);

	let enricher = Enricher::new(cfg, providers);
	let mut ctx = GatherContext::default();
	let mut stats = PopulateStats::default();

	for (index, area) in areas.iter().enumerate() {
		let candidates = match subdivide::gather(
			providers.places.as_ref(),
			&cfg.providers.places,
			&cfg.ingestion,
			area,
			&mut ctx,
		)
		.await
		{
			Ok(candidates) => candidates,
			Err(err) => {
				tracing::warn!(error = %err, area = %area.name, "Area scan failed. Skipping it.");

				stats.errors += 1;

				continue;
			},
		};

		stats.areas_scanned += 1;
		stats.found += candidates.len() as u64;

		for batch in candidates.chunks(batch_size) {
			let outcomes = future::join_all(batch.iter().map(|candidate| async {
				process(db, &enricher, candidate, options.force_update).await
			}))
			.await;

			for outcome in outcomes {
				stats.processed += 1;

				match outcome {
					Tally::Added => stats.added += 1,
					Tally::Skipped => stats.skipped += 1,
					Tally::Filtered => stats.filtered += 1,
					Tally::Error => stats.errors += 1,
				}
			}

			time::sleep(batch_delay).await;
		}

		if index + 1 < areas.len() {
			time::sleep(area_delay).await;
		}
	}

	tracing::info!(
		areas_scanned = stats.areas_scanned,
		found = stats.found,
		added = stats.added,
		skipped = stats.skipped,
		filtered = stats.filtered,
		errors = stats.errors,
		"Populate run finished.",
	);

	Ok(stats)
}

enum Tally {
	Added,
	Skipped,
	Filtered,
	Error,
}

async fn process(
	db: &Db,
	enricher: &Enricher<'_>,
	candidate: &tavola_providers::places::PlaceCandidate,
	force: bool,
) -> Tally {
	let existing_updated_at = match venues::venue_last_updated(db, &candidate.provider_id).await {
		Ok(updated_at) => updated_at,
		Err(err) => {
			tracing::warn!(
				error = %err,
				provider_id = %candidate.provider_id,
				"Freshness lookup failed.",
			);

			return Tally::Error;
		},
	};

	match enricher.enrich(candidate, existing_updated_at, force).await {
		Outcome::Added(venue) => match venues::upsert_venue(db, &venue).await {
			Ok(()) => Tally::Added,
			Err(err) => {
				tracing::warn!(
					error = %err,
					provider_id = %candidate.provider_id,
					"Venue upsert failed.",
				);

				Tally::Error
			},
		},
		Outcome::Skipped => Tally::Skipped,
		Outcome::Filtered => Tally::Filtered,
		Outcome::Failed(err) => {
			tracing::warn!(
				error = %err,
				provider_id = %candidate.provider_id,
				"Enrichment failed.",
			);

			Tally::Error
		},
	}
}
