use std::{collections::HashSet, time::Duration};

use tokio::time;

use tavola_config::{Ingestion, PlacesProviderConfig};
use tavola_domain::{
	geo,
	grid::ScanArea,
};
use tavola_providers::{PlaceProvider, places::PlaceCandidate};

use crate::{Result, scanner};

/// Dedup context threaded through a whole populate run: a place found by one
/// area (or one quadrant) is never yielded again by another.
#[derive(Debug, Default)]
pub struct GatherContext {
	pub seen: HashSet<String>,
	pub scans: u32,
}

/// Saturated areas are split into four half-radius quadrants, depth-first,
/// until a scan comes back unsaturated, the depth cap is reached, or the
/// radius floor is hit. An explicit worklist keeps the scan count bounded
/// and observable: every level scans, including the root, so one top-level
/// area performs at most `(4^(max_depth + 1) - 1) / 3` scans.
pub async fn gather(
	provider: &dyn PlaceProvider,
	places_cfg: &PlacesProviderConfig,
	ingestion: &Ingestion,
	area: &ScanArea,
	ctx: &mut GatherContext,
) -> Result<Vec<PlaceCandidate>> {
	let mut found = Vec::new();
	let mut worklist = vec![(area.lat, area.lng, area.radius_m, 0_u32)];

	while let Some((lat, lng, radius_m, depth)) = worklist.pop() {
		// Each quadrant scan is preceded by the configured delay; the root
		// scan is not.
		if depth > 0 {
			time::sleep(Duration::from_millis(ingestion.quadrant_delay_ms)).await;
		}

		let outcome = scanner::scan(provider, places_cfg, lat, lng, radius_m).await?;

		ctx.scans += 1;

		for candidate in outcome.candidates {
			if ctx.seen.insert(candidate.provider_id.clone()) {
				found.push(candidate);
			}
		}

		if !outcome.hit_limit {
			continue;
		}

		if depth >= ingestion.max_depth {
			tracing::warn!(
				area = %area.name,
				lat,
				lng,
				radius_m,
				"Area still saturated at the depth cap. May be missing restaurants.",
			);

			continue;
		}

		let half = radius_m / 2.0;

		if half <= ingestion.min_radius_m {
			continue;
		}

		let d_lat = geo::meters_to_lat_deg(half);
		let d_lng = geo::meters_to_lng_deg(half, lat);

		for (q_lat, q_lng) in [
			(lat + d_lat, lng - d_lng),
			(lat + d_lat, lng + d_lng),
			(lat - d_lat, lng - d_lng),
			(lat - d_lat, lng + d_lng),
		] {
			worklist.push((q_lat, q_lng, half, depth + 1));
		}
	}

	Ok(found)
}
