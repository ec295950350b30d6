use tavola_config::{Bounds, Region};

/// One scan center for the ingestion run. Ephemeral, generated per run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanArea {
	pub name: String,
	pub lat: f64,
	pub lng: f64,
	pub radius_m: f64,
}

/// Row-major grid over a bounding box. Pure function of its inputs, so a
/// restarted run regenerates the identical sequence.
pub fn grid(bounds: &Bounds, step_deg: f64, prefix: &str, radius_m: f64) -> Vec<ScanArea> {
	let mut areas = Vec::new();
	let mut row = 0_u32;
	let mut lat = bounds.min_lat;

	while lat <= bounds.max_lat {
		let mut col = 0_u32;
		let mut lng = bounds.min_lng;

		while lng <= bounds.max_lng {
			areas.push(ScanArea {
				name: format!("{prefix}-{row}-{col}"),
				lat,
				lng,
				radius_m,
			});

			col += 1;
			lng = bounds.min_lng + f64::from(col) * step_deg;
		}

		row += 1;
		lat = bounds.min_lat + f64::from(row) * step_deg;
	}

	areas
}

/// Full scan plan for a configured region: each dense sub-region is gridded at
/// its own (smaller) step; the remaining territory is covered by the named
/// landmark list when one is configured, otherwise by the coarse base grid.
pub fn region_scan_areas(region: &Region) -> Vec<ScanArea> {
	let radius = region.default_radius_m;
	let mut areas = Vec::new();

	for dense in &region.dense_areas {
		areas.extend(grid(&dense.bounds, dense.step_deg, &dense.name, radius));
	}

	if region.landmarks.is_empty() {
		areas.extend(grid(&region.bounds, region.grid_step_deg, &region.name, radius));
	} else {
		for landmark in &region.landmarks {
			areas.push(ScanArea {
				name: landmark.name.clone(),
				lat: landmark.lat,
				lng: landmark.lng,
				radius_m: radius,
			});
		}
	}

	areas
}
