use tavola_config::Bounds;

const EARTH_RADIUS_M: f64 = 6_371_000.0;
/// Meters per degree of latitude, and per degree of longitude at the equator.
const METERS_PER_DEGREE: f64 = 111_320.0;

pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
	let d_lat = (lat2 - lat1).to_radians();
	let d_lng = (lng2 - lng1).to_radians();
	let a = (d_lat / 2.0).sin().powi(2)
		+ lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
	let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

	EARTH_RADIUS_M * c
}

pub fn meters_to_lat_deg(meters: f64) -> f64 {
	meters / METERS_PER_DEGREE
}

/// Longitude degrees shrink with latitude; scale by the local parallel.
pub fn meters_to_lng_deg(meters: f64, at_lat: f64) -> f64 {
	meters / (METERS_PER_DEGREE * at_lat.to_radians().cos())
}

pub fn contains(bounds: &Bounds, lat: f64, lng: f64) -> bool {
	lat >= bounds.min_lat && lat <= bounds.max_lat && lng >= bounds.min_lng && lng <= bounds.max_lng
}

#[cfg(test)]
mod tests {
	use super::*;

	// Reference distances computed with a standalone haversine implementation
	// (R = 6371 km).
	#[test]
	fn haversine_matches_reference_pairs() {
		// Tel Aviv center to Old Jaffa.
		let tlv_jaffa = haversine_m(32.0809, 34.7806, 32.0554, 34.7522);

		assert!((tlv_jaffa - 3_898.0).abs() < 20.0, "got {tlv_jaffa}");

		// Paris to London.
		let paris_london = haversine_m(48.8566, 2.3522, 51.5074, -0.1278);

		assert!((paris_london - 343_556.0).abs() < 500.0, "got {paris_london}");
	}

	#[test]
	fn haversine_is_zero_for_identical_points() {
		assert_eq!(haversine_m(32.08, 34.78, 32.08, 34.78), 0.0);
	}

	#[test]
	fn longitude_degrees_scale_with_latitude() {
		let at_equator = meters_to_lng_deg(1_000.0, 0.0);
		let at_mid = meters_to_lng_deg(1_000.0, 60.0);

		assert!(at_mid > at_equator * 1.9 && at_mid < at_equator * 2.1);
	}

	#[test]
	fn bounds_containment_is_inclusive() {
		let bounds = Bounds { min_lat: 32.0, min_lng: 34.7, max_lat: 32.2, max_lng: 34.9 };

		assert!(contains(&bounds, 32.0, 34.7));
		assert!(contains(&bounds, 32.1, 34.8));
		assert!(!contains(&bounds, 31.99, 34.8));
		assert!(!contains(&bounds, 32.1, 34.91));
	}
}
