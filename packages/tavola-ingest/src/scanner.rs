use std::time::Duration;

use tokio::time;

use tavola_config::PlacesProviderConfig;
use tavola_providers::{
	PlaceProvider,
	places::{PageStatus, PlaceCandidate},
};

use crate::Result;

const TOKEN_RETRIES: u32 = 3;

#[derive(Debug, Default)]
pub struct ScanOutcome {
	pub candidates: Vec<PlaceCandidate>,
	/// The provider's hard per-query cap was reached; the area is saturated
	/// and the caller should subdivide.
	pub hit_limit: bool,
}

/// One nearby-search query, following the page-token chain up to the
/// provider's page cap. A freshly issued token is not active immediately, so
/// each follow-up page waits the activation delay and treats INVALID_REQUEST
/// as "token not ready yet" for a few short retries.
pub async fn scan(
	provider: &dyn PlaceProvider,
	cfg: &PlacesProviderConfig,
	lat: f64,
	lng: f64,
	radius_m: f64,
) -> Result<ScanOutcome> {
	let mut outcome = ScanOutcome::default();
	let mut page_token: Option<String> = None;

	for page_index in 0..cfg.page_cap {
		if page_index > 0 {
			time::sleep(Duration::from_millis(cfg.page_token_delay_ms)).await;
		}

		let mut page =
			provider.nearby_search(lat, lng, radius_m, page_token.as_deref()).await?;

		if page_token.is_some() && page.status == PageStatus::InvalidRequest {
			for _ in 0..TOKEN_RETRIES {
				time::sleep(Duration::from_millis(cfg.token_retry_delay_ms)).await;

				page = provider.nearby_search(lat, lng, radius_m, page_token.as_deref()).await?;

				if page.status != PageStatus::InvalidRequest {
					break;
				}
			}
		}

		match page.status {
			PageStatus::Ok => {},
			PageStatus::ZeroResults => break,
			PageStatus::InvalidRequest | PageStatus::Other => {
				tracing::warn!(
					status = %page.raw_status,
					lat,
					lng,
					radius_m,
					"Nearby search returned a non-OK status. Dropping this area.",
				);

				return Ok(ScanOutcome::default());
			},
		}

		outcome.candidates.extend(page.results);

		match page.next_page_token {
			Some(token) => page_token = Some(token),
			None => break,
		}
	}

	outcome.hit_limit = outcome.candidates.len() >= cfg.result_cap;

	Ok(outcome)
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::Ordering;

	use tavola_testkit::fakes::{self, FakePlaces};

	use super::*;

	fn cfg() -> PlacesProviderConfig {
		PlacesProviderConfig {
			api_base: "http://localhost".to_string(),
			api_key: "k".to_string(),
			language: "en".to_string(),
			secondary_language: "he".to_string(),
			place_type: "restaurant".to_string(),
			timeout_ms: 1_000,
			page_cap: 3,
			result_cap: 60,
			page_token_delay_ms: 0,
			token_retry_delay_ms: 0,
		}
	}

	fn page_of(count: usize, offset: usize, token: Option<&str>) -> tavola_providers::places::NearbyPage {
		let results = (0..count)
			.map(|i| fakes::candidate(&format!("p{}", offset + i), 32.05, 34.76, 4.2))
			.collect();

		fakes::ok_page(results, token)
	}

	#[tokio::test]
	async fn follows_the_token_chain_up_to_the_page_cap() {
		let places = FakePlaces::new(|_, _, _, token| {
			Ok(match token {
				None => page_of(20, 0, Some("t1")),
				Some("t1") => page_of(20, 20, Some("t2")),
				// A token past the cap must never be followed.
				Some("t2") => page_of(20, 40, Some("t3")),
				Some(other) => panic!("unexpected token {other}"),
			})
		});
		let outcome = scan(&places, &cfg(), 32.05, 34.76, 1_500.0).await.expect("scan failed");

		assert_eq!(outcome.candidates.len(), 60);
		assert!(outcome.hit_limit);
		assert_eq!(places.nearby_call_count(), 3);
	}

	#[tokio::test]
	async fn fifty_nine_results_do_not_count_as_saturated() {
		let places = FakePlaces::new(|_, _, _, token| {
			Ok(match token {
				None => page_of(20, 0, Some("t1")),
				Some("t1") => page_of(20, 20, Some("t2")),
				Some("t2") => page_of(19, 40, None),
				Some(other) => panic!("unexpected token {other}"),
			})
		});
		let outcome = scan(&places, &cfg(), 32.05, 34.76, 1_500.0).await.expect("scan failed");

		assert_eq!(outcome.candidates.len(), 59);
		assert!(!outcome.hit_limit);
	}

	#[tokio::test]
	async fn retries_a_not_yet_active_token() {
		let places = FakePlaces::new(|_, _, _, token| {
			Ok(match token {
				None => page_of(20, 0, Some("t1")),
				Some("t1") => tavola_providers::places::NearbyPage {
					results: Vec::new(),
					next_page_token: None,
					status: PageStatus::InvalidRequest,
					raw_status: "INVALID_REQUEST".to_string(),
				},
				Some(other) => panic!("unexpected token {other}"),
			})
		});
		let outcome = scan(&places, &cfg(), 32.05, 34.76, 1_500.0).await.expect("scan failed");

		// First page succeeded; the stuck token exhausts its retries and the
		// area is dropped rather than aborting the run.
		assert!(outcome.candidates.is_empty());
		assert!(!outcome.hit_limit);
		assert_eq!(places.nearby_calls.load(Ordering::SeqCst), 1 + 1 + TOKEN_RETRIES);
	}

	#[tokio::test]
	async fn zero_results_is_a_normal_empty_scan() {
		let places = FakePlaces::new(|_, _, _, _| Ok(fakes::empty_page()));
		let outcome = scan(&places, &cfg(), 32.05, 34.76, 1_500.0).await.expect("scan failed");

		assert!(outcome.candidates.is_empty());
		assert!(!outcome.hit_limit);
		assert_eq!(places.nearby_call_count(), 1);
	}
}
