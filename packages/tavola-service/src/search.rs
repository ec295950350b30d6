use serde_json::{Value, json};

use tavola_storage::{models::VenueRow, venues};

use crate::{Error, Result, TavolaService, cache};

const MIN_QUERY_CHARS: usize = 2;
const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 50;

/// Name/city/category text search, ranked by rating. Results are cached by
/// the normalized query.
pub async fn search(service: &TavolaService, query: &str, limit: Option<i64>) -> Result<Value> {
	let normalized = query.trim().to_lowercase();

	if normalized.chars().count() < MIN_QUERY_CHARS {
		return Err(Error::Validation(format!(
			"query must be at least {MIN_QUERY_CHARS} characters."
		)));
	}

	let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
	let key =
		cache::cache_key("search", &json!({ "query": normalized, "limit": limit }));

	if let Some(hit) = service.cache.get(&key) {
		return Ok(hit);
	}

	let rows = venues::search_venues(&service.db, &normalized, limit).await?;
	let response = json!({ "venues": rows.iter().map(venue_summary).collect::<Vec<_>>() });

	service.cache.put(key, response.clone(), service.cfg.cache.search_ttl_seconds);

	Ok(response)
}

pub(crate) fn venue_summary(venue: &VenueRow) -> Value {
	json!({
		"id": venue.provider_id,
		"name": venue.name,
		"name_localized": venue.name_localized,
		"city": venue.city,
		"address": venue.address,
		"rating": venue.rating,
		"review_count": venue.review_count,
		"price_level": venue.price_level,
		"categories": venue.categories,
		"kosher": venue.kosher,
		"vegetarian": venue.vegetarian,
		"summary": venue.summary_text,
	})
}
