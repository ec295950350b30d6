use std::collections::HashMap;

use serde_json::{Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use tavola_domain::{geo, hours, page};
use tavola_storage::{
	models::{MediaRow, ProfileRow, ReviewCount, ReviewRow, VenueRow},
	social, venues,
};

use crate::{Error, Result, TavolaService, cache, scoring};

/// Venues considered before review filtering and pagination.
const CANDIDATE_POOL: i64 = 200;

#[derive(Debug, Clone, Default)]
pub struct FeedParams {
	pub page: Option<usize>,
	pub limit: Option<usize>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	pub radius: Option<f64>,
	pub tab: Option<String>,
	pub city: Option<String>,
	pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
	Global,
	Friends,
}

/// Review feed around a point: nearest venues, their reviews filtered by tab,
/// social context joined in batch, then in-memory pagination. Anonymous
/// global requests are served from the response cache.
pub async fn feed(service: &TavolaService, params: &FeedParams) -> Result<Value> {
	let cfg = &service.cfg;
	// `page` is zero-based: page 0 is the first page.
	let page_number = params.page.unwrap_or(0);
	let limit = params.limit.unwrap_or(cfg.feed.default_limit).clamp(1, cfg.feed.max_limit);
	let tab = match params.tab.as_deref() {
		None | Some("global") => Tab::Global,
		Some("friends") => Tab::Friends,
		Some(other) => {
			return Err(Error::Validation(format!("Unknown feed tab {other:?}.")));
		},
	};

	if tab == Tab::Friends && params.user_id.is_none() {
		return Err(Error::Validation("The friends tab requires a user_id.".to_string()));
	}

	let bounds = &cfg.region.bounds;
	let lat = params.latitude.unwrap_or((bounds.min_lat + bounds.max_lat) / 2.0);
	let lng = params.longitude.unwrap_or((bounds.min_lng + bounds.max_lng) / 2.0);
	let radius_m = params.radius.unwrap_or(cfg.feed.default_radius_m);

	if radius_m <= 0.0 {
		return Err(Error::Validation("radius must be greater than zero.".to_string()));
	}

	// Match scores and the friends tab depend on the caller, so those
	// responses bypass the cache entirely.
	let personalized = params.user_id.is_some();
	let cache_key = (!personalized).then(|| {
		let decimals = cfg.cache.coord_decimals;

		cache::cache_key(
			"feed",
			&json!({
				"lat": cache::round_coord(lat, decimals),
				"lng": cache::round_coord(lng, decimals),
				"radius": radius_m.round(),
				"page": page_number,
				"limit": limit,
				"city": params.city.as_deref().map(str::to_lowercase),
			}),
		)
	});

	if let Some(key) = &cache_key
		&& let Some(hit) = service.cache.get(key)
	{
		return Ok(hit);
	}

	let db = &service.db;
	let lat_delta = geo::meters_to_lat_deg(radius_m);
	let lng_delta = geo::meters_to_lng_deg(radius_m, lat);
	let mut venue_ids =
		venues::nearest_venue_ids(db, lat, lng, lat_delta, lng_delta, CANDIDATE_POOL).await?;

	if venue_ids.is_empty() {
		venue_ids = venues::sample_venue_ids(db, CANDIDATE_POOL).await?;
	}

	let venue_rows = venues::venues_by_ids(db, &venue_ids).await?;
	let venue_map: HashMap<&str, &VenueRow> =
		venue_rows.iter().map(|venue| (venue.provider_id.as_str(), venue)).collect();

	if let Some(city) = params.city.as_deref() {
		venue_ids.retain(|id| {
			venue_map
				.get(id.as_str())
				.and_then(|venue| venue.city.as_deref())
				.is_some_and(|venue_city| venue_city.eq_ignore_ascii_case(city.trim()))
		});
	}

	let authors = match (tab, params.user_id) {
		(Tab::Friends, Some(user_id)) => Some(social::following_ids(db, user_id).await?),
		_ => None,
	};
	let reviews = social::reviews_for_venues(db, &venue_ids, authors.as_deref()).await?;
	let (page_reviews, has_more) = page::paginate(&reviews, page_number, limit);
	let review_ids: Vec<Uuid> = page_reviews.iter().map(|review| review.review_id).collect();
	let author_ids: Vec<Uuid> = dedup(page_reviews.iter().map(|review| review.user_id));
	let page_venue_ids: Vec<String> =
		dedup(page_reviews.iter().map(|review| review.venue_id.clone()));
	let (media, likes, comments, profiles, scores) = tokio::join!(
		social::media_for_reviews(db, &review_ids),
		social::like_counts(db, &review_ids),
		social::comment_counts(db, &review_ids),
		social::profiles_by_ids(db, &author_ids),
		scoring::score_batch(&cfg.matching, db, params.user_id, &page_venue_ids),
	);
	let media = group_media(media?);
	let likes = count_map(likes?);
	let comments = count_map(comments?);
	let profiles: HashMap<Uuid, ProfileRow> =
		profiles?.into_iter().map(|profile| (profile.user_id, profile)).collect();
	let scores = scores?;
	let now = OffsetDateTime::now_utc();
	let rendered: Vec<Value> = page_reviews
		.iter()
		.map(|review| {
			render_review(
				review,
				venue_map.get(review.venue_id.as_str()).copied(),
				&media,
				&likes,
				&comments,
				&profiles,
				&scores,
				lat,
				lng,
				now,
			)
		})
		.collect();
	let response = json!({ "reviews": rendered, "has_more": has_more });

	if let Some(key) = cache_key {
		service.cache.put(key, response.clone(), cfg.cache.feed_ttl_seconds);
	}

	Ok(response)
}

fn dedup<T: Clone + Eq + std::hash::Hash>(items: impl Iterator<Item = T>) -> Vec<T> {
	let mut seen = ahash::AHashSet::new();

	items.filter(|item| seen.insert(item.clone())).collect()
}

fn group_media(rows: Vec<MediaRow>) -> HashMap<Uuid, Vec<MediaRow>> {
	let mut grouped: HashMap<Uuid, Vec<MediaRow>> = HashMap::new();

	for row in rows {
		grouped.entry(row.review_id).or_default().push(row);
	}

	grouped
}

fn count_map(rows: Vec<ReviewCount>) -> HashMap<Uuid, i64> {
	rows.into_iter().map(|row| (row.review_id, row.count)).collect()
}

#[allow(clippy::too_many_arguments)]
fn render_review(
	review: &ReviewRow,
	venue: Option<&VenueRow>,
	media: &HashMap<Uuid, Vec<MediaRow>>,
	likes: &HashMap<Uuid, i64>,
	comments: &HashMap<Uuid, i64>,
	profiles: &HashMap<Uuid, ProfileRow>,
	scores: &HashMap<String, u8>,
	origin_lat: f64,
	origin_lng: f64,
	now: OffsetDateTime,
) -> Value {
	let author = profiles.get(&review.user_id);
	let media_items: Vec<Value> = media
		.get(&review.review_id)
		.map(|rows| {
			rows.iter()
				.map(|row| json!({ "id": row.media_id, "url": row.url, "kind": row.kind }))
				.collect()
		})
		.unwrap_or_default();

	json!({
		"id": review.review_id,
		"rating": review.rating,
		"body": review.body,
		"created_at": review.created_at.format(&Rfc3339).ok(),
		"author": author.map(|profile| json!({
			"id": profile.user_id,
			"username": profile.username,
			"avatar_url": profile.avatar_url,
		})),
		"like_count": likes.get(&review.review_id).copied().unwrap_or(0),
		"comment_count": comments.get(&review.review_id).copied().unwrap_or(0),
		"media": media_items,
		"venue": venue.map(|venue| render_feed_venue(venue, scores, origin_lat, origin_lng, now)),
	})
}

fn render_feed_venue(
	venue: &VenueRow,
	scores: &HashMap<String, u8>,
	origin_lat: f64,
	origin_lng: f64,
	now: OffsetDateTime,
) -> Value {
	let distance_m = match (venue.lat, venue.lng) {
		(Some(lat), Some(lng)) => {
			Some(geo::haversine_m(origin_lat, origin_lng, lat, lng).round())
		},
		_ => None,
	};
	let is_open = venue
		.opening_hours
		.as_ref()
		.and_then(|raw| serde_json::from_value::<hours::WeeklyHours>(raw.clone()).ok())
		.map(|schedule| hours::is_open_at(&schedule, now));
	let mut summary = crate::search::venue_summary(venue);

	if let Value::Object(map) = &mut summary {
		map.insert("distance_m".to_string(), json!(distance_m));
		map.insert("is_open".to_string(), json!(is_open));
		map.insert(
			"match_score".to_string(),
			json!(scores.get(venue.provider_id.as_str()).copied()),
		);
	}

	summary
}
