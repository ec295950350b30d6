use std::collections::{HashMap, HashSet};

use serde_json::{Value, json};
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use tavola_storage::{Error as StorageError, social, venues};

use crate::{Result, TavolaService, cache, scoring, search};

/// Full venue page: the stored record plus its reviews and social context.
/// Passing a `user_id` adds wishlist and like state and switches the match
/// score to that user's taste, which disqualifies the response from caching.
pub async fn venue_detail(
	service: &TavolaService,
	venue_id: &str,
	user_id: Option<Uuid>,
) -> Result<Value> {
	let cache_key =
		user_id.is_none().then(|| cache::cache_key("venue", &json!({ "id": venue_id })));

	if let Some(key) = &cache_key
		&& let Some(hit) = service.cache.get(key)
	{
		return Ok(hit);
	}

	let db = &service.db;
	let venue = venues::venue_by_id(db, venue_id)
		.await?
		.ok_or_else(|| StorageError::NotFound(format!("venue {venue_id}")))?;
	let venue_ids = vec![venue.provider_id.clone()];
	let reviews = social::reviews_for_venues(db, &venue_ids, None).await?;
	let review_ids: Vec<Uuid> = reviews.iter().map(|review| review.review_id).collect();
	let author_ids: Vec<Uuid> =
		reviews.iter().map(|review| review.user_id).collect::<HashSet<_>>().into_iter().collect();
	let (media, likes, comments, profiles, scores) = tokio::join!(
		social::media_for_reviews(db, &review_ids),
		social::like_counts(db, &review_ids),
		social::comment_counts(db, &review_ids),
		social::profiles_by_ids(db, &author_ids),
		scoring::score_batch(&service.cfg.matching, db, user_id, &venue_ids),
	);
	let media = media?;
	let likes: HashMap<Uuid, i64> = likes?.into_iter().map(|row| (row.review_id, row.count)).collect();
	let comments: HashMap<Uuid, i64> =
		comments?.into_iter().map(|row| (row.review_id, row.count)).collect();
	let profiles: HashMap<Uuid, _> =
		profiles?.into_iter().map(|profile| (profile.user_id, profile)).collect();
	let scores = scores?;
	let (wishlisted, liked) = match user_id {
		Some(user_id) => {
			let (wishlisted, liked) = tokio::join!(
				social::is_wishlisted(db, user_id, venue_id),
				social::liked_review_ids(db, user_id, &review_ids),
			);

			(Some(wishlisted?), liked?)
		},
		None => (None, Vec::new()),
	};
	let rendered_reviews: Vec<Value> = reviews
		.iter()
		.map(|review| {
			let review_media: Vec<Value> = media
				.iter()
				.filter(|row| row.review_id == review.review_id)
				.map(|row| json!({ "id": row.media_id, "url": row.url, "kind": row.kind }))
				.collect();
			let author = profiles.get(&review.user_id);

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
				"liked_by_caller": user_id.map(|_| liked.contains(&review.review_id)),
				"media": review_media,
			})
		})
		.collect();
	let mut response_venue = search::venue_summary(&venue);

	if let Value::Object(map) = &mut response_venue {
		map.insert("lat".to_string(), json!(venue.lat));
		map.insert("lng".to_string(), json!(venue.lng));
		map.insert("phone".to_string(), json!(venue.phone));
		map.insert("website".to_string(), json!(venue.website));
		map.insert("opening_hours".to_string(), venue.opening_hours.clone().unwrap_or(Value::Null));
		map.insert("photo_refs".to_string(), json!(venue.photo_refs));
		map.insert(
			"match_score".to_string(),
			json!(scores.get(venue.provider_id.as_str()).copied()),
		);
		map.insert("wishlisted".to_string(), json!(wishlisted));
	}

	let response = json!({ "venue": response_venue, "reviews": rendered_reviews });

	if let Some(key) = cache_key {
		service.cache.put(key, response.clone(), service.cfg.cache.feed_ttl_seconds);
	}

	Ok(response)
}
