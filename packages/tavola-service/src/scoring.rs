use std::collections::HashMap;

use uuid::Uuid;

use tavola_config::Matching;
use tavola_domain::score::{self, FallbackStrategy};
use tavola_storage::{db::Db, venues};

use crate::Result;

/// Match scores for a whole candidate page in two queries: the caller's taste
/// profile once, then every venue's scoring row in one batch. Never called
/// per venue.
pub async fn score_batch(
	matching: &Matching,
	db: &Db,
	user_id: Option<Uuid>,
	venue_ids: &[String],
) -> Result<HashMap<String, u8>> {
	let fallback = FallbackStrategy::from_config(&matching.fallback)
		.unwrap_or(FallbackStrategy::Fixed(75));
	let taste = match user_id {
		Some(user_id) => venues::taste_profile(db, user_id).await?,
		None => None,
	};
	let user_embedding = taste.as_ref().and_then(|profile| profile.taste_embedding.as_deref());
	let rows = venues::scoring_rows_by_ids(db, venue_ids).await?;
	let mut scores = HashMap::with_capacity(rows.len());

	for row in rows {
		let venue_embedding = row.summary_embedding.as_deref();
		let score = score::match_score(
			user_embedding,
			venue_embedding,
			row.rating.unwrap_or(0.0),
			matching,
			fallback,
		);

		scores.insert(row.provider_id, score);
	}

	Ok(scores)
}
