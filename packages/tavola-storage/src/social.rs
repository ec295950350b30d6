//! Read-only joins over collaborator-owned tables. The feed and the venue
//! detail page consume these; nothing here mutates.

use uuid::Uuid;

use crate::{
	Result,
	db::Db,
	models::{MediaRow, ProfileRow, ReviewCount, ReviewRow},
};

pub async fn following_ids(db: &Db, user_id: Uuid) -> Result<Vec<Uuid>> {
	let rows: Vec<(Uuid,)> =
		sqlx::query_as("SELECT followee_id FROM follows WHERE follower_id = $1")
			.bind(user_id)
			.fetch_all(&db.pool)
			.await?;

	Ok(rows.into_iter().map(|(followee_id,)| followee_id).collect())
}

/// Reviews for a resolved venue id set, newest first, optionally restricted
/// to a set of authors (the social-graph tab).
pub async fn reviews_for_venues(
	db: &Db,
	venue_ids: &[String],
	authors: Option<&[Uuid]>,
) -> Result<Vec<ReviewRow>> {
	if venue_ids.is_empty() {
		return Ok(Vec::new());
	}

	let reviews = match authors {
		Some(authors) if authors.is_empty() => Vec::new(),
		Some(authors) => {
			sqlx::query_as::<_, ReviewRow>(
				"\
SELECT review_id, venue_id, user_id, rating, body, created_at
FROM reviews
WHERE venue_id = ANY($1) AND user_id = ANY($2)
ORDER BY created_at DESC",
			)
			.bind(venue_ids)
			.bind(authors)
			.fetch_all(&db.pool)
			.await?
		},
		None => {
			sqlx::query_as::<_, ReviewRow>(
				"\
SELECT review_id, venue_id, user_id, rating, body, created_at
FROM reviews
WHERE venue_id = ANY($1)
ORDER BY created_at DESC",
			)
			.bind(venue_ids)
			.fetch_all(&db.pool)
			.await?
		},
	};

	Ok(reviews)
}

pub async fn media_for_reviews(db: &Db, review_ids: &[Uuid]) -> Result<Vec<MediaRow>> {
	if review_ids.is_empty() {
		return Ok(Vec::new());
	}

	let media = sqlx::query_as::<_, MediaRow>(
		"SELECT media_id, review_id, url, kind FROM review_media WHERE review_id = ANY($1)",
	)
	.bind(review_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(media)
}

pub async fn like_counts(db: &Db, review_ids: &[Uuid]) -> Result<Vec<ReviewCount>> {
	if review_ids.is_empty() {
		return Ok(Vec::new());
	}

	let counts = sqlx::query_as::<_, ReviewCount>(
		"\
SELECT review_id, count(*) AS count
FROM review_likes
WHERE review_id = ANY($1)
GROUP BY review_id",
	)
	.bind(review_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(counts)
}

pub async fn comment_counts(db: &Db, review_ids: &[Uuid]) -> Result<Vec<ReviewCount>> {
	if review_ids.is_empty() {
		return Ok(Vec::new());
	}

	let counts = sqlx::query_as::<_, ReviewCount>(
		"\
SELECT review_id, count(*) AS count
FROM review_comments
WHERE review_id = ANY($1)
GROUP BY review_id",
	)
	.bind(review_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(counts)
}

pub async fn profiles_by_ids(db: &Db, user_ids: &[Uuid]) -> Result<Vec<ProfileRow>> {
	if user_ids.is_empty() {
		return Ok(Vec::new());
	}

	let profiles = sqlx::query_as::<_, ProfileRow>(
		"SELECT user_id, username, avatar_url FROM profiles WHERE user_id = ANY($1)",
	)
	.bind(user_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(profiles)
}

pub async fn is_wishlisted(db: &Db, user_id: Uuid, venue_id: &str) -> Result<bool> {
	let row: Option<(i32,)> =
		sqlx::query_as("SELECT 1 FROM wishlist_items WHERE user_id = $1 AND venue_id = $2")
			.bind(user_id)
			.bind(venue_id)
			.fetch_optional(&db.pool)
			.await?;

	Ok(row.is_some())
}

/// Which of the given reviews the caller has liked, for the personalized
/// venue detail payload.
pub async fn liked_review_ids(
	db: &Db,
	user_id: Uuid,
	review_ids: &[Uuid],
) -> Result<Vec<Uuid>> {
	if review_ids.is_empty() {
		return Ok(Vec::new());
	}

	let rows: Vec<(Uuid,)> = sqlx::query_as(
		"SELECT review_id FROM review_likes WHERE user_id = $1 AND review_id = ANY($2)",
	)
	.bind(user_id)
	.bind(review_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows.into_iter().map(|(review_id,)| review_id).collect())
}
