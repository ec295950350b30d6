use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	db::Db,
	models::{CityCount, NewVenue, TasteProfileRow, VenueRow, VenueScoringRow},
};

const UPSERT_COLUMNS: &str = "\
provider_id,
name,
name_localized,
address,
city,
phone,
website,
rating,
review_count,
price_level,
categories,
kosher,
vegetarian,
opening_hours,
photo_refs,
review_snippets,
summary_text,
summary_embedding,
reviews_embedding";

const UPSERT_SET: &str = "\
name = EXCLUDED.name,
name_localized = EXCLUDED.name_localized,
address = EXCLUDED.address,
city = EXCLUDED.city,
phone = EXCLUDED.phone,
website = EXCLUDED.website,
rating = EXCLUDED.rating,
review_count = EXCLUDED.review_count,
price_level = EXCLUDED.price_level,
categories = EXCLUDED.categories,
kosher = EXCLUDED.kosher,
vegetarian = EXCLUDED.vegetarian,
opening_hours = EXCLUDED.opening_hours,
photo_refs = EXCLUDED.photo_refs,
review_snippets = EXCLUDED.review_snippets,
summary_text = EXCLUDED.summary_text,
summary_embedding = EXCLUDED.summary_embedding,
reviews_embedding = EXCLUDED.reviews_embedding,
updated_at = GREATEST(now(), venues.updated_at + interval '1 microsecond')";

/// Idempotent write keyed on the provider id. The primary path writes every
/// field including the geo point in one statement; when it fails, the
/// fallback writes the non-geo fields and then patches the geo point
/// best-effort, logging instead of failing the batch.
pub async fn upsert_venue(db: &Db, venue: &NewVenue) -> Result<()> {
	match upsert_with_geo(db, venue).await {
		Ok(()) => Ok(()),
		Err(err) => {
			tracing::warn!(
				error = %err,
				provider_id = %venue.provider_id,
				"Full venue upsert failed. Falling back to a non-geo write.",
			);

			upsert_without_geo(db, venue).await?;

			if let Err(geo_err) = patch_geo(db, venue).await {
				tracing::warn!(
					error = %geo_err,
					provider_id = %venue.provider_id,
					"Geo point patch failed. Venue stored without coordinates.",
				);
			}

			Ok(())
		},
	}
}

async fn upsert_with_geo(db: &Db, venue: &NewVenue) -> Result<()> {
	let sql = format!(
		"\
INSERT INTO venues ({UPSERT_COLUMNS}, lat, lng)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
ON CONFLICT (provider_id) DO UPDATE SET
{UPSERT_SET},
lat = EXCLUDED.lat,
lng = EXCLUDED.lng"
	);

	bind_common(sqlx::query(&sql), venue)
		.bind(venue.lat)
		.bind(venue.lng)
		.execute(&db.pool)
		.await?;

	Ok(())
}

async fn upsert_without_geo(db: &Db, venue: &NewVenue) -> Result<()> {
	let sql = format!(
		"\
INSERT INTO venues ({UPSERT_COLUMNS})
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
ON CONFLICT (provider_id) DO UPDATE SET
{UPSERT_SET}"
	);

	bind_common(sqlx::query(&sql), venue).execute(&db.pool).await?;

	Ok(())
}

async fn patch_geo(db: &Db, venue: &NewVenue) -> Result<()> {
	sqlx::query("UPDATE venues SET lat = $2, lng = $3 WHERE provider_id = $1")
		.bind(&venue.provider_id)
		.bind(venue.lat)
		.bind(venue.lng)
		.execute(&db.pool)
		.await?;

	Ok(())
}

fn bind_common<'q>(
	query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
	venue: &'q NewVenue,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
	query
		.bind(&venue.provider_id)
		.bind(&venue.name)
		.bind(venue.name_localized.as_deref())
		.bind(venue.address.as_deref())
		.bind(venue.city.as_deref())
		.bind(venue.phone.as_deref())
		.bind(venue.website.as_deref())
		.bind(venue.rating)
		.bind(venue.review_count)
		.bind(venue.price_level)
		.bind(&venue.categories)
		.bind(venue.kosher)
		.bind(venue.vegetarian)
		.bind(venue.opening_hours.as_ref())
		.bind(&venue.photo_refs)
		.bind(&venue.review_snippets)
		.bind(venue.summary_text.as_deref())
		.bind(venue.summary_embedding.as_deref())
		.bind(venue.reviews_embedding.as_deref())
}

pub async fn venue_last_updated(
	db: &Db,
	provider_id: &str,
) -> Result<Option<OffsetDateTime>> {
	let row: Option<(OffsetDateTime,)> =
		sqlx::query_as("SELECT updated_at FROM venues WHERE provider_id = $1")
			.bind(provider_id)
			.fetch_optional(&db.pool)
			.await?;

	Ok(row.map(|(updated_at,)| updated_at))
}

pub async fn venue_by_id(db: &Db, provider_id: &str) -> Result<Option<VenueRow>> {
	let venue = sqlx::query_as::<_, VenueRow>("SELECT * FROM venues WHERE provider_id = $1")
		.bind(provider_id)
		.fetch_optional(&db.pool)
		.await?;

	Ok(venue)
}

pub async fn venues_by_ids(db: &Db, provider_ids: &[String]) -> Result<Vec<VenueRow>> {
	if provider_ids.is_empty() {
		return Ok(Vec::new());
	}

	let venues =
		sqlx::query_as::<_, VenueRow>("SELECT * FROM venues WHERE provider_id = ANY($1)")
			.bind(provider_ids)
			.fetch_all(&db.pool)
			.await?;

	Ok(venues)
}

/// One query for the whole candidate set; the batched scorer depends on this
/// never being called per row.
pub async fn scoring_rows_by_ids(
	db: &Db,
	provider_ids: &[String],
) -> Result<Vec<VenueScoringRow>> {
	if provider_ids.is_empty() {
		return Ok(Vec::new());
	}

	let rows = sqlx::query_as::<_, VenueScoringRow>(
		"SELECT provider_id, rating, summary_embedding FROM venues WHERE provider_id = ANY($1)",
	)
	.bind(provider_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Planar nearest-neighbor query: bounding-box prefilter on the geo index,
/// then ordering by squared degree distance with the longitude axis scaled to
/// the local parallel.
pub async fn nearest_venue_ids(
	db: &Db,
	lat: f64,
	lng: f64,
	lat_delta_deg: f64,
	lng_delta_deg: f64,
	limit: i64,
) -> Result<Vec<String>> {
	let lng_scale = lat.to_radians().cos();
	let rows: Vec<(String,)> = sqlx::query_as(
		"\
SELECT provider_id
FROM venues
WHERE lat IS NOT NULL
	AND lng IS NOT NULL
	AND lat BETWEEN $1 - $3 AND $1 + $3
	AND lng BETWEEN $2 - $4 AND $2 + $4
ORDER BY (lat - $1) * (lat - $1) + (lng - $2) * $5 * (lng - $2) * $5
LIMIT $6",
	)
	.bind(lat)
	.bind(lng)
	.bind(lat_delta_deg)
	.bind(lng_delta_deg)
	.bind(lng_scale)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows.into_iter().map(|(provider_id,)| provider_id).collect())
}

/// Unfiltered sample used when the geo query comes back empty.
pub async fn sample_venue_ids(db: &Db, limit: i64) -> Result<Vec<String>> {
	let rows: Vec<(String,)> =
		sqlx::query_as("SELECT provider_id FROM venues ORDER BY updated_at DESC LIMIT $1")
			.bind(limit)
			.fetch_all(&db.pool)
			.await?;

	Ok(rows.into_iter().map(|(provider_id,)| provider_id).collect())
}

pub async fn search_venues(db: &Db, query: &str, limit: i64) -> Result<Vec<VenueRow>> {
	let pattern = format!("%{}%", query.trim());
	let venues = sqlx::query_as::<_, VenueRow>(
		"\
SELECT *
FROM venues
WHERE name ILIKE $1
	OR name_localized ILIKE $1
	OR city ILIKE $1
	OR EXISTS (SELECT 1 FROM unnest(categories) AS category WHERE category ILIKE $1)
ORDER BY rating DESC NULLS LAST, review_count DESC NULLS LAST
LIMIT $2",
	)
	.bind(&pattern)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(venues)
}

pub async fn venue_totals(db: &Db) -> Result<(i64, i64)> {
	let (total, with_embeddings): (i64, i64) = sqlx::query_as(
		"SELECT count(*), count(summary_embedding) FROM venues",
	)
	.fetch_one(&db.pool)
	.await?;

	Ok((total, with_embeddings))
}

pub async fn city_counts(db: &Db) -> Result<Vec<CityCount>> {
	let counts = sqlx::query_as::<_, CityCount>(
		"\
SELECT city, count(*) AS count
FROM venues
WHERE city IS NOT NULL
GROUP BY city
ORDER BY count DESC, city ASC",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(counts)
}

pub async fn taste_profile(db: &Db, user_id: Uuid) -> Result<Option<TasteProfileRow>> {
	let profile = sqlx::query_as::<_, TasteProfileRow>(
		"SELECT user_id, taste_embedding, kosher, vegetarian FROM user_taste_profiles WHERE user_id = $1",
	)
	.bind(user_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(profile)
}
