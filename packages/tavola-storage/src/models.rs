use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// The persisted unit: one row per provider place id.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VenueRow {
	pub provider_id: String,
	pub name: String,
	pub name_localized: Option<String>,
	pub address: Option<String>,
	pub city: Option<String>,
	pub lat: Option<f64>,
	pub lng: Option<f64>,
	pub phone: Option<String>,
	pub website: Option<String>,
	pub rating: Option<f32>,
	pub review_count: Option<i32>,
	pub price_level: Option<i32>,
	pub categories: Vec<String>,
	pub kosher: bool,
	pub vegetarian: bool,
	pub opening_hours: Option<Value>,
	pub photo_refs: Vec<String>,
	pub review_snippets: Vec<String>,
	pub summary_text: Option<String>,
	pub summary_embedding: Option<Vec<f32>>,
	pub reviews_embedding: Option<Vec<f32>>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

/// Input to the upsert; everything the enrichment worker produced.
#[derive(Debug, Clone)]
pub struct NewVenue {
	pub provider_id: String,
	pub name: String,
	pub name_localized: Option<String>,
	pub address: Option<String>,
	pub city: Option<String>,
	pub lat: Option<f64>,
	pub lng: Option<f64>,
	pub phone: Option<String>,
	pub website: Option<String>,
	pub rating: Option<f32>,
	pub review_count: Option<i32>,
	pub price_level: Option<i32>,
	pub categories: Vec<String>,
	pub kosher: bool,
	pub vegetarian: bool,
	pub opening_hours: Option<Value>,
	pub photo_refs: Vec<String>,
	pub review_snippets: Vec<String>,
	pub summary_text: Option<String>,
	pub summary_embedding: Option<Vec<f32>>,
	pub reviews_embedding: Option<Vec<f32>>,
}

/// Slim projection for batched match scoring.
#[derive(Debug, sqlx::FromRow)]
pub struct VenueScoringRow {
	pub provider_id: String,
	pub rating: Option<f32>,
	pub summary_embedding: Option<Vec<f32>>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct TasteProfileRow {
	pub user_id: Uuid,
	pub taste_embedding: Option<Vec<f32>>,
	pub kosher: bool,
	pub vegetarian: bool,
}

#[derive(Debug, sqlx::FromRow)]
pub struct CityCount {
	pub city: String,
	pub count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewRow {
	pub review_id: Uuid,
	pub venue_id: String,
	pub user_id: Uuid,
	pub rating: Option<f32>,
	pub body: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MediaRow {
	pub media_id: Uuid,
	pub review_id: Uuid,
	pub url: String,
	pub kind: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
	pub user_id: Uuid,
	pub username: String,
	pub avatar_url: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ReviewCount {
	pub review_id: Uuid,
	pub count: i64,
}
