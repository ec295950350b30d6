use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub region: Region,
	pub ingestion: Ingestion,
	pub matching: Matching,
	pub cache: Cache,
	pub feed: Feed,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub places: PlacesProviderConfig,
	pub llm: LlmProviderConfig,
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacesProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub language: String,
	/// Language for the localized-name lookup during enrichment.
	#[serde(default = "default_secondary_language")]
	pub secondary_language: String,
	pub place_type: String,
	pub timeout_ms: u64,
	/// Pages the provider will serve for one query before the token chain ends.
	#[serde(default = "default_page_cap")]
	pub page_cap: u32,
	/// The provider's documented hard per-query result cap.
	#[serde(default = "default_result_cap")]
	pub result_cap: usize,
	/// A freshly issued page token is not valid until this long after issue.
	#[serde(default = "default_page_token_delay_ms")]
	pub page_token_delay_ms: u64,
	#[serde(default = "default_token_retry_delay_ms")]
	pub token_retry_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	/// Input is truncated to this many characters before the embed call.
	pub max_input_chars: usize,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Region {
	pub name: String,
	pub bounds: Bounds,
	/// Locality names accepted as in-region by the membership filter.
	pub canonical_names: Vec<String>,
	pub grid_step_deg: f64,
	#[serde(default)]
	pub dense_areas: Vec<DenseArea>,
	#[serde(default)]
	pub landmarks: Vec<Landmark>,
	pub default_radius_m: f64,
	/// One of coords_or_name, coords_and_name, coords_over_name.
	#[serde(default = "default_membership_policy")]
	pub membership_policy: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Bounds {
	pub min_lat: f64,
	pub min_lng: f64,
	pub max_lat: f64,
	pub max_lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DenseArea {
	pub name: String,
	pub bounds: Bounds,
	pub step_deg: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Landmark {
	pub name: String,
	pub lat: f64,
	pub lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ingestion {
	pub freshness_days: i64,
	pub batch_size: usize,
	pub delay_between_batches_ms: u64,
	pub delay_between_areas_ms: u64,
	pub quadrant_delay_ms: u64,
	pub max_depth: u32,
	pub min_radius_m: f64,
	pub max_retries: u32,
	pub retry_base_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Matching {
	#[serde(default = "default_embedding_weight")]
	pub embedding_weight: f32,
	#[serde(default = "default_rating_weight")]
	pub rating_weight: f32,
	#[serde(default = "default_prior_weight")]
	pub prior_weight: f32,
	#[serde(default = "default_prior")]
	pub prior: f32,
	pub fallback: ScoreFallback,
}

/// Two fallback tiers for the "no embedding" case. The source system used a
/// deterministic constant on one path and a random range on another; both are
/// kept as selectable strategies rather than silently unified.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreFallback {
	/// One of fixed, random_range.
	pub strategy: String,
	#[serde(default = "default_fallback_value")]
	pub value: u8,
	#[serde(default = "default_fallback_min")]
	pub min: u8,
	#[serde(default = "default_fallback_max")]
	pub max: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cache {
	pub feed_ttl_seconds: i64,
	pub search_ttl_seconds: i64,
	pub status_ttl_seconds: i64,
	/// Coordinates are rounded to this many decimals in cache keys.
	#[serde(default = "default_coord_decimals")]
	pub coord_decimals: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feed {
	pub default_radius_m: f64,
	pub default_limit: usize,
	pub max_limit: usize,
}

fn default_page_cap() -> u32 {
	3
}

fn default_result_cap() -> usize {
	60
}

fn default_page_token_delay_ms() -> u64 {
	2_000
}

fn default_token_retry_delay_ms() -> u64 {
	500
}

fn default_secondary_language() -> String {
	"he".to_string()
}

fn default_membership_policy() -> String {
	"coords_or_name".to_string()
}

fn default_embedding_weight() -> f32 {
	0.5
}

fn default_rating_weight() -> f32 {
	0.25
}

fn default_prior_weight() -> f32 {
	0.25
}

fn default_prior() -> f32 {
	0.75
}

fn default_fallback_value() -> u8 {
	75
}

fn default_fallback_min() -> u8 {
	70
}

fn default_fallback_max() -> u8 {
	90
}

fn default_coord_decimals() -> u32 {
	3
}
