use rand::Rng;

use tavola_config::{Matching, ScoreFallback};

pub const SCORE_MIN: u8 = 50;
pub const SCORE_MAX: u8 = 100;
/// Similarity reported when either vector has zero magnitude, instead of
/// dividing by zero.
pub const ZERO_MAGNITUDE_SIMILARITY: f32 = 0.5;

/// Score used when no embedding is available on either side. The source
/// system disagreed with itself here (a constant on one path, a random range
/// on another); both tiers are kept as named strategies and selected by
/// config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStrategy {
	Fixed(u8),
	RandomRange(u8, u8),
}
impl FallbackStrategy {
	pub fn from_config(cfg: &ScoreFallback) -> Option<Self> {
		match cfg.strategy.as_str() {
			"fixed" => Some(Self::Fixed(cfg.value)),
			"random_range" => Some(Self::RandomRange(cfg.min, cfg.max)),
			_ => None,
		}
	}

	pub fn score(&self) -> u8 {
		match *self {
			Self::Fixed(value) => value,
			Self::RandomRange(min, max) => rand::thread_rng().gen_range(min..=max),
		}
	}
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	if a.len() != b.len() {
		return ZERO_MAGNITUDE_SIMILARITY;
	}

	let mut dot = 0.0_f32;
	let mut norm_a = 0.0_f32;
	let mut norm_b = 0.0_f32;

	for (x, y) in a.iter().zip(b.iter()) {
		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return ZERO_MAGNITUDE_SIMILARITY;
	}

	dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Bounded match percentage from a taste embedding and a venue embedding plus
/// its provider rating. Absent embeddings fall through to the configured
/// fallback strategy.
pub fn match_score(
	user_embedding: Option<&[f32]>,
	venue_embedding: Option<&[f32]>,
	rating: f32,
	matching: &Matching,
	fallback: FallbackStrategy,
) -> u8 {
	let (Some(user), Some(venue)) = (user_embedding, venue_embedding) else {
		return fallback.score().clamp(SCORE_MIN, SCORE_MAX);
	};
	let similarity = cosine_similarity(user, venue);
	let raw = matching.embedding_weight * similarity
		+ matching.rating_weight * (rating / 5.0).clamp(0.0, 1.0)
		+ matching.prior_weight * matching.prior;
	let scaled = (raw * 100.0).round();

	(scaled as i32).clamp(i32::from(SCORE_MIN), i32::from(SCORE_MAX)) as u8
}
