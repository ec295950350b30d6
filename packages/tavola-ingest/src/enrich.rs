use std::time::Duration;

use time::OffsetDateTime;

use tavola_config::Config;
use tavola_domain::{categories, geo, region};
use tavola_providers::{
	ProviderSet, retry,
	places::{PlaceCandidate, PlaceDetails},
};
use tavola_storage::models::NewVenue;

const SNIPPET_EMBED_COUNT: usize = 3;
const SNIPPET_EMBED_CHARS: usize = 280;

/// Per-candidate result. The driver tallies these; only `Failed` carries an
/// error, and it never aborts the batch.
#[derive(Debug)]
pub enum Outcome {
	Added(Box<NewVenue>),
	/// Already stored and fresh; no external call was made.
	Skipped,
	/// Rejected by the region-membership filter.
	Filtered,
	Failed(tavola_providers::Error),
}

pub struct Enricher<'a> {
	cfg: &'a Config,
	providers: &'a ProviderSet,
}
impl<'a> Enricher<'a> {
	pub fn new(cfg: &'a Config, providers: &'a ProviderSet) -> Self {
		Self { cfg, providers }
	}

	/// Turns a raw scan candidate into a persistable venue. Freshness is
	/// decided from the caller-supplied timestamp so this stays database-free.
	pub async fn enrich(
		&self,
		candidate: &PlaceCandidate,
		existing_updated_at: Option<OffsetDateTime>,
		force: bool,
	) -> Outcome {
		if !force && let Some(updated_at) = existing_updated_at {
			let age = OffsetDateTime::now_utc() - updated_at;

			if age < time::Duration::days(self.cfg.ingestion.freshness_days) {
				return Outcome::Skipped;
			}
		}

		let (details, name_localized) =
			tokio::join!(self.fetch_details(candidate), self.localized_name(candidate));
		let details = match details {
			Ok(details) => details,
			Err(err) => return Outcome::Failed(err),
		};
		let (city, canonical_override) = match self.apply_region_filter(candidate, &details) {
			Some(resolved) => resolved,
			None => return Outcome::Filtered,
		};

		if canonical_override {
			tracing::debug!(
				provider_id = %candidate.provider_id,
				"Locality overridden to the canonical region name.",
			);
		}

		let (summary_text, venue_categories) = match self.classify(candidate, &details).await {
			Ok(classified) => classified,
			Err(err) => return Outcome::Failed(err),
		};
		let (kosher, vegetarian) = categories::dietary_flags(&venue_categories);
		let (summary_embedding, reviews_embedding) = match self
			.embed(candidate, &details, summary_text.as_deref(), &venue_categories, city.as_deref())
			.await
		{
			Ok(embeddings) => embeddings,
			Err(err) => return Outcome::Failed(err),
		};

		Outcome::Added(Box::new(NewVenue {
			provider_id: candidate.provider_id.clone(),
			name: details.name.clone().unwrap_or_else(|| candidate.name.clone()),
			name_localized,
			address: details.address,
			city,
			lat: Some(candidate.lat),
			lng: Some(candidate.lng),
			phone: details.phone,
			website: details.website,
			rating: details.rating.or(candidate.rating),
			review_count: details.review_count.or(candidate.review_count),
			price_level: details.price_level,
			categories: venue_categories,
			kosher,
			vegetarian,
			opening_hours: details
				.opening_hours
				.as_ref()
				.and_then(|hours| serde_json::to_value(hours).ok()),
			photo_refs: details.photo_refs,
			review_snippets: details.review_snippets,
			summary_text,
			summary_embedding,
			reviews_embedding,
		}))
	}

	async fn fetch_details(
		&self,
		candidate: &PlaceCandidate,
	) -> tavola_providers::Result<PlaceDetails> {
		let places_cfg = &self.cfg.providers.places;

		retry::with_backoff(
			"place_details",
			self.cfg.ingestion.max_retries,
			self.retry_base_delay(),
			|| self.providers.places.place_details(&candidate.provider_id, &places_cfg.language),
		)
		.await
	}

	async fn localized_name(&self, candidate: &PlaceCandidate) -> Option<String> {
		let places_cfg = &self.cfg.providers.places;
		let result = retry::with_backoff(
			"localized_name",
			self.cfg.ingestion.max_retries,
			self.retry_base_delay(),
			|| {
				self.providers
					.places
					.localized_name(&candidate.provider_id, &places_cfg.secondary_language)
			},
		)
		.await;

		match result {
			Ok(name) => name,
			Err(err) => {
				tracing::warn!(
					error = %err,
					provider_id = %candidate.provider_id,
					"Localized name lookup failed. Continuing without it.",
				);

				None
			},
		}
	}

	/// Returns the resolved locality and whether it was overridden, or `None`
	/// when the candidate is out of region.
	fn apply_region_filter(
		&self,
		candidate: &PlaceCandidate,
		details: &PlaceDetails,
	) -> Option<(Option<String>, bool)> {
		let region_cfg = &self.cfg.region;
		let policy = region::MembershipPolicy::parse(&region_cfg.membership_policy)
			.unwrap_or(region::MembershipPolicy::CoordsOrName);
		let in_bounds = geo::contains(&region_cfg.bounds, candidate.lat, candidate.lng);
		let name_ok = details
			.city
			.as_deref()
			.is_some_and(|locality| region::name_matches(locality, &region_cfg.canonical_names));

		match region::evaluate(policy, in_bounds, name_ok) {
			region::Membership::Rejected => None,
			region::Membership::Accepted { canonical_override: true } => {
				Some((region_cfg.canonical_names.first().cloned(), true))
			},
			region::Membership::Accepted { canonical_override: false } => {
				Some((details.city.clone(), false))
			},
		}
	}

	async fn classify(
		&self,
		candidate: &PlaceCandidate,
		details: &PlaceDetails,
	) -> tavola_providers::Result<(Option<String>, Vec<String>)> {
		let prompt = build_prompt(candidate, details);
		let completion = retry::with_backoff(
			"summarize",
			self.cfg.ingestion.max_retries,
			self.retry_base_delay(),
			|| self.providers.llm.complete(&prompt),
		)
		.await?;
		let mut venue_categories = categories::sanitize(&completion.categories);

		if venue_categories.is_empty() {
			venue_categories = categories::from_provider_types(&candidate.types);
		}

		Ok((Some(completion.summary), venue_categories))
	}

	async fn embed(
		&self,
		candidate: &PlaceCandidate,
		details: &PlaceDetails,
		summary: Option<&str>,
		venue_categories: &[String],
		city: Option<&str>,
	) -> tavola_providers::Result<(Option<Vec<f32>>, Option<Vec<f32>>)> {
		let cap = self.cfg.providers.embedding.max_input_chars;
		let mut texts = vec![summary_input(candidate, details, summary, venue_categories, city, cap)];

		if !details.review_snippets.is_empty() {
			texts.push(reviews_input(&details.review_snippets, cap));
		}

		let mut embeddings = retry::with_backoff(
			"embed",
			self.cfg.ingestion.max_retries,
			self.retry_base_delay(),
			|| self.providers.embedding.embed(&texts),
		)
		.await?;
		let reviews_embedding = if embeddings.len() > 1 { embeddings.pop() } else { None };
		let summary_embedding = embeddings.pop();

		Ok((summary_embedding, reviews_embedding))
	}

	fn retry_base_delay(&self) -> Duration {
		Duration::from_millis(self.cfg.ingestion.retry_base_delay_ms)
	}
}

fn build_prompt(candidate: &PlaceCandidate, details: &PlaceDetails) -> String {
	let name = details.name.as_deref().unwrap_or(&candidate.name);
	let snippets = details
		.review_snippets
		.iter()
		.take(SNIPPET_EMBED_COUNT)
		.map(|snippet| format!("- {}", truncate_chars(snippet, SNIPPET_EMBED_CHARS)))
		.collect::<Vec<_>>()
		.join("\n");

	format!(
		"Summarize the restaurant \"{name}\" in one or two sentences and pick at most \
		 {max} categories from this list: {vocabulary}.\n\
		 Respond as JSON: {{\"summary\": \"...\", \"categories\": [\"...\"]}}.\n\
		 Provider types: {types}.\n\
		 Review excerpts:\n{snippets}",
		max = categories::MAX_CATEGORIES,
		vocabulary = categories::VOCABULARY.join(", "),
		types = candidate.types.join(", "),
	)
}

fn summary_input(
	candidate: &PlaceCandidate,
	details: &PlaceDetails,
	summary: Option<&str>,
	venue_categories: &[String],
	city: Option<&str>,
	cap: usize,
) -> String {
	let mut parts = vec![details.name.clone().unwrap_or_else(|| candidate.name.clone())];

	if let Some(summary) = summary {
		parts.push(summary.to_string());
	}
	if !venue_categories.is_empty() {
		parts.push(venue_categories.join(", "));
	}
	if let Some(city) = city {
		parts.push(city.to_string());
	}

	for snippet in details.review_snippets.iter().take(SNIPPET_EMBED_COUNT) {
		parts.push(truncate_chars(snippet, SNIPPET_EMBED_CHARS).to_string());
	}

	truncate_chars(&parts.join("\n"), cap).to_string()
}

fn reviews_input(snippets: &[String], cap: usize) -> String {
	truncate_chars(&snippets.join("\n"), cap).to_string()
}

fn truncate_chars(text: &str, cap: usize) -> &str {
	match text.char_indices().nth(cap) {
		Some((index, _)) => &text[..index],
		None => text,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn truncation_respects_char_boundaries() {
		assert_eq!(truncate_chars("שלום עולם", 4), "שלום");
		assert_eq!(truncate_chars("short", 100), "short");
		assert_eq!(truncate_chars("", 10), "");
	}

	#[test]
	fn prompt_names_the_vocabulary_and_the_venue() {
		let candidate = PlaceCandidate {
			provider_id: "p1".to_string(),
			name: "HaBasta".to_string(),
			lat: 32.06,
			lng: 34.77,
			rating: Some(4.5),
			review_count: Some(900),
			types: vec!["restaurant".to_string()],
			raw: serde_json::Value::Null,
		};
		let prompt = build_prompt(&candidate, &PlaceDetails::default());

		assert!(prompt.contains("HaBasta"));
		assert!(prompt.contains("seafood"));
		assert!(prompt.contains("\"categories\""));
	}
}
