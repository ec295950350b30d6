use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use tavola_config::PlacesProviderConfig;
use tavola_domain::hours::{Period, WeeklyHours};

use crate::{BoxFuture, Error, PlaceProvider, Result};

/// Raw nearby-search result, validated at the boundary. Ephemeral; only the
/// enriched form is persisted.
#[derive(Debug, Clone)]
pub struct PlaceCandidate {
	pub provider_id: String,
	pub name: String,
	pub lat: f64,
	pub lng: f64,
	pub rating: Option<f32>,
	pub review_count: Option<i32>,
	pub types: Vec<String>,
	pub raw: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
	Ok,
	ZeroResults,
	/// Also returned while a freshly issued page token is not yet active.
	InvalidRequest,
	Other,
}

#[derive(Debug)]
pub struct NearbyPage {
	pub results: Vec<PlaceCandidate>,
	pub next_page_token: Option<String>,
	pub status: PageStatus,
	pub raw_status: String,
}

#[derive(Debug, Clone, Default)]
pub struct PlaceDetails {
	pub name: Option<String>,
	pub address: Option<String>,
	pub city: Option<String>,
	pub phone: Option<String>,
	pub website: Option<String>,
	pub rating: Option<f32>,
	pub review_count: Option<i32>,
	pub price_level: Option<i32>,
	pub opening_hours: Option<WeeklyHours>,
	pub photo_refs: Vec<String>,
	pub review_snippets: Vec<String>,
}

pub struct HttpPlaceProvider {
	cfg: PlacesProviderConfig,
	client: Client,
}
impl HttpPlaceProvider {
	pub fn new(cfg: PlacesProviderConfig) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { cfg, client })
	}

	async fn fetch_nearby(
		&self,
		lat: f64,
		lng: f64,
		radius_m: f64,
		page_token: Option<&str>,
	) -> Result<NearbyPage> {
		let url = format!("{}/nearbysearch/json", self.cfg.api_base);
		let mut request = self.client.get(url).query(&[
			("location", format!("{lat},{lng}")),
			("radius", format!("{}", radius_m.round() as i64)),
			("type", self.cfg.place_type.clone()),
			("language", self.cfg.language.clone()),
			("key", self.cfg.api_key.clone()),
		]);

		if let Some(token) = page_token {
			request = request.query(&[("pagetoken", token)]);
		}

		let json: Value = request.send().await?.error_for_status()?.json().await?;

		parse_nearby_page(json)
	}

	async fn fetch_details(&self, place_id: &str, language: &str) -> Result<PlaceDetails> {
		let url = format!("{}/details/json", self.cfg.api_base);
		let json: Value = self
			.client
			.get(url)
			.query(&[
				("place_id", place_id),
				(
					"fields",
					"name,formatted_address,address_components,formatted_phone_number,website,\
					 rating,user_ratings_total,price_level,opening_hours,photos,reviews",
				),
				("language", language),
				("key", self.cfg.api_key.as_str()),
			])
			.send()
			.await?
			.error_for_status()?
			.json()
			.await?;

		parse_place_details(json)
	}

}
impl PlaceProvider for HttpPlaceProvider {
	fn nearby_search<'a>(
		&'a self,
		lat: f64,
		lng: f64,
		radius_m: f64,
		page_token: Option<&'a str>,
	) -> BoxFuture<'a, Result<NearbyPage>> {
		Box::pin(self.fetch_nearby(lat, lng, radius_m, page_token))
	}

	fn place_details<'a>(
		&'a self,
		place_id: &'a str,
		language: &'a str,
	) -> BoxFuture<'a, Result<PlaceDetails>> {
		Box::pin(self.fetch_details(place_id, language))
	}

	fn localized_name<'a>(
		&'a self,
		place_id: &'a str,
		language: &'a str,
	) -> BoxFuture<'a, Result<Option<String>>> {
		Box::pin(async move { Ok(self.fetch_details(place_id, language).await?.name) })
	}
}

pub fn parse_status(raw: &str) -> PageStatus {
	match raw {
		"OK" => PageStatus::Ok,
		"ZERO_RESULTS" => PageStatus::ZeroResults,
		"INVALID_REQUEST" => PageStatus::InvalidRequest,
		_ => PageStatus::Other,
	}
}

pub fn parse_nearby_page(json: Value) -> Result<NearbyPage> {
	let raw_status = json
		.get("status")
		.and_then(Value::as_str)
		.ok_or_else(|| Error::Parse { message: "Response is missing status.".to_string() })?
		.to_string();
	let status = parse_status(&raw_status);
	let next_page_token =
		json.get("next_page_token").and_then(Value::as_str).map(ToString::to_string);
	let mut results = Vec::new();

	if let Some(items) = json.get("results").and_then(Value::as_array) {
		for item in items {
			results.push(parse_candidate(item)?);
		}
	}

	Ok(NearbyPage { results, next_page_token, status, raw_status })
}

fn parse_candidate(item: &Value) -> Result<PlaceCandidate> {
	let provider_id = item
		.get("place_id")
		.and_then(Value::as_str)
		.ok_or_else(|| Error::Parse { message: "Result is missing place_id.".to_string() })?
		.to_string();
	let name = item
		.get("name")
		.and_then(Value::as_str)
		.ok_or_else(|| Error::Parse { message: format!("Result {provider_id} is missing name.") })?
		.to_string();
	let location = item
		.get("geometry")
		.and_then(|geometry| geometry.get("location"))
		.ok_or_else(|| Error::Parse {
			message: format!("Result {provider_id} is missing geometry."),
		})?;
	let lat = location.get("lat").and_then(Value::as_f64).ok_or_else(|| Error::Parse {
		message: format!("Result {provider_id} has a non-numeric latitude."),
	})?;
	let lng = location.get("lng").and_then(Value::as_f64).ok_or_else(|| Error::Parse {
		message: format!("Result {provider_id} has a non-numeric longitude."),
	})?;
	let rating = item.get("rating").and_then(Value::as_f64).map(|value| value as f32);
	let review_count =
		item.get("user_ratings_total").and_then(Value::as_i64).map(|value| value as i32);
	let types = item
		.get("types")
		.and_then(Value::as_array)
		.map(|values| {
			values.iter().filter_map(Value::as_str).map(ToString::to_string).collect()
		})
		.unwrap_or_default();

	Ok(PlaceCandidate { provider_id, name, lat, lng, rating, review_count, types, raw: item.clone() })
}

pub fn parse_place_details(json: Value) -> Result<PlaceDetails> {
	let raw_status = json
		.get("status")
		.and_then(Value::as_str)
		.ok_or_else(|| Error::Parse { message: "Details response is missing status.".to_string() })?;

	if raw_status != "OK" {
		return Err(Error::Status { status: raw_status.to_string() });
	}

	let result = json
		.get("result")
		.ok_or_else(|| Error::Parse { message: "Details response is missing result.".to_string() })?;
	let photo_refs = result
		.get("photos")
		.and_then(Value::as_array)
		.map(|photos| {
			photos
				.iter()
				.filter_map(|photo| photo.get("photo_reference").and_then(Value::as_str))
				.map(ToString::to_string)
				.collect()
		})
		.unwrap_or_default();
	let review_snippets = result
		.get("reviews")
		.and_then(Value::as_array)
		.map(|reviews| {
			reviews
				.iter()
				.filter_map(|review| review.get("text").and_then(Value::as_str))
				.filter(|text| !text.trim().is_empty())
				.map(ToString::to_string)
				.collect()
		})
		.unwrap_or_default();

	Ok(PlaceDetails {
		name: result.get("name").and_then(Value::as_str).map(ToString::to_string),
		address: result.get("formatted_address").and_then(Value::as_str).map(ToString::to_string),
		city: parse_locality(result),
		phone: result
			.get("formatted_phone_number")
			.and_then(Value::as_str)
			.map(ToString::to_string),
		website: result.get("website").and_then(Value::as_str).map(ToString::to_string),
		rating: result.get("rating").and_then(Value::as_f64).map(|value| value as f32),
		review_count: result
			.get("user_ratings_total")
			.and_then(Value::as_i64)
			.map(|value| value as i32),
		price_level: result.get("price_level").and_then(Value::as_i64).map(|value| value as i32),
		opening_hours: parse_opening_hours(result),
		photo_refs,
		review_snippets,
	})
}

fn parse_locality(result: &Value) -> Option<String> {
	let components = result.get("address_components")?.as_array()?;

	components
		.iter()
		.find(|component| {
			component
				.get("types")
				.and_then(Value::as_array)
				.is_some_and(|types| types.iter().any(|t| t.as_str() == Some("locality")))
		})
		.and_then(|component| component.get("long_name").and_then(Value::as_str))
		.map(ToString::to_string)
}

fn parse_opening_hours(result: &Value) -> Option<WeeklyHours> {
	let periods = result.get("opening_hours")?.get("periods")?.as_array()?;
	let mut out = Vec::new();

	for period in periods {
		let open = period.get("open")?;
		let day = open.get("day").and_then(Value::as_u64)? as u8;
		let open_minute = parse_hhmm(open.get("time").and_then(Value::as_str)?)?;
		// A missing close means the venue never closes that day.
		let close_minute = match period.get("close") {
			Some(close) => parse_hhmm(close.get("time").and_then(Value::as_str)?)?,
			None => open_minute,
		};

		out.push(Period { day, open_minute, close_minute });
	}

	if out.is_empty() { None } else { Some(WeeklyHours { periods: out }) }
}

fn parse_hhmm(raw: &str) -> Option<u16> {
	if raw.len() != 4 {
		return None;
	}

	let hours: u16 = raw[..2].parse().ok()?;
	let minutes: u16 = raw[2..].parse().ok()?;

	if hours > 23 || minutes > 59 {
		return None;
	}

	Some(hours * 60 + minutes)
}
