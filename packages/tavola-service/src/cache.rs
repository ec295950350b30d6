use std::sync::Mutex;

use ahash::AHashMap;
use serde_json::Value;
use time::OffsetDateTime;

struct Entry {
	value: Value,
	expires_at: OffsetDateTime,
}

/// TTL response cache. Entries expire on read; there is no invalidation API.
/// Personalized responses must never be put here.
#[derive(Default)]
pub struct ResponseCache {
	entries: Mutex<AHashMap<String, Entry>>,
}
impl ResponseCache {
	pub fn get(&self, key: &str) -> Option<Value> {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let entry = entries.get(key)?;

		if entry.expires_at <= OffsetDateTime::now_utc() {
			entries.remove(key);

			return None;
		}

		Some(entry.value.clone())
	}

	pub fn put(&self, key: String, value: Value, ttl_seconds: i64) {
		let expires_at = OffsetDateTime::now_utc() + time::Duration::seconds(ttl_seconds);
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.insert(key, Entry { value, expires_at });
	}
}

/// Cache key: namespace plus the blake3 hash of the canonical JSON encoding
/// of the normalized parameters. `serde_json` maps are ordered, so equal
/// parameter sets always hash identically.
pub fn cache_key(namespace: &str, params: &Value) -> String {
	let canonical = params.to_string();
	let digest = blake3::hash(canonical.as_bytes());

	format!("{namespace}:{}", digest.to_hex())
}

/// Coordinates are rounded before keying so that nearby requests share an
/// entry instead of fragmenting the cache.
pub fn round_coord(value: f64, decimals: u32) -> f64 {
	let factor = 10_f64.powi(decimals as i32);

	(value * factor).round() / factor
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn expired_entries_are_not_returned() {
		let cache = ResponseCache::default();

		cache.put("k".to_string(), json!(1), -1);

		assert_eq!(cache.get("k"), None);

		cache.put("k".to_string(), json!(2), 60);

		assert_eq!(cache.get("k"), Some(json!(2)));
	}

	#[test]
	fn equal_parameter_sets_share_a_key() {
		let a = cache_key("feed", &json!({ "lat": 32.07, "lng": 34.78, "page": 1 }));
		let b = cache_key("feed", &json!({ "lat": 32.07, "lng": 34.78, "page": 1 }));
		let c = cache_key("feed", &json!({ "lat": 32.07, "lng": 34.78, "page": 2 }));

		assert_eq!(a, b);
		assert_ne!(a, c);
	}

	#[test]
	fn namespaces_partition_the_key_space() {
		let params = json!({ "q": "pizza" });

		assert_ne!(cache_key("search", &params), cache_key("feed", &params));
	}

	#[test]
	fn coordinates_round_to_the_configured_precision() {
		assert_eq!(round_coord(32.071_949, 3), 32.072);
		assert_eq!(round_coord(34.7, 3), 34.7);
		assert_eq!(round_coord(-0.000_4, 3), -0.0);
	}
}
