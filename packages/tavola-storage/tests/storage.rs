//! Storage tests against a throwaway Postgres database. Set `TAVOLA_PG_DSN`
//! to run these; they skip otherwise.

use tavola_config::Postgres;
use tavola_storage::{db::Db, models::NewVenue, venues};
use tavola_testkit::{TestDatabase, env_dsn};

async fn setup() -> Option<(TestDatabase, Db)> {
	let Some(dsn) = env_dsn() else {
		eprintln!("TAVOLA_PG_DSN not set; skipping.");

		return None;
	};
	let test_db = TestDatabase::new(&dsn).await.expect("test database failed");
	let db = Db::connect(&Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 })
		.await
		.expect("connect failed");

	db.ensure_schema().await.expect("schema failed");

	Some((test_db, db))
}

fn venue(id: &str, name: &str, lat: f64, lng: f64) -> NewVenue {
	NewVenue {
		provider_id: id.to_string(),
		name: name.to_string(),
		name_localized: None,
		address: None,
		city: Some("Tel Aviv-Yafo".to_string()),
		lat: Some(lat),
		lng: Some(lng),
		phone: None,
		website: None,
		rating: Some(4.3),
		review_count: Some(88),
		price_level: None,
		categories: vec!["cafe".to_string()],
		kosher: false,
		vegetarian: false,
		opening_hours: None,
		photo_refs: vec![],
		review_snippets: vec![],
		summary_text: None,
		summary_embedding: Some(vec![0.1, 0.2, 0.3, 0.4]),
		reviews_embedding: None,
	}
}

#[tokio::test]
async fn schema_is_idempotent() {
	let Some((test_db, db)) = setup().await else { return };

	// A second run must be a no-op, not a failure.
	db.ensure_schema().await.expect("second schema run failed");

	test_db.cleanup().await.expect("cleanup failed");
}

#[tokio::test]
async fn upsert_is_idempotent_and_updated_at_is_monotonic() {
	let Some((test_db, db)) = setup().await else { return };

	venues::upsert_venue(&db, &venue("v1", "Cafe Noga", 32.06, 34.77))
		.await
		.expect("upsert failed");

	let first =
		venues::venue_last_updated(&db, "v1").await.expect("lookup failed").expect("missing row");
	let mut renamed = venue("v1", "Cafe Noga Renamed", 32.06, 34.77);

	renamed.rating = Some(4.6);

	venues::upsert_venue(&db, &renamed).await.expect("second upsert failed");

	let rows = venues::venues_by_ids(&db, &["v1".to_string()]).await.expect("fetch failed");

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].name, "Cafe Noga Renamed");
	assert_eq!(rows[0].rating, Some(4.6));
	// Strictly greater even when the wall clock has not visibly advanced.
	assert!(rows[0].updated_at > first);

	test_db.cleanup().await.expect("cleanup failed");
}

#[tokio::test]
async fn nearest_query_orders_by_distance_and_falls_back_to_a_sample() {
	let Some((test_db, db)) = setup().await else { return };

	venues::upsert_venue(&db, &venue("near", "Near", 32.070, 34.770))
		.await
		.expect("upsert failed");
	venues::upsert_venue(&db, &venue("nearer", "Nearer", 32.0701, 34.7701))
		.await
		.expect("upsert failed");
	venues::upsert_venue(&db, &venue("far", "Far", 32.10, 34.83)).await.expect("upsert failed");

	let ids = venues::nearest_venue_ids(&db, 32.0701, 34.7701, 0.02, 0.02, 10)
		.await
		.expect("query failed");

	assert_eq!(ids, vec!["nearer".to_string(), "near".to_string()]);

	// No venue inside the box: the caller switches to the sample.
	let empty = venues::nearest_venue_ids(&db, 31.0, 34.0, 0.01, 0.01, 10)
		.await
		.expect("query failed");

	assert!(empty.is_empty());

	let sample = venues::sample_venue_ids(&db, 2).await.expect("sample failed");

	assert_eq!(sample.len(), 2);

	test_db.cleanup().await.expect("cleanup failed");
}

#[tokio::test]
async fn geo_less_venues_are_skipped_by_the_nearest_query() {
	let Some((test_db, db)) = setup().await else { return };
	let mut no_geo = venue("no-geo", "No Geo", 0.0, 0.0);

	no_geo.lat = None;
	no_geo.lng = None;

	venues::upsert_venue(&db, &no_geo).await.expect("upsert failed");

	let ids =
		venues::nearest_venue_ids(&db, 0.0, 0.0, 1.0, 1.0, 10).await.expect("query failed");

	assert!(ids.is_empty());

	test_db.cleanup().await.expect("cleanup failed");
}

#[tokio::test]
async fn scoring_rows_come_back_in_one_batch() {
	let Some((test_db, db)) = setup().await else { return };

	venues::upsert_venue(&db, &venue("v1", "One", 32.06, 34.77)).await.expect("upsert failed");

	let mut without_embedding = venue("v2", "Two", 32.07, 34.78);

	without_embedding.summary_embedding = None;

	venues::upsert_venue(&db, &without_embedding).await.expect("upsert failed");

	let rows = venues::scoring_rows_by_ids(&db, &["v1".to_string(), "v2".to_string()])
		.await
		.expect("fetch failed");

	assert_eq!(rows.len(), 2);

	let v1 = rows.iter().find(|row| row.provider_id == "v1").expect("missing v1");

	assert_eq!(v1.summary_embedding.as_ref().map(Vec::len), Some(4));

	let v2 = rows.iter().find(|row| row.provider_id == "v2").expect("missing v2");

	assert!(v2.summary_embedding.is_none());

	// The empty id set short-circuits without touching the database.
	assert!(venues::scoring_rows_by_ids(&db, &[]).await.expect("fetch failed").is_empty());

	test_db.cleanup().await.expect("cleanup failed");
}
