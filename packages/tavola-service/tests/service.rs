//! Read-path tests against a throwaway Postgres database. Set `TAVOLA_PG_DSN`
//! to run these; they skip otherwise. Providers are fakes and never called by
//! the read path.

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use tavola_config::{
	Bounds, Cache, Config, EmbeddingProviderConfig, Feed, Ingestion, LlmProviderConfig, Matching,
	PlacesProviderConfig, Postgres, Providers, Region, ScoreFallback, Service, Storage,
};
use tavola_providers::ProviderSet;
use tavola_service::{Error, TavolaService, feed, populate, search, venue};
use tavola_storage::{db::Db, models::NewVenue, venues};
use tavola_testkit::{
	TestDatabase, env_dsn,
	fakes::{self, FakeEmbedding, FakeLlm, FakePlaces, empty_page},
};

fn test_config(dsn: &str) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "warn".to_string() },
		storage: Storage { postgres: Postgres { dsn: dsn.to_string(), pool_max_conns: 2 } },
		providers: Providers {
			places: PlacesProviderConfig {
				api_base: "http://localhost".to_string(),
				api_key: "k".to_string(),
				language: "en".to_string(),
				secondary_language: "he".to_string(),
				place_type: "restaurant".to_string(),
				timeout_ms: 1_000,
				page_cap: 3,
				result_cap: 60,
				page_token_delay_ms: 0,
				token_retry_delay_ms: 0,
			},
			llm: LlmProviderConfig {
				api_base: "http://localhost".to_string(),
				api_key: "k".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "test".to_string(),
				temperature: 0.2,
				timeout_ms: 1_000,
				default_headers: serde_json::Map::new(),
			},
			embedding: EmbeddingProviderConfig {
				api_base: "http://localhost".to_string(),
				api_key: "k".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "test".to_string(),
				dimensions: 4,
				max_input_chars: 4_000,
				timeout_ms: 1_000,
				default_headers: serde_json::Map::new(),
			},
		},
		region: Region {
			name: "tlv".to_string(),
			bounds: Bounds { min_lat: 32.0, min_lng: 34.7, max_lat: 32.15, max_lng: 34.85 },
			canonical_names: vec!["Tel Aviv-Yafo".to_string()],
			grid_step_deg: 0.01,
			dense_areas: vec![],
			landmarks: vec![],
			default_radius_m: 1_000.0,
			membership_policy: "coords_or_name".to_string(),
		},
		ingestion: Ingestion {
			freshness_days: 30,
			batch_size: 5,
			delay_between_batches_ms: 0,
			delay_between_areas_ms: 0,
			quadrant_delay_ms: 0,
			max_depth: 2,
			min_radius_m: 100.0,
			max_retries: 2,
			retry_base_delay_ms: 0,
		},
		matching: Matching {
			embedding_weight: 0.5,
			rating_weight: 0.25,
			prior_weight: 0.25,
			prior: 0.75,
			fallback: ScoreFallback { strategy: "fixed".to_string(), value: 75, min: 70, max: 90 },
		},
		cache: Cache {
			feed_ttl_seconds: 300,
			search_ttl_seconds: 300,
			status_ttl_seconds: 300,
			coord_decimals: 3,
		},
		feed: Feed { default_radius_m: 5_000.0, default_limit: 10, max_limit: 50 },
	}
}

async fn setup() -> Option<(TestDatabase, Arc<TavolaService>)> {
	let Some(dsn) = env_dsn() else {
		eprintln!("TAVOLA_PG_DSN not set; skipping.");

		return None;
	};
	let test_db = TestDatabase::new(&dsn).await.expect("test database failed");
	let cfg = test_config(test_db.dsn());
	let db = Db::connect(&cfg.storage.postgres).await.expect("connect failed");

	db.ensure_schema().await.expect("schema failed");

	let providers = ProviderSet {
		places: Arc::new(FakePlaces::new(|_, _, _, _| Ok(empty_page()))),
		llm: Arc::new(FakeLlm::new("unused", vec![])),
		embedding: Arc::new(FakeEmbedding::new(4)),
	};

	Some((test_db, Arc::new(TavolaService::new(cfg, db, providers))))
}

fn new_venue(id: &str, name: &str, city: &str, lat: f64, lng: f64) -> NewVenue {
	NewVenue {
		provider_id: id.to_string(),
		name: name.to_string(),
		name_localized: None,
		address: None,
		city: Some(city.to_string()),
		lat: Some(lat),
		lng: Some(lng),
		phone: None,
		website: None,
		rating: Some(4.2),
		review_count: Some(120),
		price_level: Some(2),
		categories: vec!["seafood".to_string()],
		kosher: false,
		vegetarian: false,
		opening_hours: None,
		photo_refs: vec![],
		review_snippets: vec![],
		summary_text: Some("Fish by the port.".to_string()),
		summary_embedding: Some(vec![0.5, 0.5, 0.0, 0.0]),
		reviews_embedding: None,
	}
}

async fn seed_profile(db: &Db, user_id: Uuid, username: &str) {
	sqlx::query("INSERT INTO profiles (user_id, username) VALUES ($1, $2)")
		.bind(user_id)
		.bind(username)
		.execute(&db.pool)
		.await
		.expect("profile insert failed");
}

async fn seed_review(db: &Db, venue_id: &str, user_id: Uuid, age_seconds: i64) -> Uuid {
	let review_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO reviews (review_id, venue_id, user_id, rating, body, created_at)
VALUES ($1, $2, $3, 4.0, 'Great.', now() - make_interval(secs => $4))",
	)
	.bind(review_id)
	.bind(venue_id)
	.bind(user_id)
	.bind(age_seconds as f64)
	.execute(&db.pool)
	.await
	.expect("review insert failed");

	review_id
}

#[tokio::test]
async fn search_rejects_short_queries() {
	let Some((test_db, service)) = setup().await else { return };

	let result = search::search(&service, " a ", None).await;

	assert!(matches!(result, Err(Error::Validation(_))));

	test_db.cleanup().await.expect("cleanup failed");
}

#[tokio::test]
async fn search_matches_name_and_category() {
	let Some((test_db, service)) = setup().await else { return };
	let db = &service.db;

	venues::upsert_venue(db, &new_venue("v1", "HaBasta", "Tel Aviv-Yafo", 32.06, 34.77))
		.await
		.expect("upsert failed");
	venues::upsert_venue(db, &new_venue("v2", "Pasta Bar", "Tel Aviv-Yafo", 32.07, 34.78))
		.await
		.expect("upsert failed");

	let by_name = search::search(&service, "habasta", None).await.expect("search failed");

	assert_eq!(by_name["venues"].as_array().expect("not an array").len(), 1);
	assert_eq!(by_name["venues"][0]["id"], "v1");

	// Both seeded venues carry the seafood category.
	let by_category = search::search(&service, "seafood", None).await.expect("search failed");

	assert_eq!(by_category["venues"].as_array().expect("not an array").len(), 2);

	test_db.cleanup().await.expect("cleanup failed");
}

#[tokio::test]
async fn feed_paginates_and_reports_has_more() {
	let Some((test_db, service)) = setup().await else { return };
	let db = &service.db;
	let author = Uuid::new_v4();

	venues::upsert_venue(db, &new_venue("v1", "HaBasta", "Tel Aviv-Yafo", 32.06, 34.77))
		.await
		.expect("upsert failed");
	seed_profile(db, author, "noa").await;

	for i in 0..23 {
		seed_review(db, "v1", author, i).await;
	}

	let params = feed::FeedParams {
		latitude: Some(32.06),
		longitude: Some(34.77),
		..feed::FeedParams::default()
	};
	let first = feed::feed(&service, &params).await.expect("feed failed");

	assert_eq!(first["reviews"].as_array().expect("not an array").len(), 10);
	assert_eq!(first["has_more"], true);
	assert_eq!(first["reviews"][0]["author"]["username"], "noa");
	assert_eq!(first["reviews"][0]["venue"]["id"], "v1");

	// Zero-based pages: 23 reviews at a limit of 10 end on page 2.
	let last = feed::feed(
		&service,
		&feed::FeedParams { page: Some(2), ..params.clone() },
	)
	.await
	.expect("feed failed");

	assert_eq!(last["reviews"].as_array().expect("not an array").len(), 3);
	assert_eq!(last["has_more"], false);

	test_db.cleanup().await.expect("cleanup failed");
}

#[tokio::test]
async fn friends_tab_shows_only_followed_authors() {
	let Some((test_db, service)) = setup().await else { return };
	let db = &service.db;
	let caller = Uuid::new_v4();
	let friend = Uuid::new_v4();
	let stranger = Uuid::new_v4();

	venues::upsert_venue(db, &new_venue("v1", "HaBasta", "Tel Aviv-Yafo", 32.06, 34.77))
		.await
		.expect("upsert failed");
	seed_profile(db, friend, "friend").await;
	seed_profile(db, stranger, "stranger").await;
	seed_review(db, "v1", friend, 10).await;
	seed_review(db, "v1", stranger, 5).await;
	sqlx::query("INSERT INTO follows (follower_id, followee_id) VALUES ($1, $2)")
		.bind(caller)
		.bind(friend)
		.execute(&db.pool)
		.await
		.expect("follow insert failed");

	let params = feed::FeedParams {
		latitude: Some(32.06),
		longitude: Some(34.77),
		tab: Some("friends".to_string()),
		user_id: Some(caller),
		..feed::FeedParams::default()
	};
	let response = feed::feed(&service, &params).await.expect("feed failed");
	let reviews = response["reviews"].as_array().expect("not an array");

	assert_eq!(reviews.len(), 1);
	assert_eq!(reviews[0]["author"]["username"], "friend");

	// Without a user the friends tab is meaningless.
	let anonymous = feed::FeedParams { user_id: None, ..params };

	assert!(matches!(feed::feed(&service, &anonymous).await, Err(Error::Validation(_))));

	test_db.cleanup().await.expect("cleanup failed");
}

#[tokio::test]
async fn anonymous_feed_is_cached_and_personalized_feed_is_not() {
	let Some((test_db, service)) = setup().await else { return };
	let db = &service.db;
	let author = Uuid::new_v4();

	venues::upsert_venue(db, &new_venue("v1", "HaBasta", "Tel Aviv-Yafo", 32.06, 34.77))
		.await
		.expect("upsert failed");
	seed_profile(db, author, "noa").await;
	seed_review(db, "v1", author, 10).await;

	let params = feed::FeedParams {
		latitude: Some(32.06),
		longitude: Some(34.77),
		..feed::FeedParams::default()
	};
	let first = feed::feed(&service, &params).await.expect("feed failed");

	assert_eq!(first["reviews"].as_array().expect("not an array").len(), 1);

	// A new review lands after the anonymous response was cached.
	seed_review(db, "v1", author, 0).await;

	let cached = feed::feed(&service, &params).await.expect("feed failed");

	assert_eq!(cached["reviews"].as_array().expect("not an array").len(), 1);

	let personalized = feed::feed(
		&service,
		&feed::FeedParams { user_id: Some(author), ..params },
	)
	.await
	.expect("feed failed");

	assert_eq!(personalized["reviews"].as_array().expect("not an array").len(), 2);

	test_db.cleanup().await.expect("cleanup failed");
}

#[tokio::test]
async fn venue_detail_carries_social_and_caller_state() {
	let Some((test_db, service)) = setup().await else { return };
	let db = &service.db;
	let caller = Uuid::new_v4();
	let author = Uuid::new_v4();

	venues::upsert_venue(db, &new_venue("v1", "HaBasta", "Tel Aviv-Yafo", 32.06, 34.77))
		.await
		.expect("upsert failed");
	seed_profile(db, author, "noa").await;

	let review_id = seed_review(db, "v1", author, 10).await;

	sqlx::query("INSERT INTO review_likes (review_id, user_id) VALUES ($1, $2)")
		.bind(review_id)
		.bind(caller)
		.execute(&db.pool)
		.await
		.expect("like insert failed");
	sqlx::query("INSERT INTO wishlist_items (user_id, venue_id) VALUES ($1, 'v1')")
		.bind(caller)
		.execute(&db.pool)
		.await
		.expect("wishlist insert failed");

	let detail =
		venue::venue_detail(&service, "v1", Some(caller)).await.expect("detail failed");

	assert_eq!(detail["venue"]["id"], "v1");
	assert_eq!(detail["venue"]["wishlisted"], true);

	let reviews = detail["reviews"].as_array().expect("not an array");

	assert_eq!(reviews.len(), 1);
	assert_eq!(reviews[0]["like_count"], 1);
	assert_eq!(reviews[0]["liked_by_caller"], true);

	// Unknown venues surface as a not-found storage error.
	assert!(venue::venue_detail(&service, "missing", None).await.is_err());

	test_db.cleanup().await.expect("cleanup failed");
}

#[tokio::test]
async fn status_reports_totals_and_city_counts() {
	let Some((test_db, service)) = setup().await else { return };
	let db = &service.db;

	venues::upsert_venue(db, &new_venue("v1", "HaBasta", "Tel Aviv-Yafo", 32.06, 34.77))
		.await
		.expect("upsert failed");
	venues::upsert_venue(db, &new_venue("v2", "Pasta Bar", "Tel Aviv-Yafo", 32.07, 34.78))
		.await
		.expect("upsert failed");

	let mut third = new_venue("v3", "North End", "Herzliya", 32.16, 34.84);

	third.summary_embedding = None;

	venues::upsert_venue(db, &third).await.expect("upsert failed");

	let status = populate::status(&service).await.expect("status failed");

	assert_eq!(status["total"], 3);
	assert_eq!(status["with_embeddings"], 2);
	assert_eq!(status["city_counts"][0]["city"], "Tel Aviv-Yafo");
	assert_eq!(status["city_counts"][0]["count"], 2);

	test_db.cleanup().await.expect("cleanup failed");
}

#[tokio::test]
async fn populate_rejects_an_unknown_region() {
	let Some((test_db, service)) = setup().await else { return };
	let request = populate::PopulateRequest {
		region: Some("gotham".to_string()),
		..Default::default()
	};
	let result = populate::run_populate(&service, &request).await;

	assert!(matches!(result, Err(Error::Validation(_))));

	test_db.cleanup().await.expect("cleanup failed");
}

#[tokio::test]
async fn a_dropped_populate_request_leaves_the_run_and_the_guard_intact() {
	let Some(dsn) = env_dsn() else {
		eprintln!("TAVOLA_PG_DSN not set; skipping.");

		return;
	};
	let test_db = TestDatabase::new(&dsn).await.expect("test database failed");
	let mut cfg = test_config(test_db.dsn());

	// A token chain keeps the scanner parked long enough to abort the caller
	// mid-run.
	cfg.providers.places.page_token_delay_ms = 300;

	let db = Db::connect(&cfg.storage.postgres).await.expect("connect failed");

	db.ensure_schema().await.expect("schema failed");

	let providers = ProviderSet {
		places: Arc::new(FakePlaces::new(|_, _, _, token| {
			if token.is_none() {
				Ok(fakes::ok_page(vec![fakes::candidate("p1", 32.068, 34.768, 4.4)], Some("t1")))
			} else {
				Ok(empty_page())
			}
		})),
		llm: Arc::new(FakeLlm::new("Stall with great hummus.", vec!["street_food".to_string()])),
		embedding: Arc::new(FakeEmbedding::new(4)),
	};
	let service = Arc::new(TavolaService::new(cfg, db, providers));
	let handler = tokio::spawn({
		let service = Arc::clone(&service);

		async move { populate::run_populate(&service, &populate::PopulateRequest::default()).await }
	});

	tokio::time::sleep(Duration::from_millis(50)).await;
	// The client goes away; the detached run keeps going.
	handler.abort();

	let rejected = populate::run_populate(&service, &populate::PopulateRequest::default()).await;

	assert!(matches!(rejected, Err(Error::Validation(_))));

	// The guard is released once the run finishes on its own.
	let mut released = false;

	for _ in 0..50 {
		tokio::time::sleep(Duration::from_millis(100)).await;

		if populate::run_populate(&service, &populate::PopulateRequest::default()).await.is_ok() {
			released = true;

			break;
		}
	}

	assert!(released);

	test_db.cleanup().await.expect("cleanup failed");
}
