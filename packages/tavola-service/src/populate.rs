use std::{
	sync::{Arc, atomic::Ordering},
	time::Instant,
};

use serde::Deserialize;
use serde_json::{Value, json};

use tavola_ingest::pipeline::{self, PopulateOptions};
use tavola_storage::venues;

use crate::{Error, Result, TavolaService, cache};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PopulateRequest {
	pub region: Option<String>,
	#[serde(default)]
	pub force_update: bool,
	pub batch_size: Option<usize>,
	pub delay_between_batches_ms: Option<u64>,
	pub delay_between_areas_ms: Option<u64>,
	pub radius_m: Option<f64>,
}

/// Clears `populate_running` when the run ends, however it ends.
struct RunGuard(Arc<TavolaService>);
impl Drop for RunGuard {
	fn drop(&mut self) {
		self.0.populate_running.store(false, Ordering::SeqCst);
	}
}

/// Kicks off a populate run with per-request overrides. Only one run may be
/// in flight; a second request is rejected instead of queued. The run itself
/// executes on a detached task: a client that disconnects mid-run neither
/// cancels the ingestion nor leaves the guard set.
pub async fn run_populate(
	service: &Arc<TavolaService>,
	request: &PopulateRequest,
) -> Result<Value> {
	if let Some(region) = request.region.as_deref()
		&& region != service.cfg.region.name
	{
		return Err(Error::Validation(format!("Unknown region {region:?}.")));
	}

	if service
		.populate_running
		.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
		.is_err()
	{
		return Err(Error::Validation("A populate run is already in progress.".to_string()));
	}

	let options = PopulateOptions {
		force_update: request.force_update,
		batch_size: request.batch_size,
		delay_between_batches_ms: request.delay_between_batches_ms,
		delay_between_areas_ms: request.delay_between_areas_ms,
		radius_m: request.radius_m,
	};
	let guard = RunGuard(Arc::clone(service));
	let run = tokio::spawn(async move {
		let service = &guard.0;
		let started = Instant::now();
		let stats = pipeline::run(&service.cfg, &service.db, &service.providers, &options).await?;

		Ok::<Value, Error>(json!({
			"stats": stats,
			"duration_seconds": started.elapsed().as_secs_f64(),
		}))
	});

	match run.await {
		Ok(response) => response,
		Err(err) => Err(Error::Internal(format!("Populate task failed: {err}."))),
	}
}

/// Snapshot of what the knowledge base currently holds.
pub async fn status(service: &TavolaService) -> Result<Value> {
	let key = cache::cache_key("status", &json!({}));

	if let Some(hit) = service.cache.get(&key) {
		return Ok(hit);
	}

	let db = &service.db;
	let ((total, with_embeddings), cities) =
		tokio::try_join!(venues::venue_totals(db), venues::city_counts(db))?;
	let city_counts: Vec<Value> = cities
		.iter()
		.map(|city| json!({ "city": city.city, "count": city.count }))
		.collect();
	let response = json!({
		"total": total,
		"with_embeddings": with_embeddings,
		"city_counts": city_counts,
	});

	service.cache.put(key, response.clone(), service.cfg.cache.status_ttl_seconds);

	Ok(response)
}
