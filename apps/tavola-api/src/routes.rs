use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use tavola_service::{Error as ServiceError, feed, populate, search, venue};
use tavola_storage::Error as StorageError;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/search", get(search_venues))
		.route("/populate", post(run_populate).get(populate_status))
		.route("/feed", get(get_feed))
		.route("/venue/{id}", get(venue_detail))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
	query: String,
	limit: Option<i64>,
}

async fn search_venues(
	State(state): State<AppState>,
	Query(params): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
	let response = search::search(&state.service, &params.query, params.limit).await?;

	Ok(Json(response))
}

async fn run_populate(
	State(state): State<AppState>,
	Json(payload): Json<populate::PopulateRequest>,
) -> Result<Json<Value>, ApiError> {
	let response = populate::run_populate(&state.service, &payload).await?;

	Ok(Json(response))
}

async fn populate_status(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
	let response = populate::status(&state.service).await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct FeedQuery {
	page: Option<usize>,
	limit: Option<usize>,
	latitude: Option<f64>,
	longitude: Option<f64>,
	radius: Option<f64>,
	tab: Option<String>,
	city: Option<String>,
	user_id: Option<Uuid>,
}

async fn get_feed(
	State(state): State<AppState>,
	Query(params): Query<FeedQuery>,
) -> Result<Json<Value>, ApiError> {
	let params = feed::FeedParams {
		page: params.page,
		limit: params.limit,
		latitude: params.latitude,
		longitude: params.longitude,
		radius: params.radius,
		tab: params.tab,
		city: params.city,
		user_id: params.user_id,
	};
	let response = feed::feed(&state.service, &params).await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct VenueQuery {
	user_id: Option<Uuid>,
}

async fn venue_detail(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Query(params): Query<VenueQuery>,
) -> Result<Json<Value>, ApiError> {
	let response = venue::venue_detail(&state.service, &id, params.user_id).await?;

	Ok(Json(response))
}

/// Service errors mapped onto the wire: caller mistakes keep their message,
/// everything else is logged server-side and surfaced as a generic 500.
#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	message: String,
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::Validation(message) => {
				Self { status: StatusCode::BAD_REQUEST, message }
			},
			ServiceError::Storage(StorageError::NotFound(what)) => {
				Self { status: StatusCode::NOT_FOUND, message: format!("Not found: {what}.") }
			},
			other => {
				tracing::error!(error = %other, "Request failed.");

				Self {
					status: StatusCode::INTERNAL_SERVER_ERROR,
					message: "Internal error.".to_string(),
				}
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status, Json(json!({ "error": self.message }))).into_response()
	}
}
