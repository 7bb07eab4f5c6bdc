use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use api_types::{
    Ack, AlertReport, ErrorBody, EtaResponse, LocationReport, StatusReport, VehicleSnapshot,
};
use bus_tracker_fleet::{Coordinates, VehicleIdentifier};

use crate::error::IngestError;
use crate::socket;
use crate::tracker::Tracker;
use crate::wire;

pub fn create_router(tracker: Tracker) -> Router {
    Router::new()
        .route("/api/driver/location", post(post_location))
        .route("/api/driver/status", post(post_status))
        .route("/api/driver/alert", post(post_alert))
        .route("/api/passenger/eta/{vehicle_id}", get(get_eta))
        .route("/api/passenger/vehicles", get(list_vehicles))
        .route("/api/passenger/vehicles/{vehicle_id}", get(get_vehicle))
        .route("/ws", get(socket::upgrade))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(tracker)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Ingest(IngestError),
    BadRequest(String),
    NotFound(String),
}

impl From<IngestError> for ApiError {
    fn from(error: IngestError) -> Self {
        Self::Ingest(error)
    }
}

impl From<bus_tracker_fleet::FleetError> for ApiError {
    fn from(error: bus_tracker_fleet::FleetError) -> Self {
        Self::Ingest(error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Ingest(error @ IngestError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, error.to_string())
            }
            Self::Ingest(error @ IngestError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, error.to_string())
            }
            Self::Ingest(error @ IngestError::Stale(_)) => {
                (StatusCode::CONFLICT, error.to_string())
            }
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}

// ============================================================================
// Driver endpoints
// ============================================================================

async fn post_location(
    State(tracker): State<Tracker>,
    Json(report): Json<LocationReport>,
) -> Result<Json<Ack>, ApiError> {
    let (vehicle, reading) = wire::location_reading(&report)?;
    tracker.gateway.ingest_location(&vehicle, reading)?;
    Ok(Json(Ack::OK))
}

async fn post_status(
    State(tracker): State<Tracker>,
    Json(report): Json<StatusReport>,
) -> Result<Json<Ack>, ApiError> {
    let (vehicle, status) = wire::status_change(&report)?;
    tracker.gateway.ingest_status(&vehicle, status)?;
    Ok(Json(Ack::OK))
}

async fn post_alert(
    State(tracker): State<Tracker>,
    Json(report): Json<AlertReport>,
) -> Result<Json<Ack>, ApiError> {
    let (vehicle, kind) = wire::alert_request(&report)?;
    tracker.gateway.ingest_alert(&vehicle, kind, &report.message)?;
    Ok(Json(Ack::OK))
}

// ============================================================================
// Passenger endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
struct EtaQuery {
    lat: Option<f64>,
    lng: Option<f64>,
}

async fn get_eta(
    State(tracker): State<Tracker>,
    Path(vehicle_id): Path<String>,
    Query(query): Query<EtaQuery>,
) -> Result<Json<EtaResponse>, ApiError> {
    let (Some(lat), Some(lng)) = (query.lat, query.lng) else {
        return Err(ApiError::BadRequest("lat/lng required".into()));
    };
    let observer = Coordinates::new(lat, lng)?;

    let response = tracker
        .eta
        .estimate(&VehicleIdentifier::new(vehicle_id), observer)
        .map(|eta| EtaResponse {
            eta_seconds: Some(eta.seconds),
            eta_minutes: Some(eta.minutes()),
            distance_m: Some(eta.distance_m),
        })
        .unwrap_or_default();

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct VehicleSearch {
    q: Option<String>,
}

async fn list_vehicles(
    State(tracker): State<Tracker>,
    Query(search): Query<VehicleSearch>,
) -> Json<Vec<VehicleSnapshot>> {
    let needle = search.q.unwrap_or_default();

    Json(
        tracker
            .store
            .snapshot()
            .iter()
            .filter(|record| record.vehicle_id.as_str().contains(needle.as_str()))
            .map(wire::snapshot)
            .collect(),
    )
}

async fn get_vehicle(
    State(tracker): State<Tracker>,
    Path(vehicle_id): Path<String>,
) -> Result<Json<VehicleSnapshot>, ApiError> {
    tracker
        .store
        .get(&VehicleIdentifier::new(&vehicle_id))
        .map(|record| Json(wire::snapshot(&record)))
        .ok_or_else(|| ApiError::NotFound(format!("Vehicle not found: {vehicle_id}")))
}

async fn health() -> &'static str {
    "OK"
}
