//! # Route Layer
//!
//! One module per resource. `api_router` merges them under `/api` and adds
//! the health probe at the root. Handlers stay thin: extract, call into the
//! repositories (and `arnica-core` where a decision is involved), map rows
//! to JSON.

pub mod branches;
pub mod cart;
pub mod catalog;
pub mod delivery;
pub mod inventory;
pub mod orders;
pub mod prescriptions;
pub mod products;
pub mod reports;
pub mod safety;
pub mod staff;
pub mod wishlist;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::SharedState;

/// Assembles the application router.
pub fn api_router(state: SharedState) -> Router {
    let api = Router::new()
        .merge(products::router())
        .merge(catalog::router())
        .merge(branches::router())
        .merge(inventory::router())
        .merge(cart::router())
        .merge(wishlist::router())
        .merge(prescriptions::router())
        .merge(orders::router())
        .merge(delivery::router())
        .merge(reports::router())
        .merge(safety::router())
        .merge(staff::router());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    database: bool,
}

/// Service and database liveness.
async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let (code, status) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (code, Json(HealthResponse { status, database }))
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Parses a query or body string into one of the snake_case wire enums
/// (order status, prescription status, roles, report grouping).
pub(crate) fn parse_enum<T: DeserializeOwned>(field: &str, value: &str) -> Result<T, ApiError> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| ApiError::bad_request(format!("Unknown {field}: {value}")))
}

/// Required query parameters arrive as options so a missing one answers
/// with the standard error body instead of the extractor rejection.
pub(crate) fn require_param<T>(value: Option<T>, name: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::bad_request(format!("{name} query parameter is required")))
}

pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("{field} must be a YYYY-MM-DD date")))
}

// =============================================================================
// Unit Tests
// =============================================================================
