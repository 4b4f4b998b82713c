//! Delivery endpoints: slot administration, driver assignment, and
//! delivery completion.
//!
//! Slot booking happens inside the checkout transaction; here a branch
//! manages its slot calendar and dispatch runs the driver flow against
//! shipping rows.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use arnica_core::validation;
use arnica_core::{DeliverySlot, Shipping, ValidationError};

use crate::error::{ApiError, ErrorCode};
use crate::routes::{parse_date, require_param};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/delivery/slots", get(open_slots).post(create_slot))
        .route("/delivery/assignments", get(assignments))
        .route("/delivery/:shipping_id/assign", post(assign_driver))
        .route("/delivery/:shipping_id/delivered", post(mark_delivered))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotsQuery {
    branch_id: Option<String>,
    /// Defaults to today.
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSlot {
    branch_id: String,
    date: String,
    /// Human label like "09:00-12:00".
    window: String,
    capacity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentsQuery {
    driver_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignBody {
    driver_id: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/delivery/slots?branchId=&date=` - bookable slots on a date.
async fn open_slots(
    State(state): State<SharedState>,
    Query(params): Query<SlotsQuery>,
) -> Result<Json<Vec<DeliverySlot>>, ApiError> {
    let branch_id = require_param(params.branch_id, "branchId")?;
    let on = match params.date {
        Some(date) => parse_date("date", &date)?,
        None => Utc::now().date_naive(),
    };

    let slots = state.db.delivery().open_slots(&branch_id, on).await?;
    Ok(Json(slots))
}

/// `POST /api/delivery/slots` - a branch opens a delivery window.
async fn create_slot(
    State(state): State<SharedState>,
    Json(body): Json<CreateSlot>,
) -> Result<(StatusCode, Json<DeliverySlot>), ApiError> {
    validation::validate_slot_capacity(body.capacity)?;
    let slot_date = parse_date("date", &body.date)?;
    if slot_date < Utc::now().date_naive() {
        return Err(ValidationError::InvalidFormat {
            field: "date".to_string(),
            reason: "must not be in the past".to_string(),
        }
        .into());
    }
    if body.window.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "window".to_string(),
        }
        .into());
    }

    let slot = DeliverySlot {
        id: Uuid::new_v4().to_string(),
        branch_id: body.branch_id,
        slot_date,
        window: body.window.trim().to_string(),
        capacity: body.capacity,
        booked: 0,
        created_at: Utc::now(),
    };
    state.db.delivery().insert_slot(&slot).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

/// `GET /api/delivery/assignments?driverId=` - a driver's open deliveries.
async fn assignments(
    State(state): State<SharedState>,
    Query(params): Query<AssignmentsQuery>,
) -> Result<Json<Vec<Shipping>>, ApiError> {
    let driver_id = require_param(params.driver_id, "driverId")?;
    let shipments = state.db.delivery().open_assignments(&driver_id).await?;
    Ok(Json(shipments))
}

/// `POST /api/delivery/:shipping_id/assign` - dispatch puts a driver on
/// a delivery. Reassignment before delivery is allowed.
async fn assign_driver(
    State(state): State<SharedState>,
    Path(shipping_id): Path<String>,
    Json(body): Json<AssignBody>,
) -> Result<Json<Shipping>, ApiError> {
    let driver = state
        .db
        .employees()
        .get_by_id(&body.driver_id)
        .await?
        .ok_or_else(|| ApiError::missing("Employee", &body.driver_id))?;
    if !driver.is_active || !driver.role.can_deliver() {
        return Err(ApiError::unprocessable(
            ErrorCode::RoleMismatch,
            format!("Employee {} is not an active driver", driver.id),
        ));
    }

    state
        .db
        .delivery()
        .assign_driver(&shipping_id, &driver.id)
        .await?;
    info!(shipping_id = %shipping_id, driver = %driver.id, "Driver assigned");

    let shipping = state
        .db
        .orders()
        .get_shipping_by_id(&shipping_id)
        .await?
        .ok_or_else(|| ApiError::missing("Shipping", &shipping_id))?;
    Ok(Json(shipping))
}

/// `POST /api/delivery/:shipping_id/delivered` - driver hands the order
/// over; the order completes in the same transaction.
async fn mark_delivered(
    State(state): State<SharedState>,
    Path(shipping_id): Path<String>,
) -> Result<Json<Shipping>, ApiError> {
    state
        .db
        .delivery()
        .mark_delivered(&shipping_id, Utc::now())
        .await?;
    info!(shipping_id = %shipping_id, "Delivery completed");

    let shipping = state
        .db
        .orders()
        .get_shipping_by_id(&shipping_id)
        .await?
        .ok_or_else(|| ApiError::missing("Shipping", &shipping_id))?;
    Ok(Json(shipping))
}

// =============================================================================
// Unit Tests
// =============================================================================
