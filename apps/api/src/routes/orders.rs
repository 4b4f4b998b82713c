//! Order endpoints: checkout, listings, detail, staff status moves, and
//! customer cancellation.
//!
//! Status moves validate against the transition graph before touching the
//! database. Cancellation is its own endpoint because it restores stock;
//! the generic status endpoint refuses to write `cancelled`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use arnica_core::{Order, OrderItem, OrderStatus, Shipping};

use crate::error::{ApiError, ErrorCode};
use crate::routes::parse_enum;
use crate::services::checkout::{self, CheckoutRequest, CheckoutResponse};
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/orders/checkout", post(place))
        .route("/orders", get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", post(set_status))
        .route("/orders/:id/cancel", post(cancel))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    user_id: Option<String>,
    branch_id: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody {
    status: String,
}

/// An order with its item snapshots and shipping row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderDetail {
    #[serde(flatten)]
    order: Order,
    items: Vec<OrderItem>,
    shipping: Option<Shipping>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CancelResponse {
    order_id: String,
    status: OrderStatus,
    /// Units returned to inventory batches.
    restored_units: i64,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /api/orders/checkout`
async fn place(
    State(state): State<SharedState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let response = checkout::process(&state, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /api/orders?userId=` or `GET /api/orders?branchId=&status=`
async fn list_orders(
    State(state): State<SharedState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    match (params.user_id, params.branch_id) {
        (Some(user_id), None) => {
            let orders = state.db.orders().list_for_user(&user_id).await?;
            Ok(Json(orders))
        }
        (None, Some(branch_id)) => {
            let status = params
                .status
                .map(|s| parse_enum::<OrderStatus>("status", &s))
                .transpose()?;
            let orders = state.db.orders().list_for_branch(&branch_id, status).await?;
            Ok(Json(orders))
        }
        _ => Err(ApiError::bad_request(
            "Provide exactly one of userId or branchId",
        )),
    }
}

/// `GET /api/orders/:id`
async fn get_order(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<OrderDetail>, ApiError> {
    let order = state
        .db
        .orders()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Order", &id))?;
    let items = state.db.orders().get_items(&id).await?;
    let shipping = state.db.orders().get_shipping(&id).await?;

    Ok(Json(OrderDetail {
        order,
        items,
        shipping,
    }))
}

/// `POST /api/orders/:id/status` - staff move along the lifecycle.
async fn set_status(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Order>, ApiError> {
    let next = parse_enum::<OrderStatus>("status", &body.status)?;
    if next == OrderStatus::Cancelled {
        return Err(ApiError::bad_request(
            "Cancellation goes through the cancel endpoint",
        ));
    }

    let order = state
        .db
        .orders()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Order", &id))?;
    if !order.status.can_transition_to(next) {
        return Err(ApiError::unprocessable(
            ErrorCode::IllegalTransition,
            format!(
                "Order {} cannot move from {} to {}",
                id,
                order.status.as_str(),
                next.as_str()
            ),
        ));
    }

    let now = Utc::now();
    state.db.orders().set_status(&id, order.status, next, now).await?;
    info!(order_id = %id, from = order.status.as_str(), to = next.as_str(), "Order status changed");

    let updated = state
        .db
        .orders()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Order", &id))?;
    Ok(Json(updated))
}

/// `POST /api/orders/:id/cancel` - cancel and restore drawn stock.
async fn cancel(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let order = state
        .db
        .orders()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Order", &id))?;
    if !order.status.can_cancel() {
        return Err(ApiError::unprocessable(
            ErrorCode::IllegalTransition,
            format!(
                "Order {} in status {} can no longer be cancelled",
                id,
                order.status.as_str()
            ),
        ));
    }

    let restored_units = state
        .db
        .orders()
        .cancel_order(&id, order.status, Utc::now())
        .await?;
    info!(order_id = %id, restored_units, "Order cancelled");

    Ok(Json(CancelResponse {
        order_id: id,
        status: OrderStatus::Cancelled,
        restored_units,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================
