//! Branch inventory endpoints: stock levels, expiring batches, restock,
//! expired-stock discard.
//!
//! Availability is always derived from unexpired batches; these endpoints
//! never write a "stock" column because none exists.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use arnica_core::validation;
use arnica_core::{InventoryBatch, ValidationError};
use arnica_db::{ExpiringBatch, StockLevel};

use crate::error::ApiError;
use crate::routes::{parse_date, require_param};
use crate::SharedState;

const DEFAULT_EXPIRY_HORIZON_DAYS: i64 = 30;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/inventory", get(stock_levels))
        .route("/inventory/expiring", get(expiring))
        .route("/inventory/restock", post(restock))
        .route("/inventory/discard-expired", post(discard_expired))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BranchQuery {
    branch_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpiringQuery {
    branch_id: Option<String>,
    days: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestockBody {
    branch_id: String,
    product_id: String,
    quantity: i64,
    expiry_date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscardBody {
    branch_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DiscardResponse {
    branch_id: String,
    discarded_units: i64,
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/inventory?branchId=` - per-product totals and soonest expiry.
async fn stock_levels(
    State(state): State<SharedState>,
    Query(params): Query<BranchQuery>,
) -> Result<Json<Vec<StockLevel>>, ApiError> {
    let branch_id = require_param(params.branch_id, "branchId")?;
    let levels = state
        .db
        .inventory()
        .stock_levels(&branch_id, Utc::now().date_naive())
        .await?;
    Ok(Json(levels))
}

/// `GET /api/inventory/expiring?branchId=&days=`
async fn expiring(
    State(state): State<SharedState>,
    Query(params): Query<ExpiringQuery>,
) -> Result<Json<Vec<ExpiringBatch>>, ApiError> {
    let branch_id = require_param(params.branch_id, "branchId")?;
    let days = params.days.unwrap_or(DEFAULT_EXPIRY_HORIZON_DAYS);
    if days < 0 {
        return Err(ApiError::bad_request("days must not be negative"));
    }

    let batches = state
        .db
        .inventory()
        .expiring(&branch_id, days, Utc::now().date_naive())
        .await?;
    Ok(Json(batches))
}

/// `POST /api/inventory/restock` - a new batch arrives at a branch.
async fn restock(
    State(state): State<SharedState>,
    Json(body): Json<RestockBody>,
) -> Result<(StatusCode, Json<InventoryBatch>), ApiError> {
    validation::validate_quantity(body.quantity)?;
    let expiry_date = parse_date("expiryDate", &body.expiry_date)?;
    if expiry_date < Utc::now().date_naive() {
        return Err(ValidationError::InvalidFormat {
            field: "expiryDate".to_string(),
            reason: "must not be in the past".to_string(),
        }
        .into());
    }

    let batch = InventoryBatch {
        id: Uuid::new_v4().to_string(),
        branch_id: body.branch_id,
        product_id: body.product_id,
        quantity: body.quantity,
        expiry_date,
        received_at: Utc::now(),
    };
    state.db.inventory().insert_batch(&batch).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// `POST /api/inventory/discard-expired` - zero out expired batches.
async fn discard_expired(
    State(state): State<SharedState>,
    Json(body): Json<DiscardBody>,
) -> Result<Json<DiscardResponse>, ApiError> {
    let discarded_units = state
        .db
        .inventory()
        .discard_expired(&body.branch_id, Utc::now().date_naive())
        .await?;
    Ok(Json(DiscardResponse {
        branch_id: body.branch_id,
        discarded_units,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{batch, branch, product, send, test_state};
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_restock_shows_in_stock_levels() {
        let state = test_state().await;
        state.db.branches().insert(&branch("br-1", "Main")).await.unwrap();
        state
            .db
            .products()
            .insert(&product("p-1", "Panadol", 450, false))
            .await
            .unwrap();
        let app = crate::app(state);

        let expiry = (Utc::now().date_naive() + chrono::Duration::days(90)).to_string();
        let (status, created) = send(
            app.clone(),
            Method::POST,
            "/api/inventory/restock",
            Some(json!({
                "branchId": "br-1",
                "productId": "p-1",
                "quantity": 40,
                "expiryDate": expiry,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["quantity"], 40);

        let (status, levels) =
            send(app, Method::GET, "/api/inventory?branchId=br-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(levels[0]["productId"], "p-1");
        assert_eq!(levels[0]["onHand"], 40);
    }

    #[tokio::test]
    async fn test_restock_rejects_past_expiry() {
        let state = test_state().await;
        state.db.branches().insert(&branch("br-1", "Main")).await.unwrap();
        state
            .db
            .products()
            .insert(&product("p-1", "Panadol", 450, false))
            .await
            .unwrap();
        let app = crate::app(state);

        let yesterday = (Utc::now().date_naive() - chrono::Duration::days(1)).to_string();
        let (status, err) = send(
            app,
            Method::POST,
            "/api/inventory/restock",
            Some(json!({
                "branchId": "br-1",
                "productId": "p-1",
                "quantity": 10,
                "expiryDate": yesterday,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn test_restock_unknown_product_is_conflict() {
        let state = test_state().await;
        state.db.branches().insert(&branch("br-1", "Main")).await.unwrap();
        let app = crate::app(state);

        let expiry = (Utc::now().date_naive() + chrono::Duration::days(30)).to_string();
        let (status, err) = send(
            app,
            Method::POST,
            "/api/inventory/restock",
            Some(json!({
                "branchId": "br-1",
                "productId": "p-ghost",
                "quantity": 10,
                "expiryDate": expiry,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_expiring_and_discard() {
        let state = test_state().await;
        state.db.branches().insert(&branch("br-1", "Main")).await.unwrap();
        state
            .db
            .products()
            .insert(&product("p-1", "Panadol", 450, false))
            .await
            .unwrap();
        // One batch expiring soon, one far out, one already expired
        state.db.inventory().insert_batch(&batch("b-soon", "br-1", "p-1", 5, 10)).await.unwrap();
        state.db.inventory().insert_batch(&batch("b-late", "br-1", "p-1", 8, 120)).await.unwrap();
        state.db.inventory().insert_batch(&batch("b-dead", "br-1", "p-1", 3, -2)).await.unwrap();
        let app = crate::app(state);

        let (status, expiring) = send(
            app.clone(),
            Method::GET,
            "/api/inventory/expiring?branchId=br-1&days=30",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(expiring.as_array().unwrap().len(), 1);
        assert_eq!(expiring[0]["batchId"], "b-soon");

        let (status, discarded) = send(
            app,
            Method::POST,
            "/api/inventory/discard-expired",
            Some(json!({"branchId": "br-1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(discarded["discardedUnits"], 3);
    }

    #[tokio::test]
    async fn test_stock_levels_requires_branch() {
        let state = test_state().await;
        let app = crate::app(state);

        let (status, err) = send(app, Method::GET, "/api/inventory", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "BAD_REQUEST");
    }
}
