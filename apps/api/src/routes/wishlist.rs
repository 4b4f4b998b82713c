//! Wishlist endpoints. A single toggle flips membership; the response says
//! which way it went so clients can render the heart without a second fetch.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use arnica_core::Product;

use crate::error::ApiError;
use crate::routes::require_param;
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/wishlist", get(list_wishlist))
        .route("/wishlist/toggle", post(toggle))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserQuery {
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleBody {
    user_id: String,
    product_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToggleResponse {
    product_id: String,
    in_wishlist: bool,
}

/// `GET /api/wishlist?userId=` - the user's saved products.
async fn list_wishlist(
    State(state): State<SharedState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let user_id = require_param(params.user_id, "userId")?;
    let products = state.db.wishlists().list_for_user(&user_id).await?;
    Ok(Json(products))
}

/// `POST /api/wishlist/toggle` - add if absent, remove if present.
async fn toggle(
    State(state): State<SharedState>,
    Json(body): Json<ToggleBody>,
) -> Result<Json<ToggleResponse>, ApiError> {
    // Unknown products must 404 rather than surface as an FK conflict.
    state
        .db
        .products()
        .get_by_id(&body.product_id)
        .await?
        .ok_or_else(|| ApiError::missing("Product", &body.product_id))?;

    let in_wishlist = state
        .db
        .wishlists()
        .toggle(&body.user_id, &body.product_id)
        .await?;
    Ok(Json(ToggleResponse {
        product_id: body.product_id,
        in_wishlist,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================
