//! Drug-interaction screening endpoint, backing the cart page's warning
//! banner. Screening itself lives in `arnica_core::safety`; this handler
//! only loads the catalog rows and shapes the response.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use arnica_core::safety::{self, SafetyWarning};

use crate::error::ApiError;
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new().route("/safety-check", post(check))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SafetyCheckBody {
    product_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SafetyCheckResponse {
    /// Names of the products that were actually screened. Unknown ids
    /// are dropped silently so a stale cart still gets its warnings.
    screened_products: Vec<String>,
    warnings: Vec<SafetyWarning>,
}

/// `POST /api/safety-check` - pairwise interaction screen over a set of
/// catalog products.
async fn check(
    State(state): State<SharedState>,
    Json(body): Json<SafetyCheckBody>,
) -> Result<Json<SafetyCheckResponse>, ApiError> {
    if body.product_ids.is_empty() {
        return Err(ApiError::bad_request("productIds must not be empty"));
    }

    let products = state.db.products().get_many(&body.product_ids).await?;
    let warnings = safety::screen(&products);

    Ok(Json(SafetyCheckResponse {
        screened_products: products.into_iter().map(|p| p.name).collect(),
        warnings,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================
