//! Cart endpoints. Carts are server-side and keyed by an opaque user id;
//! every response carries the full cart with recomputed totals so clients
//! never do money math.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use arnica_core::cart::{Cart, CartLine, CartTotals};
use arnica_core::validation;

use crate::error::ApiError;
use crate::routes::require_param;
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_item).put(set_quantity).delete(remove_item))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserQuery {
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemQuery {
    user_id: Option<String>,
    product_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartItemBody {
    user_id: String,
    product_id: String,
    quantity: i64,
}

/// Full cart snapshot returned by every cart endpoint that has one.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CartResponse {
    user_id: String,
    lines: Vec<CartLine>,
    totals: CartTotals,
}

impl CartResponse {
    fn new(user_id: String, lines: Vec<CartLine>) -> Self {
        let cart = Cart::new(lines);
        let totals = CartTotals::from(&cart);
        CartResponse {
            user_id,
            lines: cart.lines,
            totals,
        }
    }
}

async fn load_cart(state: &SharedState, user_id: String) -> Result<CartResponse, ApiError> {
    let lines = state.db.carts().lines_for_user(&user_id).await?;
    Ok(CartResponse::new(user_id, lines))
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/cart?userId=`
async fn get_cart(
    State(state): State<SharedState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<CartResponse>, ApiError> {
    let user_id = require_param(params.user_id, "userId")?;
    Ok(Json(load_cart(&state, user_id).await?))
}

/// `POST /api/cart/items` - add quantity, accumulating on repeat adds.
async fn add_item(
    State(state): State<SharedState>,
    Json(body): Json<CartItemBody>,
) -> Result<Json<CartResponse>, ApiError> {
    validation::validate_quantity(body.quantity)?;

    // The line must point at a product a customer can still buy.
    let product = state
        .db
        .products()
        .get_by_id(&body.product_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| ApiError::missing("Product", &body.product_id))?;

    state
        .db
        .carts()
        .add_item(&body.user_id, &product.id, body.quantity)
        .await?;
    Ok(Json(load_cart(&state, body.user_id).await?))
}

/// `PUT /api/cart/items` - overwrite a line's quantity; zero removes it.
async fn set_quantity(
    State(state): State<SharedState>,
    Json(body): Json<CartItemBody>,
) -> Result<Json<CartResponse>, ApiError> {
    if body.quantity != 0 {
        validation::validate_quantity(body.quantity)?;
    }

    state
        .db
        .carts()
        .set_quantity(&body.user_id, &body.product_id, body.quantity)
        .await?;
    Ok(Json(load_cart(&state, body.user_id).await?))
}

/// `DELETE /api/cart/items?userId=&productId=`
async fn remove_item(
    State(state): State<SharedState>,
    Query(params): Query<ItemQuery>,
) -> Result<Json<CartResponse>, ApiError> {
    let user_id = require_param(params.user_id, "userId")?;
    let product_id = require_param(params.product_id, "productId")?;

    state.db.carts().remove_item(&user_id, &product_id).await?;
    Ok(Json(load_cart(&state, user_id).await?))
}

/// `DELETE /api/cart?userId=` - empty the cart.
async fn clear_cart(
    State(state): State<SharedState>,
    Query(params): Query<UserQuery>,
) -> Result<StatusCode, ApiError> {
    let user_id = require_param(params.user_id, "userId")?;
    state.db.carts().clear(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{product, send, test_state};
    use axum::http::Method;
    use serde_json::json;

    async fn seed_products(state: &SharedState) {
        state
            .db
            .products()
            .insert(&product("p-1", "Panadol 500mg", 450, false))
            .await
            .unwrap();
        state
            .db
            .products()
            .insert(&product("p-2", "Vitamin C", 300, false))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_and_totals() {
        let state = test_state().await;
        seed_products(&state).await;
        let app = crate::app(state);

        let (status, cart) = send(
            app.clone(),
            Method::POST,
            "/api/cart/items",
            Some(json!({"userId": "u-1", "productId": "p-1", "quantity": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["totals"]["subtotalCents"], 900);

        // Same product again accumulates
        let (_, cart) = send(
            app,
            Method::POST,
            "/api/cart/items",
            Some(json!({"userId": "u-1", "productId": "p-1", "quantity": 1})),
        )
        .await;
        assert_eq!(cart["lines"].as_array().unwrap().len(), 1);
        assert_eq!(cart["lines"][0]["quantity"], 3);
        assert_eq!(cart["totals"]["subtotalCents"], 1350);
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_not_found() {
        let state = test_state().await;
        let app = crate::app(state);

        let (status, err) = send(
            app,
            Method::POST,
            "/api/cart/items",
            Some(json!({"userId": "u-1", "productId": "p-ghost", "quantity": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_add_soft_deleted_product_is_not_found() {
        let state = test_state().await;
        seed_products(&state).await;
        state.db.products().soft_delete("p-1").await.unwrap();
        let app = crate::app(state);

        let (status, _) = send(
            app,
            Method::POST,
            "/api/cart/items",
            Some(json!({"userId": "u-1", "productId": "p-1", "quantity": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_set_quantity_and_zero_removes() {
        let state = test_state().await;
        seed_products(&state).await;
        let app = crate::app(state);

        send(
            app.clone(),
            Method::POST,
            "/api/cart/items",
            Some(json!({"userId": "u-1", "productId": "p-1", "quantity": 2})),
        )
        .await;

        let (status, cart) = send(
            app.clone(),
            Method::PUT,
            "/api/cart/items",
            Some(json!({"userId": "u-1", "productId": "p-1", "quantity": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["lines"][0]["quantity"], 5);

        let (status, cart) = send(
            app,
            Method::PUT,
            "/api/cart/items",
            Some(json!({"userId": "u-1", "productId": "p-1", "quantity": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(cart["lines"].as_array().unwrap().is_empty());
        assert_eq!(cart["totals"]["lineCount"], 0);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let state = test_state().await;
        seed_products(&state).await;
        let app = crate::app(state);

        for pid in ["p-1", "p-2"] {
            send(
                app.clone(),
                Method::POST,
                "/api/cart/items",
                Some(json!({"userId": "u-1", "productId": pid, "quantity": 1})),
            )
            .await;
        }

        let (status, cart) = send(
            app.clone(),
            Method::DELETE,
            "/api/cart/items?userId=u-1&productId=p-1",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["lines"].as_array().unwrap().len(), 1);

        let (status, _) = send(app.clone(), Method::DELETE, "/api/cart?userId=u-1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, cart) = send(app, Method::GET, "/api/cart?userId=u-1", None).await;
        assert!(cart["lines"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_missing_line_is_not_found() {
        let state = test_state().await;
        seed_products(&state).await;
        let app = crate::app(state);

        let (status, _) = send(
            app,
            Method::DELETE,
            "/api/cart/items?userId=u-1&productId=p-1",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
