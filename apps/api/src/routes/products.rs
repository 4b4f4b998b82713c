//! Product catalog endpoints: search, CRUD, image upload.
//!
//! Products are soft-deleted; historical order lines keep their snapshots
//! either way.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use arnica_core::safety::normalize;
use arnica_core::validation;
use arnica_core::Product;

use crate::error::ApiError;
use crate::uploads;
use crate::SharedState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/:id/image", post(upload_image))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductQuery {
    q: Option<String>,
    category_id: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProduct {
    sku: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category_id: Option<String>,
    #[serde(default)]
    supplier_id: Option<String>,
    price_cents: i64,
    #[serde(default)]
    requires_prescription: bool,
    #[serde(default)]
    active_ingredient: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProduct {
    sku: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category_id: Option<String>,
    #[serde(default)]
    supplier_id: Option<String>,
    price_cents: i64,
    #[serde(default)]
    requires_prescription: bool,
    #[serde(default)]
    active_ingredient: Option<String>,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_active() -> bool {
    true
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/products?q=&categoryId=&limit=&offset=`
async fn list_products(
    State(state): State<SharedState>,
    Query(params): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let q = match &params.q {
        Some(raw) => validation::validate_search_query(raw)?,
        None => String::new(),
    };
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let products = state
        .db
        .products()
        .search(&q, params.category_id.as_deref(), limit, offset)
        .await?;
    Ok(Json(products))
}

/// `GET /api/products/{id}`
async fn get_product(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Product", &id))?;
    Ok(Json(product))
}

/// `POST /api/products`
async fn create_product(
    State(state): State<SharedState>,
    Json(body): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    validation::validate_sku(&body.sku)?;
    validation::validate_name(&body.name)?;
    validation::validate_price_cents(body.price_cents)?;

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        sku: body.sku.trim().to_string(),
        name: body.name.trim().to_string(),
        description: body.description,
        category_id: body.category_id,
        supplier_id: body.supplier_id,
        price_cents: body.price_cents,
        requires_prescription: body.requires_prescription,
        active_ingredient: body.active_ingredient.as_deref().map(normalize),
        image_path: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.db.products().insert(&product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/{id}`
async fn update_product(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateProduct>,
) -> Result<Json<Product>, ApiError> {
    validation::validate_sku(&body.sku)?;
    validation::validate_name(&body.name)?;
    validation::validate_price_cents(body.price_cents)?;

    let existing = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Product", &id))?;

    let product = Product {
        sku: body.sku.trim().to_string(),
        name: body.name.trim().to_string(),
        description: body.description,
        category_id: body.category_id,
        supplier_id: body.supplier_id,
        price_cents: body.price_cents,
        requires_prescription: body.requires_prescription,
        active_ingredient: body.active_ingredient.as_deref().map(normalize),
        is_active: body.is_active,
        updated_at: Utc::now(),
        ..existing
    };

    state.db.products().update(&product).await?;
    Ok(Json(product))
}

/// `DELETE /api/products/{id}` (soft delete)
async fn delete_product(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.products().soft_delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/products/{id}/image` (multipart, field `file`)
async fn upload_image(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Product>, ApiError> {
    // 404 before reading the body
    state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Product", &id))?;

    let file = read_file_field(multipart).await?;
    let path = uploads::save_upload(
        &state.config.upload_dir,
        "products",
        file.name.as_deref(),
        &file.bytes,
    )
    .await?;

    state.db.products().set_image_path(&id, &path).await?;

    let updated = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Product", &id))?;
    Ok(Json(updated))
}

// =============================================================================
// Multipart Helper
// =============================================================================

pub(crate) struct UploadedFile {
    pub name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Pulls the `file` field out of a multipart body, rejecting empty uploads.
pub(crate) async fn read_file_field(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?;
            if bytes.is_empty() {
                return Err(ApiError::bad_request("Uploaded file is empty"));
            }
            return Ok(UploadedFile {
                name,
                bytes: bytes.to_vec(),
            });
        }
    }
    Err(ApiError::bad_request("Multipart field 'file' is required"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{send, send_multipart, test_state};
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_product_crud_roundtrip() {
        let state = test_state().await;
        let app = crate::app(state.clone());

        let (status, created) = send(
            app.clone(),
            Method::POST,
            "/api/products",
            Some(json!({
                "sku": "PAN-0500",
                "name": "Panadol 500mg",
                "priceCents": 450,
                "activeIngredient": "  Paracetamol ",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["activeIngredient"], "paracetamol");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, fetched) =
            send(app.clone(), Method::GET, &format!("/api/products/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["sku"], "PAN-0500");

        let (status, updated) = send(
            app.clone(),
            Method::PUT,
            &format!("/api/products/{id}"),
            Some(json!({
                "sku": "PAN-0500",
                "name": "Panadol Extra 500mg",
                "priceCents": 520,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Panadol Extra 500mg");
        assert_eq!(updated["priceCents"], 520);

        let (status, _) = send(
            app.clone(),
            Method::DELETE,
            &format!("/api/products/{id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        // Soft-deleted products drop out of the default listing
        let (_, listed) = send(app, Method::GET, "/api/products", None).await;
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_409() {
        let state = test_state().await;
        let app = crate::app(state);

        let body = json!({"sku": "DUP-1", "name": "First", "priceCents": 100});
        let (status, _) = send(app.clone(), Method::POST, "/api/products", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);

        let body = json!({"sku": "DUP-1", "name": "Second", "priceCents": 200});
        let (status, err) = send(app, Method::POST, "/api/products", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "DUPLICATE");
    }

    #[tokio::test]
    async fn test_create_rejects_bad_sku() {
        let state = test_state().await;
        let app = crate::app(state);

        let body = json!({"sku": "BAD SKU!", "name": "X", "priceCents": 100});
        let (status, err) = send(app, Method::POST, "/api/products", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn test_search_filters_by_query() {
        let state = test_state().await;
        let app = crate::app(state);

        for (sku, name) in [("A-1", "Panadol"), ("A-2", "Brufen"), ("A-3", "Panadol CF")] {
            let body = json!({"sku": sku, "name": name, "priceCents": 100});
            send(app.clone(), Method::POST, "/api/products", Some(body)).await;
        }

        let (status, body) = send(app, Method::GET, "/api/products?q=panadol", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_image_upload_records_path() {
        let state = test_state().await;
        let app = crate::app(state.clone());

        let body = json!({"sku": "IMG-1", "name": "Pictured", "priceCents": 100});
        let (_, created) = send(app.clone(), Method::POST, "/api/products", Some(body)).await;
        let id = created["id"].as_str().unwrap();

        let (status, updated) = send_multipart(
            app.clone(),
            &format!("/api/products/{id}/image"),
            &[("file", Some("box.png"), b"png-bytes")],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let path = updated["imagePath"].as_str().unwrap();
        assert!(path.starts_with("products/"));
        assert!(path.ends_with(".png"));

        let on_disk = state.config.upload_dir.join(path);
        assert_eq!(std::fs::read(on_disk).unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn test_image_upload_missing_product_is_404() {
        let state = test_state().await;
        let app = crate::app(state);

        let (status, err) = send_multipart(
            app,
            "/api/products/p-missing/image",
            &[("file", Some("a.png"), b"x")],
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["code"], "NOT_FOUND");
    }
}
