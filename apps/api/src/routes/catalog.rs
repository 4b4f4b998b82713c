//! Category and supplier endpoints.
//!
//! Both are hard-deleted; the delete answers 409 while products still
//! reference the row (foreign key).

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use arnica_core::validation;
use arnica_core::{Category, Supplier};

use crate::error::ApiError;
use crate::routes::products::read_file_field;
use crate::uploads;
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/categories/:id/image", post(upload_category_image))
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route(
            "/suppliers/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryBody {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

async fn list_categories(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.db.categories().list().await?))
}

async fn get_category(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Category>, ApiError> {
    let category = state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Category", &id))?;
    Ok(Json(category))
}

async fn create_category(
    State(state): State<SharedState>,
    Json(body): Json<CategoryBody>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    validation::validate_name(&body.name)?;

    let category = Category {
        id: Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        description: body.description,
        image_path: None,
        created_at: Utc::now(),
    };
    state.db.categories().insert(&category).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<CategoryBody>,
) -> Result<Json<Category>, ApiError> {
    validation::validate_name(&body.name)?;

    let existing = state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Category", &id))?;

    let category = Category {
        name: body.name.trim().to_string(),
        description: body.description,
        ..existing
    };
    state.db.categories().update(&category).await?;
    Ok(Json(category))
}

async fn delete_category(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.categories().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/categories/{id}/image` (multipart, field `file`)
async fn upload_category_image(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Category>, ApiError> {
    state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Category", &id))?;

    let file = read_file_field(multipart).await?;
    let path = uploads::save_upload(
        &state.config.upload_dir,
        "categories",
        file.name.as_deref(),
        &file.bytes,
    )
    .await?;

    state.db.categories().set_image_path(&id, &path).await?;

    let updated = state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Category", &id))?;
    Ok(Json(updated))
}

// =============================================================================
// Suppliers
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SupplierBody {
    name: String,
    #[serde(default)]
    contact_email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
}

async fn list_suppliers(State(state): State<SharedState>) -> Result<Json<Vec<Supplier>>, ApiError> {
    Ok(Json(state.db.suppliers().list().await?))
}

async fn get_supplier(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Supplier>, ApiError> {
    let supplier = state
        .db
        .suppliers()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Supplier", &id))?;
    Ok(Json(supplier))
}

async fn create_supplier(
    State(state): State<SharedState>,
    Json(body): Json<SupplierBody>,
) -> Result<(StatusCode, Json<Supplier>), ApiError> {
    validation::validate_name(&body.name)?;
    if let Some(email) = &body.contact_email {
        validation::validate_email(email)?;
    }

    let supplier = Supplier {
        id: Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        contact_email: body.contact_email,
        phone: body.phone,
        created_at: Utc::now(),
    };
    state.db.suppliers().insert(&supplier).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

async fn update_supplier(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<SupplierBody>,
) -> Result<Json<Supplier>, ApiError> {
    validation::validate_name(&body.name)?;
    if let Some(email) = &body.contact_email {
        validation::validate_email(email)?;
    }

    let existing = state
        .db
        .suppliers()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Supplier", &id))?;

    let supplier = Supplier {
        name: body.name.trim().to_string(),
        contact_email: body.contact_email,
        phone: body.phone,
        ..existing
    };
    state.db.suppliers().update(&supplier).await?;
    Ok(Json(supplier))
}

async fn delete_supplier(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.suppliers().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{send, test_state};
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_category_crud() {
        let state = test_state().await;
        let app = crate::app(state);

        let (status, created) = send(
            app.clone(),
            Method::POST,
            "/api/categories",
            Some(json!({"name": "Pain Relief", "description": "Analgesics"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, updated) = send(
            app.clone(),
            Method::PUT,
            &format!("/api/categories/{id}"),
            Some(json!({"name": "Pain Management"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Pain Management");

        let (status, _) = send(
            app.clone(),
            Method::DELETE,
            &format!("/api/categories/{id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(app, Method::GET, &format!("/api/categories/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_category_delete_blocked_while_referenced() {
        let state = test_state().await;
        let app = crate::app(state.clone());

        let (_, category) = send(
            app.clone(),
            Method::POST,
            "/api/categories",
            Some(json!({"name": "Vitamins"})),
        )
        .await;
        let category_id = category["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/api/products",
            Some(json!({
                "sku": "VIT-1",
                "name": "Vitamin C",
                "priceCents": 250,
                "categoryId": category_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, err) = send(
            app,
            Method::DELETE,
            &format!("/api/categories/{category_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_supplier_crud_and_email_validation() {
        let state = test_state().await;
        let app = crate::app(state);

        let (status, err) = send(
            app.clone(),
            Method::POST,
            "/api/suppliers",
            Some(json!({"name": "Getz Pharma", "contactEmail": "not-an-email"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_FAILED");

        let (status, created) = send(
            app.clone(),
            Method::POST,
            "/api/suppliers",
            Some(json!({"name": "Getz Pharma", "contactEmail": "sales@getz.example"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, listed) = send(app.clone(), Method::GET, "/api/suppliers", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, _) = send(
            app,
            Method::DELETE,
            &format!("/api/suppliers/{id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
