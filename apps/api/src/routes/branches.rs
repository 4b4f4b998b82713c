//! Branch endpoints. Branches are never deleted; deactivating one stops new
//! orders while keeping its history reachable.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use arnica_core::validation;
use arnica_core::Branch;

use crate::error::ApiError;
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/branches", get(list_branches).post(create_branch))
        .route("/branches/:id", get(get_branch).put(update_branch))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBranch {
    name: String,
    address: String,
    #[serde(default)]
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBranch {
    name: String,
    address: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_active() -> bool {
    true
}

async fn list_branches(State(state): State<SharedState>) -> Result<Json<Vec<Branch>>, ApiError> {
    Ok(Json(state.db.branches().list().await?))
}

async fn get_branch(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Branch>, ApiError> {
    let branch = state
        .db
        .branches()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Branch", &id))?;
    Ok(Json(branch))
}

async fn create_branch(
    State(state): State<SharedState>,
    Json(body): Json<CreateBranch>,
) -> Result<(StatusCode, Json<Branch>), ApiError> {
    validation::validate_name(&body.name)?;
    if body.address.trim().is_empty() {
        return Err(arnica_core::ValidationError::Required {
            field: "address".to_string(),
        }
        .into());
    }

    let branch = Branch {
        id: Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        address: body.address.trim().to_string(),
        phone: body.phone,
        is_active: true,
        created_at: Utc::now(),
    };
    state.db.branches().insert(&branch).await?;
    Ok((StatusCode::CREATED, Json(branch)))
}

async fn update_branch(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateBranch>,
) -> Result<Json<Branch>, ApiError> {
    validation::validate_name(&body.name)?;
    if body.address.trim().is_empty() {
        return Err(arnica_core::ValidationError::Required {
            field: "address".to_string(),
        }
        .into());
    }

    let existing = state
        .db
        .branches()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Branch", &id))?;

    let branch = Branch {
        name: body.name.trim().to_string(),
        address: body.address.trim().to_string(),
        phone: body.phone,
        is_active: body.is_active,
        ..existing
    };
    state.db.branches().update(&branch).await?;
    Ok(Json(branch))
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
    async fn test_branch_create_and_deactivate() {
        let state = test_state().await;
        let app = crate::app(state);

        let (status, created) = send(
            app.clone(),
            Method::POST,
            "/api/branches",
            Some(json!({"name": "Gulberg", "address": "12 Main Boulevard, Lahore"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["isActive"], true);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, updated) = send(
            app.clone(),
            Method::PUT,
            &format!("/api/branches/{id}"),
            Some(json!({
                "name": "Gulberg",
                "address": "12 Main Boulevard, Lahore",
                "isActive": false,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["isActive"], false);
    }

    #[tokio::test]
    async fn test_duplicate_branch_name_is_409() {
        let state = test_state().await;
        let app = crate::app(state);

        let body = json!({"name": "Clifton", "address": "Sea View"});
        let (status, _) = send(app.clone(), Method::POST, "/api/branches", Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, err) = send(app, Method::POST, "/api/branches", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], "DUPLICATE");
    }

    #[tokio::test]
    async fn test_missing_address_is_400() {
        let state = test_state().await;
        let app = crate::app(state);

        let (status, err) = send(
            app,
            Method::POST,
            "/api/branches",
            Some(json!({"name": "No Address", "address": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], "VALIDATION_FAILED");
    }
}
