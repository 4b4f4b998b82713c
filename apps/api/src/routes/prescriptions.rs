//! Prescription endpoints: document upload, listing, and the pharmacist
//! review actions.
//!
//! Review moves orders too. Approving a prescription releases any orders
//! held on it; rejecting cancels them and returns their stock. Both sides
//! happen here so pharmacists never touch the orders API.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use arnica_core::prescription::{Approval, Prescription, PrescriptionStatus};
use arnica_core::Employee;

use crate::error::{ApiError, ErrorCode};
use crate::routes::parse_enum;
use crate::uploads::save_upload;
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/prescriptions", get(list_prescriptions).post(upload))
        .route("/prescriptions/:id", get(get_prescription))
        .route("/prescriptions/:id/approve", post(approve))
        .route("/prescriptions/:id/reject", post(reject))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    status: Option<String>,
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApproveBody {
    product_id: String,
    dosage: String,
    quantity: i64,
    expires_at: DateTime<Utc>,
    reviewed_by: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RejectBody {
    reason: String,
    reviewed_by: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /api/prescriptions` - multipart upload of a prescription document.
///
/// Expects a `userId` text field and a `file` field. The document lands
/// under `prescriptions/` in the upload dir and the row starts pending.
async fn upload(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Prescription>), ApiError> {
    let mut user_id: Option<String> = None;
    let mut file_name: Option<String> = None;
    let mut file_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("userId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?;
                user_id = Some(text);
            }
            Some("file") => {
                file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?;
                file_bytes = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let user_id = user_id
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("userId field is required"))?;
    let bytes = file_bytes.ok_or_else(|| ApiError::bad_request("file field is required"))?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }

    let document_path = save_upload(
        &state.config.upload_dir,
        "prescriptions",
        file_name.as_deref(),
        &bytes,
    )
    .await?;

    let prescription = Prescription {
        id: Uuid::new_v4().to_string(),
        user_id,
        document_path,
        status: PrescriptionStatus::PendingApproval,
        uploaded_at: Utc::now(),
        product_id: None,
        dosage: None,
        quantity: None,
        expires_at: None,
        reviewed_by: None,
        reviewed_at: None,
        rejection_reason: None,
    };
    state.db.prescriptions().insert(&prescription).await?;

    info!(
        prescription_id = %prescription.id,
        user = %prescription.user_id,
        "Prescription uploaded"
    );
    Ok((StatusCode::CREATED, Json(prescription)))
}

/// `GET /api/prescriptions?status=&userId=` - review queue listing.
async fn list_prescriptions(
    State(state): State<SharedState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<Prescription>>, ApiError> {
    let status = params
        .status
        .map(|s| parse_enum::<PrescriptionStatus>("status", &s))
        .transpose()?;

    let prescriptions = state
        .db
        .prescriptions()
        .list(status, params.user_id.as_deref())
        .await?;
    Ok(Json(prescriptions))
}

/// `GET /api/prescriptions/:id`
async fn get_prescription(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Prescription>, ApiError> {
    let prescription = state
        .db
        .prescriptions()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Prescription", &id))?;
    Ok(Json(prescription))
}

/// Loads the reviewing employee and checks the pharmacist gate.
async fn load_reviewer(state: &SharedState, employee_id: &str) -> Result<Employee, ApiError> {
    let reviewer = state
        .db
        .employees()
        .get_by_id(employee_id)
        .await?
        .ok_or_else(|| ApiError::missing("Employee", employee_id))?;

    if !reviewer.is_active || !reviewer.role.can_review_prescriptions() {
        return Err(ApiError::unprocessable(
            ErrorCode::RoleMismatch,
            format!("Employee {} is not an active pharmacist", reviewer.id),
        ));
    }
    Ok(reviewer)
}

/// `POST /api/prescriptions/:id/approve`
///
/// Records the approval and releases orders held on this prescription.
async fn approve(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<ApproveBody>,
) -> Result<Json<Prescription>, ApiError> {
    let prescription = state
        .db
        .prescriptions()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Prescription", &id))?;
    let reviewer = load_reviewer(&state, &body.reviewed_by).await?;

    // The prescribed product must exist; the row will reference it.
    state
        .db
        .products()
        .get_by_id(&body.product_id)
        .await?
        .ok_or_else(|| ApiError::missing("Product", &body.product_id))?;

    let now = Utc::now();
    let approved = prescription.approve(
        Approval {
            product_id: body.product_id,
            dosage: body.dosage,
            quantity: body.quantity,
            expires_at: body.expires_at,
            reviewed_by: reviewer.id.clone(),
        },
        now,
    )?;
    state.db.prescriptions().apply_review(&approved).await?;

    let released = state.db.orders().release_held(&approved.id, now).await?;
    info!(
        prescription_id = %approved.id,
        reviewer = %reviewer.id,
        released_orders = released,
        "Prescription approved"
    );
    Ok(Json(approved))
}

/// `POST /api/prescriptions/:id/reject`
///
/// Records the rejection, then cancels orders held on this prescription
/// and returns their stock.
async fn reject(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<RejectBody>,
) -> Result<Json<Prescription>, ApiError> {
    let prescription = state
        .db
        .prescriptions()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Prescription", &id))?;
    let reviewer = load_reviewer(&state, &body.reviewed_by).await?;

    let now = Utc::now();
    let rejected = prescription.reject(body.reason, reviewer.id.clone(), now)?;
    state.db.prescriptions().apply_review(&rejected).await?;

    let cancelled = state.db.orders().cancel_held(&rejected.id, now).await?;
    info!(
        prescription_id = %rejected.id,
        reviewer = %reviewer.id,
        cancelled_orders = cancelled.len(),
        "Prescription rejected"
    );
    Ok(Json(rejected))
}

// =============================================================================
// Unit Tests
// =============================================================================
