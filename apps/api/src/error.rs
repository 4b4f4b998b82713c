//! # API Error Types
//!
//! The one error type handlers return, and the `From` conversions that map
//! the lower layers onto HTTP.
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CoreError (business rejection)        DbError (storage outcome)       │
//! │                                                                         │
//! │  InsufficientStock ──► 409 + names     NotFound        ──► 404         │
//! │  cart bounds       ──► 422             UniqueViolation ──► 409         │
//! │  prescription gate ──► 422             ForeignKey      ──► 409         │
//! │  slot gates        ──► 422             StockConflict   ──► 409         │
//! │  illegal move      ──► 422             SlotCapacity    ──► 422         │
//! │  Validation        ──► 400             anything else   ──► 500 opaque  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal failures log at error level and answer with an opaque reason;
//! the client never sees SQL or pool details.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use arnica_core::{CoreError, ValidationError};
use arnica_db::DbError;

// =============================================================================
// Error Codes
// =============================================================================

/// Machine-readable codes clients branch on; the `reason` string is for
/// humans and may change wording freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    NotFound,
    Duplicate,
    Conflict,
    StockConflict,
    CartInvalid,
    PrescriptionRequired,
    PrescriptionNotUsable,
    PrescriptionNotPending,
    SlotInvalid,
    SlotFull,
    IllegalTransition,
    RoleMismatch,
    BranchInactive,
    ValidationFailed,
    Internal,
}

// =============================================================================
// ApiError
// =============================================================================

/// The error every handler returns; serializes as
/// `{"code": ..., "reason": ..., "unavailableProducts": [...]}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub reason: String,
    /// Stock conflicts only: names of the products the branch cannot cover.
    pub unavailable_products: Option<Vec<String>>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, reason: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            reason: reason.into(),
            unavailable_products: None,
        }
    }

    /// 400 for malformed requests (missing fields, unparseable values).
    pub fn bad_request(reason: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, reason)
    }

    /// 404 for rows that do not exist.
    pub fn not_found(reason: impl Into<String>) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, reason)
    }

    /// 404 for a referenced row, phrased the way the storage layer phrases it.
    pub fn missing(entity: &str, id: &str) -> Self {
        ApiError::not_found(format!("{entity} not found: {id}"))
    }

    /// 409 stock conflict carrying the unavailable product names.
    pub fn stock_conflict(unavailable: Vec<String>) -> Self {
        ApiError {
            status: StatusCode::CONFLICT,
            code: ErrorCode::StockConflict,
            reason: format!("Insufficient stock for: {}", unavailable.join(", ")),
            unavailable_products: Some(unavailable),
        }
    }

    /// 422 for business-rule rejections.
    pub fn unprocessable(code: ErrorCode, reason: impl Into<String>) -> Self {
        ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, code, reason)
    }

    /// 500 with an opaque reason; the caller should have logged the cause.
    pub fn internal() -> Self {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Internal,
            "Internal server error",
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    code: ErrorCode,
    reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    unavailable_products: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code,
            reason: self.reason,
            unavailable_products: self.unavailable_products,
        };
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Layer Conversions
// =============================================================================

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => {
                ApiError::not_found(format!("{entity} not found: {id}"))
            }
            DbError::UniqueViolation { ref field, .. } => ApiError::new(
                StatusCode::CONFLICT,
                ErrorCode::Duplicate,
                format!("Duplicate value for {field}"),
            ),
            DbError::ForeignKeyViolation { .. } => ApiError::new(
                StatusCode::CONFLICT,
                ErrorCode::Conflict,
                "Referenced record does not exist or is still in use",
            ),
            // The in-transaction re-check only knows the conflicting product
            // id; the checkout service swaps in the name before this runs.
            DbError::StockConflict {
                product_id,
                available,
                requested,
            } => ApiError {
                status: StatusCode::CONFLICT,
                code: ErrorCode::StockConflict,
                reason: format!(
                    "Insufficient stock for product {product_id}: {available} available, {requested} requested"
                ),
                unavailable_products: Some(vec![product_id]),
            },
            DbError::SlotCapacity { slot_id } => ApiError::unprocessable(
                ErrorCode::SlotFull,
                format!("Delivery slot {slot_id} is fully booked"),
            ),
            other => {
                error!(error = %other, "Database operation failed");
                ApiError::internal()
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::EmptyCart
            | CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. } => {
                ApiError::unprocessable(ErrorCode::CartInvalid, err.to_string())
            }
            CoreError::InsufficientStock { unavailable } => ApiError::stock_conflict(unavailable),
            CoreError::PrescriptionRequired => {
                ApiError::unprocessable(ErrorCode::PrescriptionRequired, err.to_string())
            }
            CoreError::PrescriptionNotUsable { .. }
            | CoreError::PrescriptionExpired { .. }
            | CoreError::PrescriptionWrongUser => {
                ApiError::unprocessable(ErrorCode::PrescriptionNotUsable, err.to_string())
            }
            CoreError::PrescriptionNotPending { .. } => {
                ApiError::unprocessable(ErrorCode::PrescriptionNotPending, err.to_string())
            }
            CoreError::SlotRequired | CoreError::SlotWrongBranch | CoreError::SlotInPast => {
                ApiError::unprocessable(ErrorCode::SlotInvalid, err.to_string())
            }
            CoreError::SlotFull => ApiError::unprocessable(ErrorCode::SlotFull, err.to_string()),
            CoreError::InvalidOrderTransition { .. } => {
                ApiError::unprocessable(ErrorCode::IllegalTransition, err.to_string())
            }
            CoreError::Validation(v) => ApiError::new(
                StatusCode::BAD_REQUEST,
                ErrorCode::ValidationFailed,
                v.to_string(),
            ),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        CoreError::from(err).into()
    }
}

/// Upload writes are the only direct filesystem I/O in handlers; a failure
/// there is a server problem, not a client one.
impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        error!(error = %err, "Filesystem operation failed");
        ApiError::internal()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_stock_conflict_body_carries_names() {
        let err: ApiError = CoreError::InsufficientStock {
            unavailable: vec!["Panadol 500mg".to_string(), "Brufen 400mg".to_string()],
        }
        .into();

        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "STOCK_CONFLICT");
        assert_eq!(body["unavailableProducts"][0], "Panadol 500mg");
        assert_eq!(body["unavailableProducts"][1], "Brufen 400mg");
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let err: ApiError = DbError::not_found("Product", "p-404").into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["reason"], "Product not found: p-404");
        assert!(body.get("unavailableProducts").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_maps_to_409() {
        let err: ApiError = DbError::duplicate("products.sku", "PAR-0001").into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "DUPLICATE");
    }

    #[tokio::test]
    async fn test_business_gates_map_to_422() {
        let cases: Vec<(ApiError, &str)> = vec![
            (CoreError::EmptyCart.into(), "CART_INVALID"),
            (CoreError::PrescriptionRequired.into(), "PRESCRIPTION_REQUIRED"),
            (CoreError::SlotWrongBranch.into(), "SLOT_INVALID"),
            (CoreError::SlotFull.into(), "SLOT_FULL"),
            (
                DbError::SlotCapacity {
                    slot_id: "slot-1".to_string(),
                }
                .into(),
                "SLOT_FULL",
            ),
        ];
        for (err, code) in cases {
            let (status, body) = body_json(err).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(body["code"], code);
        }
    }

    #[tokio::test]
    async fn test_internal_reason_is_opaque() {
        let err: ApiError = DbError::QueryFailed("no such table: secrets".to_string()).into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["reason"], "Internal server error");
    }

    #[tokio::test]
    async fn test_validation_maps_to_400() {
        let err: ApiError = CoreError::Validation(arnica_core::ValidationError::Required {
            field: "name".to_string(),
        })
        .into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }
}
