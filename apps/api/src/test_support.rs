//! Shared fixtures for API tests: an in-memory application state, request
//! helpers over `tower::ServiceExt::oneshot`, and row builders for the rows
//! handlers expect to find.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use arnica_core::{
    Branch, DeliverySlot, Employee, EmployeeRole, InventoryBatch, Prescription,
    PrescriptionStatus, Product,
};
use arnica_db::{Database, DbConfig};

use crate::config::ApiConfig;
use crate::{AppState, SharedState};

pub(crate) fn test_config() -> ApiConfig {
    ApiConfig {
        http_port: 0,
        database_path: ":memory:".to_string(),
        upload_dir: std::env::temp_dir().join(format!("arnica-api-test-{}", Uuid::new_v4())),
        delivery_fee_cents: 300,
        urgent_delivery_fee_cents: 900,
        prescription_pending_ttl_days: 14,
        expiry_sweep_schedule: "0 0 3 * * *".to_string(),
    }
}

pub(crate) async fn test_state() -> SharedState {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    Arc::new(AppState {
        db,
        config: test_config(),
    })
}

// =============================================================================
// Request Helpers
// =============================================================================

async fn decode(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Sends a request (JSON body optional) and decodes the JSON response.
/// Responses without a body (204) decode as `Value::Null`.
pub(crate) async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    decode(app.oneshot(request).await.unwrap()).await
}

/// Sends a multipart form built from `(field, filename, bytes)` parts.
pub(crate) async fn send_multipart(
    app: Router,
    uri: &str,
    parts: &[(&str, Option<&str>, &[u8])],
) -> (StatusCode, Value) {
    const BOUNDARY: &str = "arnica-test-boundary";

    let mut body = Vec::new();
    for (name, file_name, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    decode(app.oneshot(request).await.unwrap()).await
}

// =============================================================================
// Row Builders
// =============================================================================

pub(crate) fn product(id: &str, name: &str, price_cents: i64, controlled: bool) -> Product {
    let now = Utc::now();
    Product {
        id: id.to_string(),
        sku: format!("SKU-{id}"),
        name: name.to_string(),
        description: None,
        category_id: None,
        supplier_id: None,
        price_cents,
        requires_prescription: controlled,
        active_ingredient: None,
        image_path: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn branch(id: &str, name: &str) -> Branch {
    Branch {
        id: id.to_string(),
        name: name.to_string(),
        address: "1 High Street".to_string(),
        phone: None,
        is_active: true,
        created_at: Utc::now(),
    }
}

/// A batch expiring `expires_in_days` from today (negative = already expired).
pub(crate) fn batch(
    id: &str,
    branch_id: &str,
    product_id: &str,
    quantity: i64,
    expires_in_days: i64,
) -> InventoryBatch {
    let now = Utc::now();
    InventoryBatch {
        id: id.to_string(),
        branch_id: branch_id.to_string(),
        product_id: product_id.to_string(),
        quantity,
        expiry_date: now.date_naive() + Duration::days(expires_in_days),
        received_at: now,
    }
}

pub(crate) fn employee(id: &str, role: EmployeeRole, branch_id: &str) -> Employee {
    let now = Utc::now();
    Employee {
        id: id.to_string(),
        name: format!("Employee {id}"),
        email: format!("{id}@arnica.test"),
        role,
        branch_id: branch_id.to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// A slot `days_ahead` from today.
pub(crate) fn slot(id: &str, branch_id: &str, days_ahead: i64, capacity: i64) -> DeliverySlot {
    let now = Utc::now();
    DeliverySlot {
        id: id.to_string(),
        branch_id: branch_id.to_string(),
        slot_date: now.date_naive() + Duration::days(days_ahead),
        window: "09:00-12:00".to_string(),
        capacity,
        booked: 0,
        created_at: now,
    }
}

pub(crate) fn pending_prescription(id: &str, user_id: &str) -> Prescription {
    Prescription {
        id: id.to_string(),
        user_id: user_id.to_string(),
        document_path: format!("prescriptions/{id}.jpg"),
        status: PrescriptionStatus::PendingApproval,
        uploaded_at: Utc::now(),
        product_id: None,
        dosage: None,
        quantity: None,
        expires_at: None,
        reviewed_by: None,
        reviewed_at: None,
        rejection_reason: None,
    }
}

/// Seeds a branch with one product and stock, the base for order tests.
pub(crate) async fn seed_shop(db: &Database) {
    db.branches().insert(&branch("br-1", "Main Branch")).await.unwrap();
    db.products()
        .insert(&product("p-1", "Panadol 500mg", 450, false))
        .await
        .unwrap();
    db.inventory()
        .insert_batch(&batch("bat-1", "br-1", "p-1", 20, 60))
        .await
        .unwrap();
}
