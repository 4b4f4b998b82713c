//! Shared fixtures for repository tests.
//!
//! Builders return fully-populated rows with sensible defaults; tests
//! override what they care about and insert through the repositories.

use chrono::{Duration, Utc};

use arnica_core::{
    Branch, DeliverySlot, Employee, EmployeeRole, InventoryBatch, Prescription,
    PrescriptionStatus, Product,
};

pub fn product(
    id: &str,
    sku: &str,
    name: &str,
    price_cents: i64,
    requires_prescription: bool,
) -> Product {
    let now = Utc::now();
    Product {
        id: id.to_string(),
        sku: sku.to_string(),
        name: name.to_string(),
        description: None,
        category_id: None,
        supplier_id: None,
        price_cents,
        requires_prescription,
        active_ingredient: None,
        image_path: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn branch(id: &str, name: &str) -> Branch {
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
pub fn batch(
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

pub fn employee(id: &str, name: &str, role: EmployeeRole, branch_id: &str) -> Employee {
    let now = Utc::now();
    Employee {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{id}@arnica.test"),
        role,
        branch_id: branch_id.to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// A slot `days_ahead` from today (negative = in the past).
pub fn slot(
    id: &str,
    branch_id: &str,
    days_ahead: i64,
    window: &str,
    capacity: i64,
) -> DeliverySlot {
    let now = Utc::now();
    DeliverySlot {
        id: id.to_string(),
        branch_id: branch_id.to_string(),
        slot_date: now.date_naive() + Duration::days(days_ahead),
        window: window.to_string(),
        capacity,
        booked: 0,
        created_at: now,
    }
}

pub fn pending_prescription(id: &str, user_id: &str) -> Prescription {
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
