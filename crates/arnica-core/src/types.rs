//! # Domain Types
//!
//! Catalog and organisation types used throughout Arnica.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Branch      │   │ InventoryBatch  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  name           │   │  branch_id (FK) │       │
//! │  │  price_cents    │   │  address        │   │  product_id(FK) │       │
//! │  │  requires_rx    │   │  is_active      │   │  expiry_date    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │    Supplier     │   │    Employee     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, name       │   │  id, name       │   │  id, role       │       │
//! │  │  image_path     │   │  contact_email  │   │  branch_id (FK) │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (sku, branch name) - human-readable
//!
//! Stock is never a column on Product: availability at a branch is the sum
//! of that branch's unexpired [`InventoryBatch`] rows for the product.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the pharmacy catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown in the catalog and on order lines.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Category this product belongs to.
    pub category_id: Option<String>,

    /// Supplier this product is sourced from.
    pub supplier_id: Option<String>,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Whether purchase requires a valid prescription (controlled item).
    pub requires_prescription: bool,

    /// Active pharmaceutical ingredient, normalized lowercase.
    /// Feeds the interaction screen; None for non-medicinal products.
    pub active_ingredient: Option<String>,

    /// Relative path of the uploaded product image, if any.
    pub image_path: Option<String>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether this is a controlled item (prescription required).
    #[inline]
    pub fn is_controlled(&self) -> bool {
        self.requires_prescription
    }
}

// =============================================================================
// Category
// =============================================================================

/// A catalog category (e.g. "Pain Relief", "First Aid").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Relative path of the uploaded category image, if any.
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Supplier
// =============================================================================

/// A wholesale supplier products are sourced from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Branch
// =============================================================================

/// A physical pharmacy location holding its own inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    /// Inactive branches take no new orders but keep history.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Employee Role
// =============================================================================

/// Back-office roles. Fixed set; there is no identity system behind it,
/// role drives which workflows an employee id may appear in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    /// Full back-office access.
    Admin,
    /// Branch management: inventory, employees, slots.
    Manager,
    /// Reviews prescriptions.
    Pharmacist,
    /// Fulfils deliveries.
    Driver,
}

impl EmployeeRole {
    /// Stable string form, matches the database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeRole::Admin => "admin",
            EmployeeRole::Manager => "manager",
            EmployeeRole::Pharmacist => "pharmacist",
            EmployeeRole::Driver => "driver",
        }
    }

    /// Every role, in display order. Backs the roles listing endpoint.
    pub const fn all() -> [EmployeeRole; 4] {
        [
            EmployeeRole::Admin,
            EmployeeRole::Manager,
            EmployeeRole::Pharmacist,
            EmployeeRole::Driver,
        ]
    }

    /// Whether this role may approve or reject prescriptions.
    #[inline]
    pub fn can_review_prescriptions(&self) -> bool {
        matches!(self, EmployeeRole::Pharmacist)
    }

    /// Whether this role may be assigned deliveries.
    #[inline]
    pub fn can_deliver(&self) -> bool {
        matches!(self, EmployeeRole::Driver)
    }
}

// =============================================================================
// Employee
// =============================================================================

/// A back-office employee attached to a branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: EmployeeRole,
    pub branch_id: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Inventory Batch
// =============================================================================

/// Stock arrives in batches with an expiry date, per (branch, product).
///
/// ## Why Batches?
/// ```text
/// Branch "Downtown", Paracetamol 500mg:
///   batch A: qty 40, expires 2026-09-30   ◄── drawn first (FEFO)
///   batch B: qty 100, expires 2027-02-28
///
/// available = 140 while both unexpired; expired batches count for
/// nothing and are eventually discarded by the back office.
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryBatch {
    pub id: String,
    pub branch_id: String,
    pub product_id: String,
    /// Units remaining in this batch.
    pub quantity: i64,
    /// Last day the batch is sellable (inclusive).
    pub expiry_date: NaiveDate,
    pub received_at: DateTime<Utc>,
}

impl InventoryBatch {
    /// A batch is usable through its expiry date, expired after it.
    #[inline]
    pub fn is_expired(&self, on: NaiveDate) -> bool {
        self.expiry_date < on
    }

    /// Whether the batch expires within `days` of `on` (and is not yet expired).
    pub fn expires_within(&self, days: i64, on: NaiveDate) -> bool {
        !self.is_expired(on) && self.expiry_date <= on + chrono::Duration::days(days)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(expiry: NaiveDate) -> InventoryBatch {
        InventoryBatch {
            id: "b1".to_string(),
            branch_id: "br1".to_string(),
            product_id: "p1".to_string(),
            quantity: 10,
            expiry_date: expiry,
            received_at: Utc::now(),
        }
    }

    #[test]
    fn test_batch_usable_through_expiry_date() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let b = batch(today);
        assert!(!b.is_expired(today));
        assert!(b.is_expired(today + chrono::Duration::days(1)));
    }

    #[test]
    fn test_batch_expires_within_window() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let b = batch(today + chrono::Duration::days(20));
        assert!(b.expires_within(30, today));
        assert!(!b.expires_within(10, today));

        // Already expired batches are not "expiring"
        let dead = batch(today - chrono::Duration::days(1));
        assert!(!dead.expires_within(30, today));
    }

    #[test]
    fn test_role_helpers() {
        assert!(EmployeeRole::Pharmacist.can_review_prescriptions());
        assert!(!EmployeeRole::Driver.can_review_prescriptions());
        assert!(EmployeeRole::Driver.can_deliver());
        assert_eq!(EmployeeRole::Manager.as_str(), "manager");
        assert_eq!(EmployeeRole::all().len(), 4);
    }

    #[test]
    fn test_product_helpers() {
        let product = Product {
            id: "p1".to_string(),
            sku: "PARA-500".to_string(),
            name: "Paracetamol 500mg".to_string(),
            description: None,
            category_id: None,
            supplier_id: None,
            price_cents: 450,
            requires_prescription: false,
            active_ingredient: Some("paracetamol".to_string()),
            image_path: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(product.price().cents(), 450);
        assert!(!product.is_controlled());
    }
}
