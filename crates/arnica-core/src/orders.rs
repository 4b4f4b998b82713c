//! # Order Types
//!
//! Orders, order lines, shipping, and delivery slots, with the status rules
//! that govern them.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  awaiting_prescription ──► placed ──► processing ──┬─► ready_for_pickup│
//! │        (held orders)         ▲                     │         │          │
//! │                              │                     │         ▼          │
//! │   (pharmacist approves ──────┘                     └─► out_for_delivery│
//! │    the linked prescription)                                  │          │
//! │                                                              ▼          │
//! │            cancelled ◄── (any pre-shipment state)        completed     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every transition goes through [`OrderStatus::can_transition_to`]; the
//! repository refuses to write a move the graph does not allow.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Order Status
// =============================================================================

/// The status of a customer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created against a still-pending prescription; released by review.
    AwaitingPrescription,
    /// Validated and paid-referenced; waiting for the branch to pick it.
    Placed,
    /// Branch staff are assembling the order.
    Processing,
    /// Pickup orders only: assembled and waiting at the counter.
    ReadyForPickup,
    /// Delivery orders only: with a driver.
    OutForDelivery,
    /// Handed over (picked up or delivered).
    Completed,
    /// Cancelled before shipment; stock returned.
    Cancelled,
}

impl OrderStatus {
    /// Stable string form, matches the database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::AwaitingPrescription => "awaiting_prescription",
            OrderStatus::Placed => "placed",
            OrderStatus::Processing => "processing",
            OrderStatus::ReadyForPickup => "ready_for_pickup",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states accept no further transitions.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// An order can be cancelled until it leaves the branch.
    #[inline]
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            OrderStatus::AwaitingPrescription
                | OrderStatus::Placed
                | OrderStatus::Processing
                | OrderStatus::ReadyForPickup
        )
    }

    /// The legal transition graph.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (AwaitingPrescription, Placed) => true,
            (Placed, Processing) => true,
            (Processing, ReadyForPickup) => true,
            (Processing, OutForDelivery) => true,
            (ReadyForPickup, Completed) => true,
            (OutForDelivery, Completed) => true,
            (from, Cancelled) => from.can_cancel(),
            _ => false,
        }
    }
}

// =============================================================================
// Shipping Mode
// =============================================================================

/// How an order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ShippingMode {
    /// Customer collects at the branch.
    Pickup,
    /// Courier delivery from the dispatching branch.
    Delivery,
}

impl ShippingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingMode::Pickup => "pickup",
            ShippingMode::Delivery => "delivery",
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub delivery_fee_cents: i64,
    pub total_cents: i64,
    /// Prescription covering the controlled items, when any were ordered.
    pub prescription_id: Option<String>,
    /// External payment reference; capture happens outside this system.
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item in an order.
/// Uses snapshot pattern to freeze product data at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at checkout time (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at checkout time (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity, frozen.
    pub line_total_cents: i64,
    /// Controlled-item flag at checkout time (frozen, for compliance reports).
    pub requires_prescription: bool,
}

impl OrderItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Shipping
// =============================================================================

/// Shipping details for an order, one row per order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Shipping {
    pub id: String,
    pub order_id: String,
    pub mode: ShippingMode,
    /// Pickup branch, or the branch dispatching the delivery.
    pub branch_id: String,
    /// Delivery only.
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    /// Urgent deliveries skip the slot system and pay the urgent fee.
    pub urgent: bool,
    /// Scheduled (non-urgent) delivery only.
    pub slot_id: Option<String>,
    /// Assigned driver, set by the back office.
    pub driver_id: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Delivery Slot
// =============================================================================

/// A bookable delivery window a branch offers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DeliverySlot {
    pub id: String,
    pub branch_id: String,
    pub slot_date: NaiveDate,
    /// Human label like "09:00-12:00". Stored as `window_label` because
    /// WINDOW is reserved in SQLite.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "window_label"))]
    pub window: String,
    pub capacity: i64,
    /// Orders already booked into this slot.
    pub booked: i64,
    pub created_at: DateTime<Utc>,
}

impl DeliverySlot {
    #[inline]
    pub fn is_full(&self) -> bool {
        self.booked >= self.capacity
    }

    /// Bookable while there is capacity and the date has not passed.
    pub fn is_bookable(&self, on: NaiveDate) -> bool {
        !self.is_full() && self.slot_date >= on
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_happy_paths() {
        use OrderStatus::*;
        assert!(AwaitingPrescription.can_transition_to(Placed));
        assert!(Placed.can_transition_to(Processing));
        assert!(Processing.can_transition_to(ReadyForPickup));
        assert!(Processing.can_transition_to(OutForDelivery));
        assert!(ReadyForPickup.can_transition_to(Completed));
        assert!(OutForDelivery.can_transition_to(Completed));
    }

    #[test]
    fn test_order_status_illegal_moves() {
        use OrderStatus::*;
        assert!(!Placed.can_transition_to(Completed));
        assert!(!Placed.can_transition_to(AwaitingPrescription));
        assert!(!OutForDelivery.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Placed));
    }

    #[test]
    fn test_cancel_window_closes_at_dispatch() {
        use OrderStatus::*;
        assert!(AwaitingPrescription.can_cancel());
        assert!(Placed.can_cancel());
        assert!(Processing.can_cancel());
        assert!(ReadyForPickup.can_cancel());
        assert!(!OutForDelivery.can_cancel());
        assert!(!Completed.can_cancel());
        assert!(!Cancelled.can_cancel());
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Placed.is_terminal());
    }

    #[test]
    fn test_slot_bookability() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let mut slot = DeliverySlot {
            id: "s1".to_string(),
            branch_id: "br1".to_string(),
            slot_date: today,
            window: "09:00-12:00".to_string(),
            capacity: 2,
            booked: 0,
            created_at: Utc::now(),
        };
        assert!(slot.is_bookable(today));

        slot.booked = 2;
        assert!(slot.is_full());
        assert!(!slot.is_bookable(today));

        slot.booked = 1;
        slot.slot_date = today - chrono::Duration::days(1);
        assert!(!slot.is_bookable(today));
    }
}
