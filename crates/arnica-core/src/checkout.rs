//! # Checkout Decision
//!
//! Given a cart and shipping selection, decide whether an order can be
//! created. This is the one place the decision is made; the API layer only
//! gathers facts (cart lines, branch stock, the referenced prescription,
//! the selected slot) and the database layer only executes the outcome.
//!
//! ## Decision Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Cart bounds ──► Shipping shape ──► Stock ──► Prescription ──► Slot    │
//! │                                      │            │                     │
//! │                                      │            └─ pending reference  │
//! │                                      │               ⇒ order held as    │
//! │                                      │               awaiting_…         │
//! │                                      │                                  │
//! │                                      └─ any shortfall ⇒ reject with    │
//! │                                         the unavailable product names  │
//! │                                                                         │
//! │  All failures are synchronous, typed, and final: no retries, no        │
//! │  compensation. Payment capture is external (intent id only).           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock map passed in is advisory (it produces the full shortfall
//! list); the order repository re-verifies availability inside the write
//! transaction, so a concurrent sale can still abort cleanly.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::orders::{DeliverySlot, OrderStatus, ShippingMode};
use crate::prescription::{Prescription, PrescriptionUse};

// =============================================================================
// Inputs
// =============================================================================

/// The customer's shipping selection, straight from the request.
#[derive(Debug, Clone)]
pub struct ShippingSelection {
    pub mode: ShippingMode,
    /// Pickup branch, or the branch dispatching the delivery.
    pub branch_id: String,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub urgent: bool,
    pub slot_id: Option<String>,
}

/// Everything the decision needs, gathered by the caller.
///
/// `stock` maps product id → unexpired units at the selected branch.
/// `prescription` and `slot` are the resolved referenced rows, when the
/// request named them.
#[derive(Debug, Clone)]
pub struct CheckoutContext {
    pub user_id: String,
    pub cart: Cart,
    pub shipping: ShippingSelection,
    pub stock: HashMap<String, i64>,
    pub prescription: Option<Prescription>,
    pub slot: Option<DeliverySlot>,
}

/// Delivery fees, from configuration.
#[derive(Debug, Clone, Copy)]
pub struct FeeSchedule {
    pub delivery_fee_cents: i64,
    pub urgent_delivery_fee_cents: i64,
}

impl FeeSchedule {
    /// Fee for a given selection: pickup is free, urgent pays the premium.
    pub fn fee_for(&self, mode: ShippingMode, urgent: bool) -> i64 {
        match (mode, urgent) {
            (ShippingMode::Pickup, _) => 0,
            (ShippingMode::Delivery, false) => self.delivery_fee_cents,
            (ShippingMode::Delivery, true) => self.urgent_delivery_fee_cents,
        }
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// A positive checkout decision: what the order repository should write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutDecision {
    pub subtotal_cents: i64,
    pub delivery_fee_cents: i64,
    pub total_cents: i64,
    /// `Placed`, or `AwaitingPrescription` when the reference is pending.
    pub initial_status: OrderStatus,
    /// The prescription attached to the order, when controlled items exist.
    pub prescription_id: Option<String>,
}

// =============================================================================
// The Decision
// =============================================================================

/// Product names the branch cannot cover, in cart order.
pub fn unavailable_products(cart: &Cart, stock: &HashMap<String, i64>) -> Vec<String> {
    cart.lines
        .iter()
        .filter(|line| stock.get(&line.product_id).copied().unwrap_or(0) < line.quantity)
        .map(|line| line.name.clone())
        .collect()
}

/// Runs the full checkout decision.
pub fn evaluate(
    ctx: &CheckoutContext,
    fees: &FeeSchedule,
    now: DateTime<Utc>,
) -> CoreResult<CheckoutDecision> {
    ctx.cart.validate()?;
    validate_shipping_shape(&ctx.shipping)?;

    // Stock first: the customer gets the complete shortfall list in one
    // round trip, not one product per attempt.
    let unavailable = unavailable_products(&ctx.cart, &ctx.stock);
    if !unavailable.is_empty() {
        return Err(CoreError::InsufficientStock { unavailable });
    }

    // Prescription gate, only when controlled items are in the cart.
    let mut initial_status = OrderStatus::Placed;
    let mut prescription_id = None;
    if ctx.cart.contains_controlled_items() {
        let rx = ctx
            .prescription
            .as_ref()
            .ok_or(CoreError::PrescriptionRequired)?;
        match rx.usability_for_order(&ctx.user_id, now)? {
            PrescriptionUse::Ready => {}
            PrescriptionUse::HeldForReview => initial_status = OrderStatus::AwaitingPrescription,
        }
        prescription_id = Some(rx.id.clone());
    }

    // Slot gate for scheduled delivery.
    if ctx.shipping.mode == ShippingMode::Delivery && !ctx.shipping.urgent {
        let slot = ctx.slot.as_ref().ok_or(CoreError::SlotRequired)?;
        if slot.branch_id != ctx.shipping.branch_id {
            return Err(CoreError::SlotWrongBranch);
        }
        if slot.slot_date < now.date_naive() {
            return Err(CoreError::SlotInPast);
        }
        if slot.is_full() {
            return Err(CoreError::SlotFull);
        }
    }

    let subtotal_cents = ctx.cart.subtotal_cents();
    let delivery_fee_cents = fees.fee_for(ctx.shipping.mode, ctx.shipping.urgent);

    Ok(CheckoutDecision {
        subtotal_cents,
        delivery_fee_cents,
        total_cents: subtotal_cents + delivery_fee_cents,
        initial_status,
        prescription_id,
    })
}

/// Structural checks on the shipping selection.
///
/// Urgent deliveries ignore any slot id (they bypass the slot system);
/// scheduled deliveries get their slot checked in [`evaluate`] once the
/// slot row is resolved.
fn validate_shipping_shape(shipping: &ShippingSelection) -> CoreResult<()> {
    if shipping.branch_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "branchId".to_string(),
        }
        .into());
    }
    if shipping.mode == ShippingMode::Delivery {
        require_present("addressLine", shipping.address_line.as_deref())?;
        require_present("city", shipping.city.as_deref())?;
        require_present("postalCode", shipping.postal_code.as_deref())?;
        if !shipping.urgent && shipping.slot_id.is_none() {
            return Err(CoreError::SlotRequired);
        }
    }
    Ok(())
}

fn require_present(field: &str, value: Option<&str>) -> CoreResult<()> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::Required {
            field: field.to_string(),
        }
        .into()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
