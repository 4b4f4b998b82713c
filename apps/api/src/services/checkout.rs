//! # Checkout Service
//!
//! Turns a checkout request into an order, in three phases:
//!
//! 1. Gather: cart lines, the branch, an advisory stock snapshot, and the
//!    referenced prescription and slot rows.
//! 2. Decide: [`arnica_core::checkout::evaluate`] runs every business
//!    check and prices the order.
//! 3. Execute: the order repository writes order, items, shipping, stock
//!    draws, and the slot booking in one transaction; then the cart is
//!    cleared.
//!
//! A stock conflict inside the write transaction is translated back to
//! the product's display name, so racing checkouts fail with the same
//! response shape as the advisory check.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use arnica_core::cart::Cart;
use arnica_core::checkout::{self, CheckoutContext, ShippingSelection};
use arnica_core::{Order, OrderItem, OrderStatus, Shipping, ShippingMode};
use arnica_db::{DbError, NewOrder};

use crate::error::{ApiError, ErrorCode};
use crate::SharedState;

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub user_id: String,
    pub shipping: ShippingRequest,
    /// Prescription covering the cart's controlled items, if any.
    pub prescription_id: Option<String>,
    /// External payment reference; stored, never charged here.
    pub payment_intent_id: Option<String>,
}

/// Wire form of the shipping selection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRequest {
    pub mode: ShippingMode,
    pub branch_id: String,
    #[serde(default)]
    pub address_line: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub slot_id: Option<String>,
}

impl From<ShippingRequest> for ShippingSelection {
    fn from(request: ShippingRequest) -> Self {
        ShippingSelection {
            mode: request.mode,
            branch_id: request.branch_id,
            address_line: request.address_line,
            city: request.city,
            postal_code: request.postal_code,
            urgent: request.urgent,
            slot_id: request.slot_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order_id: String,
    pub shipping_id: String,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub delivery_fee_cents: i64,
    pub total_cents: i64,
}

// =============================================================================
// The Service
// =============================================================================

/// Runs a full checkout for `request.user_id`'s current cart.
pub async fn process(
    state: &SharedState,
    request: CheckoutRequest,
) -> Result<CheckoutResponse, ApiError> {
    let now = Utc::now();
    let today = now.date_naive();

    let lines = state.db.carts().lines_for_user(&request.user_id).await?;
    let cart = Cart::new(lines);

    let branch = state
        .db
        .branches()
        .get_by_id(&request.shipping.branch_id)
        .await?
        .ok_or_else(|| ApiError::missing("Branch", &request.shipping.branch_id))?;
    if !branch.is_active {
        return Err(ApiError::unprocessable(
            ErrorCode::BranchInactive,
            format!("Branch {} is not accepting orders", branch.id),
        ));
    }

    let product_ids: Vec<String> = cart.lines.iter().map(|l| l.product_id.clone()).collect();
    let stock = state
        .db
        .inventory()
        .availability_map(&branch.id, &product_ids, today)
        .await?;

    // Referenced rows must exist before the decision ever sees them.
    let prescription = match &request.prescription_id {
        Some(id) => Some(
            state
                .db
                .prescriptions()
                .get_by_id(id)
                .await?
                .ok_or_else(|| ApiError::missing("Prescription", id))?,
        ),
        None => None,
    };
    let slot = match &request.shipping.slot_id {
        Some(id) => Some(
            state
                .db
                .delivery()
                .get_slot(id)
                .await?
                .ok_or_else(|| ApiError::missing("Delivery slot", id))?,
        ),
        None => None,
    };

    let ctx = CheckoutContext {
        user_id: request.user_id.clone(),
        cart,
        shipping: ShippingSelection::from(request.shipping),
        stock,
        prescription,
        slot,
    };
    let decision = checkout::evaluate(&ctx, &state.config.fee_schedule(), now)?;

    let order_id = Uuid::new_v4().to_string();
    let shipping_id = Uuid::new_v4().to_string();

    let order = Order {
        id: order_id.clone(),
        user_id: request.user_id.clone(),
        status: decision.initial_status,
        subtotal_cents: decision.subtotal_cents,
        delivery_fee_cents: decision.delivery_fee_cents,
        total_cents: decision.total_cents,
        prescription_id: decision.prescription_id,
        payment_intent_id: request.payment_intent_id,
        created_at: now,
        updated_at: now,
    };

    let items: Vec<OrderItem> = ctx
        .cart
        .lines
        .iter()
        .map(|line| OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.clone(),
            product_id: line.product_id.clone(),
            name_snapshot: line.name.clone(),
            unit_price_cents: line.unit_price_cents,
            quantity: line.quantity,
            line_total_cents: line.line_total_cents(),
            requires_prescription: line.requires_prescription,
        })
        .collect();

    // Pickup rows carry no address; urgent deliveries carry no slot.
    let (address_line, city, postal_code, slot_id) = match ctx.shipping.mode {
        ShippingMode::Pickup => (None, None, None, None),
        ShippingMode::Delivery => (
            ctx.shipping.address_line.clone(),
            ctx.shipping.city.clone(),
            ctx.shipping.postal_code.clone(),
            if ctx.shipping.urgent {
                None
            } else {
                ctx.shipping.slot_id.clone()
            },
        ),
    };
    let shipping = Shipping {
        id: shipping_id.clone(),
        order_id: order_id.clone(),
        mode: ctx.shipping.mode,
        branch_id: ctx.shipping.branch_id.clone(),
        address_line,
        city,
        postal_code,
        urgent: ctx.shipping.urgent,
        slot_id,
        driver_id: None,
        delivered_at: None,
        created_at: now,
    };

    let new_order = NewOrder {
        order,
        items,
        shipping,
    };
    match state.db.orders().place_order(&new_order, today).await {
        Ok(()) => {}
        // Advisory check passed but the transaction found less; answer
        // with the display name, same shape as the advisory rejection.
        Err(DbError::StockConflict { product_id, .. }) => {
            let name = ctx
                .cart
                .lines
                .iter()
                .find(|l| l.product_id == product_id)
                .map(|l| l.name.clone())
                .unwrap_or(product_id);
            return Err(ApiError::stock_conflict(vec![name]));
        }
        Err(other) => return Err(other.into()),
    }

    state.db.carts().clear(&request.user_id).await?;

    info!(
        order_id = %order_id,
        user = %request.user_id,
        status = new_order.order.status.as_str(),
        total_cents = new_order.order.total_cents,
        "Checkout complete"
    );

    Ok(CheckoutResponse {
        order_id,
        shipping_id,
        status: new_order.order.status,
        subtotal_cents: new_order.order.subtotal_cents,
        delivery_fee_cents: new_order.order.delivery_fee_cents,
        total_cents: new_order.order.total_cents,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
