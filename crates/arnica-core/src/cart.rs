//! # Cart Math
//!
//! Pure cart lines and totals. Carts themselves live in the database, one
//! row per (user, product); this module is the arithmetic and the bounds
//! every checkout runs against the loaded lines.
//!
//! ## Price Freezing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart rows store (user, product, quantity) only.                        │
//! │                                                                         │
//! │  At checkout the lines are joined to the catalog and the price is       │
//! │  frozen into the order items. A price change after checkout never       │
//! │  touches an existing order; a price change before checkout is simply    │
//! │  the current price.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::Product;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One cart line, already joined to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product ID (UUID)
    pub product_id: String,

    /// Product name at load time
    pub name: String,

    /// Current catalog price in cents
    pub unit_price_cents: i64,

    /// Quantity requested
    pub quantity: i64,

    /// Controlled-item flag, drives the prescription gate
    pub requires_prescription: bool,
}

impl CartLine {
    /// Builds a line from a catalog product and a quantity.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            requires_prescription: product.requires_prescription,
        }
    }

    /// Line total (unit price × quantity).
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A loaded cart: the user's lines at one point in time.
///
/// ## Invariants (checked by [`Cart::validate`])
/// - non-empty at checkout
/// - at most [`MAX_CART_ITEMS`] distinct products
/// - every quantity in 1..=[`MAX_ITEM_QUANTITY`]
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(lines: Vec<CartLine>) -> Self {
        Cart { lines }
    }

    /// Checks the cart bounds ahead of any checkout work.
    pub fn validate(&self) -> CoreResult<()> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        if self.lines.len() > MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }
        for line in &self.lines {
            if line.quantity < 1 || line.quantity > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: line.quantity,
                    max: MAX_ITEM_QUANTITY,
                });
            }
        }
        Ok(())
    }

    /// Number of distinct products.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of line totals.
    pub fn subtotal_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.line_total_cents()).sum()
    }

    /// Whether any line is a controlled item.
    pub fn contains_controlled_items(&self) -> bool {
        self.lines.iter().any(|l| l.requires_prescription)
    }

    /// The controlled lines, for compliance reporting.
    pub fn controlled_lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter().filter(|l| l.requires_prescription)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cart totals summary for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            subtotal_cents: cart.subtotal_cents(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
