//! # arnica-core: Pure Business Logic for Arnica
//!
//! This crate is the **heart** of Arnica, the pharmacy-chain commerce and
//! back-office platform. It contains all business logic as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Arnica Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     apps/api (Axum REST)                        │   │
//! │  │    Catalog ──► Cart ──► Checkout ──► Orders ──► Reports        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ arnica-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────────┐ ┌─────────────┐  │   │
//! │  │   │  types   │ │ checkout │ │ prescription │ │   safety    │  │   │
//! │  │   │ Product  │ │ decision │ │    state     │ │ interaction │  │   │
//! │  │   │  Branch  │ │  gates   │ │   machine    │ │   table     │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────────┘ └─────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   arnica-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog and organisation types (Product, Branch, Employee, ...)
//! - [`orders`] - Order, shipping, and delivery slot types with status rules
//! - [`prescription`] - Prescription entity and its approval state machine
//! - [`cart`] - Cart line math with price snapshots
//! - [`checkout`] - The pure checkout decision (stock, prescription, slot gates)
//! - [`safety`] - Static drug-interaction screening
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//! 5. **Injected Clock**: Anything time-dependent takes `now` as a parameter
//!
//! ## Example Usage
//!
//! ```rust
//! use arnica_core::money::Money;
//!
//! // Create money from cents (never from floats!)
//! let price = Money::from_cents(1099); // $10.99
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.cents(), 3297);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod money;
pub mod orders;
pub mod prescription;
pub mod safety;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use arnica_core::Money` instead of
// `use arnica_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use orders::*;
pub use prescription::{Prescription, PrescriptionStatus};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable order sizes.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product in a cart line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
/// and caps how much of a controlled item one order can move.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Days a prescription may sit in `PendingApproval` before the expiry
/// sweep closes it. Deployments can override via configuration; checkout
/// itself never reads this (it only trusts recorded expiry timestamps).
pub const DEFAULT_PENDING_REVIEW_TTL_DAYS: i64 = 30;
