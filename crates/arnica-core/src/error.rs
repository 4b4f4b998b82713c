//! # Error Types
//!
//! Domain-specific error types for arnica-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  arnica-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule rejections                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  arnica-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  REST API errors (in app)                                              │
//! │  └── ApiError         - What clients see (status + JSON body)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product names, statuses, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout attempted with an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed distinct products.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// One or more cart items cannot be covered by branch stock.
    ///
    /// ## When This Occurs
    /// - Requested quantity exceeds the sum of unexpired batches at the branch
    /// - A concurrent order drained the shelf between check and commit
    ///
    /// ## Checkout Workflow
    /// ```text
    /// Checkout (paracetamol x5, insulin x2)
    ///      │
    ///      ▼
    /// Branch stock: paracetamol=3, insulin=10
    ///      │
    ///      ▼
    /// InsufficientStock { unavailable: ["Paracetamol 500mg"] }
    ///      │
    ///      ▼
    /// 409 response listing the unavailable product names
    /// ```
    #[error("Insufficient stock for: {}", unavailable.join(", "))]
    InsufficientStock { unavailable: Vec<String> },

    /// Cart contains controlled items but no prescription was referenced.
    #[error("A prescription is required for one or more items in this order")]
    PrescriptionRequired,

    /// Referenced prescription is not usable for checkout.
    ///
    /// Raised for rejected or expired prescriptions; pending ones take the
    /// held-order path instead and approved ones pass the gate.
    #[error("Prescription is {status} and cannot be used for this order")]
    PrescriptionNotUsable { status: String },

    /// Referenced prescription is approved but its validity window has passed.
    ///
    /// Checked against the recorded expiry timestamp directly, so the gate
    /// holds even when the expiry sweep has not run yet.
    #[error("Prescription expired at {expired_at}")]
    PrescriptionExpired { expired_at: String },

    /// Referenced prescription belongs to a different user.
    #[error("Prescription does not belong to this user")]
    PrescriptionWrongUser,

    /// Approve/reject attempted on a prescription that is not pending.
    ///
    /// ## When This Occurs
    /// - Approving an already approved prescription
    /// - Rejecting one the sweep has expired
    /// - Double review by two pharmacists (second loses)
    #[error("Prescription {prescription_id} is {current_status}, expected pending_approval")]
    PrescriptionNotPending {
        prescription_id: String,
        current_status: String,
    },

    /// Scheduled delivery requested without a slot.
    #[error("A delivery slot is required for scheduled delivery")]
    SlotRequired,

    /// Selected slot belongs to another branch.
    #[error("Delivery slot belongs to a different branch")]
    SlotWrongBranch,

    /// Selected slot's date is in the past.
    #[error("Delivery slot date has already passed")]
    SlotInPast,

    /// Selected slot is fully booked.
    #[error("Delivery slot is fully booked")]
    SlotFull,

    /// Order is not in a state that allows the requested transition.
    ///
    /// ## When This Occurs
    /// - Cancelling an order that is already out for delivery
    /// - Marking a cancelled order completed
    /// - Any move not on the order status graph
    #[error("Order {order_id} is {current_status}, cannot move to {requested_status}")]
    InvalidOrderTransition {
        order_id: String,
        current_status: String,
        requested_status: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., a date that does not parse, an unknown
    /// enum value, an expiry in the past).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
