//! # Money Module
//!
//! Integer money. Every monetary value in the system is an i64 count of
//! cents: the database columns, the API payloads, and the arithmetic in
//! between. [`Money`] wraps that i64 for the places that want typed
//! arithmetic or display formatting; it never holds a float, and no
//! constructor accepts one.
//!
//! A tenth plus two tenths is not three tenths in binary floating point,
//! and a price times a quantity must not depend on rounding mode. With
//! cents the only precision loss possible is integer division, which is
//! visible at the call site and handled there.
//!
//! ## Where Money Flows
//! ```text
//! Product.price_cents ──► CartLine.unit_price ──► CartLine.line_total
//!
//! Cart subtotal ──► + Delivery fee ──► Order.total_cents
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// Signed, so refunds and adjustments are representable. Zero-cost over
/// the underlying i64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a value from cents.
    ///
    /// ```rust
    /// use arnica_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// The raw cent count.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// The major unit (dollars) portion, truncated toward zero.
    ///
    /// Only a client converts to dollars for display.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// The minor unit portion, always 0-99.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Line total: unit price times quantity.
    ///
    /// ```rust
    /// use arnica_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(450);
    /// assert_eq!(unit_price.multiply_quantity(2).cents(), 900);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// `$10.99` / `-$5.50` form, for logs. Clients format for locale
/// themselves.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
