//! # Money Module
//!
//! Provides the `Money` type for ticket prices, booking totals and payments.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  0.1 + 0.2 = 0.30000000000000004  ❌                                    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Ticket $19.99 × 3 = 1999 × 3 = 5997 cents, exactly                  │
//! │    Discounts round once, on the whole subtotal                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use eventhub_core::money::Money;
//!
//! let price = Money::from_cents(1999);
//! let subtotal = price.multiply_quantity(3);
//! assert_eq!(subtotal.cents(), 5997);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

use crate::CENTS_PER_LOYALTY_POINT;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// Event.price_cents ──► Booking.subtotal ──► discount ──► Booking.total
///                                                              │
///                                   Payment.amount ◄───────────┘
///                                         │
///                                         ▼
///                                  loyalty points (1 per unit)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units.
    ///
    /// ## Example
    /// ```rust
    /// use eventhub_core::money::Money;
    ///
    /// assert_eq!(Money::from_units(42).cents(), 4200);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units * 100)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion (dollars).
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the fractional portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies money by a ticket quantity.
    ///
    /// Saturates instead of overflowing; validated quantities never get close.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns `bps` basis points of this amount, rounded half-up.
    ///
    /// ## Example
    /// ```rust
    /// use eventhub_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(10000); // $100.00
    /// assert_eq!(subtotal.percentage(1500).cents(), 1500); // 15%
    /// assert_eq!(Money::from_cents(999).percentage(1000).cents(), 100); // 99.9 → 100
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        // i128 so price × quantity × bps cannot overflow
        let part = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(part as i64)
    }

    /// Loyalty points earned by paying this amount.
    ///
    /// One point per whole currency unit; fractions are dropped and
    /// non-positive amounts earn nothing.
    ///
    /// ## Example
    /// ```rust
    /// use eventhub_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(4200).loyalty_points(), 42);
    /// assert_eq!(Money::from_cents(4299).loyalty_points(), 42);
    /// ```
    #[inline]
    pub const fn loyalty_points(&self) -> i64 {
        if self.0 <= 0 {
            0
        } else {
            self.0 / CENTS_PER_LOYALTY_POINT
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display for logs and error messages; clients format their own.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.units().abs(), self.cents_part())
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

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents_and_units() {
        let money = Money::from_cents(1099);
        assert_eq!(money.units(), 10);
        assert_eq!(money.cents_part(), 99);
        assert_eq!(Money::from_units(42).cents(), 4200);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_cents(0).to_string(), "$0.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);
        assert_eq!((a + b).cents(), 1250);
        assert_eq!((a - b).cents(), 750);

        let mut c = a;
        c += b;
        assert_eq!(c.cents(), 1250);
    }

    #[test]
    fn test_multiply_quantity() {
        assert_eq!(Money::from_cents(1999).multiply_quantity(3).cents(), 5997);
        assert_eq!(Money::from_cents(i64::MAX).multiply_quantity(2).cents(), i64::MAX);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(Money::from_cents(10000).percentage(1000).cents(), 1000);
        // 5 × 10% = 0.5 → 1
        assert_eq!(Money::from_cents(5).percentage(1000).cents(), 1);
        assert_eq!(Money::from_cents(10000).percentage(10000).cents(), 10000);
        assert_eq!(Money::from_cents(10000).percentage(0).cents(), 0);
    }

    #[test]
    fn test_loyalty_points() {
        assert_eq!(Money::from_units(42).loyalty_points(), 42);
        assert_eq!(Money::from_cents(99).loyalty_points(), 0);
        assert_eq!(Money::from_cents(-500).loyalty_points(), 0);
    }
}
