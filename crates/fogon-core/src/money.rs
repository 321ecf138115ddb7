//! # Money Module
//!
//! Provides the `Money` type for amounts that get posted to the ledger.
//!
//! ## Two Numeric Worlds
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UNIT COSTS (f64, major units)          POSTED AMOUNTS (Money, cents)   │
//! │                                                                         │
//! │  Recipe roll-up: 2505 / 10 = 250.5      Voucher line: 250_50 cents      │
//! │  Moving average: weighted means         Trial balance: exact sums       │
//! │                                                                         │
//! │  Derived, divided, never rounded        Rounded ONCE at the boundary    │
//! │  mid-computation                        with Money::from_major_f64      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Debits must equal credits to the centavo, so anything that reaches a
//! journal line is an integer amount of the smallest currency unit.
//!
//! ## Usage
//! ```rust
//! use fogon_core::money::Money;
//!
//! let price = Money::from_cents(1099);
//! let total = price + Money::from_cents(500);
//! assert_eq!(total.cents(), 1599);
//!
//! // Rounding a derived cost for posting
//! assert_eq!(Money::from_major_f64(250.5).cents(), 25050);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (centavos).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative balances in the trial balance
/// - **Single field tuple struct**: Zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Rounds a major-unit amount (e.g. a derived unit cost × quantity) to
    /// the nearest cent, half away from zero.
    ///
    /// Non-finite input yields zero; callers validate costs before posting.
    ///
    /// ## Example
    /// ```rust
    /// use fogon_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_f64(2505.0).cents(), 250_500);
    /// assert_eq!(Money::from_major_f64(0.004).cents(), 0);
    /// assert_eq!(Money::from_major_f64(-1.5).cents(), -150);
    /// ```
    pub fn from_major_f64(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        Money((amount * 100.0).round() as i64)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (pesos) portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (centavos) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the amount in major units as a float (display/reporting only).
    #[inline]
    pub fn as_major_f64(&self) -> f64 {
        self.0 as f64 / 100.0
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `$1234.50`. Thousands separators for COP belong to the
/// frontend.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.major().abs(), self.cents_part())
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_major_f64_rounding() {
        assert_eq!(Money::from_major_f64(250.5).cents(), 25050);
        assert_eq!(Money::from_major_f64(0.125).cents(), 13);
        assert_eq!(Money::from_major_f64(f64::NAN).cents(), 0);
        assert_eq!(Money::from_major_f64(f64::INFINITY).cents(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let mut c = a;
        c += b;
        c -= Money::from_cents(200);
        assert_eq!(c.cents(), 1300);
    }

    #[test]
    fn test_sum() {
        let amounts = [Money::from_cents(100), Money::from_cents(250), Money::from_cents(-50)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.cents(), 300);
        let total: Money = amounts.into_iter().sum();
        assert_eq!(total.cents(), 300);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().cents(), 100);
        assert!((Money::from_cents(25050).as_major_f64() - 250.5).abs() < 1e-9);
    }
}
