//! # Money Module
//!
//! Monetary values as integer cents.
//!
//! ## Why Integer Money?
//! Floating point cannot represent retail prices exactly (0.1 + 0.2 !=
//! 0.3), and accumulated per-line rounding silently loses cents over a day
//! of sales. All amounts in this system are `i64` cents; only formatting
//! for a receipt converts to a decimal string, and only the aggregate tax
//! is ever rounded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// Signed so that adjustments and corrections can be expressed; every
/// price and total produced by the checkout pipeline is non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity (line total = unit price x qty).
    #[inline]
    pub const fn times(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Calculates tax on this amount, rounding half-up to the cent.
    ///
    /// Applied exactly once per sale, on the aggregate subtotal. Line
    /// totals are exact products and are never rounded individually.
    ///
    /// Integer math: `(cents * bps + 5000) / 10000`; the +5000 rounds the
    /// half-cent up. i128 intermediate prevents overflow on large amounts.
    pub fn tax(&self, rate: TaxRate) -> Money {
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Parses a decimal amount string into Money.
    ///
    /// Accepts `"10000"`, `"10000.5"`, `"10,000.50"`. At most two fraction
    /// digits; returns `None` for anything else.
    pub fn parse(input: &str) -> Option<Money> {
        let cleaned = input.trim().replace(',', "");
        let (negative, body) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };

        let (major, minor) = match body.split_once('.') {
            Some((m, f)) => {
                if f.is_empty() || f.len() > 2 || !f.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                let scale = if f.len() == 1 { 10 } else { 1 };
                (m, f.parse::<i64>().ok()? * scale)
            }
            None => (body, 0),
        };

        if major.is_empty() || !major.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let cents = major.parse::<i64>().ok()?.checked_mul(100)?.checked_add(minor)?;
        Some(Money(if negative { -cents } else { cents }))
    }

    /// Formats as a 2-decimal string with thousands separators.
    ///
    /// `Money::from_cents(3_330_000).formatted() == "33,300.00"` - the
    /// layout every receipt and report uses.
    pub fn formatted(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        let digits = (abs / 100).to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        format!("{}{}.{:02}", sign, grouped, abs % 100)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
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
