//! # Pricing Module
//!
//! Totals computation for a cart.
//!
//! The pipeline is fixed: exact line totals, exact subtotal, tax rounded
//! half-up once on the aggregate, grand total as subtotal + tax. Tax is
//! never computed per line, so per-line rounding drift cannot occur.

use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::money::Money;
use crate::types::TaxRate;

// =============================================================================
// Totals
// =============================================================================

/// The three amounts printed on every receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl Totals {
    /// Computes totals for a cart at the given tax rate.
    ///
    /// Deterministic: the same cart and rate always produce the same
    /// totals, independent of the order lines were added.
    pub fn compute(cart: &Cart, rate: TaxRate) -> Totals {
        let subtotal = cart.subtotal();
        let tax = subtotal.tax(rate);
        Totals {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }

    /// Totals for an empty cart: all zero.
    pub fn zero() -> Totals {
        Totals {
            subtotal: Money::zero(),
            tax: Money::zero(),
            total: Money::zero(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
