//! # Cart Module
//!
//! In-memory cart for the single active checkout.
//!
//! ## Advisory vs. Authoritative Stock Checks
//! `add_product` rejects quantities that exceed the stock level the caller
//! just read from the catalog. That check is advisory only - it gives the
//! cashier an early, friendly error. The authoritative check happens inside
//! the commit transaction in warung-db, against a re-read quantity, and is
//! the only one that guards the invariant `quantity >= 0`.
//!
//! ## Snapshot Pricing
//! A cart line freezes the product's name and unit price at the moment it
//! is added. Catalog edits between add and checkout do not change what the
//! customer is charged.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One distinct product in the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Product UUID, carried through to the sale item.
    pub product_id: String,

    /// Barcode, the key used to merge repeated scans.
    pub barcode: String,

    /// Product name frozen at add time.
    pub name: String,

    /// Unit price in cents frozen at add time.
    pub unit_price_cents: i64,

    /// Quantity in the cart; always >= 1.
    pub quantity: i64,

    /// Stock level observed when the line was first added. Used only for
    /// the advisory check on subsequent adds of the same barcode.
    pub available: i64,
}

impl CartLine {
    /// Unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Exact line total: unit price x quantity, never rounded.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().times(self.quantity)
    }
}

// =============================================================================
// Line Reference
// =============================================================================

/// How a caller points at a cart line for removal or quantity changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRef {
    /// Zero-based position in display order.
    Index(usize),
    /// Barcode of the line's product.
    Barcode(String),
}

// =============================================================================
// Cart
// =============================================================================

/// The active cart. Plain data, no locking; callers that share a cart
/// across tasks wrap it in their own synchronization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds a product to the cart, merging with an existing line for the
    /// same barcode.
    ///
    /// Rejects the add when the combined quantity would exceed the stock
    /// level observed in `product` (advisory check), the per-line maximum,
    /// or the cart line limit. On any error the cart is unchanged.
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validation::validate_sale_quantity(quantity)?;

        let existing_qty = self
            .lines
            .iter()
            .find(|line| line.barcode == product.barcode)
            .map(|line| line.quantity)
            .unwrap_or(0);
        let combined = existing_qty + quantity;

        if combined > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: combined,
                max: MAX_LINE_QUANTITY,
            });
        }
        if combined > product.quantity {
            return Err(CoreError::InsufficientStock {
                barcode: product.barcode.clone(),
                name: product.name.clone(),
                available: product.quantity,
                requested: combined,
            });
        }

        match self
            .lines
            .iter_mut()
            .find(|line| line.barcode == product.barcode)
        {
            Some(line) => {
                line.quantity = combined;
                line.available = product.quantity;
            }
            None => {
                if self.lines.len() >= MAX_CART_LINES {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_LINES,
                    });
                }
                self.lines.push(CartLine {
                    product_id: product.id.clone(),
                    barcode: product.barcode.clone(),
                    name: product.name.clone(),
                    unit_price_cents: product.selling_price_cents,
                    quantity,
                    available: product.quantity,
                });
            }
        }
        Ok(())
    }

    /// Removes a whole line by index or barcode.
    pub fn remove_line(&mut self, line_ref: &LineRef) -> CoreResult<CartLine> {
        let index = match line_ref {
            LineRef::Index(i) => {
                if *i >= self.lines.len() {
                    return Err(CoreError::LineNotFound(format!("#{}", i + 1)));
                }
                *i
            }
            LineRef::Barcode(barcode) => self
                .lines
                .iter()
                .position(|line| &line.barcode == barcode)
                .ok_or_else(|| CoreError::LineNotFound(barcode.clone()))?,
        };
        Ok(self.lines.remove(index))
    }

    /// Sets the quantity of an existing line; 0 removes it.
    pub fn set_quantity(&mut self, line_ref: &LineRef, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            self.remove_line(line_ref)?;
            return Ok(());
        }
        validation::validate_sale_quantity(quantity)?;
        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        let line = match line_ref {
            LineRef::Index(i) => self
                .lines
                .get_mut(*i)
                .ok_or_else(|| CoreError::LineNotFound(format!("#{}", i + 1)))?,
            LineRef::Barcode(barcode) => self
                .lines
                .iter_mut()
                .find(|line| &line.barcode == barcode)
                .ok_or_else(|| CoreError::LineNotFound(barcode.clone()))?,
        };

        if quantity > line.available {
            return Err(CoreError::InsufficientStock {
                barcode: line.barcode.clone(),
                name: line.name.clone(),
                available: line.available,
                requested: quantity,
            });
        }
        line.quantity = quantity;
        Ok(())
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in display (insertion) order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when no lines are present.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of line quantities.
    pub fn total_items(&self) -> i64 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Sum of exact line totals.
    pub fn subtotal(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(), |acc, line| acc + line.line_total())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(barcode: &str, price_cents: i64, stock: i64) -> Product {
        Product {
            id: format!("id-{barcode}"),
            barcode: barcode.to_string(),
            name: format!("Product {barcode}"),
            capital_price_cents: price_cents / 2,
            selling_price_cents: price_cents,
            quantity: stock,
            low_stock_threshold: 3,
            date_added: Utc::now(),
            last_updated: None,
        }
    }

    #[test]
    fn test_add_and_merge_by_barcode() {
        let mut cart = Cart::new();
        let p = product("1000000000017", 1_000_000, 5);

        cart.add_product(&p, 2).unwrap();
        cart.add_product(&p, 1).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.subtotal().cents(), 3_000_000);
    }

    #[test]
    fn test_add_rejects_over_observed_stock() {
        let mut cart = Cart::new();
        let p = product("A", 500, 5);

        cart.add_product(&p, 3).unwrap();
        let err = cart.add_product(&p, 3).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            }
        ));
        // Failed add leaves the cart unchanged
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn test_add_rejects_nonpositive_quantity() {
        let mut cart = Cart::new();
        let p = product("A", 500, 5);
        assert!(cart.add_product(&p, 0).is_err());
        assert!(cart.add_product(&p, -1).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_snapshot_pricing() {
        let mut cart = Cart::new();
        let mut p = product("A", 1000, 10);
        cart.add_product(&p, 1).unwrap();

        // Catalog price change after add does not affect the line
        p.selling_price_cents = 9999;
        assert_eq!(cart.lines()[0].unit_price_cents, 1000);
        assert_eq!(cart.subtotal().cents(), 1000);
    }

    #[test]
    fn test_remove_by_index_and_barcode() {
        let mut cart = Cart::new();
        cart.add_product(&product("A", 100, 10), 1).unwrap();
        cart.add_product(&product("B", 200, 10), 2).unwrap();

        let removed = cart.remove_line(&LineRef::Barcode("A".to_string())).unwrap();
        assert_eq!(removed.barcode, "A");
        assert_eq!(cart.len(), 1);

        cart.remove_line(&LineRef::Index(0)).unwrap();
        assert!(cart.is_empty());

        assert!(matches!(
            cart.remove_line(&LineRef::Index(0)),
            Err(CoreError::LineNotFound(_))
        ));
        assert!(matches!(
            cart.remove_line(&LineRef::Barcode("Z".to_string())),
            Err(CoreError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = Cart::new();
        cart.add_product(&product("A", 100, 10), 1).unwrap();

        cart.set_quantity(&LineRef::Index(0), 5).unwrap();
        assert_eq!(cart.lines()[0].quantity, 5);

        // Above observed stock
        assert!(cart.set_quantity(&LineRef::Index(0), 11).is_err());

        // Zero removes the line
        cart.set_quantity(&LineRef::Barcode("A".to_string()), 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_line_limit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_LINES {
            cart.add_product(&product(&format!("B{i}"), 100, 10), 1).unwrap();
        }
        let err = cart
            .add_product(&product("overflow", 100, 10), 1)
            .unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_product(&product("A", 100, 10), 2).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Money::zero());
    }
}
