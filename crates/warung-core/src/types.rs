//! # Domain Types
//!
//! Core domain types for the inventory and checkout pipeline.
//!
//! ## Dual-Key Identity Pattern
//! Every product has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `barcode`: business identifier - unique, scanned at the till
//!
//! Sales and their items are snapshot records: they copy name, barcode and
//! unit price at the moment of commit, so deleting or editing a product
//! later never rewrites sales history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation;
use crate::DEFAULT_LOW_STOCK_THRESHOLD;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (1 bps = 0.01%).
///
/// 1100 bps = 11% (PPN, the Indonesian VAT). Basis points keep rate math
/// in integers end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for configuration input).
    ///
    /// Rejects anything outside 0..=100 percent, including NaN and
    /// infinities, instead of letting the cast silently clamp.
    pub fn from_percentage(pct: f64) -> Result<Self, ValidationError> {
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(ValidationError::OutOfRange {
                field: "tax_rate".to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(TaxRate((pct * 100.0).round() as u32))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Percentage label without trailing zeros: "11", "8.25".
    pub fn percent_label(&self) -> String {
        if self.0 % 100 == 0 {
            format!("{}", self.0 / 100)
        } else if self.0 % 10 == 0 {
            format!("{}.{}", self.0 / 100, (self.0 % 100) / 10)
        } else {
            format!("{}.{:02}", self.0 / 100, self.0 % 100)
        }
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    /// PPN 11%, the fallback when no rate is configured.
    fn default() -> Self {
        TaxRate(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Accepted payment methods - a closed set; anything else is a
/// validation error, never a silent fallback.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Credit card on external terminal.
    CreditCard,
    /// Debit card on external terminal.
    DebitCard,
    /// QRIS / QR code payment.
    Qris,
}

impl PaymentMethod {
    /// Parses a user-supplied payment method string.
    ///
    /// Accepts English names and the Indonesian labels used on receipts.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_lowercase().as_str() {
            "cash" | "tunai" => Ok(PaymentMethod::Cash),
            "credit" | "credit card" | "kartu kredit" => Ok(PaymentMethod::CreditCard),
            "debit" | "debit card" | "kartu debit" => Ok(PaymentMethod::DebitCard),
            "qr" | "qris" => Ok(PaymentMethod::Qris),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec![
                    "cash".to_string(),
                    "credit card".to_string(),
                    "debit card".to_string(),
                    "qris".to_string(),
                ],
            }),
        }
    }

    /// Receipt label (Indonesian, matching the printed struk).
    pub const fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Tunai",
            PaymentMethod::CreditCard => "Kartu Kredit",
            PaymentMethod::DebitCard => "Kartu Debit",
            PaymentMethod::Qris => "QRIS",
        }
    }
}

// =============================================================================
// Stock Action
// =============================================================================

/// Why a product's quantity changed; recorded with every ledger entry.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockAction {
    /// Stock decremented by a committed sale.
    Sale,
    /// Stock increased by replenishment.
    Restock,
    /// Manual correction.
    Adjustment,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// Invariants: `barcode` is unique and non-empty, `quantity` is never
/// negative. The quantity field is the single shared mutable resource of
/// the whole system; only the checkout committer and restock decrement or
/// increment it, always under one storage transaction.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Barcode (EAN-13 or similar) - the till-facing identity.
    pub barcode: String,

    /// Display name shown to the cashier and on receipts.
    pub name: String,

    /// Purchase cost in cents (for margin reports).
    pub capital_price_cents: i64,

    /// Selling price in cents.
    pub selling_price_cents: i64,

    /// Current stock level; >= 0 at all times.
    pub quantity: i64,

    /// Flag the product for replenishment when `quantity` falls to or
    /// below this value.
    pub low_stock_threshold: i64,

    /// When the product was created.
    pub date_added: DateTime<Utc>,

    /// When the product was last edited or sold.
    pub last_updated: Option<DateTime<Utc>>,
}

impl Product {
    /// Returns the selling price as Money.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Returns the capital (cost) price as Money.
    #[inline]
    pub fn capital_price(&self) -> Money {
        Money::from_cents(self.capital_price_cents)
    }

    /// Low stock is `quantity <= low_stock_threshold`, per product.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }
}

// =============================================================================
// Product Input
// =============================================================================

/// Validated input for catalog add and update operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInput {
    pub barcode: String,
    pub name: String,
    pub capital_price_cents: i64,
    pub selling_price_cents: i64,
    pub quantity: i64,
    pub low_stock_threshold: i64,
}

impl ProductInput {
    pub fn new(
        barcode: impl Into<String>,
        name: impl Into<String>,
        capital_price: Money,
        selling_price: Money,
        quantity: i64,
    ) -> Self {
        ProductInput {
            barcode: barcode.into(),
            name: name.into(),
            capital_price_cents: capital_price.cents(),
            selling_price_cents: selling_price.cents(),
            quantity,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }

    pub fn with_low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    /// Checks all field-level rules; leaves nothing half-validated.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_barcode(&self.barcode)?;
        validation::validate_product_name(&self.name)?;
        validation::validate_price_cents("capital_price", self.capital_price_cents)?;
        validation::validate_price_cents("selling_price", self.selling_price_cents)?;
        validation::validate_stock_level(self.quantity)?;
        validation::validate_stock_level(self.low_stock_threshold)?;
        Ok(())
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale. Immutable after creation; refunds and voids are not
/// part of this system.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    /// Business identifier printed on the receipt; unique across the store.
    pub transaction_id: String,
    pub date: DateTime<Utc>,
    /// Sum of line quantities.
    pub total_items: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
}

impl Sale {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item of a committed sale.
///
/// Snapshot pattern: product name, barcode and unit price are frozen at
/// commit time, so catalog edits and deletions never touch history.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: String,
    pub transaction_id: String,
    pub product_id: String,
    pub product_name: String,
    pub barcode: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub total_price_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

// =============================================================================
// Inventory Log Entry
// =============================================================================

/// One row of the append-only stock ledger.
///
/// Written in the same transaction as the stock mutation it records: an
/// entry never exists without its mutation, and vice versa. Entries are
/// never updated or deleted.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryLogEntry {
    pub id: String,
    pub product_id: String,
    pub action: StockAction,
    pub previous_qty: i64,
    /// Magnitude of the change; `new_qty = previous_qty - change_qty` for
    /// sales, `previous_qty + change_qty` for restocks.
    pub change_qty: i64,
    pub new_qty: i64,
    pub date: DateTime<Utc>,
}

// =============================================================================
// Low-Stock Alert
// =============================================================================

/// Replenishment signal derived from catalog state; owns no state itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub name: String,
    pub quantity: i64,
    pub threshold: i64,
}

impl From<&Product> for LowStockAlert {
    fn from(product: &Product) -> Self {
        LowStockAlert {
            name: product.name.clone(),
            quantity: product.quantity,
            threshold: product.low_stock_threshold,
        }
    }
}

// =============================================================================
// Barcode Generation
// =============================================================================

/// Generates a random 13-digit numeric barcode for products that arrive
/// without one.
pub fn generate_barcode() -> String {
    uuid::Uuid::new_v4()
        .into_bytes()
        .iter()
        .take(13)
        .map(|b| char::from(b'0' + b % 10))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_labels() {
        assert_eq!(TaxRate::from_bps(1100).percent_label(), "11");
        assert_eq!(TaxRate::from_bps(825).percent_label(), "8.25");
        assert_eq!(TaxRate::from_bps(1050).percent_label(), "10.5");
        assert_eq!(TaxRate::default().bps(), 1100);
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(11.0).unwrap().bps(), 1100);
        assert_eq!(TaxRate::from_percentage(8.25).unwrap().bps(), 825);
        assert_eq!(TaxRate::from_percentage(0.0).unwrap().bps(), 0);
        assert_eq!(TaxRate::from_percentage(100.0).unwrap().bps(), 10000);

        assert!(TaxRate::from_percentage(-1.0).is_err());
        assert!(TaxRate::from_percentage(100.5).is_err());
        assert!(TaxRate::from_percentage(f64::NAN).is_err());
        assert!(TaxRate::from_percentage(f64::INFINITY).is_err());
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!(PaymentMethod::parse("cash").unwrap(), PaymentMethod::Cash);
        assert_eq!(PaymentMethod::parse("Tunai").unwrap(), PaymentMethod::Cash);
        assert_eq!(
            PaymentMethod::parse("Kartu Kredit").unwrap(),
            PaymentMethod::CreditCard
        );
        assert_eq!(PaymentMethod::parse("QRIS").unwrap(), PaymentMethod::Qris);
        assert_eq!(PaymentMethod::parse("debit card").unwrap(), PaymentMethod::DebitCard);

        assert!(PaymentMethod::parse("bitcoin").is_err());
        assert!(PaymentMethod::parse("").is_err());
    }

    #[test]
    fn test_payment_method_labels() {
        assert_eq!(PaymentMethod::Cash.label(), "Tunai");
        assert_eq!(PaymentMethod::Qris.label(), "QRIS");
    }

    #[test]
    fn test_product_low_stock() {
        let mut product = sample_product();
        product.quantity = 3;
        product.low_stock_threshold = 3;
        assert!(product.is_low_stock());

        product.quantity = 4;
        assert!(!product.is_low_stock());

        product.quantity = 2;
        let alert = LowStockAlert::from(&product);
        assert_eq!(alert.name, product.name);
        assert_eq!(alert.quantity, 2);
        assert_eq!(alert.threshold, 3);
    }

    #[test]
    fn test_product_input_validation() {
        let input = ProductInput::new(
            "1000000000017",
            "Indomie Goreng",
            Money::from_cents(250_000),
            Money::from_cents(350_000),
            10,
        );
        assert!(input.validate().is_ok());

        let empty_barcode = ProductInput::new("", "X", Money::zero(), Money::zero(), 0);
        assert!(empty_barcode.validate().is_err());

        let negative_price =
            ProductInput::new("123", "X", Money::zero(), Money::from_cents(-1), 0);
        assert!(negative_price.validate().is_err());
    }

    #[test]
    fn test_generate_barcode_shape() {
        let barcode = generate_barcode();
        assert_eq!(barcode.len(), 13);
        assert!(barcode.chars().all(|c| c.is_ascii_digit()));
    }

    fn sample_product() -> Product {
        Product {
            id: "p-1".to_string(),
            barcode: "1000000000017".to_string(),
            name: "Indomie Goreng".to_string(),
            capital_price_cents: 250_000,
            selling_price_cents: 350_000,
            quantity: 10,
            low_stock_threshold: 3,
            date_added: Utc::now(),
            last_updated: None,
        }
    }
}
