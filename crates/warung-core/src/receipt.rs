//! # Receipt Module
//!
//! Receipt projection and plain-text rendering.
//!
//! A [`Receipt`] is a pure projection of a committed sale: building and
//! rendering one touches no state and can be repeated any number of times
//! with identical output. The layout targets a 40-column thermal printer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::pricing::Totals;
use crate::types::{PaymentMethod, Sale, SaleItem, TaxRate};

/// Printable width of the receipt in characters.
const RECEIPT_WIDTH: usize = 40;

// =============================================================================
// Store Info
// =============================================================================

/// Store header printed at the top of every receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
}

impl Default for StoreInfo {
    fn default() -> Self {
        StoreInfo {
            name: "WARUNG SEJAHTERA".to_string(),
            address: "Jl. Merdeka No. 123, Jakarta".to_string(),
            phone: "Telp: 021-5551234".to_string(),
        }
    }
}

// =============================================================================
// Receipt Line
// =============================================================================

/// One item block on the receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total: Money,
}

impl From<&SaleItem> for ReceiptLine {
    fn from(item: &SaleItem) -> Self {
        ReceiptLine {
            name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price(),
            total: item.total_price(),
        }
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// A renderable receipt for a committed sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub store: StoreInfo,
    pub transaction_id: String,
    pub date: DateTime<Utc>,
    pub cashier: String,
    pub lines: Vec<ReceiptLine>,
    pub totals: Totals,
    pub tax_rate: TaxRate,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
}

impl Receipt {
    /// Builds a receipt from a committed sale and its items.
    pub fn from_sale(
        store: StoreInfo,
        cashier: impl Into<String>,
        sale: &Sale,
        items: &[SaleItem],
        tax_rate: TaxRate,
    ) -> Receipt {
        Receipt {
            store,
            transaction_id: sale.transaction_id.clone(),
            date: sale.date,
            cashier: cashier.into(),
            lines: items.iter().map(ReceiptLine::from).collect(),
            totals: Totals {
                subtotal: sale.subtotal(),
                tax: sale.tax(),
                total: sale.total_amount(),
            },
            tax_rate,
            payment_method: sale.payment_method,
            customer_name: sale.customer_name.clone(),
        }
    }

    /// Renders the receipt as plain text.
    pub fn render(&self) -> String {
        let rule_heavy = "=".repeat(RECEIPT_WIDTH);
        let rule_light = "-".repeat(RECEIPT_WIDTH);

        let mut out = String::new();
        out.push_str(&rule_heavy);
        out.push('\n');
        out.push_str(&center(&self.store.name));
        out.push('\n');
        out.push_str(&center(&self.store.address));
        out.push('\n');
        out.push_str(&center(&self.store.phone));
        out.push('\n');
        out.push_str(&rule_heavy);
        out.push('\n');

        out.push_str(&format!("No: {}\n", self.transaction_id));
        out.push_str(&format!(
            "Tanggal: {}\n",
            self.date.format("%d/%m/%Y %H:%M:%S")
        ));
        out.push_str(&format!("Kasir: {}\n", self.cashier));
        if let Some(customer) = &self.customer_name {
            out.push_str(&format!("Pelanggan: {customer}\n"));
        }
        out.push_str(&rule_light);
        out.push('\n');

        for line in &self.lines {
            out.push_str(&line.name);
            out.push('\n');
            out.push_str(&format!(
                "{:>3} x {:>10} = {:>10}\n",
                line.quantity,
                line.unit_price.formatted(),
                line.total.formatted()
            ));
        }

        out.push_str(&rule_light);
        out.push('\n');
        out.push_str(&amount_row("Subtotal:", self.totals.subtotal));
        out.push_str(&amount_row(
            &format!("PPN {}%:", self.tax_rate.percent_label()),
            self.totals.tax,
        ));
        out.push_str(&amount_row("TOTAL  :", self.totals.total));
        out.push_str(&rule_light);
        out.push('\n');
        out.push_str(&format!("Pembayaran: {}\n", self.payment_method.label()));
        out.push_str(&rule_heavy);
        out.push('\n');
        out.push_str(&center("Terima kasih atas kunjungan Anda"));
        out.push('\n');
        out.push_str(&rule_heavy);
        out.push('\n');
        out
    }
}

/// Centers text within the receipt width; wider text is left as is.
fn center(text: &str) -> String {
    let len = text.chars().count();
    if len >= RECEIPT_WIDTH {
        return text.to_string();
    }
    format!("{}{}", " ".repeat((RECEIPT_WIDTH - len) / 2), text)
}

/// Label on the left, amount right-aligned to the receipt edge.
fn amount_row(label: &str, amount: Money) -> String {
    let value = amount.formatted();
    let pad = RECEIPT_WIDTH.saturating_sub(label.chars().count() + value.len());
    format!("{}{}{}\n", label, " ".repeat(pad), value)
}

// =============================================================================
// Unit Tests
// =============================================================================
