//! # Checkout Committer
//!
//! Atomically turns a cart into a sale.
//!
//! ## The Transaction
//! ```text
//! BEGIN
//!   INSERT sales row                      (parent of sale_items)
//!   for each cart line:
//!     re-read products.quantity           (authoritative check)
//!     UPDATE .. SET quantity = quantity - n
//!       WHERE id = ? AND quantity >= n    (guarded decrement)
//!     INSERT sale_items row               (snapshot)
//!     INSERT inventory_log row            (ledger)
//! COMMIT
//! ```
//!
//! Any failure drops the transaction and rolls back every write: no sale
//! row, no item rows, no ledger rows, no stock change. Stock for any line
//! can have shrunk between cart-add and commit, so the cart's advisory
//! check is repeated here against re-read quantities and only this one
//! counts.
//!
//! The committer never touches the cart. On success the caller clears it;
//! on failure the cart is intact so the cashier can drop a line and retry.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use warung_core::{
    validation, Cart, CoreError, PaymentMethod, Sale, SaleItem, StockAction, TaxRate, Totals,
};

use crate::error::DbError;

// =============================================================================
// Errors
// =============================================================================

/// Checkout failures: business rule violations or storage failures.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<warung_core::ValidationError> for CheckoutError {
    fn from(err: warung_core::ValidationError) -> Self {
        CheckoutError::Core(CoreError::Validation(err))
    }
}

// =============================================================================
// Request / Outcome
// =============================================================================

/// Parameters for a commit, besides the cart itself.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    pub tax_rate: TaxRate,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
}

impl CheckoutRequest {
    pub fn new(payment_method: PaymentMethod, tax_rate: TaxRate) -> Self {
        CheckoutRequest {
            payment_method,
            tax_rate,
            customer_name: None,
            notes: None,
        }
    }

    pub fn customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A committed sale with its line items, ready for receipt rendering.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Service
// =============================================================================

/// The only code path in the system allowed to decrement stock.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
}

impl CheckoutService {
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutService { pool }
    }

    /// Commits the cart as a sale.
    ///
    /// All-or-nothing: on success stock is decremented, sale and item
    /// rows exist and the ledger records every decrement; on any error
    /// the database is exactly as it was before the call.
    pub async fn commit(
        &self,
        cart: &Cart,
        request: &CheckoutRequest,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        if let Some(name) = &request.customer_name {
            validation::validate_text_field("customer_name", name)?;
        }
        if let Some(notes) = &request.notes {
            validation::validate_text_field("notes", notes)?;
        }

        let totals = Totals::compute(cart, request.tax_rate);
        let now = Utc::now();
        let transaction_id = generate_transaction_id(now);
        let sale_id = Uuid::new_v4().to_string();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        // The sale header goes in first: sale_items carries a foreign key
        // to sales.transaction_id, and SQLite enforces it per statement.
        // A failure later in the loop rolls the header back with the rest.
        let sale = Sale {
            id: sale_id,
            transaction_id: transaction_id.clone(),
            date: now,
            total_items: cart.total_items(),
            subtotal_cents: totals.subtotal.cents(),
            tax_cents: totals.tax.cents(),
            total_amount_cents: totals.total.cents(),
            payment_method: request.payment_method,
            customer_name: request.customer_name.clone(),
            notes: request.notes.clone(),
        };

        sqlx::query(
            "INSERT INTO sales \
             (id, transaction_id, date, total_items, subtotal_cents, tax_cents, \
              total_amount_cents, payment_method, customer_name, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&sale.id)
        .bind(&sale.transaction_id)
        .bind(sale.date)
        .bind(sale.total_items)
        .bind(sale.subtotal_cents)
        .bind(sale.tax_cents)
        .bind(sale.total_amount_cents)
        .bind(sale.payment_method)
        .bind(&sale.customer_name)
        .bind(&sale.notes)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let mut items = Vec::with_capacity(cart.len());
        for line in cart.lines() {
            // Authoritative stock check against the row as it is NOW, not
            // as the cart saw it at add time.
            let available: i64 =
                sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
                    .bind(&line.product_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(DbError::from)?
                    .ok_or_else(|| CoreError::ProductNotFound(line.barcode.clone()))?;

            if available < line.quantity {
                warn!(
                    barcode = %line.barcode,
                    available,
                    requested = line.quantity,
                    "Checkout aborted: insufficient stock"
                );
                return Err(CoreError::InsufficientStock {
                    barcode: line.barcode.clone(),
                    name: line.name.clone(),
                    available,
                    requested: line.quantity,
                }
                .into());
            }

            let affected =
                guarded_decrement(&mut tx, &line.product_id, line.quantity, now).await?;
            if affected == 0 {
                return Err(CoreError::InsufficientStock {
                    barcode: line.barcode.clone(),
                    name: line.name.clone(),
                    available,
                    requested: line.quantity,
                }
                .into());
            }

            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                transaction_id: transaction_id.clone(),
                product_id: line.product_id.clone(),
                product_name: line.name.clone(),
                barcode: line.barcode.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                discount_cents: 0,
                total_price_cents: line.line_total().cents(),
            };

            sqlx::query(
                "INSERT INTO sale_items \
                 (id, transaction_id, product_id, product_name, barcode, \
                  quantity, unit_price_cents, discount_cents, total_price_cents) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .bind(&item.id)
            .bind(&item.transaction_id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(&item.barcode)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.discount_cents)
            .bind(item.total_price_cents)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

            sqlx::query(
                "INSERT INTO inventory_log \
                 (id, product_id, action, previous_qty, change_qty, new_qty, date) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&line.product_id)
            .bind(StockAction::Sale)
            .bind(available)
            .bind(line.quantity)
            .bind(available - line.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

            items.push(item);
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            transaction_id = %transaction_id,
            total_items = sale.total_items,
            total = %totals.total,
            "Sale committed"
        );

        Ok(CheckoutOutcome { sale, items })
    }
}

/// Decrements a product's stock only while enough remains.
///
/// The WHERE guard is the last line of defense alongside the schema's
/// CHECK constraint: it can only take quantity to zero, never below.
/// Returns the number of rows matched; zero means the guard refused.
async fn guarded_decrement(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE products \
         SET quantity = quantity - ?1, last_updated = ?2 \
         WHERE id = ?3 AND quantity >= ?1",
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .execute(&mut **tx)
    .await
    .map_err(DbError::from)?;

    Ok(result.rows_affected())
}

/// Builds a transaction id: timestamp prefix for humans sorting receipts,
/// UUID suffix for uniqueness within the same second.
fn generate_transaction_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("TRX{}-{}", now.format("%Y%m%d%H%M%S"), &suffix[..8])
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use std::collections::HashSet;
    use warung_core::{Money, Product, ProductInput};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, barcode: &str, price_cents: i64, stock: i64) -> Product {
        db.products()
            .insert(&ProductInput::new(
                barcode,
                format!("Product {barcode}"),
                Money::from_cents(price_cents / 2),
                Money::from_cents(price_cents),
                stock,
            ))
            .await
            .unwrap()
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest::new(PaymentMethod::Cash, TaxRate::from_bps(1100))
    }

    #[tokio::test]
    async fn test_commit_happy_path() {
        let db = test_db().await;
        let product = seed_product(&db, "1000000000017", 1_000_000, 5).await;

        let mut cart = Cart::new();
        cart.add_product(&product, 2).unwrap();
        cart.add_product(&product, 1).unwrap();

        let outcome = db.checkout().commit(&cart, &request()).await.unwrap();

        assert_eq!(outcome.sale.total_items, 3);
        assert_eq!(outcome.sale.subtotal_cents, 3_000_000);
        assert_eq!(outcome.sale.tax_cents, 330_000);
        assert_eq!(outcome.sale.total_amount_cents, 3_330_000);
        assert!(outcome.sale.transaction_id.starts_with("TRX"));

        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].quantity, 3);
        assert_eq!(outcome.items[0].total_price_cents, 3_000_000);

        // Stock decremented and ledgered
        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 2);
        assert!(after.last_updated.is_some());

        let ledger = db.inventory_log().for_product(&product.id).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].action, StockAction::Sale);
        assert_eq!(ledger[0].previous_qty, 5);
        assert_eq!(ledger[0].change_qty, 3);
        assert_eq!(ledger[0].new_qty, 2);

        // Header persisted
        let stored = db
            .sales()
            .get_by_transaction_id(&outcome.sale.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_amount_cents, 3_330_000);
        assert_eq!(stored.payment_method, PaymentMethod::Cash);
    }

    #[tokio::test]
    async fn test_commit_empty_cart_rejected() {
        let db = test_db().await;
        let err = db.checkout().commit(&Cart::new(), &request()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Core(CoreError::EmptyCart)));
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_commit_insufficient_stock_writes_nothing() {
        let db = test_db().await;
        let product = seed_product(&db, "A", 500, 5).await;
        let other = seed_product(&db, "B", 300, 10).await;

        let mut cart = Cart::new();
        cart.add_product(&other, 2).unwrap();
        cart.add_product(&product, 4).unwrap();

        // Stock shrinks between cart-add and commit
        db.products().adjust_stock(&product.id, -3).await.unwrap();

        let err = db.checkout().commit(&cart, &request()).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::InsufficientStock {
                available: 2,
                requested: 4,
                ..
            })
        ));

        // Everything rolled back, including the first line's decrement
        let a = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        let b = db.products().get_by_id(&other.id).await.unwrap().unwrap();
        assert_eq!(a.quantity, 2);
        assert_eq!(b.quantity, 10);
        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert!(db.inventory_log().for_product(&other.id).await.unwrap().is_empty());

        // Cart untouched: drop the bad line and retry
        cart.remove_line(&warung_core::LineRef::Barcode("A".to_string())).unwrap();
        db.checkout().commit(&cart, &request()).await.unwrap();
    }

    #[tokio::test]
    async fn test_commit_deleted_product_rejected() {
        let db = test_db().await;
        let product = seed_product(&db, "A", 500, 5).await;

        let mut cart = Cart::new();
        cart.add_product(&product, 1).unwrap();

        db.products().delete(&product.id).await.unwrap();

        let err = db.checkout().commit(&cart, &request()).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::ProductNotFound(_))
        ));
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_commit_exact_stock_to_zero() {
        let db = test_db().await;
        let product = seed_product(&db, "A", 500, 3).await;

        let mut cart = Cart::new();
        cart.add_product(&product, 3).unwrap();

        db.checkout().commit(&cart, &request()).await.unwrap();

        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 0);
        assert!(after.is_low_stock());
    }

    #[tokio::test]
    async fn test_transaction_ids_unique() {
        let db = test_db().await;
        let product = seed_product(&db, "A", 100, 100).await;

        let mut seen = HashSet::new();
        for _ in 0..20 {
            let mut cart = Cart::new();
            cart.add_product(&product, 1).unwrap();
            let outcome = db.checkout().commit(&cart, &request()).await.unwrap();
            assert!(seen.insert(outcome.sale.transaction_id));
        }
    }

    #[tokio::test]
    async fn test_commit_carries_customer_and_notes() {
        let db = test_db().await;
        let product = seed_product(&db, "A", 500, 5).await;

        let mut cart = Cart::new();
        cart.add_product(&product, 1).unwrap();

        let req = request().customer_name("Budi").notes("langganan");
        let outcome = db.checkout().commit(&cart, &req).await.unwrap();
        assert_eq!(outcome.sale.customer_name.as_deref(), Some("Budi"));
        assert_eq!(outcome.sale.notes.as_deref(), Some("langganan"));

        let req = request().notes("x".repeat(1000));
        let err = db.checkout().commit(&cart, &req).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_commit_links_items_to_persisted_header() {
        let db = test_db().await;
        let product = seed_product(&db, "1000000000017", 1_000_000, 5).await;

        let mut cart = Cart::new();
        cart.add_product(&product, 2).unwrap();

        let outcome = db.checkout().commit(&cart, &request()).await.unwrap();

        // Every item row must join to its committed sale header; the
        // schema's foreign key enforces this during the transaction too.
        let linked: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sale_items si \
             JOIN sales s ON s.transaction_id = si.transaction_id \
             WHERE s.transaction_id = ?1",
        )
        .bind(&outcome.sale.transaction_id)
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(linked, 1);

        let orphans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sale_items si \
             LEFT JOIN sales s ON s.transaction_id = si.transaction_id \
             WHERE s.id IS NULL",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_guarded_decrement_refuses_oversell() {
        let db = test_db().await;
        let product = seed_product(&db, "A", 500, 5).await;

        let mut tx = db.pool().begin().await.unwrap();

        // Requesting more than is available matches no row
        let affected = guarded_decrement(&mut tx, &product.id, 7, Utc::now())
            .await
            .unwrap();
        assert_eq!(affected, 0);

        // Draining to exactly zero is allowed
        let affected = guarded_decrement(&mut tx, &product.id, 5, Utc::now())
            .await
            .unwrap();
        assert_eq!(affected, 1);

        // Dropping the transaction rolls the drain back
        drop(tx);
        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 5);
    }

    #[test]
    fn test_transaction_id_format() {
        let now = "2026-08-26T14:30:00Z".parse().unwrap();
        let id = generate_transaction_id(now);
        assert!(id.starts_with("TRX20260826143000-"));
        assert_eq!(id.len(), "TRX20260826143000-".len() + 8);
    }
}
