//! # Sale Repository
//!
//! Read access to sales history and the sales reports.
//!
//! Sales are written only by the checkout committer; rows here are
//! immutable. Reports aggregate in SQL so a busy day never needs to be
//! materialized in memory.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use warung_core::{Money, Sale, SaleItem};

use crate::error::DbResult;

// =============================================================================
// Report Rows
// =============================================================================

/// One day's sales rolled up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub transactions: i64,
    pub items_sold: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub revenue_cents: i64,
}

impl DailySummary {
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.revenue_cents)
    }
}

/// Per-product sales aggregate over a time range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSalesRow {
    pub product_name: String,
    pub barcode: String,
    pub quantity_sold: i64,
    pub revenue_cents: i64,
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    transactions: i64,
    items_sold: Option<i64>,
    subtotal_cents: Option<i64>,
    tax_cents: Option<i64>,
    revenue_cents: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    product_name: String,
    barcode: String,
    quantity_sold: i64,
    revenue_cents: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sales history reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Fetches a sale header by its business transaction id.
    pub async fn get_by_transaction_id(&self, transaction_id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE transaction_id = ?1")
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    /// Fetches the line items of a sale, in insertion order.
    pub async fn items(&self, transaction_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT * FROM sale_items WHERE transaction_id = ?1 ORDER BY rowid",
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Most recent sales, newest first.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<Sale>> {
        let sales =
            sqlx::query_as::<_, Sale>("SELECT * FROM sales ORDER BY date DESC, id DESC LIMIT ?1")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;
        Ok(sales)
    }

    /// Total number of committed sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Rolls up one calendar day (UTC) of sales.
    pub async fn daily_summary(&self, date: NaiveDate) -> DbResult<DailySummary> {
        let start: DateTime<Utc> = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
        let end = start + Duration::days(1);

        let row = sqlx::query_as::<_, SummaryRow>(
            "SELECT COUNT(*) AS transactions, \
                    SUM(total_items) AS items_sold, \
                    SUM(subtotal_cents) AS subtotal_cents, \
                    SUM(tax_cents) AS tax_cents, \
                    SUM(total_amount_cents) AS revenue_cents \
             FROM sales \
             WHERE date >= ?1 AND date < ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(DailySummary {
            date,
            transactions: row.transactions,
            items_sold: row.items_sold.unwrap_or(0),
            subtotal_cents: row.subtotal_cents.unwrap_or(0),
            tax_cents: row.tax_cents.unwrap_or(0),
            revenue_cents: row.revenue_cents.unwrap_or(0),
        })
    }

    /// Per-product quantity and revenue over `[start, end)`, best sellers
    /// first. Grouped by snapshot identity, so sales of a since-deleted
    /// product still appear.
    pub async fn product_sales(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<ProductSalesRow>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT si.product_name AS product_name, \
                    si.barcode AS barcode, \
                    SUM(si.quantity) AS quantity_sold, \
                    SUM(si.total_price_cents) AS revenue_cents \
             FROM sale_items si \
             JOIN sales s ON s.transaction_id = si.transaction_id \
             WHERE s.date >= ?1 AND s.date < ?2 \
             GROUP BY si.product_id, si.product_name, si.barcode \
             ORDER BY quantity_sold DESC, product_name",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ProductSalesRow {
                product_name: r.product_name,
                barcode: r.barcode,
                quantity_sold: r.quantity_sold,
                revenue_cents: r.revenue_cents,
            })
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::CheckoutRequest;
    use crate::pool::{Database, DbConfig};
    use warung_core::{Cart, PaymentMethod, ProductInput, TaxRate};

    async fn db_with_sale() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .insert(&ProductInput::new(
                "1000000000017",
                "Indomie Goreng",
                Money::from_cents(250_000),
                Money::from_cents(1_000_000),
                5,
            ))
            .await
            .unwrap();

        let mut cart = Cart::new();
        cart.add_product(&product, 2).unwrap();

        let outcome = db
            .checkout()
            .commit(&cart, &CheckoutRequest::new(PaymentMethod::Cash, TaxRate::from_bps(1100)))
            .await
            .unwrap();
        (db, outcome.sale.transaction_id)
    }

    #[tokio::test]
    async fn test_sale_reads() {
        let (db, trx_id) = db_with_sale().await;
        let sales = db.sales();

        let sale = sales.get_by_transaction_id(&trx_id).await.unwrap().unwrap();
        assert_eq!(sale.total_items, 2);
        assert_eq!(sale.subtotal_cents, 2_000_000);

        let items = sales.items(&trx_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_name, "Indomie Goreng");

        assert!(sales.get_by_transaction_id("TRX-missing").await.unwrap().is_none());

        let recent = sales.list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].transaction_id, trx_id);
    }

    #[tokio::test]
    async fn test_daily_summary() {
        let (db, _) = db_with_sale().await;
        let today = Utc::now().date_naive();

        let summary = db.sales().daily_summary(today).await.unwrap();
        assert_eq!(summary.transactions, 1);
        assert_eq!(summary.items_sold, 2);
        assert_eq!(summary.subtotal_cents, 2_000_000);
        assert_eq!(summary.tax_cents, 220_000);
        assert_eq!(summary.revenue_cents, 2_220_000);

        // A day with no sales rolls up to zeros
        let empty = db
            .sales()
            .daily_summary(today - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(empty.transactions, 0);
        assert_eq!(empty.revenue_cents, 0);
    }

    #[tokio::test]
    async fn test_product_sales_report() {
        let (db, _) = db_with_sale().await;
        let now = Utc::now();

        let rows = db
            .sales()
            .product_sales(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product_name, "Indomie Goreng");
        assert_eq!(rows[0].quantity_sold, 2);
        assert_eq!(rows[0].revenue_cents, 2_000_000);
    }

    #[tokio::test]
    async fn test_history_survives_product_deletion() {
        let (db, trx_id) = db_with_sale().await;
        let product = db
            .products()
            .get_by_barcode("1000000000017")
            .await
            .unwrap()
            .unwrap();

        db.products().delete(&product.id).await.unwrap();

        let items = db.sales().items(&trx_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_name, "Indomie Goreng");
    }
}
