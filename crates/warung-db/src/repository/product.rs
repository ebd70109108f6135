//! # Product Repository
//!
//! Catalog CRUD, search, low-stock scanning and restock.
//!
//! ## Stock Discipline
//! This repository never decrements `quantity`. The only code allowed to
//! do that is the checkout committer, inside its transaction. Restock and
//! adjustment go through [`ProductRepository::restock`] and
//! [`ProductRepository::adjust_stock`], each of which pairs its mutation
//! with a ledger row in one transaction.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use warung_core::{Product, ProductInput, StockAction};

use crate::error::{DbError, DbResult};

/// Repository for product catalog operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetches a product by its UUID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Fetches a product by barcode - the till-facing lookup.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE barcode = ?1")
            .bind(barcode.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Case-insensitive substring search over name and barcode,
    /// ordered by name.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Product>> {
        let pattern = format!("%{}%", query.trim());
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products \
             WHERE name LIKE ?1 OR barcode LIKE ?1 \
             ORDER BY name \
             LIMIT ?2",
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(query, hits = products.len(), "Product search");
        Ok(products)
    }

    /// All products, ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Products at or below their own low-stock threshold, ordered by
    /// name. Computed from current catalog state on every call.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products \
             WHERE quantity <= low_stock_threshold \
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Total number of products in the catalog.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a new product.
    ///
    /// Validates the input, rejects duplicate barcodes, and stamps
    /// `date_added`. Returns the stored product.
    pub async fn insert(&self, input: &ProductInput) -> DbResult<Product> {
        input.validate()?;

        let barcode = input.barcode.trim().to_string();
        if self.get_by_barcode(&barcode).await?.is_some() {
            return Err(DbError::DuplicateBarcode { barcode });
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO products \
             (id, barcode, name, capital_price_cents, selling_price_cents, \
              quantity, low_stock_threshold, date_added, last_updated) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)",
        )
        .bind(&id)
        .bind(&barcode)
        .bind(input.name.trim())
        .bind(input.capital_price_cents)
        .bind(input.selling_price_cents)
        .bind(input.quantity)
        .bind(input.low_stock_threshold)
        .bind(now)
        .execute(&self.pool)
        .await;

        // The UNIQUE index catches writers that raced past the pre-check
        match result {
            Ok(_) => {}
            Err(e) => {
                return Err(match DbError::from(e) {
                    DbError::DuplicateBarcode { .. } => DbError::DuplicateBarcode { barcode },
                    other => other,
                })
            }
        }

        info!(id = %id, barcode = %barcode, "Product created");

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &id))
    }

    /// Updates a product's editable fields. Stock changes go through
    /// `restock` / `adjust_stock`, not here.
    pub async fn update(&self, id: &str, input: &ProductInput) -> DbResult<Product> {
        input.validate()?;

        // Existence first: an absent id is NotFound even when the new
        // barcode happens to collide with some other product.
        if self.get_by_id(id).await?.is_none() {
            return Err(DbError::not_found("Product", id));
        }

        let barcode = input.barcode.trim().to_string();
        if let Some(existing) = self.get_by_barcode(&barcode).await? {
            if existing.id != id {
                return Err(DbError::DuplicateBarcode { barcode });
            }
        }

        let result = sqlx::query(
            "UPDATE products SET \
             barcode = ?1, name = ?2, capital_price_cents = ?3, \
             selling_price_cents = ?4, low_stock_threshold = ?5, \
             last_updated = ?6 \
             WHERE id = ?7",
        )
        .bind(&barcode)
        .bind(input.name.trim())
        .bind(input.capital_price_cents)
        .bind(input.selling_price_cents)
        .bind(input.low_stock_threshold)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product updated");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product from the catalog.
    ///
    /// Sales history and ledger rows reference products only by snapshot,
    /// so they are unaffected.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Adds stock to a product and records a restock ledger row, both in
    /// one transaction.
    pub async fn restock(&self, id: &str, quantity: i64) -> DbResult<Product> {
        warung_core::validation::validate_sale_quantity(quantity)
            .map_err(DbError::Validation)?;

        self.mutate_stock(id, quantity, StockAction::Restock).await
    }

    /// Applies a signed manual stock correction with an adjustment ledger
    /// row. Corrections below zero stock are rejected.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<Product> {
        if delta == 0 {
            return self
                .get_by_id(id)
                .await?
                .ok_or_else(|| DbError::not_found("Product", id));
        }
        self.mutate_stock(id, delta, StockAction::Adjustment).await
    }

    /// Shared increment/adjust path: re-reads quantity inside the
    /// transaction, applies the delta, writes the ledger row.
    async fn mutate_stock(&self, id: &str, delta: i64, action: StockAction) -> DbResult<Product> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let previous_qty: i64 = sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        let new_qty = previous_qty + delta;
        if new_qty < 0 {
            return Err(DbError::QueryFailed(format!(
                "stock adjustment would make quantity negative ({previous_qty} {delta:+})"
            )));
        }

        let now = Utc::now();
        sqlx::query("UPDATE products SET quantity = ?1, last_updated = ?2 WHERE id = ?3")
            .bind(new_qty)
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO inventory_log \
             (id, product_id, action, previous_qty, change_qty, new_qty, date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(id)
        .bind(action)
        .bind(previous_qty)
        .bind(delta.abs())
        .bind(new_qty)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %id, previous_qty, new_qty, ?action, "Stock mutated");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use warung_core::Money;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn indomie() -> ProductInput {
        ProductInput::new(
            "1000000000017",
            "Indomie Goreng",
            Money::from_cents(250_000),
            Money::from_cents(350_000),
            10,
        )
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = test_db().await;
        let repo = db.products();

        let product = repo.insert(&indomie()).await.unwrap();
        assert_eq!(product.barcode, "1000000000017");
        assert_eq!(product.quantity, 10);
        assert!(product.last_updated.is_none());

        let by_barcode = repo.get_by_barcode("1000000000017").await.unwrap().unwrap();
        assert_eq!(by_barcode.id, product.id);

        let by_id = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(by_id.name, "Indomie Goreng");

        assert!(repo.get_by_barcode("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_barcode_rejected() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&indomie()).await.unwrap();
        let err = repo.insert(&indomie()).await.unwrap_err();
        assert!(matches!(err, DbError::DuplicateBarcode { .. }));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_input() {
        let db = test_db().await;
        let repo = db.products();

        let mut input = indomie();
        input.name = "   ".to_string();
        assert!(matches!(
            repo.insert(&input).await.unwrap_err(),
            DbError::Validation(_)
        ));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_case_insensitive() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(&indomie()).await.unwrap();
        repo.insert(&ProductInput::new(
            "2000000000014",
            "Teh Botol",
            Money::from_cents(150_000),
            Money::from_cents(200_000),
            8,
        ))
        .await
        .unwrap();

        let hits = repo.search("INDOMIE", 20).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Indomie Goreng");

        // Barcode substring also matches
        let hits = repo.search("200000000", 20).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Teh Botol");

        assert!(repo.search("kopi", 20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.insert(&indomie()).await.unwrap();

        let mut input = indomie();
        input.name = "Indomie Goreng Jumbo".to_string();
        input.selling_price_cents = 450_000;
        let updated = repo.update(&product.id, &input).await.unwrap();

        assert_eq!(updated.name, "Indomie Goreng Jumbo");
        assert_eq!(updated.selling_price_cents, 450_000);
        assert!(updated.last_updated.is_some());
        // Stock is not editable through update
        assert_eq!(updated.quantity, 10);

        assert!(matches!(
            repo.update("missing-id", &input).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_update_cannot_steal_barcode() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(&indomie()).await.unwrap();
        let other = repo
            .insert(&ProductInput::new(
                "2000000000014",
                "Teh Botol",
                Money::from_cents(150_000),
                Money::from_cents(200_000),
                8,
            ))
            .await
            .unwrap();

        let mut input = indomie();
        input.barcode = "1000000000017".to_string();
        assert!(matches!(
            repo.update(&other.id, &input).await.unwrap_err(),
            DbError::DuplicateBarcode { .. }
        ));
    }

    #[tokio::test]
    async fn test_update_absent_id_is_not_found_even_with_taken_barcode() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(&indomie()).await.unwrap();

        // The input's barcode belongs to an existing product, but the id
        // does not exist: NotFound wins over DuplicateBarcode.
        let err = repo.update("missing-id", &indomie()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.insert(&indomie()).await.unwrap();

        repo.delete(&product.id).await.unwrap();
        assert!(repo.get_by_id(&product.id).await.unwrap().is_none());

        assert!(matches!(
            repo.delete(&product.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_low_stock_boundary() {
        let db = test_db().await;
        let repo = db.products();

        // threshold 3: quantity 3 is low, quantity 4 is not
        let at = repo
            .insert(
                &ProductInput::new("A1", "At Threshold", Money::zero(), Money::from_cents(100), 3)
                    .with_low_stock_threshold(3),
            )
            .await
            .unwrap();
        repo.insert(
            &ProductInput::new("A2", "Above", Money::zero(), Money::from_cents(100), 4)
                .with_low_stock_threshold(3),
        )
        .await
        .unwrap();

        let low = repo.list_low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, at.id);
    }

    #[tokio::test]
    async fn test_restock_writes_ledger() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.insert(&indomie()).await.unwrap();

        let updated = repo.restock(&product.id, 5).await.unwrap();
        assert_eq!(updated.quantity, 15);

        let entries = db.inventory_log().for_product(&product.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, StockAction::Restock);
        assert_eq!(entries[0].previous_qty, 10);
        assert_eq!(entries[0].change_qty, 5);
        assert_eq!(entries[0].new_qty, 15);

        assert!(repo.restock(&product.id, 0).await.is_err());
        assert!(repo.restock(&product.id, -2).await.is_err());
    }

    #[tokio::test]
    async fn test_adjust_stock_cannot_go_negative() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.insert(&indomie()).await.unwrap();

        let updated = repo.adjust_stock(&product.id, -4).await.unwrap();
        assert_eq!(updated.quantity, 6);

        assert!(repo.adjust_stock(&product.id, -7).await.is_err());
        // Failed adjustment leaves stock and ledger untouched
        let current = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(current.quantity, 6);
        assert_eq!(
            db.inventory_log().for_product(&product.id).await.unwrap().len(),
            1
        );
    }
}
