//! # Inventory Ledger Repository
//!
//! Read access to the append-only stock ledger.
//!
//! Writes happen only inside the checkout committer and the product
//! repository's stock mutations, in the same transaction as the stock
//! change they record. This repository never updates or deletes a row.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use warung_core::InventoryLogEntry;

use crate::error::DbResult;

/// Repository for inventory ledger reads.
#[derive(Debug, Clone)]
pub struct InventoryLogRepository {
    pool: SqlitePool,
}

impl InventoryLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryLogRepository { pool }
    }

    /// Full movement history for one product, oldest first.
    pub async fn for_product(&self, product_id: &str) -> DbResult<Vec<InventoryLogEntry>> {
        let entries = sqlx::query_as::<_, InventoryLogEntry>(
            "SELECT * FROM inventory_log WHERE product_id = ?1 ORDER BY date, id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Most recent movements across all products, newest first.
    pub async fn recent(&self, limit: i64) -> DbResult<Vec<InventoryLogEntry>> {
        let entries = sqlx::query_as::<_, InventoryLogEntry>(
            "SELECT * FROM inventory_log ORDER BY date DESC, id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Movements in a half-open time range `[start, end)`, oldest first.
    pub async fn in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<InventoryLogEntry>> {
        let entries = sqlx::query_as::<_, InventoryLogEntry>(
            "SELECT * FROM inventory_log \
             WHERE date >= ?1 AND date < ?2 \
             ORDER BY date, id",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Total number of ledger rows.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_log")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
