//! # warung-db: SQLite Persistence for Warung POS
//!
//! Repositories over the catalog, sales history and inventory ledger,
//! plus the checkout committer.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  apps (CLI, test harness)                                       │
//! └──────────────────────────────┬──────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────▼──────────────────────────────────┐
//! │               ★ warung-db (THIS CRATE) ★                        │
//! │                                                                 │
//! │   pool        repository/           checkout                   │
//! │   Database    ProductRepository     CheckoutService            │
//! │   DbConfig    SaleRepository        (the ONLY stock            │
//! │               InventoryLogRepo       decrementer)              │
//! └──────────────────────────────┬──────────────────────────────────┘
//!                                │
//!                          SQLite (WAL)
//! ```
//!
//! ## Write Discipline
//! - Stock decrements: only [`checkout::CheckoutService::commit`]
//! - Stock increments: only the product repository's restock/adjust paths
//! - Every stock mutation pairs with an inventory ledger row in the same
//!   transaction
//! - Sales and ledger rows are immutable once committed

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{CheckoutError, CheckoutOutcome, CheckoutRequest, CheckoutService};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::inventory_log::InventoryLogRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::{DailySummary, ProductSalesRow, SaleRepository};
