//! # Repository Module
//!
//! Database repository implementations for Warung POS.
//!
//! ## Repository Pattern
//! ```text
//! Caller
//!   │  db.products().search("indomie", 20)
//!   ▼
//! ProductRepository
//!   │  SQL, bound parameters
//!   ▼
//! SQLite
//! ```
//!
//! SQL lives only here and in the checkout committer; callers never see a
//! row or a query string.
//!
//! ## Available Repositories
//! - [`product::ProductRepository`] - catalog CRUD, search, low-stock, restock
//! - [`sale::SaleRepository`] - sales history reads and reports
//! - [`inventory_log::InventoryLogRepository`] - ledger reads

pub mod inventory_log;
pub mod product;
pub mod sale;
