//! # warung-core: Pure Business Logic for Warung POS
//!
//! This crate is the heart of the system. It contains the checkout domain -
//! money arithmetic, cart aggregation, pricing, receipt projection and
//! validation - as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Presentation (CLI / GUI / test harness)                        │
//! │      scan barcode ─► add to cart ─► totals ─► checkout          │
//! └──────────────────────────────┬──────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────▼──────────────────────────────────┐
//! │               ★ warung-core (THIS CRATE) ★                      │
//! │                                                                 │
//! │   types      money      cart       pricing    receipt           │
//! │   Product    Money      Cart       Totals     Receipt           │
//! │   Sale       TaxRate    CartLine              render()          │
//! │                                                                 │
//! │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │
//! └──────────────────────────────┬──────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────▼──────────────────────────────────┐
//! │  warung-db: SQLite repositories + the checkout committer        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic - same input, same output
//! 2. **Integer Money**: all monetary values are in cents (i64), never floats
//! 3. **Explicit Errors**: typed error enums, never strings or panics
//! 4. **Snapshots**: cart lines and sale items freeze product data at the
//!    moment of capture; later catalog edits do not rewrite history

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod pricing;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, LineRef};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::Totals;
pub use receipt::{Receipt, ReceiptLine, StoreInfo};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tax rate in basis points: PPN 11%.
///
/// The effective rate is supplied by the caller (config); this is only the
/// fallback when nothing is configured.
pub const DEFAULT_TAX_RATE_BPS: u32 = 1100;

/// Default low-stock threshold for new products.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 3;

/// Maximum distinct lines allowed in a single cart.
///
/// Prevents runaway carts and keeps transactions reviewable on a receipt.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in the cart.
///
/// Guards against typos (1000 instead of 10) at the entry point.
pub const MAX_LINE_QUANTITY: i64 = 999;
