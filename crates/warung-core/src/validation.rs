//! # Validation Module
//!
//! Field-level validation rules, shared by the repositories and the cart.
//!
//! Every function either returns `Ok(())` or a [`ValidationError`] naming
//! the offending field; callers reject the whole operation on the first
//! failure and leave state untouched.

use crate::error::ValidationError;

// =============================================================================
// Limits
// =============================================================================

/// Maximum length of a product name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length of a barcode.
pub const MAX_BARCODE_LENGTH: usize = 64;

/// Maximum length for free-text fields (customer name, notes).
pub const MAX_TEXT_LENGTH: usize = 500;

/// Maximum price in cents (1 billion major units).
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// Maximum stock level per product.
pub const MAX_STOCK_LEVEL: i64 = 1_000_000;

// =============================================================================
// Validators
// =============================================================================

/// Barcode: non-empty after trimming, bounded length.
pub fn validate_barcode(barcode: &str) -> Result<(), ValidationError> {
    let trimmed = barcode.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }
    if trimmed.len() > MAX_BARCODE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LENGTH,
        });
    }
    Ok(())
}

/// Product name: non-empty after trimming, bounded length.
pub fn validate_product_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }
    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(())
}

/// Price: non-negative and below the sanity ceiling.
pub fn validate_price_cents(field: &str, cents: i64) -> Result<(), ValidationError> {
    if cents < 0 || cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// Stock level: non-negative and below the sanity ceiling.
pub fn validate_stock_level(quantity: i64) -> Result<(), ValidationError> {
    if quantity < 0 || quantity > MAX_STOCK_LEVEL {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_STOCK_LEVEL,
        });
    }
    Ok(())
}

/// Sale quantity: strictly positive.
pub fn validate_sale_quantity(quantity: i64) -> Result<(), ValidationError> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Optional free-text field (customer name, notes): bounded length.
pub fn validate_text_field(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.len() > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LENGTH,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
