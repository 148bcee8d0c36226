//! Parameter validation for query kinds.
//!
//! Each validator returns the normalized value or a reason. Constructors
//! wrap the reason in `QueryError::InvalidParameter`; field setters used
//! during restore wrap it in `FieldError::Invalid`, so a value accepted by
//! one path is accepted by the other.

use crate::error::{FieldError, QueryError};
use crate::limits::{LEGACY_ID_MAX, LEGACY_ID_MIN};

/// Price types accepted by `CoinPrice`.
pub const PRICE_TYPES: &[&str] = &["current", "eod", "24hr_twap", "1hr_twap", "custom", "manual"];

/// Currencies accepted by `TokenSpotPrice`.
pub const TOKEN_CURRENCIES: &[&str] = &["native", "usd"];

/// Lower-cases an asset or currency symbol.
pub fn symbol(value: &str) -> Result<String, &'static str> {
    if value.is_empty() {
        return Err("symbol must not be empty");
    }
    if value.chars().any(char::is_whitespace) {
        return Err("symbol must not contain whitespace");
    }
    Ok(value.to_lowercase())
}

pub fn price_type(value: &str) -> Result<String, &'static str> {
    let value = value.to_lowercase();
    if PRICE_TYPES.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err("price type must be one of current, eod, 24hr_twap, 1hr_twap, custom, manual")
    }
}

pub fn token_currency(value: &str) -> Result<String, &'static str> {
    let value = value.to_lowercase();
    if TOKEN_CURRENCIES.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err("currency must be native or usd")
    }
}

/// Lower-cases a `0x`-prefixed 20-byte hex address.
pub fn address(value: &str) -> Result<String, &'static str> {
    let value = value.to_lowercase();
    let Some(hex) = value.strip_prefix("0x") else {
        return Err("address must start with 0x");
    };
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("address must be 40 hex digits");
    }
    Ok(value)
}

pub fn legacy_id(value: u64) -> Result<u64, &'static str> {
    if (LEGACY_ID_MIN..=LEGACY_ID_MAX).contains(&value) {
        Ok(value)
    } else {
        Err("legacy id must be in 1..=100")
    }
}

/// Free text must be non-empty; it is kept verbatim.
pub fn text(value: &str) -> Result<String, &'static str> {
    if value.is_empty() {
        return Err("text must not be empty");
    }
    Ok(value.to_string())
}

/// Wraps a validator failure for a constructor.
pub(crate) fn param_error(query: &'static str, field: &'static str) -> impl FnOnce(&'static str) -> QueryError {
    move |reason| QueryError::InvalidParameter { query, field, reason: reason.to_string() }
}

/// Wraps a validator failure for a field setter.
pub(crate) fn field_error(reason: &'static str) -> FieldError {
    FieldError::Invalid { reason: reason.to_string() }
}
