//! Key validation rules (spec §3: keys are UTF-8 strings, ≤1 KiB).

use crate::error::{Error, Result};
use crate::limits::Limits;

/// Validate a key using default limits.
///
/// # Examples
///
/// ```
/// use agrama_core::key::validate_key;
///
/// assert!(validate_key("src/main.rs").is_ok());
/// assert!(validate_key("").is_err());
/// ```
pub fn validate_key(key: &str) -> Result<()> {
    validate_key_with_limits(key, &Limits::default())
}

/// Validate a key against custom limits.
pub fn validate_key_with_limits(key: &str, limits: &Limits) -> Result<()> {
    if key.contains('\0') {
        return Err(Error::InvalidInput("key must not contain NUL bytes".into()));
    }
    limits.validate_key(key)
}
