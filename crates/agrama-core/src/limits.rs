//! Size limits enforced by Storage Core and the Primitive Engine (spec §3, §4.A).

use crate::error::{Error, Result};

/// Configurable size bounds. Defaults match spec §3.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum key length in bytes (default: 1 KiB).
    pub max_key_bytes: usize,
    /// Maximum value length in bytes (default: 16 MiB).
    pub max_value_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_key_bytes: 1024,
            max_value_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Limits {
    /// Validate a key's length, returning `SizeExceeded` on violation.
    pub fn validate_key(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(Error::InvalidInput("key must not be empty".into()));
        }
        if key.len() > self.max_key_bytes {
            return Err(Error::SizeExceeded(format!(
                "key length {} exceeds maximum {}",
                key.len(),
                self.max_key_bytes
            )));
        }
        Ok(())
    }

    /// Validate a value's length, returning `SizeExceeded` on violation.
    pub fn validate_value(&self, value: &[u8]) -> Result<()> {
        if value.len() > self.max_value_bytes {
            return Err(Error::SizeExceeded(format!(
                "value length {} exceeds maximum {}",
                value.len(),
                self.max_value_bytes
            )));
        }
        Ok(())
    }
}
