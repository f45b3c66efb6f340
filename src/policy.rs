use crate::constants::{DEFAULT_MAX_BYTES, DEFAULT_MAX_SIDE};
use crate::error::ConfigError;

/// Size limits applied to one compression run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionPolicy {
    /// Longest allowed side in pixels
    pub max_side: u32,
    /// Byte ceiling for the encoded result
    pub max_bytes: usize,
    /// Name to give encoded results instead of the source name
    pub file_name: Option<String>,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            max_side: DEFAULT_MAX_SIDE,
            max_bytes: DEFAULT_MAX_BYTES,
            file_name: None,
        }
    }
}

impl CompressionPolicy {
    pub fn new(
        max_side: Option<u32>,
        max_bytes: Option<usize>,
        file_name: Option<String>,
    ) -> Result<Self, ConfigError> {
        let max_side = max_side.unwrap_or(DEFAULT_MAX_SIDE);
        if max_side == 0 {
            return Err(ConfigError::InvalidMaxSide(max_side));
        }

        let max_bytes = max_bytes.unwrap_or(DEFAULT_MAX_BYTES);
        if max_bytes == 0 {
            return Err(ConfigError::InvalidMaxBytes(max_bytes));
        }

        Ok(Self {
            max_side,
            max_bytes,
            file_name: file_name.filter(|name| !name.trim().is_empty()),
        })
    }
}
