//! Store configuration
//!
//! Loaded from a JSON file. Every field is optional and falls back to its
//! default; values are range-checked after parsing.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{StoreError, StoreResult};

/// Deepest nesting a stored body can have and still decode.
///
/// serde_json refuses input nested 128 levels or more, so a higher cap
/// would accept documents that can never be read back.
pub const MAX_NESTING_DEPTH_LIMIT: usize = 127;

/// Configuration shared by every collection of a `Database`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Records per extent (default 64)
    #[serde(default = "default_extent_capacity")]
    pub extent_capacity: usize,

    /// Max encoded document size in bytes (default 16MB)
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,

    /// Max nesting depth of mappings and sequences (default 100, at most
    /// `MAX_NESTING_DEPTH_LIMIT`)
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
}

fn default_extent_capacity() -> usize {
    64
}
fn default_max_document_bytes() -> usize {
    16 * 1024 * 1024
}
fn default_max_nesting_depth() -> usize {
    100
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            extent_capacity: default_extent_capacity(),
            max_document_bytes: default_max_document_bytes(),
            max_nesting_depth: default_max_nesting_depth(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StoreError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json_str(content: &str) -> StoreResult<Self> {
        let config: StoreConfig = serde_json::from_str(content)
            .map_err(|e| StoreError::Config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Range-check every field
    pub fn validate(&self) -> StoreResult<()> {
        if self.extent_capacity == 0 {
            return Err(StoreError::Config("extent_capacity must be > 0".into()));
        }

        if self.max_document_bytes == 0 {
            return Err(StoreError::Config("max_document_bytes must be > 0".into()));
        }

        if self.max_nesting_depth == 0 {
            return Err(StoreError::Config("max_nesting_depth must be > 0".into()));
        }

        if self.max_nesting_depth > MAX_NESTING_DEPTH_LIMIT {
            return Err(StoreError::Config(format!(
                "max_nesting_depth must be <= {}, got {}",
                MAX_NESTING_DEPTH_LIMIT, self.max_nesting_depth
            )));
        }

        Ok(())
    }
}
