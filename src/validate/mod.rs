//! Collection validation
//!
//! Validation is a read-only structural consistency check of a collection's
//! records against its metadata. It never mutates state and never fails:
//! structural problems are reported as `valid: false` with one message per
//! finding, so the caller decides what to do.
//!
//! Open scans are counted in the report for information only. Their
//! presence, absence, or abandonment never affects `valid`.

mod validator;

pub(crate) use validator::validate_state;

use serde::{Deserialize, Serialize};

/// Options for `Collection::validate_with`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateOptions {
    /// Also verify every record's checksum and decoding
    #[serde(default)]
    pub full: bool,
}

impl ValidateOptions {
    pub fn full() -> Self {
        Self { full: true }
    }
}

/// Result of validating one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub ns: String,
    pub valid: bool,
    /// Whether record-level checks ran
    pub full: bool,
    pub record_count: u64,
    pub data_size: u64,
    pub extent_count: usize,
    /// Scans registered at the time of validation
    pub open_cursors: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}
