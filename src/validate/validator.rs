//! Structural checks over a collection's records and metadata
//!
//! Checks, in order:
//! 1. Each extent is non-empty and within capacity
//! 2. Every extent but the last is full
//! 3. Each extent's tracked size equals the sum of its record sizes
//! 4. Record total equals `record_count`; byte total equals `data_size`
//! 5. Identities are strictly increasing and below `next_id`
//! 6. (full only) Every record verifies and decodes to a mapping
//!
//! Checks never stop at the first problem; every finding is reported.

use super::{ValidateOptions, ValidationReport};
use crate::collection::{CollectionState, Extent};

const PARTIAL_WARNING: &str =
    "record-level checks skipped; use ValidateOptions { full: true } for a thorough scan";

pub(crate) fn validate_state(
    ns: &str,
    state: &CollectionState,
    open_cursors: usize,
    options: ValidateOptions,
) -> ValidationReport {
    let meta = state.metadata();
    let extents = state.extents();
    let capacity = state.extent_capacity();

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    check_extent_layout(extents, capacity, &mut errors);

    let record_total: u64 = extents.iter().map(|e| e.len() as u64).sum();
    if record_total != meta.record_count {
        errors.push(format!(
            "record_count is {} but extents hold {} records",
            meta.record_count, record_total
        ));
    }

    let byte_total: u64 = extents.iter().map(Extent::data_size).sum();
    if byte_total != meta.data_size {
        errors.push(format!(
            "data_size is {} but extents track {} bytes",
            meta.data_size, byte_total
        ));
    }

    check_identities(extents, meta.next_id, &mut errors);

    if options.full {
        check_records(extents, &mut errors);
    } else {
        warnings.push(PARTIAL_WARNING.to_string());
    }

    ValidationReport {
        ns: ns.to_string(),
        valid: errors.is_empty(),
        full: options.full,
        record_count: meta.record_count,
        data_size: meta.data_size,
        extent_count: extents.len(),
        open_cursors,
        errors,
        warnings,
    }
}

fn check_extent_layout(extents: &[Extent], capacity: usize, errors: &mut Vec<String>) {
    let last = extents.len().saturating_sub(1);

    for (index, extent) in extents.iter().enumerate() {
        if extent.len() == 0 {
            errors.push(format!("extent {} is empty", index));
        }
        if extent.len() > capacity {
            errors.push(format!(
                "extent {} holds {} records, capacity is {}",
                index,
                extent.len(),
                capacity
            ));
        }
        if index < last && extent.len() < capacity {
            errors.push(format!(
                "extent {} holds {} records but is not the last extent (capacity {})",
                index,
                extent.len(),
                capacity
            ));
        }

        let tracked = extent.data_size();
        let actual: u64 = extent.records().iter().map(|r| r.size()).sum();
        if tracked != actual {
            errors.push(format!(
                "extent {} tracks {} bytes, records hold {}",
                index, tracked, actual
            ));
        }
    }
}

fn check_identities(extents: &[Extent], next_id: u64, errors: &mut Vec<String>) {
    let mut previous: Option<u64> = None;

    for record in extents.iter().flat_map(Extent::records) {
        let id = record.id().as_u64();

        if let Some(prev) = previous {
            if id <= prev {
                errors.push(format!("record {} follows record {} out of order", id, prev));
            }
        }
        if id >= next_id {
            errors.push(format!("record {} is not below next_id {}", id, next_id));
        }

        previous = Some(id);
    }
}

fn check_records(extents: &[Extent], errors: &mut Vec<String>) {
    for record in extents.iter().flat_map(Extent::records) {
        if let Err(err) = record.decode() {
            errors.push(err.to_string());
        }
    }
}
