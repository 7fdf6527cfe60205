//! Cursor: an immutable query configuration
//!
//! A cursor holds a collection handle, an optional limit, and a skip count.
//! It never iterates by itself. Each terminal call (`iter`, `to_array`)
//! opens a fresh `Scan`, so the same cursor can be materialized any number
//! of times and yields the same result while the collection is unchanged.

use std::fmt;

use super::scan::Scan;
use crate::collection::Collection;
use crate::document::Document;
use crate::errors::StoreResult;

#[derive(Clone)]
pub struct Cursor {
    collection: Collection,
    limit: Option<u64>,
    skip: u64,
}

impl Cursor {
    pub(crate) fn new(collection: Collection) -> Self {
        Self {
            collection,
            limit: None,
            skip: 0,
        }
    }

    /// Yield at most `n` documents.
    ///
    /// `n <= 0` means no limit. A later call replaces an earlier one.
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = u64::try_from(n).ok().filter(|&n| n > 0);
        self
    }

    /// Skip the first `n` documents in insertion order.
    pub fn skip(mut self, n: u64) -> Self {
        self.skip = n;
        self
    }

    /// Configured limit, `None` when unbounded
    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn skip_value(&self) -> u64 {
        self.skip
    }

    /// Open a new scan over the collection.
    pub fn iter(&self) -> Scan {
        Scan::open(self.collection.clone(), self.limit, self.skip)
    }

    /// Materialize every document this cursor yields.
    ///
    /// Length is `min(limit, count - skip)`. The scan is exhausted, and its
    /// registration released, before this returns.
    ///
    /// # Errors
    ///
    /// Returns `DOCSTORE_DATA_CORRUPTION` if a record fails verification.
    pub fn to_array(&self) -> StoreResult<Vec<Document>> {
        self.iter().collect()
    }

    /// Number of documents `to_array` would return now.
    ///
    /// Computed from collection metadata; no records are read.
    pub fn count(&self) -> u64 {
        let visible = self.collection.count().saturating_sub(self.skip);
        match self.limit {
            Some(limit) => visible.min(limit),
            None => visible,
        }
    }
}

impl IntoIterator for &Cursor {
    type Item = StoreResult<Document>;
    type IntoIter = Scan;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("ns", &self.collection.ns())
            .field("limit", &self.limit)
            .field("skip", &self.skip)
            .finish()
    }
}
