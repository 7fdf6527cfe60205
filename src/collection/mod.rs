//! Collection store
//!
//! A `Collection` is a cheap, clonable handle to one collection's shared
//! state. Clones observe the same documents, metadata, and open cursors.
//!
//! # Invariants
//!
//! - Insertion order is iteration order
//! - Metadata reflects exactly the live records (no phantom, no orphan)
//! - Data and metadata change under one write lock
//! - Scans and validation take the read lock for one step at a time

mod store;

pub(crate) use store::{CollectionMetadata, CollectionState, Extent};

#[cfg(test)]
pub(crate) use store::test_support;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::cursor::{Cursor, CursorId, CursorInfo, CursorRegistry, KillCursorsReport, ScanGuard};
use crate::document::{check_document, Document, DocumentId, StoredRecord};
use crate::errors::{StoreError, StoreResult};
use crate::observability::{log_event, Event, MetricsRegistry};
use crate::validate::{validate_state, ValidateOptions, ValidationReport};

/// Size and layout summary of a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub ns: String,
    pub count: u64,
    /// Sum of encoded document sizes in bytes
    pub size: u64,
    pub extent_count: usize,
    pub extent_capacity: usize,
}

struct Shared {
    ns: String,
    state: RwLock<CollectionState>,
    cursors: Arc<CursorRegistry>,
    config: Arc<StoreConfig>,
    metrics: Arc<MetricsRegistry>,
}

/// Handle to a collection
#[derive(Clone)]
pub struct Collection {
    shared: Arc<Shared>,
}

impl Collection {
    pub(crate) fn new(
        ns: impl Into<String>,
        config: Arc<StoreConfig>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let ns = ns.into();
        log_event!(Event::CollectionCreated, &ns);

        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(CollectionState::new(config.extent_capacity)),
                cursors: Arc::new(CursorRegistry::new(ns.clone())),
                ns,
                config,
                metrics,
            }),
        }
    }

    /// Full namespace (`database.collection`)
    pub fn ns(&self) -> &str {
        &self.shared.ns
    }

    /// Collection name without the database prefix
    pub fn name(&self) -> &str {
        self.ns()
            .split_once('.')
            .map_or(self.ns(), |(_, name)| name)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CollectionState> {
        self.shared
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CollectionState> {
        self.shared
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn metrics(&self) -> &MetricsRegistry {
        &self.shared.metrics
    }

    /// Removes every document and resets metadata to the empty state.
    ///
    /// Idempotent. Open scans on the collection are killed.
    pub fn drop(&self) {
        // Scans are killed before the write lock is released, so no scan can
        // register against the new generation and then be killed.
        let (dropped, killed) = {
            let mut state = self.write_state();
            let count = state.metadata().record_count;
            state.reset();
            (count, self.shared.cursors.kill_all())
        };

        self.metrics().add_cursors_killed(killed as u64);
        self.metrics().increment_collections_dropped();

        log_event!(
            Event::CollectionDropped,
            self.ns(),
            cursors_killed = killed,
            documents = dropped
        );
    }

    /// Inserts one document and returns its assigned identity.
    ///
    /// # Errors
    ///
    /// - `DOCSTORE_INVALID_DOCUMENT` if `doc` is not a mapping or breaks the
    ///   field name or depth rules
    /// - `DOCSTORE_DOCUMENT_TOO_LARGE` if its encoding exceeds
    ///   `max_document_bytes`
    ///
    /// On error the collection is unchanged.
    pub fn insert(&self, doc: Value) -> StoreResult<DocumentId> {
        let mut ids = self.insert_many(std::iter::once(doc))?;
        Ok(ids.remove(0))
    }

    /// Inserts documents in order, all or nothing.
    ///
    /// Every document is checked and serialized before the write lock is
    /// taken. Under the lock each body only gets its id and checksum.
    pub fn insert_many<I>(&self, docs: I) -> StoreResult<Vec<DocumentId>>
    where
        I: IntoIterator<Item = Value>,
    {
        let docs: Vec<Value> = docs.into_iter().collect();
        let config = &self.shared.config;

        let bodies = docs
            .iter()
            .map(|doc| {
                let fields = check_document(doc, config.max_nesting_depth)?;
                StoredRecord::encode_body(fields, config.max_document_bytes)
            })
            .collect::<StoreResult<Vec<_>>>()
            .map_err(|e| self.reject_insert(e))?;

        let ids = {
            let mut state = self.write_state();
            let mut ids = Vec::with_capacity(bodies.len());

            for body in bodies {
                let record = StoredRecord::seal(state.next_id(), body);
                ids.push(record.id());
                state.append(record);
            }
            ids
        };

        self.metrics().add_documents_inserted(ids.len() as u64);
        log_event!(Event::DocumentsInserted, self.ns(), count = ids.len());

        Ok(ids)
    }

    fn reject_insert(&self, err: StoreError) -> StoreError {
        self.metrics().increment_inserts_rejected();
        log_event!(
            Event::InsertRejected,
            self.ns(),
            code = err.code(),
            reason = %err
        );
        err
    }

    /// Returns an unbounded cursor over the collection in insertion order.
    pub fn find(&self) -> Cursor {
        Cursor::new(self.clone())
    }

    /// Number of documents, from metadata
    pub fn count(&self) -> u64 {
        self.read_state().metadata().record_count
    }

    pub fn stats(&self) -> CollectionStats {
        let state = self.read_state();
        let meta = state.metadata();

        CollectionStats {
            ns: self.ns().to_string(),
            count: meta.record_count,
            size: meta.data_size,
            extent_count: state.extents().len(),
            extent_capacity: state.extent_capacity(),
        }
    }

    /// Structural validation without record-level checks.
    pub fn validate(&self) -> ValidationReport {
        self.validate_with(ValidateOptions::default())
    }

    /// Read-only consistency check of records against metadata.
    ///
    /// Never fails; problems are reported through `valid` and `errors`.
    /// Open cursors are counted but never make the collection invalid.
    pub fn validate_with(&self, options: ValidateOptions) -> ValidationReport {
        log_event!(Event::ValidateBegin, self.ns());
        self.metrics().increment_validations_run();

        let open_cursors = self.shared.cursors.open_count();
        let report = {
            let state = self.read_state();
            validate_state(self.ns(), &state, open_cursors, options)
        };

        if report.valid {
            log_event!(
                Event::ValidateComplete,
                self.ns(),
                records = report.record_count,
                full = report.full
            );
        } else {
            self.metrics().increment_validations_failed();
            log_event!(
                Event::ValidateFailed,
                self.ns(),
                error_count = report.errors.len(),
                errors = ?report.errors
            );
        }

        report
    }

    /// Scans currently registered on this collection
    pub fn list_cursors(&self) -> Vec<CursorInfo> {
        self.shared.cursors.list()
    }

    /// Kills the listed scans. Ids not open are reported in `not_found`.
    pub fn kill_cursors(&self, ids: &[CursorId]) -> KillCursorsReport {
        let report = self.shared.cursors.kill(ids);
        self.metrics().add_cursors_killed(report.killed.len() as u64);
        report
    }

    /// Registers a new scan and returns its guard with the generation and
    /// visible record count it reads under.
    ///
    /// Registration happens under the read lock, so a concurrent drop either
    /// precedes it entirely or kills the scan it registered.
    pub(crate) fn register_scan(&self, limit: Option<u64>) -> (ScanGuard, u64, u64) {
        let state = self.read_state();
        let meta: CollectionMetadata = state.metadata();
        let guard = self.shared.cursors.register(limit);
        (guard, meta.generation, meta.record_count)
    }

    /// Reads and decodes the record at `position`.
    ///
    /// Returns `None` if the collection was dropped since `generation` or
    /// the position is past the end.
    pub(crate) fn read_record(
        &self,
        generation: u64,
        position: u64,
    ) -> Option<StoreResult<Document>> {
        let state = self.read_state();
        if state.metadata().generation != generation {
            return None;
        }
        state.record_at(position).map(StoredRecord::decode)
    }

    #[cfg(test)]
    pub(crate) fn with_state_mut<R>(&self, f: impl FnOnce(&mut CollectionState) -> R) -> R {
        f(&mut self.write_state())
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("ns", &self.ns()).finish()
    }
}
