//! Scan: the iteration state produced by a cursor
//!
//! State machine:
//!
//! ```text
//! Iterating --(limit reached | end of collection | dropped | killed | corrupt record)--> Exhausted
//! ```
//!
//! - The scan registers with the collection's cursor registry when opened
//!   and releases that registration on the transition to `Exhausted`, or on
//!   drop if it is abandoned first.
//! - The transition happens as soon as the last allowed document is yielded,
//!   not on the following call.
//! - The collection lock is taken for each step only. A scan never holds it
//!   between calls.
//! - A scan sees the records that existed when it was opened.

use std::fmt;

use serde::Serialize;

use super::registry::{CursorId, ScanGuard};
use crate::collection::Collection;
use crate::document::Document;
use crate::errors::StoreResult;
use crate::observability::{log_event, Event};

/// Why a scan stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustReason {
    /// Yielded as many documents as the limit allows
    Limit,
    /// Reached the last record visible to the scan
    EndOfCollection,
    /// Collection was dropped under the scan
    Invalidated,
    /// Killed through `kill_cursors` or a drop
    Killed,
    /// A record failed checksum or decoding
    Corrupted,
}

impl ExhaustReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExhaustReason::Limit => "limit",
            ExhaustReason::EndOfCollection => "end_of_collection",
            ExhaustReason::Invalidated => "invalidated",
            ExhaustReason::Killed => "killed",
            ExhaustReason::Corrupted => "corrupted",
        }
    }
}

impl fmt::Display for ExhaustReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Iterating,
    Exhausted(ExhaustReason),
}

/// Lazy producer of documents from one collection
pub struct Scan {
    collection: Collection,
    cursor_id: CursorId,
    generation: u64,
    /// First ordinal not visible to this scan
    end: u64,
    position: u64,
    /// Documents still allowed by the limit; `None` when unbounded
    remaining: Option<u64>,
    returned: u64,
    guard: Option<ScanGuard>,
    state: ScanState,
}

impl Scan {
    pub(crate) fn open(collection: Collection, limit: Option<u64>, skip: u64) -> Self {
        let (guard, generation, end) = collection.register_scan(limit);
        let cursor_id = guard.id();

        collection.metrics().increment_cursors_opened();
        log_event!(
            Event::CursorOpened,
            collection.ns(),
            cursor_id = cursor_id.as_u64(),
            limit = ?limit,
            skip = skip
        );

        let mut scan = Self {
            collection,
            cursor_id,
            generation,
            end,
            position: skip.min(end),
            remaining: limit,
            returned: 0,
            guard: Some(guard),
            state: ScanState::Iterating,
        };

        if scan.position >= scan.end {
            scan.exhaust(ExhaustReason::EndOfCollection);
        }

        scan
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, ScanState::Exhausted(_))
    }

    /// Registry id of this scan; no longer listed once exhausted
    pub fn cursor_id(&self) -> CursorId {
        self.cursor_id
    }

    /// Documents yielded so far
    pub fn returned(&self) -> u64 {
        self.returned
    }

    fn exhaust(&mut self, reason: ExhaustReason) {
        if self.is_exhausted() {
            return;
        }
        self.state = ScanState::Exhausted(reason);

        // Dropping the guard releases the registration
        let killed = match self.guard.take() {
            Some(guard) => guard.is_killed(),
            None => return,
        };

        // A kill that lands mid-step is already counted by whoever killed it
        if reason == ExhaustReason::Killed || killed {
            log_event!(
                Event::CursorKilled,
                self.collection.ns(),
                cursor_id = self.cursor_id.as_u64(),
                returned = self.returned
            );
            return;
        }

        self.collection.metrics().increment_cursors_exhausted();
        log_event!(
            Event::CursorExhausted,
            self.collection.ns(),
            cursor_id = self.cursor_id.as_u64(),
            reason = reason.as_str(),
            returned = self.returned
        );
    }
}

impl Iterator for Scan {
    type Item = StoreResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_exhausted() {
            return None;
        }

        if self.guard.as_ref().map_or(true, ScanGuard::is_killed) {
            self.exhaust(ExhaustReason::Killed);
            return None;
        }

        let item = match self.collection.read_record(self.generation, self.position) {
            Some(item) => item,
            None => {
                self.exhaust(ExhaustReason::Invalidated);
                return None;
            }
        };
        self.position += 1;

        match item {
            Ok(doc) => {
                self.returned += 1;
                if let Some(guard) = &self.guard {
                    guard.record_returned();
                }
                if let Some(remaining) = self.remaining.as_mut() {
                    *remaining -= 1;
                }

                if self.remaining == Some(0) {
                    self.exhaust(ExhaustReason::Limit);
                } else if self.position >= self.end {
                    self.exhaust(ExhaustReason::EndOfCollection);
                }

                Some(Ok(doc))
            }
            Err(err) => {
                self.collection.metrics().increment_corruptions_detected();
                log_event!(
                    Event::DataCorruption,
                    self.collection.ns(),
                    cursor_id = self.cursor_id.as_u64(),
                    error = %err
                );
                self.exhaust(ExhaustReason::Corrupted);
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.is_exhausted() {
            return (0, Some(0));
        }
        let visible = self.end.saturating_sub(self.position);
        let upper = self.remaining.map_or(visible, |r| r.min(visible));
        (0, usize::try_from(upper).ok())
    }
}

impl Drop for Scan {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            if !guard.is_killed() {
                self.collection.metrics().increment_cursors_abandoned();
                log_event!(
                    Event::CursorAbandoned,
                    self.collection.ns(),
                    cursor_id = self.cursor_id.as_u64(),
                    returned = self.returned
                );
            }
            // guard drops here, releasing the registration
        }
    }
}

impl fmt::Debug for Scan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scan")
            .field("ns", &self.collection.ns())
            .field("cursor_id", &self.cursor_id)
            .field("position", &self.position)
            .field("end", &self.end)
            .field("remaining", &self.remaining)
            .field("state", &self.state)
            .finish()
    }
}
