//! Observable events
//!
//! Events are explicit and typed. Each has a stable upper-snake name used as
//! the `event` field of the emitted log record.

use std::fmt;

/// Observable events in docstore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Collection lifecycle
    /// Collection handle created
    CollectionCreated,
    /// Collection dropped (contents and metadata reset)
    CollectionDropped,

    // Writes
    /// Documents appended
    DocumentsInserted,
    /// Insert rejected before touching the store
    InsertRejected,

    // Cursors
    /// Scan registered
    CursorOpened,
    /// Scan reached its limit or the end of the collection
    CursorExhausted,
    /// Scan dropped before exhaustion
    CursorAbandoned,
    /// Scan killed by request or by a drop
    CursorKilled,

    // Validation
    /// Validation started
    ValidateBegin,
    /// Validation found the collection consistent
    ValidateComplete,
    /// Validation found structural problems
    ValidateFailed,

    /// Record failed checksum or decoding (FATAL)
    DataCorruption,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::CollectionCreated => "COLLECTION_CREATED",
            Event::CollectionDropped => "COLLECTION_DROPPED",
            Event::DocumentsInserted => "DOCUMENTS_INSERTED",
            Event::InsertRejected => "INSERT_REJECTED",
            Event::CursorOpened => "CURSOR_OPENED",
            Event::CursorExhausted => "CURSOR_EXHAUSTED",
            Event::CursorAbandoned => "CURSOR_ABANDONED",
            Event::CursorKilled => "CURSOR_KILLED",
            Event::ValidateBegin => "VALIDATE_BEGIN",
            Event::ValidateComplete => "VALIDATE_COMPLETE",
            Event::ValidateFailed => "VALIDATE_FAILED",
            Event::DataCorruption => "DATA_CORRUPTION",
        }
    }

    /// Returns whether this event means stored data is untrustworthy
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::DataCorruption)
    }

    /// Returns whether this event reports a problem
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Event::InsertRejected | Event::ValidateFailed | Event::CursorKilled
        )
    }

    /// Returns whether this event is per-scan chatter logged at debug level
    pub fn is_routine(&self) -> bool {
        matches!(
            self,
            Event::CursorOpened | Event::CursorExhausted | Event::CursorAbandoned
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
