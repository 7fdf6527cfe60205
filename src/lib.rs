//! docstore - an in-memory document collection store
//!
//! Collections hold schemaless JSON documents in insertion order. Reads go
//! through cursors with an optional limit and skip; each cursor evaluation
//! opens a scan that is registered with its collection only while it is
//! iterating. Validation checks records against collection metadata and is
//! unaffected by open, exhausted, or abandoned scans.
//!
//! ```
//! use docstore::Database;
//! use serde_json::json;
//!
//! let db = Database::new("test");
//! let coll = db.collection("find3").unwrap();
//! coll.drop();
//! for i in 1..=50 {
//!     coll.insert(json!({ "a": i })).unwrap();
//! }
//!
//! assert_eq!(coll.find().limit(20).to_array().unwrap().len(), 20);
//! assert!(coll.validate().valid);
//! ```

pub mod collection;
pub mod config;
pub mod cursor;
pub mod database;
pub mod document;
pub mod errors;
pub mod observability;
pub mod validate;

pub use collection::{Collection, CollectionStats};
pub use config::{StoreConfig, MAX_NESTING_DEPTH_LIMIT};
pub use cursor::{Cursor, CursorId, CursorInfo, ExhaustReason, KillCursorsReport, Scan, ScanState};
pub use database::Database;
pub use document::{Document, DocumentId};
pub use errors::{Severity, StoreError, StoreResult};
pub use observability::MetricsSnapshot;
pub use validate::{ValidateOptions, ValidationReport};
