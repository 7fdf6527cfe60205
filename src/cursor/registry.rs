//! Open-cursor bookkeeping
//!
//! Every scan registers here while it iterates. Registration is held by a
//! `ScanGuard`; dropping the guard unregisters the scan, so release happens
//! exactly once on every exit path.
//!
//! The registry is separate from the collection's structural metadata.
//! Nothing in it is consulted when deciding whether a collection is valid.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of an open scan, unique per collection handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CursorId(u64);

impl CursorId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CursorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Description of an open scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CursorInfo {
    pub id: CursorId,
    pub ns: String,
    /// `None` when unbounded
    pub limit: Option<u64>,
    /// Documents yielded so far
    pub returned: u64,
    pub opened_at: DateTime<Utc>,
}

/// Outcome of `kill_cursors`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KillCursorsReport {
    pub killed: Vec<CursorId>,
    pub not_found: Vec<CursorId>,
}

/// Progress shared between a scan and its registry entry
#[derive(Debug, Default)]
struct ScanProgress {
    returned: AtomicU64,
    killed: AtomicBool,
}

#[derive(Debug)]
struct OpenCursor {
    limit: Option<u64>,
    opened_at: DateTime<Utc>,
    progress: Arc<ScanProgress>,
}

#[derive(Debug)]
pub(crate) struct CursorRegistry {
    ns: String,
    next_id: AtomicU64,
    open: Mutex<HashMap<CursorId, OpenCursor>>,
}

impl CursorRegistry {
    pub(crate) fn new(ns: impl Into<String>) -> Self {
        Self {
            ns: ns.into(),
            next_id: AtomicU64::new(1),
            open: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CursorId, OpenCursor>> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new scan. The returned guard unregisters it on drop.
    pub(crate) fn register(self: &Arc<Self>, limit: Option<u64>) -> ScanGuard {
        let id = CursorId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let progress = Arc::new(ScanProgress::default());

        self.lock().insert(
            id,
            OpenCursor {
                limit,
                opened_at: Utc::now(),
                progress: Arc::clone(&progress),
            },
        );

        ScanGuard {
            id,
            registry: Arc::clone(self),
            progress,
        }
    }

    fn release(&self, id: CursorId) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Number of registered scans
    pub(crate) fn open_count(&self) -> usize {
        self.lock().len()
    }

    /// All registered scans, ordered by id
    pub(crate) fn list(&self) -> Vec<CursorInfo> {
        let mut infos: Vec<CursorInfo> = self
            .lock()
            .iter()
            .map(|(id, open)| CursorInfo {
                id: *id,
                ns: self.ns.clone(),
                limit: open.limit,
                returned: open.progress.returned.load(Ordering::Relaxed),
                opened_at: open.opened_at,
            })
            .collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    /// Marks the listed scans killed and unregisters them.
    pub(crate) fn kill(&self, ids: &[CursorId]) -> KillCursorsReport {
        let mut open = self.lock();
        let mut report = KillCursorsReport::default();

        for id in ids {
            match open.remove(id) {
                Some(cursor) => {
                    cursor.progress.killed.store(true, Ordering::Release);
                    report.killed.push(*id);
                }
                None => report.not_found.push(*id),
            }
        }

        report
    }

    /// Kills every registered scan, returning how many there were.
    pub(crate) fn kill_all(&self) -> usize {
        let drained: Vec<OpenCursor> = self.lock().drain().map(|(_, cursor)| cursor).collect();
        for cursor in &drained {
            cursor.progress.killed.store(true, Ordering::Release);
        }
        drained.len()
    }
}

/// Registration held by an iterating scan
#[derive(Debug)]
pub(crate) struct ScanGuard {
    id: CursorId,
    registry: Arc<CursorRegistry>,
    progress: Arc<ScanProgress>,
}

impl ScanGuard {
    pub(crate) fn id(&self) -> CursorId {
        self.id
    }

    pub(crate) fn record_returned(&self) {
        self.progress.returned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn is_killed(&self) -> bool {
        self.progress.killed.load(Ordering::Acquire)
    }
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        // Already gone if the scan was killed
        self.registry.release(self.id);
    }
}
