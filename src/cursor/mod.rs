//! Cursors and scans
//!
//! A `Cursor` is configuration: collection handle, limit, skip. Every
//! terminal call opens a `Scan`, which lazily yields documents and is
//! registered with the collection only while it iterates.
//!
//! # Limit policy
//!
//! `limit(n)` with `n <= 0` means no limit. Positive `n` caps the number of
//! yielded documents at `n`.
//!
//! # Resource model
//!
//! A scan holds no collection lock between steps. Its registry entry is
//! released when it becomes exhausted or when it is dropped, whichever comes
//! first, so validation never observes a leftover scan artifact.

#[allow(clippy::module_inception)]
mod cursor;
mod registry;
mod scan;

pub use cursor::Cursor;
pub use registry::{CursorId, CursorInfo, KillCursorsReport};
pub use scan::{ExhaustReason, Scan, ScanState};

pub(crate) use registry::{CursorRegistry, ScanGuard};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Collection;
    use crate::database::Database;
    use serde_json::json;

    fn filled(count: i64) -> Collection {
        let db = Database::new("test");
        let coll = db.collection("cursor").unwrap();
        for i in 1..=count {
            coll.insert(json!({ "a": i })).unwrap();
        }
        coll
    }

    fn values(docs: &[crate::document::Document]) -> Vec<i64> {
        docs.iter()
            .map(|d| d.get("a").and_then(|v| v.as_i64()).unwrap())
            .collect()
    }

    #[test]
    fn test_unbounded_yields_all_in_order() {
        let coll = filled(10);
        let docs = coll.find().to_array().unwrap();
        assert_eq!(values(&docs), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_limit_caps_results() {
        let coll = filled(10);
        assert_eq!(coll.find().limit(3).to_array().unwrap().len(), 3);
        assert_eq!(coll.find().limit(30).to_array().unwrap().len(), 10);
    }

    #[test]
    fn test_non_positive_limit_is_unbounded() {
        let coll = filled(10);
        assert_eq!(coll.find().limit(0).limit_value(), None);
        assert_eq!(coll.find().limit(-5).limit_value(), None);
        assert_eq!(coll.find().limit(0).to_array().unwrap().len(), 10);
        assert_eq!(coll.find().limit(-5).to_array().unwrap().len(), 10);
    }

    #[test]
    fn test_later_limit_replaces_earlier() {
        let coll = filled(10);
        let cursor = coll.find().limit(2).limit(5);
        assert_eq!(cursor.limit_value(), Some(5));
        let cursor = coll.find().limit(2).limit(0);
        assert_eq!(cursor.limit_value(), None);
    }

    #[test]
    fn test_skip_and_limit() {
        let coll = filled(10);
        let docs = coll.find().skip(4).limit(3).to_array().unwrap();
        assert_eq!(values(&docs), vec![5, 6, 7]);

        assert!(coll.find().skip(20).to_array().unwrap().is_empty());
    }

    #[test]
    fn test_count_matches_to_array() {
        let coll = filled(10);
        for cursor in [
            coll.find(),
            coll.find().limit(4),
            coll.find().skip(8).limit(4),
            coll.find().skip(11),
        ] {
            assert_eq!(cursor.count(), cursor.to_array().unwrap().len() as u64);
        }
    }

    #[test]
    fn test_cursor_is_restartable() {
        let coll = filled(5);
        let cursor = coll.find().limit(3);
        let first = cursor.to_array().unwrap();
        let second = cursor.to_array().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scan_released_as_soon_as_limit_reached() {
        let coll = filled(10);
        let mut scan = coll.find().limit(2).iter();
        assert_eq!(coll.list_cursors().len(), 1);

        scan.next().unwrap().unwrap();
        assert_eq!(scan.state(), ScanState::Iterating);

        scan.next().unwrap().unwrap();
        assert_eq!(scan.state(), ScanState::Exhausted(ExhaustReason::Limit));
        assert!(coll.list_cursors().is_empty());

        assert!(scan.next().is_none());
        assert_eq!(scan.returned(), 2);
    }

    #[test]
    fn test_scan_released_at_end_of_collection() {
        let coll = filled(2);
        let mut scan = coll.find().iter();
        scan.next();
        scan.next();
        assert_eq!(
            scan.state(),
            ScanState::Exhausted(ExhaustReason::EndOfCollection)
        );
        assert!(coll.list_cursors().is_empty());
    }

    #[test]
    fn test_empty_scan_exhausted_at_open() {
        let coll = filled(0);
        let scan = coll.find().limit(5).iter();
        assert!(scan.is_exhausted());
        assert!(coll.list_cursors().is_empty());
    }

    #[test]
    fn test_abandoned_scan_released_on_drop() {
        let coll = filled(10);
        let mut scan = coll.find().limit(5).iter();
        scan.next();
        assert_eq!(coll.list_cursors().len(), 1);

        drop(scan);
        assert!(coll.list_cursors().is_empty());
        assert_eq!(coll.metrics().snapshot().cursors_abandoned, 1);
    }

    #[test]
    fn test_list_cursors_reports_progress() {
        let coll = filled(10);
        let mut scan = coll.find().limit(6).iter();
        scan.next();
        scan.next();

        let infos = coll.list_cursors();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].id, scan.cursor_id());
        assert_eq!(infos[0].limit, Some(6));
        assert_eq!(infos[0].returned, 2);
        assert_eq!(infos[0].ns, "test.cursor");
    }

    #[test]
    fn test_kill_cursors_stops_scan() {
        let coll = filled(10);
        let mut scan = coll.find().iter();
        scan.next();

        let report = coll.kill_cursors(&[scan.cursor_id(), CursorId::new(12345)]);
        assert_eq!(report.killed, vec![scan.cursor_id()]);
        assert_eq!(report.not_found, vec![CursorId::new(12345)]);

        assert!(scan.next().is_none());
        assert_eq!(scan.state(), ScanState::Exhausted(ExhaustReason::Killed));
        assert!(coll.list_cursors().is_empty());
    }

    #[test]
    fn test_drop_kills_open_scans() {
        let coll = filled(10);
        let mut scan = coll.find().iter();
        scan.next();

        coll.drop();
        assert!(coll.list_cursors().is_empty());
        assert!(scan.next().is_none());
        assert_eq!(scan.state(), ScanState::Exhausted(ExhaustReason::Killed));
        assert!(coll.validate().valid);
    }

    #[test]
    fn test_reset_under_scan_invalidates_it() {
        let coll = filled(5);
        let mut scan = coll.find().iter();
        scan.next().unwrap().unwrap();

        // Reset without killing, as if the scan missed a concurrent drop
        coll.with_state_mut(|state| state.reset());
        coll.insert(json!({"a": 99})).unwrap();

        assert!(scan.next().is_none());
        assert_eq!(
            scan.state(),
            ScanState::Exhausted(ExhaustReason::Invalidated)
        );
        assert!(coll.list_cursors().is_empty());
        assert_eq!(scan.returned(), 1);
    }

    #[test]
    fn test_scan_opened_after_drop_is_not_killed() {
        let coll = filled(5);
        coll.drop();
        coll.insert(json!({"a": 1})).unwrap();

        let mut scan = coll.find().iter();
        assert_eq!(scan.next().unwrap().unwrap().get("a"), Some(&json!(1)));
        assert_eq!(
            scan.state(),
            ScanState::Exhausted(ExhaustReason::EndOfCollection)
        );
    }

    #[test]
    fn test_scan_does_not_see_later_inserts() {
        let coll = filled(3);
        let scan = coll.find().iter();
        coll.insert(json!({"a": 4})).unwrap();

        let docs: Vec<_> = scan.collect::<Result<_, _>>().unwrap();
        assert_eq!(values(&docs), vec![1, 2, 3]);
        assert_eq!(coll.find().to_array().unwrap().len(), 4);
    }

    #[test]
    fn test_corrupt_record_ends_scan_with_error() {
        let coll = filled(3);
        coll.with_state_mut(|state| state.extent_records_mut(0)[1].flip_body_byte(2));

        let mut scan = coll.find().iter();
        assert!(scan.next().unwrap().is_ok());
        let err = scan.next().unwrap().unwrap_err();
        assert_eq!(err.code(), "DOCSTORE_DATA_CORRUPTION");
        assert_eq!(scan.state(), ScanState::Exhausted(ExhaustReason::Corrupted));
        assert!(scan.next().is_none());
        assert!(coll.list_cursors().is_empty());

        assert!(coll.find().to_array().is_err());
    }

    #[test]
    fn test_size_hint_bounded_by_limit() {
        let coll = filled(10);
        let scan = coll.find().limit(4).iter();
        assert_eq!(scan.size_hint(), (0, Some(4)));
        let scan = coll.find().skip(8).iter();
        assert_eq!(scan.size_hint(), (0, Some(2)));
    }
}
