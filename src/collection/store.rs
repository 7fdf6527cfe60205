//! Record layout and structural metadata of a collection
//!
//! Records live in fixed-capacity extents, in insertion order. Every extent
//! except the last is full, so a record's ordinal position alone locates its
//! extent and slot.
//!
//! Metadata (`record_count`, `data_size`) is updated in the same call that
//! mutates the extents. Callers hold the collection write lock across the
//! whole call, so no reader sees one without the other.

use crate::document::{DocumentId, StoredRecord};

/// A fixed-capacity run of records
#[derive(Debug, Clone, Default)]
pub(crate) struct Extent {
    records: Vec<StoredRecord>,
    data_size: u64,
}

impl Extent {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            data_size: 0,
        }
    }

    pub(crate) fn records(&self) -> &[StoredRecord] {
        &self.records
    }

    /// Sum of encoded body sizes as tracked by the extent
    pub(crate) fn data_size(&self) -> u64 {
        self.data_size
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

/// Structural metadata of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CollectionMetadata {
    /// Live records
    pub record_count: u64,
    /// Sum of encoded body sizes of live records
    pub data_size: u64,
    /// Identity the next insert receives
    pub next_id: u64,
    /// Bumped by every drop; scans opened under an older generation are stale
    pub generation: u64,
}

impl Default for CollectionMetadata {
    fn default() -> Self {
        Self {
            record_count: 0,
            data_size: 0,
            next_id: 1,
            generation: 0,
        }
    }
}

#[derive(Debug)]
pub(crate) struct CollectionState {
    extents: Vec<Extent>,
    meta: CollectionMetadata,
    extent_capacity: usize,
}

impl CollectionState {
    pub(crate) fn new(extent_capacity: usize) -> Self {
        Self {
            extents: Vec::new(),
            meta: CollectionMetadata::default(),
            extent_capacity: extent_capacity.max(1),
        }
    }

    pub(crate) fn metadata(&self) -> CollectionMetadata {
        self.meta
    }

    pub(crate) fn extents(&self) -> &[Extent] {
        &self.extents
    }

    pub(crate) fn extent_capacity(&self) -> usize {
        self.extent_capacity
    }

    /// Identity the next appended record must carry
    pub(crate) fn next_id(&self) -> DocumentId {
        DocumentId::new(self.meta.next_id)
    }

    /// Removes every record and returns metadata to the empty state.
    ///
    /// Identities are not reused after a reset.
    pub(crate) fn reset(&mut self) {
        self.extents.clear();
        self.meta.record_count = 0;
        self.meta.data_size = 0;
        self.meta.generation += 1;
    }

    /// Appends a record built with `next_id()`.
    pub(crate) fn append(&mut self, record: StoredRecord) {
        debug_assert_eq!(record.id(), self.next_id());

        let needs_extent = self
            .extents
            .last()
            .map_or(true, |extent| extent.len() >= self.extent_capacity);
        if needs_extent {
            self.extents.push(Extent::with_capacity(self.extent_capacity));
        }

        let size = record.size();
        let id = record.id();
        if let Some(extent) = self.extents.last_mut() {
            extent.records.push(record);
            extent.data_size += size;
        }

        self.meta.record_count += 1;
        self.meta.data_size += size;
        self.meta.next_id = id.as_u64() + 1;
    }

    /// Returns the record at ordinal `position` in insertion order.
    pub(crate) fn record_at(&self, position: u64) -> Option<&StoredRecord> {
        if position >= self.meta.record_count {
            return None;
        }

        let capacity = self.extent_capacity as u64;
        let extent = (position / capacity) as usize;
        let slot = (position % capacity) as usize;

        self.extents.get(extent)?.records.get(slot)
    }

    #[cfg(test)]
    pub(crate) fn metadata_mut(&mut self) -> &mut CollectionMetadata {
        &mut self.meta
    }

    #[cfg(test)]
    pub(crate) fn extent_records_mut(&mut self, extent: usize) -> &mut Vec<StoredRecord> {
        &mut self.extents[extent].records
    }

    #[cfg(test)]
    pub(crate) fn push_empty_extent(&mut self) {
        self.extents.push(Extent::default());
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::filled_state;
    use super::*;

    #[test]
    fn test_empty_state() {
        let state = CollectionState::new(4);
        let meta = state.metadata();
        assert_eq!(meta.record_count, 0);
        assert_eq!(meta.data_size, 0);
        assert_eq!(state.next_id(), DocumentId::new(1));
        assert!(state.extents().is_empty());
        assert!(state.record_at(0).is_none());
    }

    #[test]
    fn test_append_fills_extents_densely() {
        let state = filled_state(10, 4);

        let lens: Vec<usize> = state.extents().iter().map(Extent::len).collect();
        assert_eq!(lens, vec![4, 4, 2]);
        assert_eq!(state.metadata().record_count, 10);

        let total: u64 = state.extents().iter().map(Extent::data_size).sum();
        assert_eq!(total, state.metadata().data_size);
    }

    #[test]
    fn test_record_at_follows_insertion_order() {
        let state = filled_state(10, 4);
        for position in 0..10u64 {
            let record = state.record_at(position).unwrap();
            assert_eq!(record.id(), DocumentId::new(position + 1));
        }
        assert!(state.record_at(10).is_none());
    }

    #[test]
    fn test_reset_keeps_identities_moving_forward() {
        let mut state = filled_state(3, 4);
        let before = state.metadata();

        state.reset();
        let after = state.metadata();

        assert_eq!(after.record_count, 0);
        assert_eq!(after.data_size, 0);
        assert_eq!(after.generation, before.generation + 1);
        assert_eq!(state.next_id(), DocumentId::new(4));
        assert!(state.extents().is_empty());
    }

    #[test]
    fn test_zero_capacity_clamped() {
        assert_eq!(CollectionState::new(0).extent_capacity(), 1);
    }
}
