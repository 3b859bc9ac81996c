//! Per-stream segment cache.

use crate::error::{CoreError, CoreResult};
use crate::segment::header::{Segment, SegmentState};
use sfstore_storage::StorageBackend;
use std::collections::HashMap;

/// Segments already resolved by one record stream, keyed by index.
///
/// The buffer is owned by a single stream and holds the authoritative copy
/// of every segment header it has touched, including deferred tail updates
/// that have not been written yet.
#[derive(Debug, Default)]
pub struct SegmentBuffer {
    segments: HashMap<u32, Segment>,
}

impl SegmentBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns segment `index`, reading its header on first use.
    pub fn load(&mut self, backend: &dyn StorageBackend, index: u32) -> CoreResult<Segment> {
        if let Some(segment) = self.segments.get(&index) {
            return Ok(*segment);
        }
        let segment = Segment::read(backend, index)?;
        self.segments.insert(index, segment);
        Ok(segment)
    }

    /// Like [`SegmentBuffer::load`], but rejects segments that are not part
    /// of a chain.
    pub fn load_chained(&mut self, backend: &dyn StorageBackend, index: u32) -> CoreResult<Segment> {
        let segment = self.load(backend, index)?;
        if segment.state == SegmentState::Free {
            return Err(CoreError::corrupted(format!(
                "segment {index} is free but still linked"
            )));
        }
        Ok(segment)
    }

    /// Stores a segment, replacing any cached copy.
    pub fn insert(&mut self, segment: Segment) {
        self.segments.insert(segment.index, segment);
    }

    /// Forgets a segment.
    pub fn remove(&mut self, index: u32) -> Option<Segment> {
        self.segments.remove(&index)
    }

    /// Indexes of segments with unwritten header changes, ascending.
    #[must_use]
    pub fn dirty_indexes(&self) -> Vec<u32> {
        let mut dirty: Vec<u32> = self
            .segments
            .values()
            .filter(|segment| segment.dirty)
            .map(|segment| segment.index)
            .collect();
        dirty.sort_unstable();
        dirty
    }

    /// Number of cached segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
