//! Segment allocation.

use crate::error::{CoreError, CoreResult};
use crate::layout::{segment_count, segment_offset, SEGMENT_DATA_SIZE, SEGMENT_SIZE};
use crate::segment::header::{encode_header, read_state, write_state, Segment, SegmentState};
use sfstore_storage::StorageBackend;
use tracing::trace;

/// Hands out segments, lowest free index first, appending when none is free.
///
/// The allocator keeps a hint with the invariant that no free segment exists
/// below it. Scans start at the hint and only move forward; allocation
/// advances the hint past the allocated index, and releasing segments lowers
/// it to the lowest freed index.
#[derive(Debug, Default)]
pub struct SegmentAllocator {
    hint: u32,
}

impl SegmentAllocator {
    /// Creates an allocator with the hint at segment 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next free-segment scan starts from.
    #[must_use]
    pub fn hint(&self) -> u32 {
        self.hint
    }

    /// Number of segments in the backend.
    pub fn segment_count(backend: &dyn StorageBackend) -> CoreResult<u32> {
        Ok(segment_count(backend.size()?))
    }

    /// Scans forward from `from` for the first free segment.
    pub fn find_next_free(backend: &dyn StorageBackend, from: u32) -> CoreResult<Option<u32>> {
        let count = Self::segment_count(backend)?;
        for index in from..count {
            if read_state(backend, index)? == SegmentState::Free {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Appends a zero-filled segment in the given state.
    pub fn append_empty(backend: &mut dyn StorageBackend, state: SegmentState) -> CoreResult<u32> {
        Self::append(backend, state, 0, &[])
    }

    /// Appends a full segment block after the last whole segment.
    ///
    /// `data` is zero-padded up to the segment capacity.
    pub fn append(
        backend: &mut dyn StorageBackend,
        state: SegmentState,
        next_or_length: u32,
        data: &[u8],
    ) -> CoreResult<u32> {
        debug_assert!(data.len() <= SEGMENT_DATA_SIZE);

        let index = Self::segment_count(backend)?;
        let mut block = Vec::with_capacity(SEGMENT_SIZE);
        block.extend_from_slice(&encode_header(state, next_or_length));
        block.extend_from_slice(data);
        block.resize(SEGMENT_SIZE, 0);

        let offset = segment_offset(index);
        if backend.size()? == offset {
            backend.append(&block)?;
        } else {
            // A partial block after the last segment is overwritten.
            backend.write_at(offset, &block)?;
        }
        Ok(index)
    }

    /// Allocates a tail segment holding `data`.
    ///
    /// Reuses the lowest free segment at or after the hint, otherwise appends.
    pub fn allocate(&mut self, backend: &mut dyn StorageBackend, data: &[u8]) -> CoreResult<u32> {
        debug_assert!(data.len() <= SEGMENT_DATA_SIZE);

        let index = match Self::find_next_free(backend, self.hint)? {
            Some(index) => {
                let mut block = Vec::with_capacity(data.len() + 5);
                block.extend_from_slice(&encode_header(SegmentState::Last, data.len() as u32));
                block.extend_from_slice(data);
                backend.write_at(segment_offset(index), &block)?;
                trace!(index, len = data.len(), "reused free segment");
                index
            }
            None => {
                let index =
                    Self::append(backend, SegmentState::Last, data.len() as u32, data)?;
                trace!(index, len = data.len(), "appended segment");
                index
            }
        };

        self.hint = index + 1;
        Ok(index)
    }

    /// Allocates an empty tail segment, the head of a new record.
    ///
    /// Reuses the lowest free segment at or after the hint, otherwise appends
    /// a zero-filled block.
    pub fn allocate_empty(&mut self, backend: &mut dyn StorageBackend) -> CoreResult<u32> {
        let index = match Self::find_next_free(backend, self.hint)? {
            Some(index) => {
                backend.write_at(segment_offset(index), &encode_header(SegmentState::Last, 0))?;
                trace!(index, "reused free segment for an empty record");
                index
            }
            None => {
                let index = Self::append_empty(backend, SegmentState::Last)?;
                trace!(index, "appended empty segment");
                index
            }
        };

        self.hint = index + 1;
        Ok(index)
    }

    /// Marks one segment free and lowers the hint.
    ///
    /// Used to give back a segment that was allocated but never linked.
    pub fn free(&mut self, backend: &mut dyn StorageBackend, index: u32) -> CoreResult<()> {
        write_state(backend, index, SegmentState::Free)?;
        self.release(index);
        Ok(())
    }

    /// Lowers the hint after `index` became free.
    pub fn release(&mut self, index: u32) {
        self.hint = self.hint.min(index);
    }

    /// Frees every segment of the chain starting at `first`.
    ///
    /// Returns the freed indexes in chain order.
    pub fn free_chain(
        &mut self,
        backend: &mut dyn StorageBackend,
        first: u32,
    ) -> CoreResult<Vec<u32>> {
        let count = Self::segment_count(backend)?;
        let mut freed = Vec::new();
        let mut next = Some(first);

        while let Some(index) = next {
            if index >= count || freed.len() > count as usize {
                return Err(CoreError::corrupted(format!(
                    "chain starting at segment {first} is broken at {index}"
                )));
            }
            let segment = Segment::read(backend, index)?;
            if segment.state == SegmentState::Free {
                return Err(CoreError::corrupted(format!(
                    "chain starting at segment {first} reaches free segment {index}"
                )));
            }
            write_state(backend, index, SegmentState::Free)?;
            freed.push(index);
            next = segment.next();
        }

        if let Some(&lowest) = freed.iter().min() {
            self.release(lowest);
        }
        Ok(freed)
    }
}
