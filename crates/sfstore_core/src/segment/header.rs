//! Segment header types.

use crate::error::{CoreError, CoreResult};
use crate::layout::{
    segment_data_offset, segment_offset, SEGMENT_DATA_SIZE, SEGMENT_HEADER_SIZE, NULL_INDEX,
};
use sfstore_storage::StorageBackend;

/// State byte of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentState {
    /// Unused and available to the allocator.
    Free,
    /// Interior chain link; all data bytes are significant.
    Chained,
    /// Chain tail; the header holds the used data length.
    Last,
}

impl SegmentState {
    /// Decodes a state byte.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Corrupted`] for unknown values.
    pub fn from_byte(b: u8) -> CoreResult<Self> {
        match b {
            0 => Ok(Self::Free),
            1 => Ok(Self::Chained),
            2 => Ok(Self::Last),
            other => Err(CoreError::corrupted(format!(
                "unknown segment state {other:#04x}"
            ))),
        }
    }

    /// Returns the raw byte value.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Free => 0,
            Self::Chained => 1,
            Self::Last => 2,
        }
    }
}

/// Decoded segment header plus its place in the file.
///
/// Segments are plain values; the per-stream [`super::SegmentBuffer`]
/// keeps the authoritative copy while a stream is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Segment index.
    pub index: u32,
    /// Segment state.
    pub state: SegmentState,
    /// Bytes of data in use: 8192 when chained, the remainder when last.
    pub data_length: u32,
    /// Next segment index, [`NULL_INDEX`] unless chained.
    pub next_index: u32,
    /// Header differs from what is on disk.
    pub dirty: bool,
}

impl Segment {
    /// Builds a tail segment holding `data_length` bytes.
    #[must_use]
    pub const fn last(index: u32, data_length: u32) -> Self {
        Self {
            index,
            state: SegmentState::Last,
            data_length,
            next_index: NULL_INDEX,
            dirty: false,
        }
    }

    /// Decodes a 5-byte header.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Corrupted`] if the state byte is unknown or a
    /// last segment claims more than a segment's capacity.
    pub fn decode(index: u32, header: &[u8; SEGMENT_HEADER_SIZE]) -> CoreResult<Self> {
        let state = SegmentState::from_byte(header[0])?;
        let value = u32::from_le_bytes([header[1], header[2], header[3], header[4]]);

        let (data_length, next_index) = match state {
            SegmentState::Chained => (SEGMENT_DATA_SIZE as u32, value),
            SegmentState::Last => {
                if value as usize > SEGMENT_DATA_SIZE {
                    return Err(CoreError::corrupted(format!(
                        "segment {index} claims {value} data bytes"
                    )));
                }
                (value, NULL_INDEX)
            }
            SegmentState::Free => (0, NULL_INDEX),
        };

        Ok(Self {
            index,
            state,
            data_length,
            next_index,
            dirty: false,
        })
    }

    /// Encodes the header as it should appear on disk.
    #[must_use]
    pub fn encode_header(&self) -> [u8; SEGMENT_HEADER_SIZE] {
        let value = match self.state {
            SegmentState::Chained => self.next_index,
            SegmentState::Last => self.data_length,
            SegmentState::Free => 0,
        };
        encode_header(self.state, value)
    }

    /// Reads segment `index` from the backend.
    pub fn read(backend: &dyn StorageBackend, index: u32) -> CoreResult<Self> {
        let mut header = [0u8; SEGMENT_HEADER_SIZE];
        backend.read_at(segment_offset(index), &mut header)?;
        Self::decode(index, &header)
    }

    /// Writes the header and clears the dirty flag.
    pub fn write_header(&mut self, backend: &mut dyn StorageBackend) -> CoreResult<()> {
        backend.write_at(segment_offset(self.index), &self.encode_header())?;
        self.dirty = false;
        Ok(())
    }

    /// Turns this tail into an interior link pointing at `next`.
    pub fn chain_to(&mut self, next: u32) {
        self.state = SegmentState::Chained;
        self.next_index = next;
        self.data_length = SEGMENT_DATA_SIZE as u32;
    }

    /// Turns this segment into a tail holding `data_length` bytes.
    pub fn make_last(&mut self, data_length: u32) {
        self.state = SegmentState::Last;
        self.next_index = NULL_INDEX;
        self.data_length = data_length;
    }

    /// Returns true for a chain tail.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.state == SegmentState::Last
    }

    /// Returns the next index when chained.
    #[must_use]
    pub fn next(&self) -> Option<u32> {
        match self.state {
            SegmentState::Chained => Some(self.next_index),
            _ => None,
        }
    }

    /// File offset of the segment.
    #[must_use]
    pub fn start_offset(&self) -> u64 {
        segment_offset(self.index)
    }

    /// File offset of the segment's payload.
    #[must_use]
    pub fn data_offset(&self) -> u64 {
        segment_data_offset(self.index)
    }
}

/// Encodes a header from its parts.
#[must_use]
pub(crate) fn encode_header(state: SegmentState, value: u32) -> [u8; SEGMENT_HEADER_SIZE] {
    let mut header = [0u8; SEGMENT_HEADER_SIZE];
    header[0] = state.as_byte();
    header[1..].copy_from_slice(&value.to_le_bytes());
    header
}

/// Reads only the state byte of segment `index`.
pub(crate) fn read_state(backend: &dyn StorageBackend, index: u32) -> CoreResult<SegmentState> {
    let mut state = [0u8; 1];
    backend.read_at(segment_offset(index), &mut state)?;
    SegmentState::from_byte(state[0])
}

/// Overwrites only the state byte of segment `index`.
pub(crate) fn write_state(
    backend: &mut dyn StorageBackend,
    index: u32,
    state: SegmentState,
) -> CoreResult<()> {
    backend.write_at(segment_offset(index), &[state.as_byte()])?;
    Ok(())
}
