//! Binary layout of a storage file.
//!
//! ```text
//! | directory: MAX_RECORDS_COUNT x slot | segment 0 | segment 1 | ... |
//!
//! slot:    | state (1) | name (256) | first_segment (4) | last_segment (4) | length (4) |
//! segment: | state (1) | next_index_or_data_length (4) | data (8192) |
//! ```
//!
//! There is no magic header; both regions are statically positioned.
//! Integers are little-endian.

/// Size of a slot's state byte.
pub const RECORD_STATE_SIZE: usize = 1;
/// Size of a slot's zero-padded UTF-8 name field.
pub const RECORD_NAME_SIZE: usize = 256;
/// Size of a slot's first segment index.
pub const RECORD_FIRST_SEGMENT_INDEX_SIZE: usize = 4;
/// Size of a slot's last segment index.
pub const RECORD_LAST_SEGMENT_INDEX_SIZE: usize = 4;
/// Size of a slot's record length.
pub const RECORD_LENGTH_SIZE: usize = 4;
/// Size of one directory slot (269 bytes).
pub const RECORD_SLOT_SIZE: usize = RECORD_STATE_SIZE
    + RECORD_NAME_SIZE
    + RECORD_FIRST_SEGMENT_INDEX_SIZE
    + RECORD_LAST_SEGMENT_INDEX_SIZE
    + RECORD_LENGTH_SIZE;

/// Number of slots in the directory.
pub const MAX_RECORDS_COUNT: usize = 1000;
/// Size of the directory region (269,000 bytes).
pub const DIRECTORY_SIZE: usize = RECORD_SLOT_SIZE * MAX_RECORDS_COUNT;

/// Offset of the name field within a slot.
pub const SLOT_NAME_OFFSET: usize = RECORD_STATE_SIZE;
/// Offset of the first segment index within a slot.
pub const SLOT_FIRST_SEGMENT_OFFSET: usize = SLOT_NAME_OFFSET + RECORD_NAME_SIZE;
/// Offset of the last segment index within a slot.
pub const SLOT_LAST_SEGMENT_OFFSET: usize =
    SLOT_FIRST_SEGMENT_OFFSET + RECORD_FIRST_SEGMENT_INDEX_SIZE;
/// Offset of the record length within a slot.
pub const SLOT_LENGTH_OFFSET: usize = SLOT_LAST_SEGMENT_OFFSET + RECORD_LAST_SEGMENT_INDEX_SIZE;

/// Size of a segment's state byte.
pub const SEGMENT_STATE_SIZE: usize = 1;
/// Size of a segment's next-index-or-data-length field.
pub const SEGMENT_NEXT_OR_LENGTH_SIZE: usize = 4;
/// Size of a segment's header.
pub const SEGMENT_HEADER_SIZE: usize = SEGMENT_STATE_SIZE + SEGMENT_NEXT_OR_LENGTH_SIZE;
/// Payload capacity of one segment.
pub const SEGMENT_DATA_SIZE: usize = 8 * 1024;
/// Size of one segment (8197 bytes).
pub const SEGMENT_SIZE: usize = SEGMENT_HEADER_SIZE + SEGMENT_DATA_SIZE;

/// Sentinel for "no segment".
pub const NULL_INDEX: u32 = u32::MAX;

/// Largest record length the 32-bit length field can hold.
pub const MAX_RECORD_LENGTH: u64 = u32::MAX as u64;

/// Returns the file offset of a directory slot.
#[must_use]
pub const fn slot_offset(slot: usize) -> u64 {
    (slot * RECORD_SLOT_SIZE) as u64
}

/// Returns the file offset of a segment.
#[must_use]
pub const fn segment_offset(index: u32) -> u64 {
    DIRECTORY_SIZE as u64 + index as u64 * SEGMENT_SIZE as u64
}

/// Returns the file offset of a segment's payload.
#[must_use]
pub const fn segment_data_offset(index: u32) -> u64 {
    segment_offset(index) + SEGMENT_HEADER_SIZE as u64
}

/// Returns the number of whole segments in a file of `file_len` bytes.
#[must_use]
pub const fn segment_count(file_len: u64) -> u32 {
    if file_len < DIRECTORY_SIZE as u64 {
        return 0;
    }
    ((file_len - DIRECTORY_SIZE as u64) / SEGMENT_SIZE as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_the_file_format() {
        assert_eq!(RECORD_SLOT_SIZE, 269);
        assert_eq!(DIRECTORY_SIZE, 269_000);
        assert_eq!(SEGMENT_SIZE, 8197);
        assert_eq!(SLOT_FIRST_SEGMENT_OFFSET, 257);
        assert_eq!(SLOT_LAST_SEGMENT_OFFSET, 261);
        assert_eq!(SLOT_LENGTH_OFFSET, 265);
    }

    #[test]
    fn segment_offsets() {
        assert_eq!(segment_offset(0), 269_000);
        assert_eq!(segment_offset(2), 269_000 + 2 * 8197);
        assert_eq!(segment_data_offset(1), 269_000 + 8197 + 5);
    }

    #[test]
    fn segment_count_ignores_partial_tail() {
        assert_eq!(segment_count(0), 0);
        assert_eq!(segment_count(DIRECTORY_SIZE as u64), 0);
        assert_eq!(segment_count(segment_offset(3)), 3);
        assert_eq!(segment_count(segment_offset(3) + 100), 3);
    }

    #[test]
    fn slot_offsets() {
        assert_eq!(slot_offset(0), 0);
        assert_eq!(slot_offset(999), 999 * 269);
    }
}
