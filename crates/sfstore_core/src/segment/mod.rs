//! Segment storage for records.
//!
//! A record's bytes live in a chain of fixed-size segments addressed by
//! `u32` index. Segment `i` sits at a fixed offset after the directory, so
//! there is no separate index table.
//!
//! ## Segment Format
//!
//! ```text
//! | state (1) | next_index_or_data_length (4) | data (8192) |
//! ```
//!
//! States:
//! - `0` = free, reusable by the allocator
//! - `1` = chained, the u32 field is the next index and all 8192 data bytes count
//! - `2` = last, the u32 field is the number of data bytes in use

mod allocator;
mod buffer;
mod header;

pub use allocator::SegmentAllocator;
pub use buffer::SegmentBuffer;
pub use header::{Segment, SegmentState};
pub(crate) use header::{encode_header, write_state};
