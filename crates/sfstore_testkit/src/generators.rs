//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use proptest::prelude::*;
use sfstore_core::layout::{RECORD_NAME_SIZE, SEGMENT_DATA_SIZE};

/// Strategy for generating valid record names.
pub fn record_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9_.][A-Za-z0-9_. ]{0,31}").expect("Invalid regex")
}

/// Strategy for generating valid names up to the full field width.
pub fn long_record_name_strategy() -> impl Strategy<Value = String> {
    (1..=RECORD_NAME_SIZE).prop_map(|len| "n".repeat(len))
}

/// Strategy for generating names that must be rejected.
pub fn invalid_record_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("n".repeat(RECORD_NAME_SIZE + 1)),
        (
            record_name_strategy(),
            prop::sample::select(vec!['/', '\\', ':', '*', '?', '"', '<', '>', '|', '-', 'é', '\0']),
        )
            .prop_map(|(mut name, c)| {
                name.push(c);
                name
            }),
    ]
}

/// Strategy for generating record payloads (arbitrary bytes).
pub fn payload_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Strategy for lengths close to a multiple of the segment capacity.
///
/// Off-by-one errors in chain handling show up at these lengths.
pub fn boundary_length_strategy(max_segments: usize) -> impl Strategy<Value = usize> {
    (0..=max_segments, -2i64..=2).prop_map(|(segments, delta)| {
        (segments as i64 * SEGMENT_DATA_SIZE as i64 + delta).max(0) as usize
    })
}

/// A single operation on an open record stream.
#[derive(Debug, Clone)]
pub enum StreamOperation {
    /// Write bytes at the cursor
    Write {
        /// Bytes to write
        data: Vec<u8>,
    },
    /// Read up to `len` bytes from the cursor
    Read {
        /// Maximum bytes to read
        len: usize,
    },
    /// Seek to a fraction of the current length
    Seek {
        /// Target as a percentage of the length, may exceed 100
        percent: u8,
    },
    /// Truncate to a fraction of the current length
    Truncate {
        /// New length as a percentage of the current length
        percent: u8,
    },
}

/// Strategy for generating stream operations.
pub fn stream_operation_strategy() -> impl Strategy<Value = StreamOperation> {
    prop_oneof![
        4 => prop_oneof![
            payload_strategy(64),
            payload_strategy(3 * SEGMENT_DATA_SIZE),
        ]
        .prop_map(|data| StreamOperation::Write { data }),
        2 => (0..2 * SEGMENT_DATA_SIZE).prop_map(|len| StreamOperation::Read { len }),
        2 => (0u8..=110).prop_map(|percent| StreamOperation::Seek { percent }),
        1 => (0u8..=100).prop_map(|percent| StreamOperation::Truncate { percent }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StreamOperation>> {
    prop::collection::vec(stream_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfstore_core::RecordName;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn record_names_parse(name in record_name_strategy()) {
            prop_assert!(RecordName::parse(&name).is_ok());
        }

        #[test]
        fn long_names_parse(name in long_record_name_strategy()) {
            prop_assert!(RecordName::parse(&name).is_ok());
        }

        #[test]
        fn invalid_names_are_rejected(name in invalid_record_name_strategy()) {
            prop_assert!(RecordName::parse(&name).is_err());
        }

        #[test]
        fn boundary_lengths_are_near_edges(len in boundary_length_strategy(4)) {
            let rem = len % SEGMENT_DATA_SIZE;
            prop_assert!(rem <= 2 || rem >= SEGMENT_DATA_SIZE - 2);
        }
    }
}
