//! Storage statistics and consistency checks.
//!
//! Both work from the bytes on disk. Updates deferred by open streams are
//! not visible until those streams close.

use crate::directory::Directory;
use crate::error::{CoreError, CoreResult};
use crate::layout::MAX_RECORDS_COUNT;
use crate::segment::{Segment, SegmentAllocator, SegmentState};
use sfstore_storage::StorageBackend;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Space usage of a storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageStats {
    /// File size in bytes.
    pub file_size: u64,
    /// Segments in the file, free ones included.
    pub segment_count: u32,
    /// Segments available for reuse.
    pub free_segment_count: u32,
    /// Used directory slots.
    pub record_count: usize,
    /// Directory slots in total.
    pub record_capacity: usize,
    /// Sum of all record lengths.
    pub live_bytes: u64,
}

impl StorageStats {
    /// Fraction of the segment area that is free, between 0 and 1.
    #[must_use]
    pub fn free_ratio(&self) -> f64 {
        if self.segment_count == 0 {
            0.0
        } else {
            f64::from(self.free_segment_count) / f64::from(self.segment_count)
        }
    }
}

/// One inconsistency found by [`crate::Storage::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyIssue {
    /// A chain points outside the file or at a free segment.
    BrokenLink {
        /// Record owning the chain.
        record: String,
        /// Segment holding the bad link (the head itself for a bad head).
        segment: u32,
        /// Target of the link.
        target: u32,
    },
    /// A chain revisits one of its own segments.
    Cycle {
        /// Record owning the chain.
        record: String,
        /// First revisited segment.
        segment: u32,
    },
    /// The chain's data does not add up to the directory length.
    LengthMismatch {
        /// Record owning the chain.
        record: String,
        /// Length stored in the directory.
        directory: u64,
        /// Bytes counted along the chain.
        chain: u64,
    },
    /// The directory's last index is not the chain's tail.
    TailMismatch {
        /// Record owning the chain.
        record: String,
        /// Last index stored in the directory.
        directory: u32,
        /// Tail reached by walking the chain.
        chain: u32,
    },
    /// A segment belongs to two chains.
    SharedSegment {
        /// The shared segment.
        segment: u32,
        /// Record that claimed it first.
        first: String,
        /// Record that claimed it again.
        second: String,
    },
    /// A used segment that no record reaches.
    OrphanSegment {
        /// The unreachable segment.
        segment: u32,
    },
}

impl fmt::Display for VerifyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BrokenLink {
                record,
                segment,
                target,
            } => write!(f, "record '{record}': segment {segment} links to invalid segment {target}"),
            Self::Cycle { record, segment } => {
                write!(f, "record '{record}': chain loops back to segment {segment}")
            }
            Self::LengthMismatch {
                record,
                directory,
                chain,
            } => write!(f, "record '{record}': directory length {directory}, chain holds {chain}"),
            Self::TailMismatch {
                record,
                directory,
                chain,
            } => write!(f, "record '{record}': directory tail {directory}, chain ends at {chain}"),
            Self::SharedSegment {
                segment,
                first,
                second,
            } => write!(f, "segment {segment} is shared by '{first}' and '{second}'"),
            Self::OrphanSegment { segment } => {
                write!(f, "segment {segment} is in use but not reachable from any record")
            }
        }
    }
}

/// Result of a consistency check.
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    /// Records whose chains were walked.
    pub records_checked: usize,
    /// Segment headers inspected.
    pub segments_checked: u32,
    /// Problems found, in discovery order.
    pub issues: Vec<VerifyIssue>,
}

impl VerifyReport {
    /// Returns true if no issue was found.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Reads the segments of a chain, head first.
///
/// # Errors
///
/// Returns [`CoreError::Corrupted`] on a link out of range, into a free
/// segment, or back into the chain.
pub(crate) fn walk_chain(backend: &dyn StorageBackend, first: u32) -> CoreResult<Vec<Segment>> {
    let count = SegmentAllocator::segment_count(backend)?;
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut next = Some(first);

    while let Some(index) = next {
        if index >= count {
            return Err(CoreError::corrupted(format!(
                "chain starting at {first} links to segment {index}, past the end of the file"
            )));
        }
        if !seen.insert(index) {
            return Err(CoreError::corrupted(format!(
                "chain starting at {first} loops back to segment {index}"
            )));
        }
        let segment = Segment::read(backend, index)?;
        if segment.state == SegmentState::Free {
            return Err(CoreError::corrupted(format!(
                "chain starting at {first} reaches free segment {index}"
            )));
        }
        next = segment.next();
        chain.push(segment);
    }
    Ok(chain)
}

pub(crate) fn collect(backend: &dyn StorageBackend) -> CoreResult<StorageStats> {
    let file_size = backend.size()?;
    let segment_count = SegmentAllocator::segment_count(backend)?;

    let mut free_segment_count = 0;
    for index in 0..segment_count {
        if Segment::read(backend, index)?.state == SegmentState::Free {
            free_segment_count += 1;
        }
    }

    let directory = Directory::load(backend)?;
    let (record_count, live_bytes) = directory
        .records()
        .fold((0, 0u64), |(count, bytes), record| {
            (count + 1, bytes + u64::from(record.length))
        });

    Ok(StorageStats {
        file_size,
        segment_count,
        free_segment_count,
        record_count,
        record_capacity: MAX_RECORDS_COUNT,
        live_bytes,
    })
}

pub(crate) fn verify(backend: &dyn StorageBackend) -> CoreResult<VerifyReport> {
    let count = SegmentAllocator::segment_count(backend)?;
    let directory = Directory::load(backend)?;

    let mut report = VerifyReport::default();
    let mut owners: HashMap<u32, String> = HashMap::new();

    for record in directory.records() {
        report.records_checked += 1;

        let mut seen = HashSet::new();
        let mut chain_length = 0u64;
        let mut tail = None;
        let mut previous = record.first_segment_index;
        let mut next = Some(record.first_segment_index);

        while let Some(index) = next {
            if index >= count {
                report.issues.push(VerifyIssue::BrokenLink {
                    record: record.name.clone(),
                    segment: previous,
                    target: index,
                });
                break;
            }
            if !seen.insert(index) {
                report.issues.push(VerifyIssue::Cycle {
                    record: record.name.clone(),
                    segment: index,
                });
                break;
            }

            let segment = Segment::read(backend, index)?;
            report.segments_checked += 1;
            if segment.state == SegmentState::Free {
                report.issues.push(VerifyIssue::BrokenLink {
                    record: record.name.clone(),
                    segment: previous,
                    target: index,
                });
                break;
            }
            if let Some(owner) = owners.insert(index, record.name.clone()) {
                report.issues.push(VerifyIssue::SharedSegment {
                    segment: index,
                    first: owner,
                    second: record.name.clone(),
                });
            }

            chain_length += u64::from(segment.data_length);
            if segment.is_last() {
                tail = Some(index);
            }
            previous = index;
            next = segment.next();
        }

        // Length and tail are only meaningful for a chain that ended cleanly.
        let Some(tail) = tail else {
            continue;
        };
        if tail != record.last_segment_index {
            report.issues.push(VerifyIssue::TailMismatch {
                record: record.name.clone(),
                directory: record.last_segment_index,
                chain: tail,
            });
        }
        if chain_length != u64::from(record.length) {
            report.issues.push(VerifyIssue::LengthMismatch {
                record: record.name.clone(),
                directory: u64::from(record.length),
                chain: chain_length,
            });
        }
    }

    for index in 0..count {
        if owners.contains_key(&index) {
            continue;
        }
        report.segments_checked += 1;
        if Segment::read(backend, index)?.state != SegmentState::Free {
            report.issues.push(VerifyIssue::OrphanSegment { segment: index });
        }
    }

    Ok(report)
}
