//! Reference model of a record stream.
//!
//! [`RecordModel`] keeps a record as a plain `Vec<u8>` and applies
//! [`StreamOperation`]s with the semantics a [`RecordStream`] must match.
//! Property tests run the same operations against both and compare.

use crate::generators::StreamOperation;
use sfstore_core::RecordStream;
use std::io::SeekFrom;

/// Observable result of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Bytes written.
    Wrote(usize),
    /// Bytes returned by a read.
    Read(Vec<u8>),
    /// New cursor position after a seek.
    Seeked(u64),
    /// A seek target outside the record was rejected.
    SeekRejected,
    /// Truncated to this length.
    Truncated(u64),
}

/// In-memory reference record.
#[derive(Debug, Clone, Default)]
pub struct RecordModel {
    data: Vec<u8>,
    position: usize,
}

impl RecordModel {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Current cursor position.
    pub fn position(&self) -> u64 {
        self.position as u64
    }

    /// Applies an operation.
    pub fn apply(&mut self, op: &StreamOperation) -> Outcome {
        match op {
            StreamOperation::Write { data } => {
                let end = self.position + data.len();
                if end > self.data.len() {
                    self.data.resize(end, 0);
                }
                self.data[self.position..end].copy_from_slice(data);
                self.position = end;
                Outcome::Wrote(data.len())
            }
            StreamOperation::Read { len } => {
                let end = (self.position + len).min(self.data.len());
                let out = self.data[self.position..end].to_vec();
                self.position = end;
                Outcome::Read(out)
            }
            StreamOperation::Seek { percent } => {
                let target = seek_target(self.data.len() as u64, *percent);
                if target > self.data.len() as u64 {
                    return Outcome::SeekRejected;
                }
                self.position = target as usize;
                Outcome::Seeked(target)
            }
            StreamOperation::Truncate { percent } => {
                let len = truncate_target(self.data.len() as u64, *percent);
                self.data.truncate(len as usize);
                self.position = self.position.min(self.data.len());
                Outcome::Truncated(len)
            }
        }
    }
}

/// Applies an operation to a real stream.
///
/// Panics on unexpected errors; a rejected seek is reported as
/// [`Outcome::SeekRejected`].
pub fn apply_to_stream(stream: &mut RecordStream, op: &StreamOperation) -> Outcome {
    match op {
        StreamOperation::Write { data } => {
            Outcome::Wrote(stream.write(data).expect("write failed"))
        }
        StreamOperation::Read { len } => {
            let mut buf = vec![0u8; *len];
            let mut total = 0;
            while total < buf.len() {
                let count = stream.read(&mut buf[total..]).expect("read failed");
                if count == 0 {
                    break;
                }
                total += count;
            }
            buf.truncate(total);
            Outcome::Read(buf)
        }
        StreamOperation::Seek { percent } => {
            let target = seek_target(stream.len(), *percent);
            match stream.seek(SeekFrom::Start(target)) {
                Ok(position) => Outcome::Seeked(position),
                Err(_) => Outcome::SeekRejected,
            }
        }
        StreamOperation::Truncate { percent } => {
            let len = truncate_target(stream.len(), *percent);
            stream.set_len(len).expect("truncate failed");
            Outcome::Truncated(len)
        }
    }
}

fn seek_target(len: u64, percent: u8) -> u64 {
    // Past 100% the target lands beyond the end unless the record is empty.
    if percent > 100 {
        len + u64::from(percent - 100)
    } else {
        len * u64::from(percent) / 100
    }
}

fn truncate_target(len: u64, percent: u8) -> u64 {
    len * u64::from(percent.min(100)) / 100
}
