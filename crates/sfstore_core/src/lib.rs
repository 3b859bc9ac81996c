//! # SFStore Core
//!
//! Single-file record store.
//!
//! A storage file holds up to [`layout::MAX_RECORDS_COUNT`] named records of
//! variable length. This crate provides:
//! - The record directory at the start of the file
//! - Segment chains and a lowest-hole-first segment allocator
//! - Seekable, truncatable record streams
//! - Statistics, consistency checks and defragmentation
//!
//! ```rust,ignore
//! use sfstore_core::Storage;
//! use std::io::{Read, Write};
//!
//! let storage = Storage::open_in_memory()?;
//! storage.create_record("greeting")?;
//!
//! let mut stream = storage.open_record("greeting")?;
//! stream.write_all(b"hello")?;
//! stream.close()?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod directory;
mod error;
pub mod layout;
pub mod maintenance;
mod name;
pub mod segment;
mod stats;
mod storage;
mod stream;
#[cfg(test)]
mod testing;
mod types;

pub use config::Config;
pub use directory::RecordDescription;
pub use error::{CoreError, CoreResult};
pub use maintenance::{
    DefragmentConfig, DefragmentReport, Defragmentator, FileSystem, MemoryFileSystem,
    OsFileSystem,
};
pub use name::RecordName;
pub use segment::{Segment, SegmentState};
pub use stats::{StorageStats, VerifyIssue, VerifyReport};
pub use storage::Storage;
pub use stream::RecordStream;
pub use types::{Access, RecordAccess};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
