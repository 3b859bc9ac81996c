//! Offline maintenance.
//!
//! Deleting and truncating records leaves free segments scattered through
//! the file. The [`Defragmentator`] rewrites a storage file so every record
//! occupies a contiguous run of segments and the file holds no free ones.
//!
//! File access goes through the [`FileSystem`] trait so the same code runs
//! against the real file system ([`OsFileSystem`]) and an in-memory one
//! ([`MemoryFileSystem`]).

mod defrag;
mod fs;

pub use defrag::{DefragmentConfig, DefragmentReport, Defragmentator};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
