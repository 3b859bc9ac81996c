//! # SFStore Storage
//!
//! Backing byte stores for SFStore.
//!
//! This crate provides the lowest-level storage abstraction for SFStore.
//! Backends are **opaque random-access byte stores** - they do not interpret
//! the data they hold.
//!
//! ## Design Principles
//!
//! - Backends are simple byte stores (positional read, positional write, append, flush)
//! - No knowledge of the directory or segment layout
//! - Must be `Send + Sync` so a storage handle can be shared by its streams
//! - SFStore core owns all file format interpretation
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use sfstore_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"hello world").unwrap();
//! backend.write_at(offset + 6, b"there").unwrap();
//!
//! let mut buf = [0u8; 11];
//! backend.read_at(offset, &mut buf).unwrap();
//! assert_eq!(&buf, b"hello there");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
