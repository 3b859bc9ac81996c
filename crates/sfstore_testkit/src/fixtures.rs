//! Test fixtures and storage helpers.
//!
//! Provides convenience functions for setting up test storages
//! and common test scenarios.

use sfstore_core::{Config, Storage};
use sfstore_storage::InMemoryBackend;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A test storage with automatic cleanup.
pub struct TestStorage {
    /// The storage instance.
    pub storage: Storage,
    /// Shared handle onto the in-memory bytes, if memory-backed.
    backend: Option<InMemoryBackend>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
    path: Option<PathBuf>,
}

impl TestStorage {
    /// Creates a new in-memory test storage.
    pub fn memory() -> Self {
        let backend = InMemoryBackend::new();
        let storage = Storage::create(Box::new(backend.share()), Config::default())
            .expect("Failed to create in-memory storage");
        Self {
            storage,
            backend: Some(backend),
            _temp_dir: None,
            path: None,
        }
    }

    /// Creates a new file-based test storage.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("test.sfs");
        let storage =
            Storage::open_file(&path, Config::default()).expect("Failed to open file storage");

        Self {
            storage,
            backend: None,
            _temp_dir: Some(temp_dir),
            path: Some(path),
        }
    }

    /// Returns the storage path if file-based, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns a copy of the raw storage bytes.
    pub fn bytes(&self) -> Vec<u8> {
        match (&self.backend, &self.path) {
            (Some(backend), _) => backend.data(),
            (None, Some(path)) => std::fs::read(path).expect("Failed to read storage file"),
            (None, None) => unreachable!("test storage has neither backend nor path"),
        }
    }

    /// Reopens the same bytes with another configuration.
    ///
    /// The current handle stays usable; writes through either handle are
    /// visible to the other once their streams close.
    pub fn reopen(&self, config: Config) -> Storage {
        match (&self.backend, &self.path) {
            (Some(backend), _) => {
                let handle = if config.access.can_modify() {
                    backend.share()
                } else {
                    backend.read_only()
                };
                Storage::open(Box::new(handle), config).expect("Failed to reopen storage")
            }
            (None, Some(path)) => {
                Storage::open_file(path, config).expect("Failed to reopen storage file")
            }
            (None, None) => unreachable!("test storage has neither backend nor path"),
        }
    }
}

impl std::ops::Deref for TestStorage {
    type Target = Storage;

    fn deref(&self) -> &Self::Target {
        &self.storage
    }
}

/// Runs a test with a temporary in-memory storage.
///
/// # Example
///
/// ```rust,ignore
/// use sfstore_testkit::with_temp_storage;
///
/// #[test]
/// fn my_test() {
///     with_temp_storage(|storage| {
///         storage.create_record("test").unwrap();
///     });
/// }
/// ```
pub fn with_temp_storage<F, R>(f: F) -> R
where
    F: FnOnce(&Storage) -> R,
{
    let test_storage = TestStorage::memory();
    f(&test_storage.storage)
}

/// Runs a test with a temporary file-based storage.
pub fn with_file_storage<F, R>(f: F) -> R
where
    F: FnOnce(&Storage, &Path) -> R,
{
    let test_storage = TestStorage::file();
    let path = test_storage
        .path()
        .expect("File storage should have a path")
        .to_path_buf();
    f(&test_storage.storage, &path)
}

/// Creates a record holding `content`.
pub fn write_record(storage: &Storage, name: &str, content: &[u8]) {
    storage.create_record(name).expect("Failed to create record");
    let mut stream = storage.open_record(name).expect("Failed to open record");
    stream.write_all(content).expect("Failed to write record");
    stream.close().expect("Failed to close record");
}

/// Reads a whole record.
pub fn read_record(storage: &Storage, name: &str) -> Vec<u8> {
    let mut stream = storage.open_record(name).expect("Failed to open record");
    let mut content = Vec::new();
    stream
        .read_to_end(&mut content)
        .expect("Failed to read record");
    content
}

/// Indexes of a record's segment chain, head first.
pub fn chain_indexes(storage: &Storage, name: &str) -> Vec<u32> {
    storage
        .record_segments(name)
        .expect("Failed to walk chain")
        .iter()
        .map(|segment| segment.index)
        .collect()
}

/// Deterministic test payload of `len` bytes.
pub fn payload(seed: u8, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| seed.wrapping_mul(31).wrapping_add((i % 251) as u8))
        .collect()
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a storage with `count` records named `record_<i>`, each
    /// `len` bytes long.
    pub fn populated_storage(count: usize, len: usize) -> TestStorage {
        let test_storage = TestStorage::memory();
        for i in 0..count {
            write_record(&test_storage, &format!("record_{i}"), &payload(i as u8, len));
        }
        test_storage
    }

    /// Creates a storage with free segments between live records.
    ///
    /// Records `keep_<i>` survive; records `drop_<i>` are deleted.
    pub fn fragmented_storage(pairs: usize, len: usize) -> TestStorage {
        let test_storage = TestStorage::memory();
        for i in 0..pairs {
            write_record(&test_storage, &format!("keep_{i}"), &payload(i as u8, len));
            write_record(&test_storage, &format!("drop_{i}"), &payload(!(i as u8), len));
        }
        for i in 0..pairs {
            test_storage
                .delete_record(&format!("drop_{i}"))
                .expect("Failed to delete record");
        }
        test_storage
    }
}
