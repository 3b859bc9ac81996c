//! In-memory storage backend for testing.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::sync::Arc;

/// An in-memory storage backend.
///
/// This backend stores all data in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral storages that don't need persistence
///
/// The buffer lives behind an `Arc`, so [`InMemoryBackend::share`] and
/// [`InMemoryBackend::read_only`] hand out further handles onto the same
/// bytes. A test file system uses this to "reopen" a file.
///
/// # Example
///
/// ```rust
/// use sfstore_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// let offset = backend.append(b"test data").unwrap();
/// assert_eq!(offset, 0);
/// assert_eq!(backend.size().unwrap(), 9);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: Arc<RwLock<Vec<u8>>>,
    read_only: bool,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend with pre-existing data.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
            read_only: false,
        }
    }

    /// Returns a writable handle onto the same buffer.
    #[must_use]
    pub fn share(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            read_only: false,
        }
    }

    /// Returns a read-only handle onto the same buffer.
    #[must_use]
    pub fn read_only(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            read_only: true,
        }
    }

    /// Returns a copy of all data in the backend.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        Ok(())
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> StorageResult<()> {
        let data = self.data.read();
        let size = data.len() as u64;
        let end = offset.saturating_add(buf.len() as u64);

        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd {
                offset,
                len: buf.len(),
                size,
            });
        }

        buf.copy_from_slice(&data[offset as usize..end as usize]);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, new_data: &[u8]) -> StorageResult<()> {
        self.check_writable()?;
        let mut data = self.data.write();
        let size = data.len() as u64;

        if offset > size {
            return Err(StorageError::WriteGap { offset, size });
        }

        let start = offset as usize;
        let end = start + new_data.len();
        if end > data.len() {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(new_data);
        Ok(())
    }

    fn append(&mut self, new_data: &[u8]) -> StorageResult<u64> {
        self.check_writable()?;
        let mut data = self.data.write();
        let offset = data.len() as u64;
        data.extend_from_slice(new_data);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        // In-memory backend has no pending writes
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(backend.data().is_empty());
        assert!(!backend.is_read_only());
    }

    #[test]
    fn memory_append_returns_correct_offset() {
        let mut backend = InMemoryBackend::new();

        let offset1 = backend.append(b"hello").unwrap();
        assert_eq!(offset1, 0);

        let offset2 = backend.append(b" world").unwrap();
        assert_eq!(offset2, 5);

        assert_eq!(backend.size().unwrap(), 11);
    }

    #[test]
    fn memory_read_at_returns_correct_data() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"hello world").unwrap();

        let mut buf = [0u8; 5];
        backend.read_at(0, &mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        backend.read_at(6, &mut buf).unwrap();
        assert_eq!(&buf, b"world");
    }

    #[test]
    fn memory_read_at_past_end_fails() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"hello").unwrap();

        let mut buf = [0u8; 5];
        let result = backend.read_at(10, &mut buf);
        assert!(matches!(result, Err(StorageError::ReadPastEnd { .. })));

        let result = backend.read_at(3, &mut buf);
        assert!(matches!(result, Err(StorageError::ReadPastEnd { .. })));
    }

    #[test]
    fn memory_write_at_overwrites_and_extends() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"hello").unwrap();

        backend.write_at(3, b"p me").unwrap();
        assert_eq!(backend.data(), b"help me");

        backend.write_at(7, b"!").unwrap();
        assert_eq!(backend.data(), b"help me!");
    }

    #[test]
    fn memory_write_at_gap_fails() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"abc").unwrap();

        let result = backend.write_at(4, b"x");
        assert!(matches!(
            result,
            Err(StorageError::WriteGap { offset: 4, size: 3 })
        ));
    }

    #[test]
    fn memory_empty_read() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"hello").unwrap();

        let mut buf = [0u8; 0];
        backend.read_at(2, &mut buf).unwrap();
    }

    #[test]
    fn memory_with_data() {
        let backend = InMemoryBackend::with_data(b"preloaded".to_vec());
        assert_eq!(backend.size().unwrap(), 9);
        let mut buf = [0u8; 9];
        backend.read_at(0, &mut buf).unwrap();
        assert_eq!(&buf, b"preloaded");
    }

    #[test]
    fn memory_share_sees_writes() {
        let mut backend = InMemoryBackend::new();
        let shared = backend.share();
        backend.append(b"shared").unwrap();
        assert_eq!(shared.data(), b"shared");
    }

    #[test]
    fn memory_read_only_rejects_writes() {
        let mut backend = InMemoryBackend::with_data(b"fixed".to_vec());
        let mut reader = backend.read_only();

        assert!(reader.is_read_only());
        assert!(matches!(reader.append(b"x"), Err(StorageError::ReadOnly)));
        assert!(matches!(reader.write_at(0, b"x"), Err(StorageError::ReadOnly)));
        assert_eq!(reader.data(), b"fixed");

        backend.write_at(0, b"F").unwrap();
        assert_eq!(reader.data(), b"Fixed");
    }

    #[test]
    fn memory_flush_and_sync_succeed() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"data").unwrap();
        assert!(backend.flush().is_ok());
        assert!(backend.sync().is_ok());
    }

    proptest::proptest! {
        #[test]
        fn memory_writes_match_vec_model(
            writes in proptest::collection::vec((0usize..64, proptest::collection::vec(proptest::num::u8::ANY, 0..32)), 1..20)
        ) {
            let mut backend = InMemoryBackend::new();
            let mut model: Vec<u8> = Vec::new();

            for (offset, data) in writes {
                let offset = offset.min(model.len());
                backend.write_at(offset as u64, &data).unwrap();
                let end = offset + data.len();
                if end > model.len() {
                    model.resize(end, 0);
                }
                model[offset..end].copy_from_slice(&data);
            }

            proptest::prop_assert_eq!(backend.data(), model);
        }
    }
}
