//! Test backends.

use sfstore_storage::{InMemoryBackend, StorageBackend, StorageError, StorageResult};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory backend whose appends start failing once a shared budget runs out.
///
/// Positional writes keep working, which models a disk that fills up while
/// existing blocks stay writable.
#[derive(Debug)]
pub(crate) struct FullDiskBackend {
    inner: InMemoryBackend,
    appends_left: Arc<AtomicUsize>,
}

impl FullDiskBackend {
    /// Returns the backend and the handle controlling its append budget.
    pub(crate) fn new(inner: InMemoryBackend) -> (Self, Arc<AtomicUsize>) {
        let appends_left = Arc::new(AtomicUsize::new(usize::MAX));
        let backend = Self {
            inner,
            appends_left: Arc::clone(&appends_left),
        };
        (backend, appends_left)
    }
}

impl StorageBackend for FullDiskBackend {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> StorageResult<()> {
        self.inner.read_at(offset, buf)
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> StorageResult<()> {
        self.inner.write_at(offset, data)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let granted = self
            .appends_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if !granted {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.inner.append(data)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.inner.flush()
    }

    fn size(&self) -> StorageResult<u64> {
        self.inner.size()
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.inner.sync()
    }

    fn is_read_only(&self) -> bool {
        self.inner.is_read_only()
    }
}
