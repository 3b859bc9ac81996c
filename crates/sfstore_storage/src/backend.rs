//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level random-access byte store for SFStore.
///
/// Backends are **opaque byte stores**. They provide positional reads and
/// writes plus appends and flushing. SFStore core owns all file format
/// interpretation - backends do not understand directory slots or segments.
///
/// # Invariants
///
/// - `read_at` fills the whole buffer with bytes previously written at that offset
/// - `write_at` may overwrite existing bytes or extend the store at its end,
///   but never leaves a gap
/// - `append` returns the offset where data was written
/// - A read-only backend rejects every mutation with [`StorageError::ReadOnly`]
///   and leaves its bytes untouched
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
///
/// [`StorageError::ReadOnly`]: crate::StorageError::ReadOnly
pub trait StorageBackend: Send + Sync {
    /// Reads exactly `buf.len()` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The read would extend beyond the current size
    /// - An I/O error occurs
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> StorageResult<()>;

    /// Writes `data` starting at `offset`.
    ///
    /// `offset` may be at most the current size; writing past the end grows
    /// the store.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The backend is read-only
    /// - `offset` is greater than the current size
    /// - An I/O error occurs
    fn write_at(&mut self, offset: u64, data: &[u8]) -> StorageResult<()>;

    /// Appends data to the end of the storage.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is read-only or an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Flushes all pending writes to the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size of the storage in bytes.
    ///
    /// This is the offset where the next `append` will write.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// This is a stronger guarantee than `flush`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Returns true if this backend rejects writes.
    fn is_read_only(&self) -> bool;
}
