//! Storage facade.

use crate::config::Config;
use crate::directory::{Directory, RecordDescription};
use crate::error::{CoreError, CoreResult};
use crate::layout::{segment_count, DIRECTORY_SIZE, SEGMENT_SIZE};
use crate::name::RecordName;
use crate::segment::{Segment, SegmentAllocator};
use crate::stats::{self, StorageStats, VerifyReport};
use crate::stream::RecordStream;
use crate::types::{Access, RecordAccess};
use parking_lot::Mutex;
use sfstore_storage::{FileBackend, InMemoryBackend, StorageBackend};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// State shared by a storage and every stream opened from it.
pub(crate) struct StorageCore {
    pub(crate) backend: Box<dyn StorageBackend>,
    pub(crate) allocator: SegmentAllocator,
    pub(crate) config: Config,
}

pub(crate) type SharedCore = Arc<Mutex<StorageCore>>;

/// A single-file store of named, variable-length records.
///
/// `Storage` owns the record directory and the segment allocator. Record
/// contents are accessed through [`RecordStream`]s opened from it.
///
/// # Opening a Storage
///
/// ```rust,ignore
/// use sfstore_core::{Config, Storage};
/// use std::io::Write;
///
/// let storage = Storage::open_file("data.sfs", Config::default())?;
/// storage.create_record("readme")?;
///
/// let mut stream = storage.open_record("readme")?;
/// stream.write_all(b"hello")?;
/// stream.close()?;
/// ```
///
/// # In-Memory Storages
///
/// ```rust,ignore
/// let storage = Storage::open_in_memory()?;
/// ```
pub struct Storage {
    core: SharedCore,
    access: Access,
}

impl Storage {
    /// Writes an empty directory region to an empty backend.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFormat`] if the backend already holds data.
    pub fn format(backend: &mut dyn StorageBackend) -> CoreResult<()> {
        let size = backend.size()?;
        if size != 0 {
            return Err(CoreError::invalid_format(format!(
                "cannot format a backend holding {size} bytes"
            )));
        }
        backend.write_at(0, &Directory::empty_region())?;
        backend.flush()?;
        Ok(())
    }

    /// Formats an empty backend and opens it.
    pub fn create(mut backend: Box<dyn StorageBackend>, config: Config) -> CoreResult<Self> {
        Self::format(backend.as_mut())?;
        Self::open(backend, config)
    }

    /// Opens a formatted backend.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFormat`] if the backend is shorter than
    /// the directory region.
    ///
    /// A partial block after the last whole segment is not counted as a
    /// segment; the next append overwrites it.
    pub fn open(backend: Box<dyn StorageBackend>, config: Config) -> CoreResult<Self> {
        let size = backend.size()?;
        if size < DIRECTORY_SIZE as u64 {
            return Err(CoreError::invalid_format(format!(
                "file is {size} bytes, smaller than the {DIRECTORY_SIZE}-byte directory"
            )));
        }
        let partial = (size - DIRECTORY_SIZE as u64) % SEGMENT_SIZE as u64;
        if partial != 0 {
            warn!(partial, "ignoring partial segment at end of file");
        }
        if config.access.can_modify() && backend.is_read_only() {
            return Err(CoreError::not_writable(
                "cannot open a read-only backend with modify access",
            ));
        }

        let access = config.access;
        debug!(size, segments = segment_count(size), %access, "opened storage");

        Ok(Self {
            core: Arc::new(Mutex::new(StorageCore {
                backend,
                allocator: SegmentAllocator::new(),
                config,
            })),
            access,
        })
    }

    /// Creates a fresh in-memory storage with modify access.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::create(Box::new(InMemoryBackend::new()), Config::default())
    }

    /// Creates a formatted storage file, including missing parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFormat`] if the file exists and is not empty.
    pub fn create_file(path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        let mut backend = FileBackend::open_with_create_dirs(path)?;
        Self::format(&mut backend)?;
        info!(path = %path.display(), "created storage file");
        Ok(())
    }

    /// Opens a storage file.
    ///
    /// With [`Access::Read`] the file is opened read-only and must exist.
    /// With [`Access::Modify`] a missing file is created when
    /// `config.create_if_missing` is set.
    pub fn open_file(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let path = path.as_ref();
        let exists = path.exists();

        let backend = match config.access {
            Access::Read => {
                if !exists {
                    return Err(CoreError::StorageNotFound {
                        path: path.to_path_buf(),
                    });
                }
                FileBackend::open_read_only(path)?
            }
            Access::Modify => {
                if !exists {
                    if !config.create_if_missing {
                        return Err(CoreError::StorageNotFound {
                            path: path.to_path_buf(),
                        });
                    }
                    Self::create_file(path)?;
                }
                FileBackend::open(path)?
            }
        };

        Self::open(Box::new(backend), config)
    }

    /// Access mode fixed at open.
    #[must_use]
    pub fn access(&self) -> Access {
        self.access
    }

    /// Creates an empty record.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotWritable`] in read mode
    /// - [`CoreError::InvalidName`] for a malformed name
    /// - [`CoreError::RecordAlreadyExists`] if the name is taken
    /// - [`CoreError::DirectoryFull`] when all slots are in use
    pub fn create_record(&self, name: &str) -> CoreResult<()> {
        self.ensure_modifiable("create record")?;
        let name = RecordName::parse(name)?;

        let mut guard = self.core.lock();
        let core = &mut *guard;

        let mut directory = Directory::load(core.backend.as_ref())?;
        if directory.find_by_name(&name).is_some() {
            return Err(CoreError::record_already_exists(name.as_str()));
        }

        let slot = directory.find_free()?;
        let first = core.allocator.allocate_empty(core.backend.as_mut())?;
        if let Err(err) = Directory::write_new_record(core.backend.as_mut(), slot, &name, first) {
            if let Err(cleanup) = core.allocator.free(core.backend.as_mut(), first) {
                warn!(segment = first, error = %cleanup, "failed to free unlinked segment");
            }
            return Err(err);
        }

        debug!(record = %name, slot, segment = first, "created record");
        Ok(())
    }

    /// Opens a stream with the storage's default access.
    pub fn open_record(&self, name: &str) -> CoreResult<RecordStream> {
        self.open_record_with(name, self.access.default_record_access())
    }

    /// Opens a stream with an explicit access mode.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotWritable`] when asking for
    /// [`RecordAccess::ReadWrite`] on a read-only storage.
    pub fn open_record_with(&self, name: &str, access: RecordAccess) -> CoreResult<RecordStream> {
        let name = RecordName::parse(name)?;
        if access.can_write() && !self.access.can_modify() {
            return Err(CoreError::not_writable(format!(
                "cannot open record '{name}' for writing in read mode"
            )));
        }

        let record = self.find(&name)?;
        RecordStream::open(Arc::clone(&self.core), record, access)
    }

    /// Returns true if a record with this name exists.
    pub fn record_exists(&self, name: &str) -> CoreResult<bool> {
        let name = RecordName::parse(name)?;
        let guard = self.core.lock();
        let directory = Directory::load(guard.backend.as_ref())?;
        Ok(directory.find_by_name(&name).is_some())
    }

    /// Renames a record in place; its slot position does not change.
    pub fn rename_record(&self, old_name: &str, new_name: &str) -> CoreResult<()> {
        self.ensure_modifiable("rename record")?;
        let old = RecordName::parse(old_name)?;
        let new = RecordName::parse(new_name)?;

        let mut guard = self.core.lock();
        let directory = Directory::load(guard.backend.as_ref())?;
        let record = directory
            .find_by_name(&old)
            .ok_or_else(|| CoreError::record_not_found(old.as_str()))?;
        if directory.find_by_name(&new).is_some() {
            return Err(CoreError::record_already_exists(new.as_str()));
        }

        Directory::write_name(guard.backend.as_mut(), record.slot, &new)?;
        debug!(from = %old, to = %new, slot = record.slot, "renamed record");
        Ok(())
    }

    /// Deletes a record and returns its segments to the free pool.
    pub fn delete_record(&self, name: &str) -> CoreResult<()> {
        self.ensure_modifiable("delete record")?;
        let name = RecordName::parse(name)?;

        let mut guard = self.core.lock();
        let core = &mut *guard;

        let directory = Directory::load(core.backend.as_ref())?;
        let record = directory
            .find_by_name(&name)
            .ok_or_else(|| CoreError::record_not_found(name.as_str()))?;

        Directory::free_slot(core.backend.as_mut(), record.slot)?;
        let freed = core
            .allocator
            .free_chain(core.backend.as_mut(), record.first_segment_index)?;

        debug!(record = %name, segments = freed.len(), "deleted record");
        Ok(())
    }

    /// Names of all records, in directory slot order.
    pub fn record_names(&self) -> CoreResult<Vec<String>> {
        let guard = self.core.lock();
        Ok(Directory::load(guard.backend.as_ref())?.list_used())
    }

    /// Directory entry of a record as stored on disk.
    ///
    /// Updates deferred by an open stream are not visible until it closes.
    pub fn describe_record(&self, name: &str) -> CoreResult<RecordDescription> {
        let name = RecordName::parse(name)?;
        self.find(&name)
    }

    /// Directory entries of all records, in slot order.
    pub fn records(&self) -> CoreResult<Vec<RecordDescription>> {
        let guard = self.core.lock();
        Ok(Directory::load(guard.backend.as_ref())?.records().collect())
    }

    /// Header of segment `index` as stored on disk.
    pub fn segment(&self, index: u32) -> CoreResult<Segment> {
        let guard = self.core.lock();
        let count = SegmentAllocator::segment_count(guard.backend.as_ref())?;
        if index >= count {
            return Err(CoreError::corrupted(format!(
                "segment {index} is past the last segment {count}"
            )));
        }
        Segment::read(guard.backend.as_ref(), index)
    }

    /// Segments of a record's chain, head first.
    pub fn record_segments(&self, name: &str) -> CoreResult<Vec<Segment>> {
        let name = RecordName::parse(name)?;
        let record = self.find(&name)?;
        let guard = self.core.lock();
        stats::walk_chain(guard.backend.as_ref(), record.first_segment_index)
    }

    /// Number of segments in the file, free ones included.
    pub fn segment_count(&self) -> CoreResult<u32> {
        let guard = self.core.lock();
        SegmentAllocator::segment_count(guard.backend.as_ref())
    }

    /// Space usage summary.
    pub fn stats(&self) -> CoreResult<StorageStats> {
        let guard = self.core.lock();
        stats::collect(guard.backend.as_ref())
    }

    /// Checks every record chain and the free pool for inconsistencies.
    pub fn verify(&self) -> CoreResult<VerifyReport> {
        let guard = self.core.lock();
        let report = stats::verify(guard.backend.as_ref())?;
        info!(
            records = report.records_checked,
            segments = report.segments_checked,
            issues = report.issues.len(),
            "verified storage"
        );
        Ok(report)
    }

    /// Flushes buffered backend writes.
    pub fn flush(&self) -> CoreResult<()> {
        self.core.lock().backend.flush()?;
        Ok(())
    }

    /// Syncs the backend to durable storage.
    pub fn sync(&self) -> CoreResult<()> {
        self.core.lock().backend.sync()?;
        Ok(())
    }

    fn find(&self, name: &RecordName) -> CoreResult<RecordDescription> {
        let guard = self.core.lock();
        Directory::load(guard.backend.as_ref())?
            .find_by_name(name)
            .ok_or_else(|| CoreError::record_not_found(name.as_str()))
    }

    fn ensure_modifiable(&self, operation: &str) -> CoreResult<()> {
        if !self.access.can_modify() {
            return Err(CoreError::not_writable(format!(
                "cannot {operation} in read mode"
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.core.lock();
        f.debug_struct("Storage")
            .field("access", &self.access)
            .field("size", &core.backend.size().ok())
            .field("allocator", &core.allocator)
            .finish_non_exhaustive()
    }
}
