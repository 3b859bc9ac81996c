//! Storage defragmentation.

use crate::error::CoreResult;
use crate::maintenance::fs::{FileSystem, OsFileSystem};
use crate::storage::Storage;
use crate::types::{Access, RecordAccess};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default transfer buffer size (10 MiB).
pub const DEFAULT_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// Default suffix of the temporary file.
pub const DEFAULT_SUFFIX: &str = ".defrag";

/// Configuration for defragmentation.
#[derive(Debug, Clone)]
pub struct DefragmentConfig {
    /// Bytes moved per read/write pair while copying a record.
    pub buffer_size: usize,
    /// Appended to the source path to name the temporary file.
    pub suffix: String,
}

impl Default for DefragmentConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

impl DefragmentConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transfer buffer size. Zero is treated as one byte.
    #[must_use]
    pub const fn buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes;
        self
    }

    /// Sets the temporary file suffix.
    #[must_use]
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }
}

/// Result of a defragmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DefragmentReport {
    /// Records copied.
    pub records: usize,
    /// Record bytes copied.
    pub bytes_copied: u64,
    /// File size before.
    pub size_before: u64,
    /// File size after.
    pub size_after: u64,
}

impl DefragmentReport {
    /// Bytes reclaimed (0 if the file did not shrink).
    #[must_use]
    pub fn bytes_saved(&self) -> u64 {
        self.size_before.saturating_sub(self.size_after)
    }
}

/// Rewrites a storage file without free segments.
///
/// Records are copied in directory order into `<path><suffix>`, which then
/// replaces the source. Each copied record ends up in consecutive segments.
///
/// ## Example
///
/// ```ignore
/// use sfstore_core::Defragmentator;
///
/// let report = Defragmentator::os().defragment("data.sfs".as_ref())?;
/// println!("saved {} bytes", report.bytes_saved());
/// ```
#[derive(Debug)]
pub struct Defragmentator<F: FileSystem> {
    fs: F,
    config: DefragmentConfig,
}

impl Defragmentator<OsFileSystem> {
    /// Defragmentator over the real file system with default settings.
    #[must_use]
    pub fn os() -> Self {
        Self::new(OsFileSystem)
    }
}

impl<F: FileSystem> Defragmentator<F> {
    /// Creates a defragmentator with default settings.
    pub fn new(fs: F) -> Self {
        Self::with_config(fs, DefragmentConfig::default())
    }

    /// Creates a defragmentator with custom settings.
    pub fn with_config(fs: F, config: DefragmentConfig) -> Self {
        Self { fs, config }
    }

    /// Returns the file system.
    pub fn file_system(&self) -> &F {
        &self.fs
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DefragmentConfig {
        &self.config
    }

    /// Path of the temporary file used for `path`.
    #[must_use]
    pub fn temp_path(&self, path: &Path) -> PathBuf {
        let mut name = OsString::from(path.as_os_str());
        name.push(&self.config.suffix);
        PathBuf::from(name)
    }

    /// Defragments the storage file at `path`.
    ///
    /// On failure the source file is left untouched and the temporary file
    /// is removed.
    pub fn defragment(&self, path: &Path) -> CoreResult<DefragmentReport> {
        let temp = self.temp_path(path);
        if self.fs.exists(&temp) {
            warn!(path = %temp.display(), "removing stale defragmentation file");
            self.fs.delete_file(&temp)?;
        }

        let size_before = self.fs.file_size(path)?;
        self.fs.create_storage_file(&temp)?;

        let (records, bytes_copied) = match self.copy(path, &temp) {
            Ok(copied) => copied,
            Err(err) => {
                if let Err(cleanup) = self.fs.delete_file(&temp) {
                    warn!(path = %temp.display(), error = %cleanup, "failed to remove defragmentation file");
                }
                return Err(err);
            }
        };

        self.fs.delete_file(path)?;
        self.fs.rename_file(&temp, path)?;
        let size_after = self.fs.file_size(path)?;

        let report = DefragmentReport {
            records,
            bytes_copied,
            size_before,
            size_after,
        };
        info!(
            path = %path.display(),
            records,
            bytes_copied,
            size_before,
            size_after,
            "defragmented storage"
        );
        Ok(report)
    }

    /// Copies every record; both storages are closed on return.
    fn copy(&self, source: &Path, target: &Path) -> CoreResult<(usize, u64)> {
        let source = self.fs.open_storage_file(source, Access::Read)?;
        let target = self.fs.open_storage_file(target, Access::Modify)?;
        let mut buffer = vec![0u8; self.config.buffer_size.max(1)];

        let names = source.record_names()?;
        let mut bytes_copied = 0u64;
        for name in &names {
            bytes_copied += copy_record(&source, &target, name, &mut buffer)?;
        }
        target.flush()?;
        Ok((names.len(), bytes_copied))
    }
}

fn copy_record(source: &Storage, target: &Storage, name: &str, buffer: &mut [u8]) -> CoreResult<u64> {
    target.create_record(name)?;
    let mut input = source.open_record_with(name, RecordAccess::Read)?;
    let mut output = target.open_record(name)?;

    let mut copied = 0u64;
    loop {
        let count = input.read(buffer)?;
        if count == 0 {
            break;
        }
        output.write(&buffer[..count])?;
        copied += count as u64;
    }

    output.close()?;
    input.close()?;
    debug!(record = name, bytes = copied, "copied record");
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{segment_offset, DIRECTORY_SIZE, SEGMENT_DATA_SIZE};
    use crate::maintenance::MemoryFileSystem;
    use crate::segment::SegmentState;
    use std::io::Read;
    use tempfile::tempdir;

    fn content(seed: u8, len: usize) -> Vec<u8> {
        (0..len).map(|i| seed.wrapping_add((i % 199) as u8)).collect()
    }

    fn write(storage: &Storage, name: &str, data: &[u8]) {
        storage.create_record(name).unwrap();
        let mut stream = storage.open_record(name).unwrap();
        stream.write(data).unwrap();
        stream.close().unwrap();
    }

    fn read(storage: &Storage, name: &str) -> Vec<u8> {
        let mut out = Vec::new();
        storage.open_record(name).unwrap().read_to_end(&mut out).unwrap();
        out
    }

    /// Builds a file with holes: records b and d are deleted.
    fn fragmented(fs: &MemoryFileSystem, path: &Path) {
        fs.create_storage_file(path).unwrap();
        let storage = fs.open_storage_file(path, Access::Modify).unwrap();
        write(&storage, "a", &content(1, 3 * SEGMENT_DATA_SIZE));
        write(&storage, "b", &content(2, 2 * SEGMENT_DATA_SIZE));
        write(&storage, "c", &content(3, SEGMENT_DATA_SIZE + 5));
        write(&storage, "d", &content(4, 10));
        write(&storage, "e", &content(5, 0));
        storage.delete_record("b").unwrap();
        storage.delete_record("d").unwrap();
    }

    #[test]
    fn temp_path_appends_suffix() {
        let defrag = Defragmentator::new(MemoryFileSystem::new());
        assert_eq!(
            defrag.temp_path(Path::new("dir/data.sfs")),
            PathBuf::from("dir/data.sfs.defrag")
        );
    }

    #[test]
    fn defragment_compacts_and_preserves_records() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("store.sfs");
        fragmented(&fs, path);

        let defrag = Defragmentator::with_config(fs, DefragmentConfig::new().buffer_size(1000));
        let report = defrag.defragment(path).unwrap();

        assert_eq!(report.records, 3);
        assert_eq!(report.bytes_copied, (4 * SEGMENT_DATA_SIZE + 5) as u64);
        assert_eq!(report.size_before, segment_offset(9));
        assert_eq!(report.size_after, segment_offset(6));
        assert_eq!(report.bytes_saved(), segment_offset(9) - segment_offset(6));

        let fs = defrag.file_system();
        assert_eq!(fs.paths(), vec![PathBuf::from("store.sfs")]);

        let storage = fs.open_storage_file(path, Access::Read).unwrap();
        assert_eq!(storage.record_names().unwrap(), vec!["a", "c", "e"]);
        assert_eq!(read(&storage, "a"), content(1, 3 * SEGMENT_DATA_SIZE));
        assert_eq!(read(&storage, "c"), content(3, SEGMENT_DATA_SIZE + 5));
        assert!(read(&storage, "e").is_empty());

        let stats = storage.stats().unwrap();
        assert_eq!(stats.free_segment_count, 0);
        for index in 0..stats.segment_count {
            assert_ne!(storage.segment(index).unwrap().state, SegmentState::Free);
        }

        // Each record sits in consecutive segments.
        let c: Vec<u32> = storage
            .record_segments("c")
            .unwrap()
            .iter()
            .map(|segment| segment.index)
            .collect();
        assert_eq!(c, vec![3, 4]);
        assert!(storage.verify().unwrap().is_ok());
    }

    #[test]
    fn defragment_empty_storage() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("empty.sfs");
        fs.create_storage_file(path).unwrap();

        let defrag = Defragmentator::new(fs);
        let report = defrag.defragment(path).unwrap();
        assert_eq!(report.records, 0);
        assert_eq!(report.size_after, DIRECTORY_SIZE as u64);
    }

    #[test]
    fn defragment_missing_file_leaves_nothing_behind() {
        let defrag = Defragmentator::new(MemoryFileSystem::new());
        assert!(defrag.defragment(Path::new("missing.sfs")).is_err());
        assert!(defrag.file_system().paths().is_empty());
    }

    #[test]
    fn defragment_replaces_stale_temp_file() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("store.sfs");
        fragmented(&fs, path);
        fs.create_storage_file(Path::new("store.sfs.defrag")).unwrap();

        let defrag = Defragmentator::new(fs);
        defrag.defragment(path).unwrap();
        assert_eq!(defrag.file_system().paths(), vec![PathBuf::from("store.sfs")]);
    }

    #[test]
    fn defragment_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.sfs");

        {
            let storage = Storage::open_file(&path, crate::Config::default()).unwrap();
            write(&storage, "x", &content(9, 2 * SEGMENT_DATA_SIZE));
            write(&storage, "y", &content(8, 100));
            storage.delete_record("x").unwrap();
        }

        let report = Defragmentator::os().defragment(&path).unwrap();
        assert_eq!(report.records, 1);
        assert_eq!(report.size_after, segment_offset(1));
        assert!(!dir.path().join("store.sfs.defrag").exists());

        let storage = Storage::open_file(&path, crate::Config::read_only()).unwrap();
        assert_eq!(read(&storage, "y"), content(8, 100));
    }
}
