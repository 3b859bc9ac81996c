//! File system abstraction used by maintenance tasks.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::storage::Storage;
use crate::types::Access;
use parking_lot::RwLock;
use sfstore_storage::{InMemoryBackend, StorageBackend};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The file operations a maintenance task needs.
pub trait FileSystem: Send + Sync {
    /// Creates a new, formatted storage file.
    fn create_storage_file(&self, path: &Path) -> CoreResult<()>;

    /// Opens an existing storage file with the given access.
    fn open_storage_file(&self, path: &Path, access: Access) -> CoreResult<Storage>;

    /// Renames a file, replacing any file already at `to`.
    fn rename_file(&self, from: &Path, to: &Path) -> CoreResult<()>;

    /// Deletes a file.
    fn delete_file(&self, path: &Path) -> CoreResult<()>;

    /// Size of a file in bytes.
    fn file_size(&self, path: &Path) -> CoreResult<u64>;

    /// Returns true if a file exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn create_storage_file(&self, path: &Path) -> CoreResult<()> {
        Storage::create_file(path)
    }

    fn open_storage_file(&self, path: &Path, access: Access) -> CoreResult<Storage> {
        Storage::open_file(path, Config::new().access(access).create_if_missing(false))
    }

    fn rename_file(&self, from: &Path, to: &Path) -> CoreResult<()> {
        std::fs::rename(from, to)?;
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> CoreResult<()> {
        std::fs::remove_file(path)?;
        Ok(())
    }

    fn file_size(&self, path: &Path) -> CoreResult<u64> {
        Ok(std::fs::metadata(path)?.len())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// [`FileSystem`] holding named in-memory buffers.
///
/// Opening a file hands out a handle sharing the stored buffer, so data
/// written through one storage is visible to the next open.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<HashMap<PathBuf, InMemoryBackend>>,
}

impl MemoryFileSystem {
    /// Creates an empty file system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of a file's bytes.
    #[must_use]
    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.read().get(path).map(InMemoryBackend::data)
    }

    /// Paths of all files, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.files.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn not_found(path: &Path) -> CoreError {
        CoreError::StorageNotFound {
            path: path.to_path_buf(),
        }
    }
}

impl FileSystem for MemoryFileSystem {
    fn create_storage_file(&self, path: &Path) -> CoreResult<()> {
        let mut files = self.files.write();
        if files.contains_key(path) {
            return Err(CoreError::invalid_format(format!(
                "{} already exists",
                path.display()
            )));
        }
        let mut backend = InMemoryBackend::new();
        Storage::format(&mut backend)?;
        files.insert(path.to_path_buf(), backend);
        Ok(())
    }

    fn open_storage_file(&self, path: &Path, access: Access) -> CoreResult<Storage> {
        let backend = {
            let files = self.files.read();
            let file = files.get(path).ok_or_else(|| Self::not_found(path))?;
            match access {
                Access::Read => file.read_only(),
                Access::Modify => file.share(),
            }
        };
        Storage::open(Box::new(backend), Config::new().access(access))
    }

    fn rename_file(&self, from: &Path, to: &Path) -> CoreResult<()> {
        let mut files = self.files.write();
        let file = files.remove(from).ok_or_else(|| Self::not_found(from))?;
        files.insert(to.to_path_buf(), file);
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> CoreResult<()> {
        self.files
            .write()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(path))
    }

    fn file_size(&self, path: &Path) -> CoreResult<u64> {
        let files = self.files.read();
        let file = files.get(path).ok_or_else(|| Self::not_found(path))?;
        Ok(file.size()?)
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DIRECTORY_SIZE;
    use tempfile::tempdir;

    #[test]
    fn memory_files_survive_reopen() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("store.sfs");
        fs.create_storage_file(path).unwrap();
        assert_eq!(fs.file_size(path).unwrap(), DIRECTORY_SIZE as u64);

        fs.open_storage_file(path, Access::Modify)
            .unwrap()
            .create_record("kept")
            .unwrap();

        let reopened = fs.open_storage_file(path, Access::Read).unwrap();
        assert_eq!(reopened.record_names().unwrap(), vec!["kept"]);
    }

    #[test]
    fn memory_read_handles_reject_writes() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("store.sfs");
        fs.create_storage_file(path).unwrap();

        let storage = fs.open_storage_file(path, Access::Read).unwrap();
        assert!(matches!(
            storage.create_record("x"),
            Err(CoreError::NotWritable { .. })
        ));
    }

    #[test]
    fn memory_rename_and_delete() {
        let fs = MemoryFileSystem::new();
        fs.create_storage_file(Path::new("a")).unwrap();
        assert!(fs.create_storage_file(Path::new("a")).is_err());

        fs.rename_file(Path::new("a"), Path::new("b")).unwrap();
        assert_eq!(fs.paths(), vec![PathBuf::from("b")]);
        assert!(matches!(
            fs.open_storage_file(Path::new("a"), Access::Read),
            Err(CoreError::StorageNotFound { .. })
        ));

        fs.delete_file(Path::new("b")).unwrap();
        assert!(!fs.exists(Path::new("b")));
        assert!(fs.delete_file(Path::new("b")).is_err());
    }

    #[test]
    fn os_file_system_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.sfs");
        let moved = dir.path().join("moved.sfs");
        let fs = OsFileSystem;

        fs.create_storage_file(&path).unwrap();
        assert!(fs.exists(&path));
        assert_eq!(fs.file_size(&path).unwrap(), DIRECTORY_SIZE as u64);

        fs.rename_file(&path, &moved).unwrap();
        assert!(!fs.exists(&path));
        let storage = fs.open_storage_file(&moved, Access::Read).unwrap();
        assert!(storage.record_names().unwrap().is_empty());
        drop(storage);

        fs.delete_file(&moved).unwrap();
        assert!(matches!(
            fs.open_storage_file(&moved, Access::Modify),
            Err(CoreError::StorageNotFound { .. })
        ));
    }
}
