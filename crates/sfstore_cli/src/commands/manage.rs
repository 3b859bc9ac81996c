//! Rename, delete and truncate commands.

use sfstore_core::{Config, Storage};
use std::path::Path;

fn open(path: &Path) -> Result<Storage, Box<dyn std::error::Error>> {
    Ok(Storage::open_file(path, Config::default().create_if_missing(false))?)
}

/// Runs the rename command.
pub fn rename(path: &Path, from: &str, to: &str) -> Result<(), Box<dyn std::error::Error>> {
    open(path)?.rename_record(from, to)?;
    println!("✓ Renamed '{from}' to '{to}'");
    Ok(())
}

/// Runs the delete command.
pub fn delete(path: &Path, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    open(path)?.delete_record(name)?;
    println!("✓ Deleted '{name}'");
    Ok(())
}

/// Runs the truncate command.
pub fn truncate(path: &Path, name: &str, length: u64) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open(path)?;
    let mut stream = storage.open_record(name)?;
    let before = stream.len();
    stream.set_len(length)?;
    stream.close()?;
    println!("✓ Truncated '{name}' from {before} to {length} bytes");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.sfs");
        let storage = Storage::open_file(&path, Config::default()).unwrap();
        storage.create_record("r").unwrap();
        let mut stream = storage.open_record("r").unwrap();
        stream.write_all(&[5u8; 10_000]).unwrap();
        stream.close().unwrap();
        (dir, path)
    }

    #[test]
    fn rename_then_delete() {
        let (_dir, path) = setup();
        rename(&path, "r", "s").unwrap();
        assert!(delete(&path, "r").is_err());
        delete(&path, "s").unwrap();

        let storage = Storage::open_file(&path, Config::read_only()).unwrap();
        assert!(storage.record_names().unwrap().is_empty());
    }

    #[test]
    fn truncate_shrinks_and_rejects_growth() {
        let (_dir, path) = setup();
        truncate(&path, "r", 100).unwrap();
        assert!(truncate(&path, "r", 200).is_err());

        let storage = Storage::open_file(&path, Config::read_only()).unwrap();
        assert_eq!(storage.describe_record("r").unwrap().length, 100);
    }

    #[test]
    fn missing_storage_is_not_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.sfs");
        assert!(delete(&path, "r").is_err());
        assert!(!path.exists());
    }
}
