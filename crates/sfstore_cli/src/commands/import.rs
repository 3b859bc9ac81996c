//! Import command implementation.

use sfstore_core::{Config, Storage};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use tracing::debug;

/// Runs the import command.
pub fn run(
    path: &Path,
    name: &str,
    source: &Path,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = import(path, name, source, force)?;
    println!("✓ Imported {bytes} bytes into '{name}'");
    Ok(())
}

/// Copies `source` into record `name`, creating the storage if needed.
///
/// Returns the number of bytes copied.
pub fn import(
    path: &Path,
    name: &str,
    source: &Path,
    force: bool,
) -> Result<u64, Box<dyn std::error::Error>> {
    let mut input = BufReader::new(File::open(source)?);
    let storage = Storage::open_file(path, Config::default())?;

    if storage.record_exists(name)? {
        if !force {
            return Err(format!("record '{name}' already exists (use --force to replace)").into());
        }
        debug!(record = name, "replacing existing record");
        storage.delete_record(name)?;
    }

    storage.create_record(name)?;
    let mut stream = storage.open_record(name)?;
    let bytes = io::copy(&mut input, &mut stream)?;
    stream.close()?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn import_creates_storage_and_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.sfs");
        let source = dir.path().join("input.bin");
        let content: Vec<u8> = (0..20_000u32).map(|i| (i % 256) as u8).collect();
        std::fs::write(&source, &content).unwrap();

        assert_eq!(import(&path, "blob", &source, false).unwrap(), 20_000);

        let storage = Storage::open_file(&path, Config::read_only()).unwrap();
        let mut out = Vec::new();
        storage.open_record("blob").unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out, content);
    }

    #[test]
    fn import_requires_force_to_replace() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.sfs");
        let source = dir.path().join("input.bin");
        std::fs::write(&source, b"first").unwrap();
        import(&path, "r", &source, false).unwrap();

        std::fs::write(&source, b"second").unwrap();
        assert!(import(&path, "r", &source, false).is_err());
        assert_eq!(import(&path, "r", &source, true).unwrap(), 6);
    }
}
