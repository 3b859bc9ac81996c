//! Export command implementation.

use sfstore_core::{Config, Storage};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Runs the export command.
pub fn run(
    path: &Path,
    name: &str,
    destination: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    match destination {
        Some(destination) => {
            let mut output = BufWriter::new(File::create(destination)?);
            let bytes = export(path, name, &mut output)?;
            output.flush()?;
            println!("✓ Exported {bytes} bytes to {}", destination.display());
        }
        None => {
            let stdout = io::stdout();
            let mut output = stdout.lock();
            export(path, name, &mut output)?;
            output.flush()?;
        }
    }
    Ok(())
}

/// Copies record `name` into `output`, returning the number of bytes.
pub fn export(
    path: &Path,
    name: &str,
    output: &mut dyn Write,
) -> Result<u64, Box<dyn std::error::Error>> {
    let storage = Storage::open_file(path, Config::read_only())?;
    let mut stream = storage.open_record(name)?;
    Ok(io::copy(&mut stream, output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn export_writes_record_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.sfs");
        {
            let storage = Storage::open_file(&path, Config::default()).unwrap();
            storage.create_record("r").unwrap();
            let mut stream = storage.open_record("r").unwrap();
            stream.write_all(b"exported bytes").unwrap();
            stream.close().unwrap();
        }

        let mut out = Vec::new();
        assert_eq!(export(&path, "r", &mut out).unwrap(), 14);
        assert_eq!(out, b"exported bytes");
        assert!(export(&path, "missing", &mut out).is_err());
    }
}
