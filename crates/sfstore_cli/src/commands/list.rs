//! List command implementation.

use serde::Serialize;
use sfstore_core::{Config, Storage};
use std::path::Path;

/// One listed record.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RecordEntry {
    /// Record name.
    pub name: String,
    /// Directory slot.
    pub slot: usize,
    /// Length in bytes.
    pub length: u32,
}

/// Runs the list command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let entries = collect(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        _ => {
            for entry in &entries {
                println!("{:>12}  {}", entry.length, entry.name);
            }
            println!("{} record(s)", entries.len());
        }
    }
    Ok(())
}

/// Reads the directory of the storage at `path`.
pub fn collect(path: &Path) -> Result<Vec<RecordEntry>, Box<dyn std::error::Error>> {
    let storage = Storage::open_file(path, Config::read_only())?;
    Ok(storage
        .records()?
        .into_iter()
        .map(|record| RecordEntry {
            name: record.name,
            slot: record.slot,
            length: record.length,
        })
        .collect())
}
