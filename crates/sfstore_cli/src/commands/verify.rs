//! Verify command implementation.

use serde::Serialize;
use sfstore_core::{Config, Storage};
use std::path::Path;

/// Verification result.
#[derive(Debug, Serialize)]
pub struct VerifyResult {
    /// Storage path.
    pub path: String,
    /// Records checked.
    pub records_checked: usize,
    /// Segment headers checked.
    pub segments_checked: u32,
    /// Problems found.
    pub issues: Vec<String>,
}

impl VerifyResult {
    /// Returns true if no issue was found.
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Runs the verify command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = verify(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("Verifying storage at {}", result.path);
            println!();
            println!("  Records checked:  {}", result.records_checked);
            println!("  Segments checked: {}", result.segments_checked);
            println!();
            for issue in &result.issues {
                println!("  ✗ {issue}");
            }
            if result.is_ok() {
                println!("✓ Storage is consistent");
            }
        }
    }

    if result.is_ok() {
        Ok(())
    } else {
        Err(format!("verification failed with {} issue(s)", result.issues.len()).into())
    }
}

/// Checks the storage at `path`.
pub fn verify(path: &Path) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let storage = Storage::open_file(path, Config::read_only())?;
    let report = storage.verify()?;

    Ok(VerifyResult {
        path: path.display().to_string(),
        records_checked: report.records_checked,
        segments_checked: report.segments_checked,
        issues: report.issues.iter().map(ToString::to_string).collect(),
    })
}
