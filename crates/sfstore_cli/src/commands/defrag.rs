//! Defrag command implementation.

use sfstore_core::{DefragmentConfig, Defragmentator, OsFileSystem};
use std::path::Path;

/// Runs the defrag command.
pub fn run(path: &Path, buffer_size: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Storage file not found: {}", path.display()).into());
    }

    let mut config = DefragmentConfig::default();
    if let Some(size) = buffer_size {
        config = config.buffer_size(size);
    }

    println!("Defragmenting {}", path.display());
    let report = Defragmentator::with_config(OsFileSystem, config).defragment(path)?;

    println!();
    println!("  Records copied: {}", report.records);
    println!("  Bytes copied:   {}", report.bytes_copied);
    println!("  Size before:    {} bytes", report.size_before);
    println!("  Size after:     {} bytes", report.size_after);
    println!(
        "  Space saved:    {} bytes ({:.1}%)",
        report.bytes_saved(),
        if report.size_before > 0 {
            report.bytes_saved() as f64 / report.size_before as f64 * 100.0
        } else {
            0.0
        }
    );
    println!("✓ Defragmentation complete");
    Ok(())
}
