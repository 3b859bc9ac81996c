//! Create command implementation.

use sfstore_core::Storage;
use std::path::Path;

/// Runs the create command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        return Err(format!("{} already exists", path.display()).into());
    }

    Storage::create_file(path)?;
    println!("✓ Created storage at {}", path.display());
    Ok(())
}
