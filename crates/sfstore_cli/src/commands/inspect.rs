//! Inspect command implementation.

use serde::Serialize;
use sfstore_core::{layout, Config, Storage};
use std::path::Path;

/// Storage inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Storage path.
    pub path: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Size of the directory region in bytes.
    pub directory_size: usize,
    /// Segments in the file.
    pub segment_count: u32,
    /// Free segments.
    pub free_segment_count: u32,
    /// Used record slots.
    pub record_count: usize,
    /// Total record slots.
    pub record_capacity: usize,
    /// Sum of record lengths.
    pub live_bytes: u64,
    /// Per-record details.
    pub records: Vec<RecordInfo>,
}

/// Details of a single record.
#[derive(Debug, Serialize)]
pub struct RecordInfo {
    /// Record name.
    pub name: String,
    /// Directory slot.
    pub slot: usize,
    /// Length in bytes.
    pub length: u32,
    /// First segment index.
    pub first_segment: u32,
    /// Last segment index.
    pub last_segment: u32,
    /// Segment chain (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<u32>>,
}

/// Runs the inspect command.
pub fn run(path: &Path, show_segments: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path, show_segments)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }
    Ok(())
}

/// Collects statistics and per-record layout.
pub fn inspect(path: &Path, show_segments: bool) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let storage = Storage::open_file(path, Config::read_only())?;
    let stats = storage.stats()?;

    let mut records = Vec::new();
    for record in storage.records()? {
        let segments = if show_segments {
            Some(
                storage
                    .record_segments(&record.name)?
                    .iter()
                    .map(|segment| segment.index)
                    .collect(),
            )
        } else {
            None
        };
        records.push(RecordInfo {
            name: record.name,
            slot: record.slot,
            length: record.length,
            first_segment: record.first_segment_index,
            last_segment: record.last_segment_index,
            segments,
        });
    }

    Ok(InspectResult {
        path: path.display().to_string(),
        file_size: stats.file_size,
        directory_size: layout::DIRECTORY_SIZE,
        segment_count: stats.segment_count,
        free_segment_count: stats.free_segment_count,
        record_count: stats.record_count,
        record_capacity: stats.record_capacity,
        live_bytes: stats.live_bytes,
        records,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("SFStore Storage: {}", result.path);
    println!();
    println!("File:");
    println!("  Size:            {} bytes", result.file_size);
    println!("  Directory:       {} bytes", result.directory_size);
    println!(
        "  Segments:        {} ({} free)",
        result.segment_count, result.free_segment_count
    );
    println!();
    println!("Records:");
    println!(
        "  Slots used:      {} / {}",
        result.record_count, result.record_capacity
    );
    println!("  Live bytes:      {}", result.live_bytes);

    if result.records.is_empty() {
        return;
    }
    println!();
    println!("  {:>5}  {:>12}  {:>8}  {:>8}  Name", "Slot", "Length", "First", "Last");
    for record in &result.records {
        println!(
            "  {:>5}  {:>12}  {:>8}  {:>8}  {}",
            record.slot, record.length, record.first_segment, record.last_segment, record.name
        );
        if let Some(segments) = &record.segments {
            let chain: Vec<String> = segments.iter().map(ToString::to_string).collect();
            println!("         chain: {}", chain.join(" -> "));
        }
    }
}
