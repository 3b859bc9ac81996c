//! Stress tests for SFStore.
//!
//! These tests drive many create/write/delete cycles through one storage and
//! check that the file stays consistent and free space is reused.

use crate::fixtures::payload;
use sfstore_core::Storage;
use std::io::{Read, Write};
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of distinct record names cycled through.
    pub record_count: usize,
    /// Largest record payload in bytes.
    pub max_record_size: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 2_000,
            record_count: 50,
            max_record_size: 40_000,
        }
    }
}

impl StressConfig {
    /// Creates a configuration for quick runs.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            operations: 200,
            record_count: 10,
            max_record_size: 20_000,
        }
    }

    fn record_size(&self, i: usize) -> usize {
        // Spread sizes over 0..max with a stride coprime to common segment counts.
        (i * 7919) % (self.max_record_size + 1)
    }
}

/// Run a sequential write stress test: every operation rewrites one record.
pub fn stress_sequential_writes(storage: &Storage, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let name = format!("record_{}", i % config.record_count);
        let data = payload(i as u8, config.record_size(i));

        match rewrite(storage, &name, &data) {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a churn stress test mixing create, append, truncate, read and delete.
pub fn stress_mixed_operations(storage: &Storage, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let name = format!("record_{}", i % config.record_count);

        let result = match i % 4 {
            0 => rewrite(storage, &name, &payload(i as u8, config.record_size(i))),
            1 => append(storage, &name, &payload(i as u8, config.record_size(i) / 4)),
            2 => read_all(storage, &name).map(|_| ()),
            _ => {
                if i % 8 == 3 {
                    delete_if_exists(storage, &name)
                } else {
                    truncate_half(storage, &name)
                }
            }
        };

        match result {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

type StressResult<T> = Result<T, Box<dyn std::error::Error>>;

fn rewrite(storage: &Storage, name: &str, data: &[u8]) -> StressResult<()> {
    delete_if_exists(storage, name)?;
    storage.create_record(name)?;
    let mut stream = storage.open_record(name)?;
    stream.write_all(data)?;
    stream.close()?;
    Ok(())
}

fn append(storage: &Storage, name: &str, data: &[u8]) -> StressResult<()> {
    if !storage.record_exists(name)? {
        storage.create_record(name)?;
    }
    let mut stream = storage.open_record(name)?;
    stream.seek(std::io::SeekFrom::End(0))?;
    stream.write_all(data)?;
    stream.close()?;
    Ok(())
}

fn read_all(storage: &Storage, name: &str) -> StressResult<Vec<u8>> {
    let mut out = Vec::new();
    if storage.record_exists(name)? {
        storage.open_record(name)?.read_to_end(&mut out)?;
    }
    Ok(out)
}

fn truncate_half(storage: &Storage, name: &str) -> StressResult<()> {
    if storage.record_exists(name)? {
        let mut stream = storage.open_record(name)?;
        let len = stream.len();
        stream.set_len(len / 2)?;
        stream.close()?;
    }
    Ok(())
}

fn delete_if_exists(storage: &Storage, name: &str) -> StressResult<()> {
    if storage.record_exists(name)? {
        storage.delete_record(name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestStorage;

    #[test]
    fn sequential_writes_stay_consistent() {
        let storage = TestStorage::memory();
        let result = stress_sequential_writes(&storage, &StressConfig::quick());
        assert_eq!(result.failed_ops, 0);

        let report = storage.verify().unwrap();
        assert!(report.is_ok(), "{:?}", report.issues);
        assert_eq!(storage.record_names().unwrap().len(), 10);
    }

    #[test]
    fn mixed_operations_stay_consistent() {
        let storage = TestStorage::memory();
        let result = stress_mixed_operations(&storage, &StressConfig::quick());
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.total_ops, 200);

        let report = storage.verify().unwrap();
        assert!(report.is_ok(), "{:?}", report.issues);
    }

    #[test]
    fn churn_reuses_free_space() {
        let storage = TestStorage::memory();
        let config = StressConfig::quick();
        stress_sequential_writes(&storage, &config);
        let after_first = storage.segment_count().unwrap();

        stress_sequential_writes(&storage, &config);
        let stats = storage.stats().unwrap();
        // Same workload again: holes are filled before the file grows much.
        assert!(stats.segment_count <= after_first * 2, "{stats:?}");
    }
}
