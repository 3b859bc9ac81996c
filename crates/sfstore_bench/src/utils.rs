//! Benchmark utilities.

use rand::Rng;
use sfstore_core::Storage;
use std::io::Write;

/// Generate random record data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` distinct record names.
pub fn generate_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("record_{i:04}")).collect()
}

/// Create a record holding `data`.
pub fn write_record(storage: &Storage, name: &str, data: &[u8]) {
    storage.create_record(name).unwrap();
    let mut stream = storage.open_record(name).unwrap();
    stream.write_all(data).unwrap();
    stream.close().unwrap();
}

/// Create an in-memory storage with `count` records of `size` random bytes,
/// every other one deleted afterwards.
pub fn fragmented_storage(count: usize, size: usize) -> Storage {
    let storage = Storage::open_in_memory().unwrap();
    let names = generate_names(count);
    for name in &names {
        write_record(&storage, name, &random_data(size));
    }
    for name in names.iter().step_by(2) {
        storage.delete_record(name).unwrap();
    }
    storage
}
