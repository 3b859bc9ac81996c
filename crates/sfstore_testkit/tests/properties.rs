//! Property tests comparing record streams against a reference model.

use proptest::prelude::*;
use sfstore_core::layout::SEGMENT_DATA_SIZE;
use sfstore_core::Storage;
use sfstore_testkit::prelude::*;
use std::io::{Read, Seek, SeekFrom};

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn stream_matches_model(ops in operation_sequence_strategy(1, 24)) {
        let storage = Storage::open_in_memory().unwrap();
        storage.create_record("model").unwrap();
        let mut stream = storage.open_record("model").unwrap();
        let mut model = RecordModel::new();

        for op in &ops {
            let expected = model.apply(op);
            let actual = apply_to_stream(&mut stream, op);
            prop_assert_eq!(actual, expected, "{:?}", op);
            prop_assert_eq!(stream.position(), model.position());
            prop_assert_eq!(stream.len(), model.data().len() as u64);
        }
        stream.close().unwrap();

        prop_assert_eq!(read_record(&storage, "model"), model.data().to_vec());
        let report = storage.verify().unwrap();
        prop_assert!(report.is_ok(), "{:?}", report.issues);
    }

    #[test]
    fn round_trip_near_segment_edges(len in boundary_length_strategy(4), seed in any::<u8>()) {
        let storage = Storage::open_in_memory().unwrap();
        let content = payload(seed, len);
        write_record(&storage, "edge", &content);

        prop_assert_eq!(read_record(&storage, "edge"), content);
        let expected_segments = if len == 0 { 1 } else { len.div_ceil(SEGMENT_DATA_SIZE) };
        prop_assert_eq!(chain_indexes(&storage, "edge").len(), expected_segments);
    }

    #[test]
    fn chunked_reads_see_every_byte(content in payload_strategy(3 * SEGMENT_DATA_SIZE), chunk in 1usize..5000) {
        let storage = Storage::open_in_memory().unwrap();
        write_record(&storage, "chunks", &content);

        let mut stream = storage.open_record("chunks").unwrap();
        let mut out = Vec::new();
        let mut buf = vec![0u8; chunk];
        let mut last_position = 0;
        loop {
            let n = stream.read(&mut buf).unwrap();
            prop_assert!(stream.position() >= last_position);
            last_position = stream.position();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        prop_assert_eq!(out, content);
    }

    #[test]
    fn random_seek_reads_match(content in payload_strategy(2 * SEGMENT_DATA_SIZE + 100), targets in prop::collection::vec(any::<prop::sample::Index>(), 1..16)) {
        prop_assume!(!content.is_empty());
        let storage = Storage::open_in_memory().unwrap();
        write_record(&storage, "seek", &content);

        let mut stream = storage.open_record("seek").unwrap();
        for target in targets {
            let target = target.index(content.len());
            Seek::seek(&mut stream, SeekFrom::Start(target as u64)).unwrap();
            let mut byte = [0u8; 1];
            stream.read_exact(&mut byte).unwrap();
            prop_assert_eq!(byte[0], content[target]);
        }
    }

    #[test]
    fn names_round_trip_through_directory(names in prop::collection::hash_set(record_name_strategy(), 1..20)) {
        let storage = Storage::open_in_memory().unwrap();
        for name in &names {
            storage.create_record(name).unwrap();
        }
        let mut listed = storage.record_names().unwrap();
        listed.sort();
        let mut expected: Vec<String> = names.into_iter().collect();
        expected.sort();
        prop_assert_eq!(listed, expected);
    }
}
