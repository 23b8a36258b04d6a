//! Accepted database lines serialize back to themselves.

use proptest::prelude::*;
use treedb::database::codec::{is_representable, parse_line, serialize};
use treedb::types::{Checksum, Record};

fn record() -> impl Strategy<Value = Record> {
    (
        "[a-zA-Z0-9 _.#>-]{1,10}(/[a-zA-Z0-9 _.#>-]{1,10}){0,3}",
        prop::option::of(any::<[u8; 16]>()),
        any::<u64>(),
    )
        .prop_map(|(path, checksum, size)| Record::new(path, checksum.map(Checksum::from_bytes), size))
}

proptest! {
    #[test]
    fn serialized_records_parse_back(record in record()) {
        prop_assume!(is_representable(&record.path));
        let line = serialize(&record);
        let parsed = parse_line(1, &line).unwrap();
        prop_assert_eq!(&parsed, &record);
        prop_assert_eq!(serialize(&parsed), line);
    }

    #[test]
    fn parse_never_panics(line in "\\PC{0,80}") {
        if let Ok(record) = parse_line(1, &line) {
            prop_assert!(is_representable(&record.path));
            prop_assert_eq!(serialize(&record), line);
        }
    }
}
