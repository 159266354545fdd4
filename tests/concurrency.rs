use std::sync::Arc;

use rayon::prelude::*;

use docvalues::codec::DocValuesReader;
use docvalues::conf::CodecConfig;
use docvalues::store::HeapDirectory;
use docvalues::testutil::{
    BINARY_FIELD, FixtureSegment, NUMERIC_FIELD, SORTED_FIELD, SORTED_SET_FIELD,
};

const MAX_DOC: u32 = 3000;

fn open() -> (FixtureSegment, DocValuesReader) {
    let fixture = FixtureSegment::generate(77, MAX_DOC);
    let dir = HeapDirectory::new();
    fixture.write(&dir, "_0", CodecConfig::default()).unwrap();
    let reader = DocValuesReader::open(&dir, "_0", MAX_DOC).unwrap();
    (fixture, reader)
}

#[test]
fn test_first_access_races_share_one_accessor() {
    let (_, reader) = open();
    let numerics: Vec<_> = (0..64)
        .into_par_iter()
        .map(|_| reader.numeric(NUMERIC_FIELD).unwrap())
        .collect();
    assert!(numerics.iter().all(|n| Arc::ptr_eq(n, &numerics[0])));
    assert_eq!(reader.loaded_fields(), 1);

    let ram = reader.ram_bytes_used();
    (0..64).into_par_iter().for_each(|_| {
        reader.numeric(NUMERIC_FIELD).unwrap();
    });
    assert_eq!(reader.ram_bytes_used(), ram);
}

#[test]
fn test_parallel_reads_match_input() {
    let (fixture, reader) = open();
    (0..MAX_DOC).into_par_iter().for_each(|doc| {
        let d = doc as usize;
        assert_eq!(reader.numeric(NUMERIC_FIELD).unwrap().get(doc), fixture.numeric[d]);
        assert_eq!(
            reader.binary(BINARY_FIELD).unwrap().get(doc),
            &fixture.binary[d][..]
        );
        assert_eq!(reader.sorted(SORTED_FIELD).unwrap().ord(doc), fixture.sorted.ords[d]);
        let set = reader.sorted_set(SORTED_SET_FIELD).unwrap();
        let ords: Vec<i64> = set.ords(doc).map(|o| o as i64).collect();
        assert_eq!(ords, fixture.sorted_set.doc_ords(doc));
    });
    assert_eq!(reader.loaded_fields(), 4);
}
