use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use docvalues::codec::{DocValuesReader, DocValuesWriter};
use docvalues::conf::CodecConfig;
use docvalues::store::HeapDirectory;
use docvalues::testutil::{
    BINARY_FIELD, FixtureSegment, NUMERIC_FIELD, SORTED_SET_FIELD, random_numeric,
};

const DOC_COUNTS: &[u32] = &[10_000, 1_000_000];

fn open(max_doc: u32) -> DocValuesReader {
    let dir = HeapDirectory::new();
    FixtureSegment::generate(42, max_doc)
        .write(&dir, "_0", CodecConfig::default())
        .unwrap();
    DocValuesReader::open(&dir, "_0", max_doc).unwrap()
}

fn bench_reads(c: &mut Criterion) {
    for &max_doc in DOC_COUNTS {
        let reader = open(max_doc);
        let numeric = reader.numeric(NUMERIC_FIELD).unwrap();
        let binary = reader.binary(BINARY_FIELD).unwrap();
        let sorted_set = reader.sorted_set(SORTED_SET_FIELD).unwrap();

        let mut group = c.benchmark_group(format!("read/docs_{max_doc}"));
        group.throughput(Throughput::Elements(max_doc as u64));
        group.bench_function("numeric", |b| {
            b.iter(|| {
                (0..max_doc)
                    .map(|doc| numeric.get(black_box(doc)))
                    .fold(0i64, i64::wrapping_add)
            })
        });
        group.bench_function("binary", |b| {
            b.iter(|| (0..max_doc).map(|doc| binary.get(black_box(doc)).len()).sum::<usize>())
        });
        group.bench_function("sorted_set", |b| {
            let mut cursor = sorted_set.cursor();
            b.iter(|| {
                let mut total = 0u64;
                for doc in 0..max_doc {
                    cursor.set_document(black_box(doc));
                    total += cursor.by_ref().sum::<u64>();
                }
                total
            })
        });
        group.finish();
    }
}

fn bench_numeric_formats(c: &mut Criterion) {
    let max_doc = 1_000_000;
    let mut group = c.benchmark_group("numeric_format");
    group.throughput(Throughput::Elements(max_doc as u64));
    let cases: [(&str, Vec<i64>); 3] = [
        ("table", random_numeric(1, max_doc, Some(100))),
        ("gcd", (0..max_doc as i64).map(|i| i * 1000).collect()),
        ("delta", random_numeric(1, max_doc, None)),
    ];
    for (name, values) in cases {
        let dir = HeapDirectory::new();
        let mut writer = DocValuesWriter::new(&dir, "_0", max_doc, CodecConfig::default()).unwrap();
        writer.add_numeric_field(0, &values).unwrap();
        writer.finish().unwrap();
        let reader = DocValuesReader::open(&dir, "_0", max_doc).unwrap();
        let numeric = reader.numeric(0).unwrap();
        group.bench_with_input(BenchmarkId::new("get", name), &numeric, |b, numeric| {
            b.iter(|| {
                (0..max_doc)
                    .map(|doc| numeric.get(black_box(doc)))
                    .fold(0i64, i64::wrapping_add)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_reads, bench_numeric_formats);
criterion_main!(benches);
