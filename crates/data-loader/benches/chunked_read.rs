//! Benchmarks for the chunked reader
//!
//! Run with: cargo bench --package data-loader
//!
//! Streams a synthetic 200k-row akas file at several chunk sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use data_loader::{ChunkedTableReader, Fields, ReadOptions};
use std::fmt::Write as _;
use std::path::PathBuf;

const ROWS: usize = 200_000;

fn write_synthetic_akas(dir: &tempfile::TempDir) -> PathBuf {
    let mut content = String::from("titleId\tordering\ttitle\tregion\tlanguage\tisOriginalTitle\n");
    for i in 0..ROWS {
        let region = if i % 4 == 0 { "IN" } else { "US" };
        writeln!(content, "tt{i:07}\t1\tTitle {i}\t{region}\thi\t{}", i % 2).unwrap();
    }
    let path = dir.path().join("title.akas.tsv");
    std::fs::write(&path, content).unwrap();
    path
}

fn bench_chunked_read(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_synthetic_akas(&dir);

    let mut group = c.benchmark_group("chunked_read");
    for chunk_rows in [1_000, 50_000, 250_000] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk_rows), &chunk_rows, |b, &chunk_rows| {
            b.iter(|| {
                let options = ReadOptions::tsv(["titleId", "language"]).with_chunk_rows(chunk_rows);
                let table = ChunkedTableReader::open(&path, options, |row| row.field("region") == Some("IN"))
                    .unwrap()
                    .collect_table()
                    .unwrap();
                black_box(table.len())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_chunked_read);
criterion_main!(benches);
