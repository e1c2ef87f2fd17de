use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use extsort_core::{ByteOrderCollator, KeyStore};
use extsort_io::{RawRunReader, RawRunWriter, RunReader, RunWriter, StreamWriter};
use extsort_engine::RunMerger;
use tempfile::tempdir;

const RUNS: usize = 8;
const RECORDS_PER_RUN: usize = 20_000;

fn write_sample_run(dir: &std::path::Path, name: &str, offset: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut ks = KeyStore::new(1 << 22);
    for i in 0..RECORDS_PER_RUN {
        let key = format!("{:010}", i * RUNS + offset);
        ks.insert(key.as_bytes());
    }
    ks.sort(&ByteOrderCollator);

    let mut writer: Box<dyn RunWriter> = Box::new(RawRunWriter::create(&path).unwrap());
    writer.write_run(&ks).unwrap();
    writer.finish().unwrap();
    path
}

fn bench_merge(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let paths: Vec<_> = (0..RUNS)
        .map(|i| write_sample_run(dir.path(), &format!("fort_run.{i}.0"), i))
        .collect();

    let mut group = c.benchmark_group("merge");
    group.throughput(Throughput::Elements((RUNS * RECORDS_PER_RUN) as u64));

    group.bench_with_input(BenchmarkId::new("k_way", RUNS), &paths, |b, paths| {
        b.iter(|| {
            let readers: Vec<Box<dyn RunReader>> = paths
                .iter()
                .map(|p| Box::new(RawRunReader::open(p, 1 << 16).unwrap()) as Box<dyn RunReader>)
                .collect();
            let collator = ByteOrderCollator;
            let mut merger = RunMerger::new(readers, &collator);
            let mut out = Vec::new();
            let mut writer = StreamWriter::new(&mut out, 1 << 16);
            merger.merge(&mut writer).unwrap();
            black_box(out);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_merge);
criterion_main!(benches);
