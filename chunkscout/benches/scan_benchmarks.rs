use chunkscout::search::{LineIndex, PatternMatcher};
use chunkscout::{scan, ScanConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::{fs::File, io::Write, path::PathBuf};
use tempfile::tempdir;

fn create_test_file(dir: &tempfile::TempDir, lines: usize) -> std::io::Result<PathBuf> {
    let path = dir.path().join("bench.txt");
    let mut file = File::create(&path)?;
    for i in 0..lines {
        writeln!(
            file,
            "Line {} TODO: fix bug {} FIXME: optimize line {} NOTE: important task {}",
            i, i, i, i
        )?;
    }
    Ok(path)
}

fn bench_worker_counts(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = create_test_file(&dir, 200_000).unwrap();

    let mut group = c.benchmark_group("scan_worker_count");
    for workers in [1usize, 2, 4, 8, 16] {
        let config = ScanConfig::new(workers, "TODO", &path);
        group.bench_with_input(BenchmarkId::from_parameter(workers), &config, |b, config| {
            b.iter(|| scan(black_box(config)).unwrap())
        });
    }
    group.finish();
}

fn bench_line_index(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = create_test_file(&dir, 200_000).unwrap();

    c.bench_function("line_index_build", |b| {
        b.iter(|| LineIndex::build(black_box(&path)).unwrap())
    });
}

fn bench_matcher(c: &mut Criterion) {
    let matcher = PatternMatcher::new("needle").unwrap();
    let text = "hay needle stack ".repeat(10_000);

    c.bench_function("count_matches", |b| {
        b.iter(|| matcher.count_matches(black_box(&text)))
    });
}

criterion_group!(benches, bench_worker_counts, bench_line_index, bench_matcher);
criterion_main!(benches);
