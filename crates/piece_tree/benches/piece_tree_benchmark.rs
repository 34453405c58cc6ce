use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use piece_tree::{Chunk, Edit, PieceTree};
use std::hint::black_box;

fn document(size: usize) -> String {
    let line = "the quick brown fox jumps over the lazy dog\r\n";
    line.repeat(size / line.len() + 1)[..size].to_string()
}

fn chunked(text: &str, chunk_len: usize) -> Vec<Chunk> {
    text.as_bytes()
        .chunks(chunk_len)
        .map(|bytes| Chunk::from(String::from_utf8_lossy(bytes).into_owned()))
        .collect()
}

fn bench_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("creation");

    for size in [1_000, 100_000, 1_000_000].iter() {
        let text = document(*size);

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("piece_tree", size), size, |b, _| {
            b.iter_batched(
                || chunked(&text, 4096),
                |chunks| black_box(PieceTree::new(chunks)),
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("ropey", size), size, |b, _| {
            b.iter(|| black_box(ropey::Rope::from_str(black_box(text.as_str()))));
        });

        group.bench_with_input(BenchmarkId::new("string", size), size, |b, _| {
            b.iter(|| black_box(black_box(&text).clone()));
        });
    }
    group.finish();
}

fn bench_insert_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    let insert_text = "INSERTED";

    for size in [10_000, 1_000_000].iter() {
        let text = document(*size);
        let tree = PieceTree::from(text.as_str());
        let rope = ropey::Rope::from_str(&text);

        group.throughput(Throughput::Elements(1));

        for (name, at) in [("beginning", 0), ("middle", size / 2), ("end", *size)] {
            group.bench_with_input(BenchmarkId::new(format!("piece_tree_{name}"), size), &at, |b, &at| {
                b.iter_batched(
                    || tree.clone(),
                    |mut tree| {
                        tree.insert(black_box(at), black_box(insert_text)).ok();
                        black_box(tree);
                    },
                    BatchSize::SmallInput,
                )
            });

            group.bench_with_input(BenchmarkId::new(format!("ropey_{name}"), size), &at, |b, &at| {
                b.iter_batched(
                    || rope.clone(),
                    |mut rope| {
                        rope.insert(black_box(at), black_box(insert_text));
                        black_box(rope);
                    },
                    BatchSize::SmallInput,
                )
            });

            group.bench_with_input(BenchmarkId::new(format!("string_{name}"), size), &at, |b, &at| {
                b.iter_batched(
                    || text.clone(),
                    |mut string| {
                        string.insert_str(black_box(at), black_box(insert_text));
                        black_box(string);
                    },
                    BatchSize::SmallInput,
                )
            });
        }
    }
    group.finish();
}

fn bench_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("typing");
    let text = document(100_000);
    let tree = PieceTree::from(text.as_str());

    group.throughput(Throughput::Elements(1_000));
    group.bench_function("piece_tree_1000_keystrokes", |b| {
        b.iter_batched(
            || tree.clone(),
            |mut tree| {
                let mut at = 50_000;
                for i in 0..1_000 {
                    let ch = if i % 40 == 39 { "\n" } else { "x" };
                    tree.insert(at, ch).ok();
                    at += 1;
                }
                black_box(tree);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_delete_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("delete");

    for size in [10_000, 1_000_000].iter() {
        let text = document(*size);
        let tree = PieceTree::from(text.as_str());
        let rope = ropey::Rope::from_str(&text);
        let delete_size = size / 10;
        let start = size / 2 - delete_size / 2;
        let end = start + delete_size;

        group.throughput(Throughput::Elements(delete_size as u64));

        group.bench_with_input(BenchmarkId::new("piece_tree_middle", size), size, |b, _| {
            b.iter_batched(
                || tree.clone(),
                |mut tree| {
                    tree.delete(black_box(start), black_box(delete_size)).ok();
                    black_box(tree);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("ropey_middle", size), size, |b, _| {
            b.iter_batched(
                || rope.clone(),
                |mut rope| {
                    rope.remove(black_box(start..end));
                    black_box(rope);
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("string_middle", size), size, |b, _| {
            b.iter_batched(
                || text.clone(),
                |mut string| {
                    string.replace_range(black_box(start..end), "");
                    black_box(string);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_batch_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    let text = document(1_000_000);
    let tree = PieceTree::from(text.as_str());
    let edits: Vec<Edit> = (0..100)
        .map(|i| Edit::new(i * 9_000 + 17, 5, "replacement\n"))
        .collect();

    group.throughput(Throughput::Elements(edits.len() as u64));
    group.bench_function("piece_tree_100_edits", |b| {
        b.iter_batched(
            || tree.clone(),
            |mut tree| {
                tree.replace_offset_len(black_box(&edits)).ok();
                black_box(tree);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_line_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_lookup");

    for size in [100_000, 1_000_000].iter() {
        let text = document(*size);
        let tree = PieceTree::new(chunked(&text, 4096));
        let rope = ropey::Rope::from_str(&text);
        let line = tree.line_count() / 2;

        group.bench_with_input(BenchmarkId::new("piece_tree", size), &tree, |b, tree| {
            b.iter(|| black_box(tree.get_line_content(black_box(line)).ok()))
        });

        group.bench_with_input(BenchmarkId::new("ropey", size), &rope, |b, rope| {
            b.iter(|| black_box(rope.line(black_box(line - 1)).to_string()))
        });

        group.bench_with_input(BenchmarkId::new("piece_tree_offset_at", size), &tree, |b, tree| {
            b.iter(|| black_box(tree.get_offset_at(black_box(line), 1).ok()))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_creation,
    bench_insert_operations,
    bench_typing,
    bench_delete_operations,
    bench_batch_edits,
    bench_line_lookup
);
criterion_main!(benches);
