use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use doxygen_search::index::{MatchMode, SearchIndexTable};
use std::hint::black_box;

/// Synthetic script shaped like Doxygen output, `n` records.
fn synthetic_script(n: usize) -> String {
    let mut out = String::from("var searchData=\n[\n");
    for i in 0..n {
        let class = format!("Shape{i}");
        out.push_str(&format!(
            "  ['shape{i}_{i}',['shape{i}',['../class{class}.html',1,'{class}'],['../class{class}.html#a{i:032x}',1,'{class}::{class}(const {class} &amp;other)']]],\n"
        ));
    }
    out.push_str("];\n");
    out
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");
    for n in [100, 1_000, 10_000] {
        let script = synthetic_script(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &script, |b, s| {
            b.iter(|| black_box(SearchIndexTable::load(s).unwrap()));
        });
    }
    group.finish();
}

/// Per-keystroke lookups as a user types "shape12".
fn bench_lookup(c: &mut Criterion) {
    let table = SearchIndexTable::load(&synthetic_script(10_000)).unwrap();
    let typed = "shape12";

    c.bench_function("lookup_keystrokes_prefix", |b| {
        b.iter(|| {
            for end in 1..=typed.len() {
                black_box(table.lookup(&typed[..end]).count());
            }
        })
    });

    c.bench_function("lookup_substring_10k", |b| {
        b.iter(|| black_box(table.lookup_with("e99", MatchMode::Substring).count()))
    });
}

criterion_group!(benches, bench_load, bench_lookup);
criterion_main!(benches);
