use criterion::{Criterion, criterion_group, criterion_main};
use markdown_live_engine::editing::position::{document_len, to_absolute, to_structural};
use markdown_live_engine::tree_from_markup;
mod common;

fn bench_position_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("position");
    group.sample_size(10);

    let doc = tree_from_markup(&common::generate_markdown_content(100));
    let len = document_len(&doc);

    group.bench_function("to_structural_sweep", |b| {
        let mut d = doc.clone();
        b.iter(|| {
            for offset in (0..len).step_by(97) {
                std::hint::black_box(to_structural(&mut d, offset));
            }
        });
    });

    let mut d = doc.clone();
    let locations: Vec<_> = (0..len)
        .step_by(97)
        .map(|offset| to_structural(&mut d, offset))
        .collect();
    group.bench_function("to_absolute_sweep", |b| {
        b.iter(|| {
            for location in &locations {
                std::hint::black_box(to_absolute(&d, location));
            }
        });
    });

    let list = tree_from_markup(&common::generate_nested_list(300, 5));
    let list_len = document_len(&list);
    group.bench_function("nested_list_end", |b| {
        let mut d = list.clone();
        b.iter(|| std::hint::black_box(to_structural(&mut d, list_len)));
    });

    group.finish();
}

criterion_group!(benches, bench_position_mapping);
criterion_main!(benches);
