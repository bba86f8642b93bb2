use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tolk_abi::boc::{self, BocOptions};
use tolk_abi::prelude::*;

/// Complete binary tree of the given height, every cell carrying 64 bits
fn tree(height: u32, seed: u64) -> Cell {
    let mut b = CellBuilder::new();
    b.store_u64(seed).unwrap();
    if height > 0 {
        b.store_reference(tree(height - 1, seed * 2)).unwrap();
        b.store_reference(tree(height - 1, seed * 2 + 1)).unwrap();
    }
    b.build().unwrap()
}

fn boc_bench(c: &mut Criterion) {
    let root = tree(8, 1);
    let bytes = boc::serialize(&root, BocOptions::default());

    c.bench_function("boc_serialize", |b| {
        b.iter(|| boc::serialize(black_box(&root), BocOptions::default()))
    });
    c.bench_function("boc_deserialize", |b| {
        b.iter(|| boc::deserialize(black_box(&bytes)))
    });
}

fn tuple_stack_bench(c: &mut Criterion) {
    let items: Vec<TupleItem> = (0..64i64)
        .map(|i| match i % 3 {
            0 => TupleItem::Int(i.into()),
            1 => TupleItem::Null,
            _ => TupleItem::Cell(tree(1, i as u64)),
        })
        .collect();
    let cell = tolk_abi::tuple::serialize(&items).unwrap();

    c.bench_function("stack_serialize", |b| {
        b.iter(|| tolk_abi::tuple::serialize(black_box(&items)))
    });
    c.bench_function("stack_deserialize", |b| {
        b.iter(|| tolk_abi::tuple::deserialize(black_box(&cell)))
    });
}

criterion_group!(benches, boc_bench, tuple_stack_bench);
criterion_main!(benches);
