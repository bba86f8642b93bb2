use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tolk_abi::prelude::*;

fn wallet_abi() -> ContractAbi {
    ContractAbi::new(
        "Wallet",
        vec![
            TypeAbi::new(
                "Limits",
                vec![
                    Field::new("daily", TypeInfo::Coins),
                    Field::new("single", TypeInfo::optional(TypeInfo::Coins)),
                ],
            ),
            TypeAbi::new(
                "Storage",
                vec![
                    Field::new("seqno", TypeInfo::uint(32)),
                    Field::new("subwallet", TypeInfo::uint(32)),
                    Field::new("publicKey", TypeInfo::uint(256)),
                    Field::new("owner", TypeInfo::Address),
                    Field::new("limits", TypeInfo::cell_of(TypeInfo::struct_ref("Limits"))),
                    Field::new("active", TypeInfo::Bool),
                ],
            ),
        ],
    )
}

fn wallet_storage() -> ParsedObject {
    let limits = ParsedObject::new()
        .with("daily", 50_000_000_000u64)
        .with("single", ParsedValue::Null);
    ParsedObject::new()
        .with("seqno", 42)
        .with("subwallet", 698_983_191)
        .with("publicKey", u128::MAX)
        .with("owner", StdAddress::new(0, [0x5a; 32]))
        .with("limits", ParsedValue::nested("limits", limits))
        .with("active", true)
}

fn cell_codec_bench(c: &mut Criterion) {
    let abi = wallet_abi();
    let ty = abi.find_type("Storage").unwrap();
    let obj = wallet_storage();
    let cell = encode_data(&abi, ty, &obj).unwrap();

    c.bench_function("encode_data", |b| {
        b.iter(|| encode_data(&abi, ty, black_box(&obj)))
    });
    c.bench_function("parse_cell", |b| {
        b.iter(|| parse_cell(&abi, ty, black_box(&cell)))
    });
}

fn tuple_codec_bench(c: &mut Criterion) {
    let abi = wallet_abi();
    let ty = abi.find_type("Storage").unwrap();
    let obj = wallet_storage();
    let items = encode_tuple(&abi, ty, &obj).unwrap();

    c.bench_function("encode_tuple", |b| {
        b.iter(|| encode_tuple(&abi, ty, black_box(&obj)))
    });
    c.bench_function("parse_tuple", |b| {
        b.iter(|| parse_tuple(&abi, ty, &mut TupleReader::new(black_box(items.clone()))))
    });
}

fn path_bench(c: &mut Criterion) {
    let obj = wallet_storage();
    let flat = flatten(&obj);
    c.bench_function("flatten", |b| b.iter(|| flatten(black_box(&obj))));
    c.bench_function("unflatten", |b| b.iter(|| unflatten(black_box(&flat))));
}

criterion_group!(benches, cell_codec_bench, tuple_codec_bench, path_bench);
criterion_main!(benches);
