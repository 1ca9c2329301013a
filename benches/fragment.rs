use criterion::{black_box, criterion_group, criterion_main, Criterion};

use groupfrag::{from_smiles, Catalog, Fragmenter, Identifier, Joback, JobackOptions, Model};

const HEXANE: &str = "CCCCCC";
const METHYLANTHRACENE: &str = "CC1=C2C=CC=CC2=CC3=CC=CC=C13";
const NMP: &str = "CN1CCCC1=O";
const DIPHENYLMETHANE: &str = "c1ccccc1Cc1ccccc1";
const STERANE: &str = "CC12C3CCC4CCC1C234";

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    group.bench_function("hexane", |b| {
        b.iter(|| black_box(from_smiles(black_box(HEXANE)).unwrap()))
    });
    group.bench_function("methylanthracene", |b| {
        b.iter(|| black_box(from_smiles(black_box(METHYLANTHRACENE)).unwrap()))
    });

    group.finish();
}

fn bench_catalog(c: &mut Criterion) {
    c.bench_function("catalog/load_unifac", |b| {
        b.iter(|| black_box(Catalog::load(black_box(Model::Unifac)).unwrap()))
    });
}

fn bench_fragment(c: &mut Criterion) {
    let unifac = Catalog::load(Model::Unifac).unwrap();
    let fragmenter = Fragmenter::new(&unifac);

    let mut group = c.benchmark_group("fragment");

    for (name, smiles) in [
        ("hexane", HEXANE),
        ("methylanthracene", METHYLANTHRACENE),
        ("nmp", NMP),
        ("diphenylmethane", DIPHENYLMETHANE),
        ("sterane", STERANE),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| black_box(fragmenter.fragment(Identifier::smiles(black_box(smiles))).unwrap()))
        });
    }

    group.finish();
}

fn bench_joback(c: &mut Criterion) {
    let catalog = Catalog::load(Model::Joback).unwrap();
    let joback = Joback::new(&catalog).unwrap();
    let groups = Fragmenter::new(&catalog)
        .fragment(Identifier::smiles("Cc1ccccc1"))
        .unwrap()
        .groups;
    let options = JobackOptions {
        temperature: Some(298.15),
        ..JobackOptions::default()
    };

    c.bench_function("joback/toluene", |b| {
        b.iter(|| black_box(joback.estimate(black_box(&groups), &options).unwrap()))
    });
}

criterion_group!(benches, bench_parse, bench_catalog, bench_fragment, bench_joback);
criterion_main!(benches);
