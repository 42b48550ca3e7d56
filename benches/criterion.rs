use criterion::{criterion_group, criterion_main, Criterion};
use kpcmp::{compare, CompareConfig, Keypoint, KeypointSet};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::f32::consts::PI;

const BLOCK_SIZE: usize = 128;

/// Roughly what SIFT produces for a KITTI frame.
fn sift_like_keypoints(n: usize) -> Vec<Keypoint> {
    let mut rng = Pcg64::from_seed([7; 32]);
    (0..n)
        .map(|_| {
            Keypoint::new(
                rng.gen_range(0.0..375.0),
                rng.gen_range(0.0..1242.0),
                rng.gen_range(1.0..30.0),
                rng.gen_range(-PI..PI),
                (0..BLOCK_SIZE).map(|_| rng.gen_range(0..=255)).collect(),
            )
        })
        .collect()
}

fn sift_like_text(n: usize) -> String {
    let set = KeypointSet::new(BLOCK_SIZE, sift_like_keypoints(n), 1e-3).unwrap();
    let mut out = Vec::new();
    set.write_to(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn parse(c: &mut Criterion) {
    let text = sift_like_text(2000);
    let config = CompareConfig::default();
    c.bench_function("parse_and_canonicalize_2000", |b| {
        b.iter(|| KeypointSet::parse(&text, &config).unwrap())
    });
}

fn canonicalize(c: &mut Criterion) {
    let mut keypoints = sift_like_keypoints(2000);
    keypoints.shuffle(&mut Pcg64::from_seed([8; 32]));
    c.bench_function("canonicalize_shuffled_2000", |b| {
        b.iter(|| KeypointSet::new(BLOCK_SIZE, keypoints.clone(), 1e-3).unwrap())
    });
}

fn diff(c: &mut Criterion) {
    let config = CompareConfig::default();
    let a = KeypointSet::new(BLOCK_SIZE, sift_like_keypoints(2000), 1e-3).unwrap();
    let b = a.clone();
    c.bench_function("compare_2000", |bench| {
        bench.iter(|| compare(&a, &b, &config).unwrap())
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = parse, canonicalize, diff
);
criterion_main!(benches);
