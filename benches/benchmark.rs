use battcrypt::hash;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const PASSWORD: &[u8] = b"correct horse battery staple";
const SALT: &[u8] = b"";

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash");

    // Mirrors the reference implementation's benchmark grid: time and
    // upgrade swept at 0..=4 with memory held at its three smallest
    // values. Higher memory costs are left out of the default run since
    // mem_blocks doubles every step, and the working table's allocation
    // grows with it; run them individually with `cargo bench -- hash/T4U0M4`
    // if needed.
    for memory in 0..=2_u64 {
        for time in 0..=4_u64 {
            let id = format!("T{time}U0M{memory}");
            group.bench_function(id, |b| {
                b.iter(|| black_box(hash(PASSWORD, SALT, time, 0, memory).unwrap()))
            });
        }
    }

    for upgrade in 0..=4_u64 {
        let id = format!("T0U{upgrade}M0");
        group.bench_function(id, |b| {
            b.iter(|| black_box(hash(PASSWORD, SALT, 0, upgrade, 0).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
