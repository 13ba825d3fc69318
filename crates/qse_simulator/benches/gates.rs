//! Gate-kernel benchmark.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use qse_simulator::{DensityOperatorSimulator, StateVectorSimulator};

fn apply_layer(sim: &mut StateVectorSimulator, n: usize) {
    for q in 0..n {
        sim.h(q, &[], false).unwrap();
    }
    for q in 0..n - 1 {
        sim.cnot(q, q + 1, &[], false).unwrap();
    }
    for q in 0..n {
        sim.rz(q, 0.37, &[], false).unwrap();
    }
}

fn bench_statevector_layer(c: &mut Criterion) {
    let mut group = c.benchmark_group("statevector_layer");

    for num_qubits in [4, 8, 12, 16] {
        group.bench_with_input(
            BenchmarkId::new("qubits", num_qubits),
            &num_qubits,
            |b, &n| {
                let mut sim = StateVectorSimulator::new(n).unwrap();
                b.iter(|| {
                    sim.reset();
                    apply_layer(&mut sim, n);
                })
            },
        );
    }

    group.finish();
}

fn bench_controlled_vs_plain(c: &mut Criterion) {
    let mut group = c.benchmark_group("controlled_vs_plain");
    let n = 12;

    group.bench_function("x_plain", |b| {
        let mut sim = StateVectorSimulator::new(n).unwrap();
        b.iter(|| sim.x(3, &[], false).unwrap())
    });

    group.bench_function("x_controlled", |b| {
        let mut sim = StateVectorSimulator::new(n).unwrap();
        b.iter(|| sim.x(3, &[0, 7], false).unwrap())
    });

    group.finish();
}

fn bench_density_gate(c: &mut Criterion) {
    let mut group = c.benchmark_group("density_gate");

    for num_qubits in [2, 4, 6] {
        group.bench_with_input(
            BenchmarkId::new("hadamard", num_qubits),
            &num_qubits,
            |b, &n| {
                let mut sim = DensityOperatorSimulator::new(n).unwrap();
                b.iter(|| sim.h(0, &[], false).unwrap())
            },
        );
    }

    group.finish();
}

fn bench_density_channel(c: &mut Criterion) {
    let mut group = c.benchmark_group("density_channel");

    for num_qubits in [2, 4, 6] {
        group.bench_with_input(
            BenchmarkId::new("depolarizing", num_qubits),
            &num_qubits,
            |b, &n| {
                let mut sim = DensityOperatorSimulator::new(n).unwrap();
                sim.h(0, &[], false).unwrap();
                b.iter(|| sim.depolarizing(0, 0.01).unwrap())
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_statevector_layer,
    bench_controlled_vs_plain,
    bench_density_gate,
    bench_density_channel,
);
criterion_main!(benches);
