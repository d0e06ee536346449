use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use invasion_sim::mapgen::grid_map;
use invasion_sim::{ExecutionMode, Simulation, SimulationConfig};

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");

    for (label, execution) in [
        ("lockstep", ExecutionMode::Lockstep),
        ("concurrent", ExecutionMode::Concurrent),
    ] {
        for size in [8u32, 16, 32] {
            let config = SimulationConfig {
                seed: Some(0x5eed),
                max_rounds: 1_000,
                execution,
                ..SimulationConfig::default()
            };
            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, &size| {
                b.iter_batched(
                    || {
                        let aliens = size * size * 3 / 2;
                        Simulation::new(grid_map(size, size), aliens, config.clone())
                            .expect("benchmark world builds")
                    },
                    |simulation| simulation.run().expect("benchmark run completes"),
                    BatchSize::SmallInput,
                )
            });
        }
    }

    group.finish();
}

criterion_group!(simulation_benches, bench_simulation);
criterion_main!(simulation_benches);
