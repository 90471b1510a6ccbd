//! Benchmarks for patch labeling and the spatial operators.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use landuse_evo::{
    compute::{Grid, OperatorRng, PatchLabeler, SpatialOperators},
    schema::{LabelingConfig, NeighborMode, OptimizationConfig},
};

fn landscape(size: usize) -> Grid {
    let config = OptimizationConfig {
        random_seed: Some(17),
        ..Default::default()
    };
    let operators = SpatialOperators::new(config).unwrap();
    let mut base = Grid::filled(size, size, 1);
    for row in 0..size {
        base.set(row, size / 2, 8);
    }
    operators
        .sample_population(&base, 1, &mut OperatorRng::new(17))
        .remove(0)
}

fn bench_label(c: &mut Criterion) {
    let mut group = c.benchmark_group("label");

    for size in [64, 128, 256, 512] {
        let grid = landscape(size);
        for mode in [NeighborMode::Four, NeighborMode::Eight] {
            let labeler = PatchLabeler::new(LabelingConfig {
                neighbor_mode: mode,
                ..Default::default()
            });
            group.bench_with_input(
                BenchmarkId::from_parameter(format!("{}x{}_{:?}", size, size, mode)),
                &grid,
                |b, grid| {
                    b.iter(|| labeler.label(black_box(grid)));
                },
            );
        }
    }

    group.finish();
}

fn bench_operators(c: &mut Criterion) {
    let mut group = c.benchmark_group("operators");
    let operators = SpatialOperators::new(OptimizationConfig::default()).unwrap();

    for size in [64, 256] {
        let a = landscape(size);
        let b = operators.sample_population(&a, 1, &mut OperatorRng::new(3)).remove(0);
        let mut rng = StdRng::seed_from_u64(0);

        group.bench_function(BenchmarkId::new("crossover", size), |bench| {
            bench.iter(|| operators.crossover().cross(black_box(&a), black_box(&b), &mut rng));
        });
        group.bench_function(BenchmarkId::new("mutation", size), |bench| {
            bench.iter(|| operators.mutation().mutate(black_box(&a), &mut rng));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_label, bench_operators);
criterion_main!(benches);
