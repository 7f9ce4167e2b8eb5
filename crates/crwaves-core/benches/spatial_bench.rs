// ─────────────────────────────────────────────────────────────────────
// CR Waves — Spatial Transport Benchmark
// © 1998–2026 Miroslav Šotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

use criterion::{criterion_group, criterion_main, Criterion};
use crwaves_core::driver::Evolver;
use crwaves_core::spatial::SpatialTransport;
use crwaves_core::splitting::{Operator, StepContext, TimeStep};
use crwaves_types::config::{GeometryMode, SimulationConfig};
use std::hint::black_box;

fn reference_config(geometry: GeometryMode) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.flags.geometry = geometry;
    config
}

fn bench_spatial_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_transport");

    for (label, mode) in [
        ("planar_128x401", GeometryMode::Planar),
        ("spherical_128x401", GeometryMode::Spherical),
    ] {
        let config = reference_config(mode);
        group.bench_function(label, |b| {
            b.iter_batched(
                || {
                    let evolver =
                        Evolver::from_config(config.clone()).expect("setup should succeed");
                    evolver.fields().clone()
                },
                |mut fields| {
                    let ctx = StepContext {
                        step: 1,
                        t_now: config.run.dt(),
                        time: TimeStep::new(config.run.dt()).expect("valid dt"),
                        source_decay_time: config.source.decay_time(),
                        n_transport_ops: 1,
                    };
                    SpatialTransport::from_config(&config)
                        .apply(&mut fields, &ctx)
                        .expect("step should succeed");
                    black_box(fields.f_cr[[0, 200]]);
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.bench_function("planar_100_steps", |b| {
        let mut config = reference_config(GeometryMode::Planar);
        config.flags.do_selfgeneration = false;
        b.iter_batched(
            || Evolver::from_config(config.clone()).expect("setup should succeed"),
            |mut evolver| {
                for _ in 0..100 {
                    evolver.step().expect("step should succeed");
                }
                black_box(evolver.fields().f_cr[[0, 200]]);
            },
            criterion::BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_spatial_step);
criterion_main!(benches);
