// ─────────────────────────────────────────────────────────────────────
// CR Waves — Property-Based Tests (proptest) for crwaves-core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based and scenario tests of the evolution engine.
//!
//! Covers: non-negativity, mid-plane symmetry, stationarity of uniform
//! fields, damping-regime branching, wave decay, energy conservation and
//! convergence to the closed-form diffusion of a steady Gaussian source.

use crwaves_core::analytic::{build_analytic_test, AnalyticSolution, AnalyticTestSink};
use crwaves_core::diagnostics::compute_total_energy_in_fcr;
use crwaves_core::driver::Evolver;
use crwaves_core::dump::{NpzDumper, NullSink};
use crwaves_core::geometry::Geometry;
use crwaves_core::spatial::SpatialTransport;
use crwaves_core::splitting::{Operator, StepContext, TimeStep};
use crwaves_core::waves::{damping_rate, WaveSolver};
use crwaves_types::config::{DampingRegime, SimulationConfig};
use crwaves_types::state::{CrFields, GridAxis};
use crwaves_types::units::{ELEMENTARY_CHARGE, KYR, PARSEC, YEAR};
use ndarray::Array2;
use proptest::prelude::*;
use std::time::{SystemTime, UNIX_EPOCH};

fn grid(p_size: usize, z_min: f64, z_max: f64, z_size: usize) -> CrFields {
    let p = GridAxis::logarithmic(1.0, 10.0, p_size).unwrap();
    let z = GridAxis::linear(z_min, z_max, z_size).unwrap();
    CrFields::zeros(p, z)
}

fn ctx(dt: f64) -> StepContext {
    StepContext {
        step: 1,
        t_now: 0.0,
        time: TimeStep::new(dt).unwrap(),
        source_decay_time: 1.0,
        n_transport_ops: 1,
    }
}

fn unit_wave_solver(regime: DampingRegime) -> WaveSolver {
    WaveSolver {
        regime,
        magnetic_field: 1.0 / ELEMENTARY_CHARGE,
        factor_growth: 1.0,
        factor_damping: 1.0,
        ceiling: false,
    }
}

// ── Spatial Transport ────────────────────────────────────────────────

proptest! {
    /// f_cr stays non-negative and mirror-symmetric in the transported slab bins.
    #[test]
    fn planar_step_nonnegative_and_symmetric(
        seed_f in prop::collection::vec(0.0f64..10.0, 3 * 9),
        seed_d in prop::collection::vec(0.1f64..3.0, 3 * 9),
        q in 0.0f64..2.0,
        dt in 1e-3f64..1.0,
    ) {
        let mut fields = grid(3, -4.0, 4.0, 9);
        fields.f_cr = Array2::from_shape_vec((3, 9), seed_f).unwrap();
        fields.d_zz = Array2::from_shape_vec((3, 9), seed_d).unwrap();
        fields.q_cr.fill(q);
        let before_top = fields.f_cr.row(2).to_owned();

        SpatialTransport::new(Geometry::Planar).apply(&mut fields, &ctx(dt)).unwrap();

        prop_assert!(fields.f_cr.iter().all(|&v| v >= 0.0));
        for ip in 0..2 {
            for iz in 1..8 {
                prop_assert_eq!(fields.f_cr[[ip, iz]], fields.f_cr[[ip, 8 - iz]]);
            }
        }
        // The top momentum bin is a fixed boundary and keeps its values.
        prop_assert_eq!(fields.f_cr.row(2).to_owned(), before_top);
    }

    /// Radial steps never produce negative densities.
    #[test]
    fn spherical_step_nonnegative(
        seed_f in prop::collection::vec(0.0f64..10.0, 3 * 9),
        seed_d in prop::collection::vec(0.5f64..1.5, 3 * 9),
        dt in 1e-3f64..0.5,
    ) {
        let mut fields = grid(3, 0.0, 8.0, 9);
        fields.f_cr = Array2::from_shape_vec((3, 9), seed_f).unwrap();
        fields.d_zz = Array2::from_shape_vec((3, 9), seed_d).unwrap();
        let before_top = fields.f_cr.row(2).to_owned();

        SpatialTransport::new(Geometry::Spherical { r_floor: 0.01 })
            .apply(&mut fields, &ctx(dt))
            .unwrap();

        prop_assert!(fields.f_cr.iter().all(|&v| v >= 0.0));
        prop_assert_eq!(fields.f_cr.row(2).to_owned(), before_top);
    }

    /// A uniform field with uniform D and no source is stationary.
    #[test]
    fn uniform_field_is_fixed_point(
        level in 0.1f64..100.0,
        d in 0.01f64..10.0,
        dt in 1e-3f64..1.0,
        spherical in any::<bool>(),
    ) {
        let (geometry, z_min) = if spherical {
            (Geometry::Spherical { r_floor: 0.01 }, 0.0)
        } else {
            (Geometry::Planar, -5.0)
        };
        let mut fields = grid(4, z_min, z_min + 10.0, 11);
        fields.f_cr.fill(level);
        fields.d_zz.fill(d);

        SpatialTransport::new(geometry).apply(&mut fields, &ctx(dt)).unwrap();

        for &v in fields.f_cr.iter() {
            prop_assert!((v - level).abs() < 1e-10 * level, "{} vs {}", v, level);
        }
    }
}

// ── Waves ────────────────────────────────────────────────────────────

proptest! {
    /// Both damping formulas are evaluated as written and differ
    /// whenever k W ≠ 1.
    #[test]
    fn damping_regimes_are_distinct(k in 0.01f64..100.0, w in 0.01f64..100.0) {
        let kol = damping_rate(DampingRegime::Kolmogorov, 1.0, k, w);
        let kra = damping_rate(DampingRegime::Kraichnan, 1.0, k, w);
        prop_assert!((kol - k.powf(1.5) * w.sqrt()).abs() <= 1e-12 * kol);
        prop_assert!((kra - k * k * w).abs() <= 1e-12 * kra);
        if (k * w - 1.0).abs() > 1e-3 {
            prop_assert!(kol != kra);
        }
    }

    /// Without a CR gradient or background the wave field only decays.
    #[test]
    fn waves_decay_without_drive(
        seed_w in prop::collection::vec(0.0f64..1.0, 3 * 5),
        kraichnan in any::<bool>(),
    ) {
        let regime = if kraichnan { DampingRegime::Kraichnan } else { DampingRegime::Kolmogorov };
        let solver = unit_wave_solver(regime);
        let mut fields = grid(3, -1.0, 1.0, 5);
        fields.w_sg = Array2::from_shape_vec((3, 5), seed_w).unwrap();
        for _ in 0..20 {
            let before = fields.w_sg.clone();
            solver.evolve_with(&mut fields, 0.05, 1).unwrap();
            for (now, was) in fields.w_sg.iter().zip(before.iter()) {
                prop_assert!(*now <= *was);
                prop_assert!(*now >= 0.0);
            }
        }
    }
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn spike_diffuses_to_neighbours_only_in_its_bin() {
    let mut fields = grid(3, -2.0, 2.0, 5);
    fields.d_zz.fill(1.0);
    fields.f_cr[[1, 2]] = 1.0;

    SpatialTransport::new(Geometry::Planar)
        .apply(&mut fields, &ctx(0.01))
        .unwrap();

    let row = fields.f_cr.row(1);
    assert!(row[2] < 1.0 && row[2] > 0.9);
    assert!(row[1] > 0.0 && row[3] > 0.0);
    assert!((row.sum() - 1.0).abs() < 1e-3);
    assert!(fields.f_cr.row(0).iter().all(|&v| v == 0.0));
    assert!(fields.f_cr.row(2).iter().all(|&v| v == 0.0));
}

/// Slab with a Gaussian source, constant D and no wave feedback.
fn conservation_run(dt: f64, steps: usize, decay_time_kyr: f64) -> f64 {
    let mut config = SimulationConfig::default();
    config.flags.do_selfgeneration = false;
    config.source.decay_time_kyr = decay_time_kyr;
    config.run.max_steps = steps;
    config.run.dump_interval = steps + 1;

    let mut fields = grid(3, -10.0, 10.0, 41);
    fields.d_zz.fill(1.0);
    let z = fields.z.values().clone();
    for ip in 0..2 {
        for iz in 0..41 {
            fields.q_cr[[ip, iz]] = (-0.5 * z[iz] * z[iz]).exp();
        }
    }

    let mut evolver = Evolver::new(config, fields).unwrap();
    evolver.set_dt(dt).unwrap();
    let summary = evolver.evolve(&mut NullSink).unwrap();
    assert!(summary.final_status.f_cr.min >= 0.0);
    let recomputed = compute_total_energy_in_fcr(evolver.fields(), &Geometry::Planar);
    assert!((recomputed - summary.energy.in_crs).abs() <= 1e-12 * recomputed);
    summary.energy.ratio
}

#[test]
fn energy_tracks_constant_source() {
    // t₀ far beyond the run: L stays constant.
    let ratio = conservation_run(0.01, 100, 1e30);
    assert!((ratio - 1.0).abs() < 1e-4, "ratio = {ratio}");
}

#[test]
fn energy_error_shrinks_with_dt() {
    // t₀ = 1 s, comparable to the run length.
    let t0_kyr = 1.0 / KYR;
    let coarse = conservation_run(0.01, 100, t0_kyr);
    let fine = conservation_run(0.005, 200, t0_kyr);
    assert!((fine - 1.0).abs() < (coarse - 1.0).abs(), "{fine} vs {coarse}");
    assert!((coarse - 1.0).abs() < 1e-2);
}

// ── Closed-Form Reference ────────────────────────────────────────────

/// Relative deviation from the closed form after evolving a unit Gaussian
/// source (D = 1, σ = 1) to t = 2 on [z_min, 12].
fn analytic_error(geometry: Geometry, z_min: f64, z_size: usize, dt: f64) -> f64 {
    let solution = AnalyticSolution::new(geometry, 1.0, 1.0, 1.0).unwrap();
    let mut fields = grid(3, z_min, 12.0, z_size);
    solution.build(&mut fields);
    let transport = SpatialTransport::new(geometry);
    let steps = (2.0 / dt).round() as usize;
    for step in 1..=steps {
        let ctx = StepContext {
            step,
            t_now: step as f64 * dt,
            time: TimeStep::new(dt).unwrap(),
            source_decay_time: 1e30,
            n_transport_ops: 1,
        };
        transport.apply(&mut fields, &ctx).unwrap();
    }
    solution
        .compare(&fields, steps as f64 * dt)
        .relative_error()
}

#[test]
fn planar_transport_converges_to_closed_form() {
    let coarse = analytic_error(Geometry::Planar, -12.0, 49, 0.1);
    let fine = analytic_error(Geometry::Planar, -12.0, 97, 0.05);
    assert!(fine < 3e-3, "fine = {fine}");
    assert!(coarse > 3.0 * fine, "{coarse} vs {fine}");
}

#[test]
fn spherical_transport_converges_to_closed_form() {
    let sph = Geometry::Spherical { r_floor: 0.01 };
    let coarse = analytic_error(sph, 0.0, 25, 0.1);
    let fine = analytic_error(sph, 0.0, 49, 0.05);
    assert!(fine < 6e-2, "fine = {fine}");
    assert!(coarse > 3.0 * fine, "{coarse} vs {fine}");
}

#[test]
fn analytic_run_through_the_driver() {
    let mut config = SimulationConfig::default();
    config.grid.p_size = 3;
    config.grid.z_size = 81;
    config.grid.halo_size_kpc = 0.02;
    config.run.max_steps = 10;
    config.run.dump_interval = 5;

    let (mut evolver, solution) = build_analytic_test(&config).unwrap();
    assert_eq!(evolver.schedule().names(), vec!["spatial_transport"]);
    assert!((solution.sigma - PARSEC).abs() < 1.0);

    let epoch_ns = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("crwaves_analytic_run_{epoch_ns}"));
    let mut sink = AnalyticTestSink::new(solution, NpzDumper::new(&dir, "check").unwrap());
    let summary = evolver.evolve(&mut sink).unwrap();
    let written = sink.dumper().written().len();
    let _ = std::fs::remove_dir_all(&dir);

    assert_eq!(summary.dumps, 2);
    assert_eq!(written, 2);
    let comparisons = sink.comparisons();
    assert_eq!(comparisons.len(), 2);
    assert!((comparisons[1].t - 1.0 * YEAR).abs() < 1e-6 * YEAR);
    for cmp in comparisons {
        assert!(cmp.peak > 0.0);
        assert!(cmp.relative_error() < 2e-2, "{cmp:?}");
    }
}
