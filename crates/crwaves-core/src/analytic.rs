// ─────────────────────────────────────────────────────────────────────
// CR Waves — Analytic Transport Test
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Closed-form reference for the spatial transport: constant-D diffusion
//! of a Gaussian source switched on at t = 0 in an unbounded slab or
//! sphere.
//!
//! A Gaussian of variance σ² injected at age s has spread to variance
//! σ² + 2Ds, so with d = 1 (slab) or d = 3 (sphere)
//!
//!   f(r, t) = q₀ ∫₀ᵗ (σ² / (σ² + 2Ds))^(d/2) exp(−r² / 2(σ² + 2Ds)) ds.
//!
//! In u = σ² + 2Ds the integrand is smooth on [σ², σ² + 2Dt] and is
//! integrated with composite Simpson.

use crate::driver::Evolver;
use crate::dump::{NpzDumper, Snapshot, SnapshotSink};
use crate::geometry::Geometry;
use crate::setup::build_fields;
use crwaves_types::config::SimulationConfig;
use crwaves_types::error::{CrwError, CrwResult};
use crwaves_types::state::{CrFields, GridAxis};
use crwaves_types::units::{pow2, KYR};
use ndarray::Array1;

/// Simpson intervals of the source-age integral (even).
pub const QUADRATURE_INTERVALS: usize = 512;

/// Source decay time of analytic runs [kyr]; the source stays constant.
pub const STEADY_SOURCE_DECAY_KYR: f64 = 1e30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyticSolution {
    pub geometry: Geometry,
    /// Constant diffusion coefficient [m²/s]
    pub d_zz: f64,
    /// Source amplitude at the centre
    pub q0: f64,
    /// Gaussian width of the source [m]
    pub sigma: f64,
}

/// Largest deviation of the evolved f_cr from the closed form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyticComparison {
    /// Simulated time [s]
    pub t: f64,
    pub max_error: f64,
    /// Peak of the closed-form profile
    pub peak: f64,
}

impl AnalyticComparison {
    pub fn relative_error(&self) -> f64 {
        if self.peak > 0.0 {
            self.max_error / self.peak
        } else {
            self.max_error
        }
    }
}

impl AnalyticSolution {
    pub fn new(geometry: Geometry, d_zz: f64, q0: f64, sigma: f64) -> CrwResult<Self> {
        if !(d_zz.is_finite() && d_zz > 0.0) {
            return Err(CrwError::ConfigError(format!(
                "analytic test needs a finite D > 0, got {d_zz}"
            )));
        }
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(CrwError::ConfigError(format!(
                "analytic test needs a finite source width > 0, got {sigma}"
            )));
        }
        if !(q0.is_finite() && q0 >= 0.0) {
            return Err(CrwError::ConfigError(format!(
                "analytic test needs a finite source amplitude >= 0, got {q0}"
            )));
        }
        Ok(AnalyticSolution {
            geometry,
            d_zz,
            q0,
            sigma,
        })
    }

    /// Unit source of the configured width, diffusing at `d_zz_max`.
    pub fn from_config(config: &SimulationConfig) -> CrwResult<Self> {
        Self::new(
            Geometry::from(config.flags.geometry),
            config.plasma.d_zz_max(),
            1.0,
            config.source.size(),
        )
    }

    fn dimension(&self) -> f64 {
        match self.geometry {
            Geometry::Planar => 1.0,
            Geometry::Spherical { .. } => 3.0,
        }
    }

    #[inline]
    pub fn source(&self, r: f64) -> f64 {
        self.q0 * (-pow2(r) / (2.0 * pow2(self.sigma))).exp()
    }

    /// f at distance `r` from the centre, `t` after the source switched on.
    pub fn density(&self, r: f64, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        let u0 = pow2(self.sigma);
        let u1 = u0 + 2.0 * self.d_zz * t;
        let half_dim = 0.5 * self.dimension();
        let r2 = pow2(r);
        let kernel = |u: f64| (u0 / u).powf(half_dim) * (-r2 / (2.0 * u)).exp();

        let n = QUADRATURE_INTERVALS;
        let h = (u1 - u0) / n as f64;
        let mut sum = kernel(u0) + kernel(u1);
        for i in 1..n {
            let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += weight * kernel(u0 + i as f64 * h);
        }
        // ds = du / 2D
        self.q0 / (2.0 * self.d_zz) * sum * h / 3.0
    }

    /// Closed form sampled on a height axis.
    pub fn profile(&self, z: &GridAxis, t: f64) -> Array1<f64> {
        z.values().mapv(|zi| self.density(zi.abs(), t))
    }

    /// Empty halo, constant D and the Gaussian source in every bin.
    pub fn build(&self, fields: &mut CrFields) {
        fields.f_cr.fill(0.0);
        fields.d_zz.fill(self.d_zz);
        let source = fields.z.values().mapv(|zi| self.source(zi.abs()));
        for mut row in fields.q_cr.rows_mut() {
            row.assign(&source);
        }
    }

    /// Deviation over every transported momentum bin; the fixed top bin
    /// is skipped.
    pub fn compare(&self, fields: &CrFields, t: f64) -> AnalyticComparison {
        let exact = self.profile(&fields.z, t);
        let p_active = fields.p_size().saturating_sub(1);
        let mut max_error = 0.0f64;
        for row in fields.f_cr.rows().into_iter().take(p_active) {
            for (f, a) in row.iter().zip(exact.iter()) {
                max_error = max_error.max((f - a).abs());
            }
        }
        AnalyticComparison {
            t,
            max_error,
            peak: exact.iter().cloned().fold(0.0, f64::max),
        }
    }
}

/// Pure spatial transport of a steady source.
pub fn analytic_test_config(config: &SimulationConfig) -> SimulationConfig {
    let mut config = config.clone();
    config.flags.do_selfgeneration = false;
    config.flags.do_momentum_losses = false;
    config.source.decay_time_kyr = STEADY_SOURCE_DECAY_KYR;
    config
}

/// Evolver loaded with the analytic test problem, and its closed form.
pub fn build_analytic_test(config: &SimulationConfig) -> CrwResult<(Evolver, AnalyticSolution)> {
    let config = analytic_test_config(config);
    let solution = AnalyticSolution::from_config(&config)?;
    let mut fields = build_fields(&config)?;
    solution.build(&mut fields);
    log::info!(
        "analytic test: D = {:.3e} m2/s, source width {:.3e} m, {:?}",
        solution.d_zz,
        solution.sigma,
        solution.geometry.mode()
    );
    Ok((Evolver::new(config, fields)?, solution))
}

/// Compares every snapshot with the closed form and archives both.
#[derive(Debug)]
pub struct AnalyticTestSink {
    solution: AnalyticSolution,
    dumper: NpzDumper,
    comparisons: Vec<AnalyticComparison>,
}

impl AnalyticTestSink {
    pub fn new(solution: AnalyticSolution, dumper: NpzDumper) -> Self {
        AnalyticTestSink {
            solution,
            dumper,
            comparisons: Vec::new(),
        }
    }

    pub fn comparisons(&self) -> &[AnalyticComparison] {
        &self.comparisons
    }

    pub fn dumper(&self) -> &NpzDumper {
        &self.dumper
    }
}

impl SnapshotSink for AnalyticTestSink {
    fn write(&mut self, snapshot: &Snapshot<'_>) -> CrwResult<()> {
        let exact = self.solution.profile(&snapshot.fields.z, snapshot.t);
        let comparison = self.solution.compare(snapshot.fields, snapshot.t);
        log::info!(
            " - analytic test at {:.3} kyr: max |f - f_exact| = {:.4e} ({:.3e} of peak)",
            snapshot.t / KYR,
            comparison.max_error,
            comparison.relative_error()
        );
        self.dumper.write_analytic_test(snapshot, &exact)?;
        self.comparisons.push(comparison);
        Ok(())
    }
}
