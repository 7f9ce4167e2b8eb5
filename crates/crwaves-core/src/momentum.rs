// ─────────────────────────────────────────────────────────────────────
// CR Waves — Momentum Transport
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Implicit momentum-loss step of f_cr, one tridiagonal system per
//! interior height bin.

use crate::geometry::TridiagonalSystem;
use crate::splitting::{Operator, StepContext};
use crwaves_types::config::SimulationConfig;
use crwaves_types::error::{CrwError, CrwResult};
use crwaves_types::state::CrFields;
use crwaves_types::units::pow2;
use ndarray::parallel::prelude::*;
use ndarray::{s, ArrayView1, Axis};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MomentumTransport {
    /// Include the adiabatic (∂v_A/∂z)/3 term
    pub adiabatic: bool,
}

impl MomentumTransport {
    pub fn new(adiabatic: bool) -> Self {
        MomentumTransport { adiabatic }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.flags.adiabatic_momentum_term)
    }
}

/// Inputs of one height column along the momentum axis.
struct ColumnInputs<'a> {
    f: ArrayView1<'a, f64>,
    dp_dt: ArrayView1<'a, f64>,
    p: ArrayView1<'a, f64>,
    /// ∂v_A/∂z per momentum bin, zero when the adiabatic term is off
    dvadz: Vec<f64>,
    dt: f64,
    dt_half: f64,
    source: ArrayView1<'a, f64>,
    source_weight: f64,
}

fn assemble_column(col: &ColumnInputs<'_>) -> TridiagonalSystem {
    let p_size = col.p.len();
    let n = p_size - 1;
    let dt_half = col.dt_half;
    let mut sys = TridiagonalSystem::with_size(n);

    for ip in 0..n {
        let ratio = col.p[ip + 1] / col.p[ip];
        let dp = col.p[ip + 1] - col.p[ip];
        let b_i = col.dvadz[ip] / 3.0 / (ratio - 1.0);
        let c = b_i - col.dp_dt[ip] / dp;
        let u = b_i - pow2(ratio) * col.dp_dt[ip + 1] / dp;

        sys.central[ip] = 1.0 + dt_half * c;
        let upper = -dt_half * u;
        let mut rhs = col.f[ip] * (2.0 - sys.central[ip]);
        if ip < n - 1 {
            sys.upper[ip] = upper;
            rhs -= col.f[ip + 1] * upper;
        } else {
            // Inflow from the fixed top momentum bin.
            rhs += col.dt * u * col.f[ip + 1];
        }
        // No coupling to lower momenta: the lower diagonal stays zero.
        sys.rhs[ip] = rhs + col.dt * col.source[ip] * col.source_weight;
    }
    sys
}

impl Operator for MomentumTransport {
    fn name(&self) -> &'static str {
        "momentum_transport"
    }

    fn injects_source(&self) -> bool {
        true
    }

    fn apply(&self, fields: &mut CrFields, ctx: &StepContext) -> CrwResult<()> {
        let z_size = fields.z_size();
        let p_size = fields.p_size();
        if p_size < 2 || z_size < 3 {
            return Err(CrwError::ConfigError(format!(
                "momentum transport needs at least 2 momenta and 3 heights, got {p_size}x{z_size}"
            )));
        }
        let dt = ctx.time.dt();
        let dt_half = ctx.time.dt_half();
        let source_weight = ctx.source_weight();
        let adiabatic = self.adiabatic;
        let p = fields.p.values().view();
        let z = fields.z.values().view();
        let dp_dt = &fields.dp_dt;
        let v_a = &fields.v_a;
        let q_cr = &fields.q_cr;

        fields
            .f_cr
            .slice_mut(s![.., 1..z_size - 1])
            .axis_iter_mut(Axis(1))
            .into_par_iter()
            .enumerate()
            .try_for_each(|(offset, mut f_col)| -> CrwResult<()> {
                let iz = offset + 1;
                let dvadz = if adiabatic {
                    let dz2 = z[iz + 1] - z[iz - 1];
                    (0..p_size)
                        .map(|ip| (v_a[[ip, iz + 1]] - v_a[[ip, iz - 1]]) / dz2)
                        .collect()
                } else {
                    vec![0.0; p_size]
                };
                let system = assemble_column(&ColumnInputs {
                    f: f_col.view(),
                    dp_dt: dp_dt.column(iz),
                    p: p.view(),
                    dvadz,
                    dt,
                    dt_half,
                    source: q_cr.column(iz),
                    source_weight,
                });
                let solution = system.solve().map_err(|e| CrwError::SolverDiverged {
                    step: ctx.step,
                    message: format!("momentum transport at iz={iz}: {e}"),
                })?;
                for (ip, value) in solution.iter().enumerate() {
                    f_col[ip] = value.max(0.0);
                }
                Ok(())
            })
    }
}
