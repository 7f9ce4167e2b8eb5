// ─────────────────────────────────────────────────────────────────────
// CR Waves — Self-Generated Waves
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Explicit growth and damping of the self-generated wave intensity W_sg.
//!
//! ∂W/∂t = Γ_CR W − Γ_D W + Γ_gal W_ISM, with streaming-instability growth
//! Γ_CR W ∝ p⁴ |∂f/∂z| / k and nonlinear damping chosen by `DampingRegime`.

use crate::physics::{alfven_speed, damping_factor, growth_factor, resonant_wavenumber};
use crate::splitting::StepContext;
use crwaves_types::config::{DampingRegime, SimulationConfig};
use crwaves_types::error::{CrwError, CrwResult};
use crwaves_types::state::CrFields;
use crwaves_types::units::{pow2, pow4};
use ndarray::parallel::prelude::*;
use ndarray::Axis;

/// Nonlinear damping rate Γ_D of waves of intensity `w` at wavenumber `k`.
///
/// The two regimes are distinct formulas, never a blend.
#[inline]
pub fn damping_rate(regime: DampingRegime, factor_damping: f64, k: f64, w: f64) -> f64 {
    match regime {
        DampingRegime::Kolmogorov => factor_damping * k.powf(1.5) * w.sqrt(),
        DampingRegime::Kraichnan => factor_damping * pow2(k) * w,
    }
}

/// Damping rate of the galactic background turbulence.
#[inline]
pub fn galactic_damping_rate(factor_damping: f64, k: f64, w_ism: f64) -> f64 {
    factor_damping * k.powf(1.5) * w_ism.sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveSolver {
    pub regime: DampingRegime,
    /// Regular magnetic field B [T]
    pub magnetic_field: f64,
    pub factor_growth: f64,
    pub factor_damping: f64,
    /// Cap W_sg at 1/k after every update
    pub ceiling: bool,
}

impl WaveSolver {
    pub fn from_config(config: &SimulationConfig) -> Self {
        let b = config.plasma.magnetic_field();
        let v_a = alfven_speed(b, config.plasma.ion_density());
        WaveSolver {
            regime: config.flags.damping,
            magnetic_field: b,
            factor_growth: growth_factor(v_a, b),
            factor_damping: damping_factor(v_a, config.plasma.damping_constant),
            ceiling: config.flags.wave_ceiling,
        }
    }

    /// Net source ∂W/∂t of one cell.
    #[inline]
    pub fn wave_source(&self, p: f64, w: f64, w_ism: f64, df_dz: f64) -> f64 {
        let k = resonant_wavenumber(p, self.magnetic_field);
        let growth = self.factor_growth / k * pow4(p) * df_dz;
        let gamma_d = damping_rate(self.regime, self.factor_damping, k, w);
        let gamma_gal = galactic_damping_rate(self.factor_damping, k, w_ism);
        growth - gamma_d * w + gamma_gal * w_ism
    }

    /// Forward-Euler update of every cell, split across `n_ops` operators.
    pub fn evolve_with(&self, fields: &mut CrFields, dt: f64, n_ops: usize) -> CrwResult<()> {
        let n_ops = n_ops.max(1) as f64;
        let p = fields.p.values();
        let w_ism = &fields.w_ism;
        let df_dz = &fields.df_dz;

        fields
            .w_sg
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .try_for_each(|(ip, mut w_row)| -> CrwResult<()> {
                let k = resonant_wavenumber(p[ip], self.magnetic_field);
                for (iz, w) in w_row.iter_mut().enumerate() {
                    let q_w = self.wave_source(p[ip], *w, w_ism[[ip, iz]], df_dz[[ip, iz]]);
                    let mut value = *w + dt * q_w / n_ops;
                    if !value.is_finite() {
                        return Err(CrwError::PhysicsViolation(format!(
                            "non-finite W_sg at ip={ip}, iz={iz}"
                        )));
                    }
                    if self.ceiling {
                        value = value.min(1.0 / k);
                    }
                    *w = value.max(0.0);
                }
                Ok(())
            })
    }

    /// Wave update of one scheduled step.
    pub fn evolve(&self, fields: &mut CrFields, ctx: &StepContext) -> CrwResult<()> {
        self.evolve_with(fields, ctx.time.dt(), 1)
            .map_err(|e| CrwError::SolverDiverged {
                step: ctx.step,
                message: format!("wave update: {e}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crwaves_types::state::GridAxis;
    use crwaves_types::units::{ELEMENTARY_CHARGE, GEV_C};
    use ndarray::Array2;

    fn solver(regime: DampingRegime) -> WaveSolver {
        WaveSolver {
            regime,
            magnetic_field: 1.0 / ELEMENTARY_CHARGE,
            factor_growth: 1.0,
            factor_damping: 1.0,
            ceiling: false,
        }
    }

    fn fields() -> CrFields {
        // With B = 1/e the wavenumber is 1/p.
        let p = GridAxis::logarithmic(0.25, 1.0, 3).unwrap();
        let z = GridAxis::linear(-1.0, 1.0, 5).unwrap();
        CrFields::zeros(p, z)
    }

    #[test]
    fn test_damping_regimes_differ() {
        let kol = damping_rate(DampingRegime::Kolmogorov, 1.0, 4.0, 1.0);
        let kra = damping_rate(DampingRegime::Kraichnan, 1.0, 4.0, 1.0);
        assert!((kol - 8.0).abs() < 1e-12);
        assert!((kra - 16.0).abs() < 1e-12);
        assert_ne!(kol, kra);
    }

    #[test]
    fn test_factors_from_config() {
        let cfg = SimulationConfig::default();
        let s = WaveSolver::from_config(&cfg);
        assert!(s.factor_growth > 0.0 && s.factor_damping > 0.0);
        assert_eq!(s.regime, DampingRegime::Kolmogorov);
        let k = resonant_wavenumber(GEV_C, s.magnetic_field);
        assert!(k > 0.0 && k.is_finite());
    }

    #[test]
    fn test_decay_without_gradient() {
        for regime in [DampingRegime::Kolmogorov, DampingRegime::Kraichnan] {
            let mut f = fields();
            f.w_sg = Array2::from_elem((3, 5), 0.5);
            let s = solver(regime);
            let mut previous = f.w_sg.clone();
            for _ in 0..50 {
                s.evolve_with(&mut f, 0.01, 1).unwrap();
                for (now, before) in f.w_sg.iter().zip(previous.iter()) {
                    assert!(*now <= *before, "{regime:?}: {now} > {before}");
                    assert!(*now >= 0.0);
                }
                previous = f.w_sg.clone();
            }
            assert!(f.w_sg.iter().all(|&w| w < 0.5));
        }
    }

    #[test]
    fn test_growth_from_gradient() {
        let mut f = fields();
        f.df_dz.fill(1.0);
        solver(DampingRegime::Kolmogorov)
            .evolve_with(&mut f, 0.1, 1)
            .unwrap();
        // W = 0: only growth p⁴ · p = p⁵ acts.
        let p = f.p.values().clone();
        for ip in 0..3 {
            let expected = 0.1 * p[ip].powi(5);
            assert!((f.w_sg[[ip, 2]] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_ceiling_caps_at_inverse_wavenumber() {
        let mut f = fields();
        f.df_dz.fill(1e6);
        let mut s = solver(DampingRegime::Kraichnan);
        s.ceiling = true;
        s.evolve_with(&mut f, 1.0, 1).unwrap();
        let p = f.p.values().clone();
        for ip in 0..3 {
            // 1/k = p
            assert!((f.w_sg[[ip, 0]] - p[ip]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_non_finite_gradient_is_reported() {
        let mut f = fields();
        f.df_dz[[1, 3]] = f64::NAN;
        let err = solver(DampingRegime::Kolmogorov)
            .evolve_with(&mut f, 0.1, 1)
            .expect_err("NaN gradient must fail");
        assert!(matches!(err, CrwError::PhysicsViolation(_)));
    }

    #[test]
    fn test_operator_share_halves_increment() {
        let mut a = fields();
        a.df_dz.fill(1.0);
        let mut b = a.clone();
        let s = solver(DampingRegime::Kraichnan);
        s.evolve_with(&mut a, 0.1, 1).unwrap();
        s.evolve_with(&mut b, 0.1, 2).unwrap();
        assert!((a.w_sg[[1, 1]] - 2.0 * b.w_sg[[1, 1]]).abs() < 1e-12);
    }
}
