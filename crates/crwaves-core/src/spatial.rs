// ─────────────────────────────────────────────────────────────────────
// CR Waves — Spatial Transport
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Implicit Crank–Nicolson diffusion of f_cr along the height axis.
//!
//! Every momentum bin below the top one is an independent tridiagonal
//! system, solved in parallel. The top bin is the fixed momentum boundary.

use crate::geometry::{Geometry, SliceInputs};
use crate::splitting::{Operator, StepContext};
use crwaves_types::config::SimulationConfig;
use crwaves_types::error::{CrwError, CrwResult};
use crwaves_types::state::CrFields;
use ndarray::parallel::prelude::*;
use ndarray::{s, Axis};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialTransport {
    pub geometry: Geometry,
}

impl SpatialTransport {
    pub fn new(geometry: Geometry) -> Self {
        SpatialTransport { geometry }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(Geometry::from(config.flags.geometry))
    }
}

impl Operator for SpatialTransport {
    fn name(&self) -> &'static str {
        "spatial_transport"
    }

    fn injects_source(&self) -> bool {
        true
    }

    fn geometry(&self) -> Option<Geometry> {
        Some(self.geometry)
    }

    fn apply(&self, fields: &mut CrFields, ctx: &StepContext) -> CrwResult<()> {
        self.geometry.check_size(fields.z_size())?;
        let p_active = fields.p_size().saturating_sub(1);
        let dz = fields.dz;
        let dt = ctx.time.dt();
        let dt_half = ctx.time.dt_half();
        let source_weight = ctx.source_weight();
        let geometry = self.geometry;
        let z = fields.z.values().view();
        let d_zz = &fields.d_zz;
        let q_cr = &fields.q_cr;

        fields
            .f_cr
            .slice_mut(s![..p_active, ..])
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .try_for_each(|(ip, mut f_row)| -> CrwResult<()> {
                let system = geometry.assemble(&SliceInputs {
                    f: f_row.view(),
                    d_zz: d_zz.row(ip),
                    q: q_cr.row(ip),
                    z: z.view(),
                    dz,
                    dt,
                    dt_half,
                    source_weight,
                })?;
                let solution = system.solve().map_err(|e| CrwError::SolverDiverged {
                    step: ctx.step,
                    message: format!("spatial transport at ip={ip}: {e}"),
                })?;
                geometry.write_back(&solution, f_row.view_mut());
                Ok(())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitting::TimeStep;
    use crwaves_types::state::GridAxis;
    use ndarray::Array2;

    fn spike_fields(z_min: f64) -> CrFields {
        let p = GridAxis::logarithmic(1.0, 100.0, 3).unwrap();
        let z = GridAxis::linear(z_min, z_min + 4.0, 5).unwrap();
        let mut fields = CrFields::zeros(p, z);
        fields.d_zz = Array2::from_elem((3, 5), 1.0);
        fields
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

    #[test]
    fn test_spike_spreads_and_conserves() {
        let mut fields = spike_fields(-2.0);
        fields.f_cr[[1, 2]] = 1.0;
        SpatialTransport::new(Geometry::Planar)
            .apply(&mut fields, &ctx(0.01))
            .unwrap();

        let row = fields.f_cr.row(1);
        assert!(row[2] < 1.0);
        assert!(row[1] > 0.0 && row[3] > 0.0);
        assert_eq!(row[1], row[3]);
        let mass: f64 = row.sum();
        assert!((mass - 1.0).abs() < 1e-3, "mass = {mass}");
        assert!(fields.f_cr.row(0).iter().all(|&v| v == 0.0));
        assert!(fields.f_cr.row(2).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_top_momentum_bin_untouched() {
        let mut fields = spike_fields(-2.0);
        fields.f_cr.row_mut(2).fill(0.5);
        fields.q_cr.fill(1.0);
        SpatialTransport::new(Geometry::Planar)
            .apply(&mut fields, &ctx(0.1))
            .unwrap();
        assert!(fields.f_cr.row(2).iter().all(|&v| v == 0.5));
        assert!(fields.f_cr[[0, 2]] > 0.0);
    }

    #[test]
    fn test_source_injection_rate() {
        // f = 0, uniform Q: each interior cell gains ≈ dt · Q.
        let mut fields = spike_fields(-2.0);
        fields.d_zz.fill(0.0);
        fields.q_cr.fill(2.0);
        SpatialTransport::new(Geometry::Planar)
            .apply(&mut fields, &ctx(0.5))
            .unwrap();
        for iz in 1..4 {
            assert!((fields.f_cr[[0, iz]] - 1.0).abs() < 1e-12);
        }
        assert_eq!(fields.f_cr[[0, 0]], 0.0);
        assert_eq!(fields.f_cr[[0, 4]], 0.0);
    }

    #[test]
    fn test_spherical_advances_origin() {
        let mut fields = spike_fields(0.0);
        fields.f_cr[[0, 1]] = 1.0;
        SpatialTransport::new(Geometry::Spherical { r_floor: 0.01 })
            .apply(&mut fields, &ctx(0.01))
            .unwrap();
        assert!(fields.f_cr[[0, 0]] > 0.0);
        assert!(fields.f_cr[[0, 1]] < 1.0);
        assert_eq!(fields.f_cr[[0, 4]], 0.0);
        assert!(fields.f_cr.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_short_height_axis_is_config_error() {
        let p = GridAxis::logarithmic(1.0, 100.0, 3).unwrap();
        let z = GridAxis::linear(0.0, 1.0, 2).unwrap();
        let mut fields = CrFields::zeros(p, z);
        fields.d_zz.fill(1.0);
        for geometry in [Geometry::Planar, Geometry::Spherical { r_floor: 0.01 }] {
            let err = SpatialTransport::new(geometry)
                .apply(&mut fields, &ctx(0.01))
                .expect_err("two heights cannot be transported");
            assert!(matches!(err, CrwError::ConfigError(_)), "{err:?}");
        }
    }

    #[test]
    fn test_reports_its_geometry() {
        let sph = Geometry::Spherical { r_floor: 0.01 };
        assert_eq!(SpatialTransport::new(sph).geometry(), Some(sph));
    }

    #[test]
    fn test_non_finite_coefficients_fail_fast() {
        let mut fields = spike_fields(-2.0);
        fields.d_zz[[0, 2]] = f64::NAN;
        let err = SpatialTransport::new(Geometry::Planar)
            .apply(&mut fields, &ctx(0.01))
            .expect_err("NaN diffusion must fail");
        match err {
            CrwError::SolverDiverged { step, message } => {
                assert_eq!(step, 1);
                assert!(message.contains("ip=0"));
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }
}
