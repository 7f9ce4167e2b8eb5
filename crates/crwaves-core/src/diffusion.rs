// ─────────────────────────────────────────────────────────────────────
// CR Waves — Diffusion Coefficient
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Quasi-linear D_zz from the wave field, and the CR gradient that drives
//! wave growth.

use crate::geometry::Geometry;
use crate::physics::{beta, larmor_radius};
use crwaves_types::config::SimulationConfig;
use crwaves_types::state::CrFields;
use crwaves_types::units::{pow2, C_LIGHT};
use ndarray::parallel::prelude::*;
use ndarray::Axis;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffusionModel {
    pub geometry: Geometry,
    /// Regular magnetic field B [T]
    pub magnetic_field: f64,
    /// Ceiling of D_zz, also used where the wave field vanishes [m²/s]
    pub d_zz_max: f64,
}

impl DiffusionModel {
    pub fn from_config(config: &SimulationConfig) -> Self {
        DiffusionModel {
            geometry: Geometry::from(config.flags.geometry),
            magnetic_field: config.plasma.magnetic_field(),
            d_zz_max: config.plasma.d_zz_max(),
        }
    }

    /// D = (4/3π) v r_L / (k W) with k = 1/r_L, capped at `d_zz_max`.
    pub fn diffusion_coefficient(&self, p: f64, w: f64) -> f64 {
        if w <= 0.0 {
            return self.d_zz_max;
        }
        let r_l = larmor_radius(p, self.magnetic_field);
        let v = beta(p) * C_LIGHT;
        let d = 4.0 / (3.0 * PI) * v * pow2(r_l) / w;
        d.min(self.d_zz_max)
    }

    /// Rebuild D_zz from W_sg.
    pub fn compute_d_zz(&self, fields: &mut CrFields) {
        let p = fields.p.values();
        let w_sg = &fields.w_sg;
        fields
            .d_zz
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(ip, mut row)| {
                for (iz, d) in row.iter_mut().enumerate() {
                    *d = self.diffusion_coefficient(p[ip], w_sg[[ip, iz]]);
                }
            });
    }

    /// |∂f/∂z|: centred inside, one-sided on the outer faces. The gradient
    /// vanishes at the spherical origin.
    pub fn compute_dfdz(&self, fields: &mut CrFields) {
        let z_size = fields.z_size();
        let dz = fields.dz;
        let origin_is_symmetric = matches!(self.geometry, Geometry::Spherical { .. });
        let f_cr = &fields.f_cr;
        fields
            .df_dz
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(ip, mut row)| {
                let f = f_cr.row(ip);
                row[0] = if origin_is_symmetric {
                    0.0
                } else {
                    (f[1] - f[0]).abs() / dz
                };
                for iz in 1..z_size - 1 {
                    row[iz] = (f[iz + 1] - f[iz - 1]).abs() / (2.0 * dz);
                }
                row[z_size - 1] = (f[z_size - 1] - f[z_size - 2]).abs() / dz;
            });
    }
}
