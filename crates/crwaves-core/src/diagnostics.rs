// ─────────────────────────────────────────────────────────────────────
// CR Waves — Diagnostics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Energy bookkeeping, boundary leakage and stability numbers.
//!
//! Diagnostics only read the fields; nothing here feeds back into the state.

use crate::geometry::Geometry;
use crate::physics::resonant_wavenumber;
use crate::waves::{damping_rate, WaveSolver};
use crwaves_types::state::CrFields;
use crwaves_types::units::{pow2, pow3, C_LIGHT, ERG, SECOND};
use ndarray::Array2;

/// Closed range of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    pub min: f64,
    pub max: f64,
}

impl FieldRange {
    pub fn of(field: &Array2<f64>) -> Self {
        field.iter().fold(
            FieldRange {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            },
            |r, &v| FieldRange {
                min: r.min.min(v),
                max: r.max.max(v),
            },
        )
    }
}

/// Energy injected by the source against the energy held by CRs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyBalance {
    /// Source luminosity at t = 0 [W]
    pub luminosity: f64,
    /// L · t·t₀/(t + t₀) [J]
    pub injected: f64,
    /// Energy in f_cr [J]
    pub in_crs: f64,
    /// in_crs / injected, zero before any injection
    pub ratio: f64,
}

/// Largest stability numbers of the current fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourantNumbers {
    /// max D dt / dz²
    pub diffusion: f64,
    /// max Γ_D dt of the explicit wave update
    pub waves: f64,
}

/// Σ_z w(z) Σ_{p < p_max} p³ X(p, z) p c, scaled by the geometry
/// prefactor and dz · dlnp.
fn energy_integral(fields: &CrFields, field: &Array2<f64>, geometry: &Geometry) -> f64 {
    let p = fields.p.values();
    let z = fields.z.values();
    let p_bins = fields.p_size() - 1;
    let mut value = 0.0;
    for iz in 0..fields.z_size() {
        let i_p: f64 = (0..p_bins)
            .map(|ip| pow3(p[ip]) * field[[ip, iz]] * (p[ip] * C_LIGHT))
            .sum();
        value += geometry.volume_weight(z[iz]) * i_p;
    }
    value * geometry.volume_prefactor() * fields.dz * fields.dlnp
}

/// Total CR energy held in f_cr [J].
pub fn compute_total_energy_in_fcr(fields: &CrFields, geometry: &Geometry) -> f64 {
    energy_integral(fields, &fields.f_cr, geometry)
}

/// Power injected by Q_cr before time decay [W].
pub fn compute_source_luminosity(fields: &CrFields, geometry: &Geometry) -> f64 {
    energy_integral(fields, &fields.q_cr, geometry)
}

pub fn test_total_energy(fields: &CrFields, geometry: &Geometry, t: f64, t0: f64) -> EnergyBalance {
    let luminosity = compute_source_luminosity(fields, geometry);
    let injected = luminosity * (t * t0 / (t + t0));
    let in_crs = compute_total_energy_in_fcr(fields, geometry);
    let ratio = if injected > 0.0 { in_crs / injected } else { 0.0 };
    log::info!(" -- source term: {:.4e} erg/s", luminosity / (ERG / SECOND));
    log::info!(" -- injected: {:.4e} erg", injected / ERG);
    log::info!(" -- in CRs: {:.4e} erg / {:.6}", in_crs / ERG, ratio);
    EnergyBalance {
        luminosity,
        injected,
        in_crs,
        ratio,
    }
}

/// Σ|f_cr| over the open height faces and the top momentum bin.
pub fn test_boundary_conditions(fields: &CrFields, geometry: &Geometry) -> f64 {
    let (p_size, z_size) = fields.shape();
    let mut value = 0.0;
    for iz in geometry.outer_faces(z_size) {
        value += fields.f_cr.column(iz).iter().map(|f| f.abs()).sum::<f64>();
    }
    value += fields.f_cr.row(p_size - 1).iter().map(|f| f.abs()).sum::<f64>();
    log::info!(" -- total CRs at border: {value:.4e}");
    value
}

pub fn test_courant_conditions(fields: &CrFields, waves: &WaveSolver, dt: f64) -> CourantNumbers {
    let d_max = fields.d_zz.iter().cloned().fold(0.0, f64::max);
    let diffusion = d_max * dt / pow2(fields.dz);

    let p = fields.p.values();
    let mut wave_number: f64 = 0.0;
    for ((ip, _), &w) in fields.w_sg.indexed_iter() {
        let k = resonant_wavenumber(p[ip], waves.magnetic_field);
        let gamma = damping_rate(waves.regime, waves.factor_damping, k, w);
        wave_number = wave_number.max(gamma * dt);
    }

    log::info!(" -- Courant numbers: diffusion {diffusion:.3e}, waves {wave_number:.3e}");
    if wave_number > 1.0 {
        log::warn!("explicit wave update is unstable: Γ_D dt = {wave_number:.3e} > 1");
    }
    CourantNumbers {
        diffusion,
        waves: wave_number,
    }
}
