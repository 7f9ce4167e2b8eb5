// ─────────────────────────────────────────────────────────────────────
// CR Waves — Setup
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Axes, initial conditions and constant inputs of a run.
//!
//! `build_fields` runs the builders in dependency order: axes, Alfvén
//! speed, losses, source, f_cr, W_ISM, W_sg, then D_zz.

use crate::diagnostics::compute_source_luminosity;
use crate::diffusion::DiffusionModel;
use crate::geometry::Geometry;
use crate::physics::{alfven_speed, ionization_dp_dt, resonant_wavenumber, PROTON_REST_MOMENTUM};
use crwaves_types::config::{GeometryMode, SimulationConfig};
use crwaves_types::error::{CrwError, CrwResult};
use crwaves_types::state::{CrFields, GridAxis};
use crwaves_types::units::pow2;
use ndarray::Array2;

/// Height axis: [-H, H] for the slab, [0, H] for the sphere.
pub fn build_z_axis(config: &SimulationConfig) -> CrwResult<GridAxis> {
    let h = config.grid.halo_size();
    let z_min = match config.flags.geometry {
        GeometryMode::Planar => -h,
        GeometryMode::Spherical => 0.0,
    };
    GridAxis::linear(z_min, h, config.grid.z_size)
}

/// Log-spaced momentum axis.
pub fn build_p_axis(config: &SimulationConfig) -> CrwResult<GridAxis> {
    GridAxis::logarithmic(config.grid.p_min(), config.grid.p_max(), config.grid.p_size)
}

/// Streaming speed v_A · tanh(z / source size), pointing away from the source.
pub fn build_v_a(fields: &mut CrFields, config: &SimulationConfig) {
    let v_a = alfven_speed(config.plasma.magnetic_field(), config.plasma.ion_density());
    let size = config.source.size();
    let z = fields.z.values();
    for mut row in fields.v_a.rows_mut() {
        for (iz, v) in row.iter_mut().enumerate() {
            *v = v_a * (z[iz] / size).tanh();
        }
    }
}

/// Ionization momentum losses in the neutral halo gas.
pub fn build_energy_losses(fields: &mut CrFields, config: &SimulationConfig) {
    let n_h = config.plasma.neutral_density();
    let p = fields.p.values();
    for (ip, mut row) in fields.dp_dt.rows_mut().into_iter().enumerate() {
        row.fill(ionization_dp_dt(p[ip], n_h));
    }
}

/// Power-law Gaussian source, rescaled to the configured luminosity.
pub fn build_cr_source_term(fields: &mut CrFields, config: &SimulationConfig) -> CrwResult<()> {
    let slope = config.source.slope;
    let sigma = config.source.size();
    let p = fields.p.values().clone();
    let z = fields.z.values().clone();
    fields.q_cr = Array2::from_shape_fn(fields.shape(), |(ip, iz)| {
        (p[ip] / PROTON_REST_MOMENTUM).powf(-slope) * (-pow2(z[iz]) / (2.0 * pow2(sigma))).exp()
    });

    let target = config.source.luminosity();
    if target == 0.0 {
        fields.q_cr.fill(0.0);
        return Ok(());
    }
    let geometry = Geometry::from(config.flags.geometry);
    let shape_luminosity = compute_source_luminosity(fields, &geometry);
    if !shape_luminosity.is_finite() || shape_luminosity <= 0.0 {
        return Err(CrwError::PhysicsViolation(format!(
            "source profile has no resolvable luminosity ({shape_luminosity}); \
             is the source narrower than the height spacing?"
        )));
    }
    let scale = target / shape_luminosity;
    fields.q_cr.mapv_inplace(|q| q * scale);
    Ok(())
}

/// Empty halo.
pub fn build_f_cr(fields: &mut CrFields) {
    fields.f_cr.fill(0.0);
}

/// Kolmogorov background W_ISM(k) = (2/3)(η_B/k₀)(k/k₀)^(-5/3).
pub fn build_w_ism(fields: &mut CrFields, config: &SimulationConfig) {
    let b = config.plasma.magnetic_field();
    let eta_b = config.plasma.turbulence_level;
    let k0 = 1.0 / config.plasma.coherence_length();
    let p = fields.p.values();
    for (ip, mut row) in fields.w_ism.rows_mut().into_iter().enumerate() {
        let k = resonant_wavenumber(p[ip], b);
        row.fill(2.0 / 3.0 * eta_b / k0 * (k / k0).powf(-5.0 / 3.0));
    }
}

/// Self-generated waves start from the background.
pub fn build_w_sg(fields: &mut CrFields) {
    fields.w_sg.assign(&fields.w_ism);
}

pub fn build_d_zz(fields: &mut CrFields, config: &SimulationConfig) {
    DiffusionModel::from_config(config).compute_d_zz(fields);
}

/// Every field of a fresh run.
pub fn build_fields(config: &SimulationConfig) -> CrwResult<CrFields> {
    config.validate()?;
    let p = build_p_axis(config)?;
    let z = build_z_axis(config)?;
    let mut fields = CrFields::zeros(p, z);

    build_v_a(&mut fields, config);
    build_energy_losses(&mut fields, config);
    build_cr_source_term(&mut fields, config)?;
    build_f_cr(&mut fields);
    build_w_ism(&mut fields, config);
    build_w_sg(&mut fields);
    build_d_zz(&mut fields, config);

    fields.check_shapes()?;
    log::debug!(
        "built fields {}x{}: dz = {:.3e} m, dlnp = {:.4}",
        fields.p_size(),
        fields.z_size(),
        fields.dz,
        fields.dlnp
    );
    Ok(fields)
}
