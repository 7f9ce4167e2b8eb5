// ─────────────────────────────────────────────────────────────────────
// CR Waves — Plasma Physics Helpers
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Single-particle and background-plasma quantities shared by the solvers.
//!
//! References:
//! - Evoli, Linden & Morlino, PRD 98, 063017 (2018)
//! - Ptuskin & Zirakashvili, A&A 403, 1 (2003)
//! - Mannheim & Schlickeiser, A&A 286, 983 (1994)

use crwaves_types::units::{
    pow2, pow3, C_LIGHT, ELEMENTARY_CHARGE, EV, MU0, PER_CM3, PROTON_MASS,
};
use std::f64::consts::PI;

/// Proton rest momentum m_p c [kg m/s].
pub const PROTON_REST_MOMENTUM: f64 = PROTON_MASS * C_LIGHT;

/// Ionization loss normalization, Mannheim & Schlickeiser Eq. 4.1 [eV/s per cm⁻³].
const IONIZATION_RATE_EV_S: f64 = 1.82e-7;

/// Threshold velocity of the ionization loss formula.
const IONIZATION_BETA0: f64 = 0.01;

/// Velocity over c of a proton with momentum `p`.
#[inline]
pub fn beta(p: f64) -> f64 {
    p / (pow2(p) + pow2(PROTON_REST_MOMENTUM)).sqrt()
}

/// Gyration radius r_L = p / (e B) of a singly charged particle.
#[inline]
pub fn larmor_radius(p: f64, magnetic_field: f64) -> f64 {
    p / (ELEMENTARY_CHARGE * magnetic_field)
}

/// Resonant wavenumber k = 1 / r_L.
#[inline]
pub fn resonant_wavenumber(p: f64, magnetic_field: f64) -> f64 {
    1.0 / larmor_radius(p, magnetic_field)
}

/// Ion Alfvén speed B / √(μ₀ n_i m_p).
pub fn alfven_speed(magnetic_field: f64, ion_density: f64) -> f64 {
    magnetic_field / (MU0 * ion_density * PROTON_MASS).sqrt()
}

/// Magnetic energy density B² / 2μ₀.
pub fn magnetic_energy_density(magnetic_field: f64) -> f64 {
    pow2(magnetic_field) / (2.0 * MU0)
}

/// Time profile of the source, normalized so that its integral from 0 to t
/// is t·t₀/(t + t₀): the injected energy saturates at L·t₀.
#[inline]
pub fn source_evolution(t: f64, t0: f64) -> f64 {
    pow2(t0 / (t + t0))
}

/// Prefactor of the streaming-instability growth term,
/// Γ_CR W = factor_growth · p⁴ |∂f/∂z| / k.
pub fn growth_factor(v_a: f64, magnetic_field: f64) -> f64 {
    16.0 * pow2(PI) / 3.0 * C_LIGHT * v_a.abs() / magnetic_energy_density(magnetic_field)
}

/// Prefactor of the nonlinear damping rate, c_K · v_A.
pub fn damping_factor(v_a: f64, damping_constant: f64) -> f64 {
    damping_constant * v_a.abs()
}

/// Ionization momentum-loss rate dp/dt (negative) of a proton with
/// momentum `p` in neutral hydrogen of density `n_neutral` [m⁻³].
pub fn ionization_dp_dt(p: f64, n_neutral: f64) -> f64 {
    if n_neutral <= 0.0 {
        return 0.0;
    }
    let b = beta(p);
    let coulomb = if b > IONIZATION_BETA0 {
        1.0 + 0.0185 * b.ln()
    } else {
        1.0
    };
    let de_dt = -IONIZATION_RATE_EV_S * EV * (n_neutral / PER_CM3) * coulomb * 2.0 * pow2(b)
        / (pow3(IONIZATION_BETA0) + 2.0 * pow3(b));
    de_dt / (b * C_LIGHT)
}
