// ─────────────────────────────────────────────────────────────────────
// CR Waves — Units
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Physical constants and units. Everything is stored internally in SI;
//! multiply by a unit to convert into SI, divide to convert out of it.

/// Meter.
pub const METER: f64 = 1.0;
/// Centimeter (m).
pub const CENTIMETER: f64 = 1e-2;
/// Parsec (m).
pub const PARSEC: f64 = 3.085_677_581_491_367e16;
/// Kiloparsec (m).
pub const KPC: f64 = 1e3 * PARSEC;

/// Second.
pub const SECOND: f64 = 1.0;
/// Julian year (s).
pub const YEAR: f64 = 3.155_76e7;
/// Kiloyear (s).
pub const KYR: f64 = 1e3 * YEAR;
/// Megayear (s).
pub const MYR: f64 = 1e6 * YEAR;

/// Erg (J).
pub const ERG: f64 = 1e-7;
/// Electronvolt (J).
pub const EV: f64 = 1.602_176_634e-19;
/// Gigaelectronvolt (J).
pub const GEV: f64 = 1e9 * EV;

/// Speed of light (m/s).
pub const C_LIGHT: f64 = 2.997_924_58e8;
/// Momentum unit GeV/c (kg m/s).
pub const GEV_C: f64 = GEV / C_LIGHT;

/// Proton mass (kg).
pub const PROTON_MASS: f64 = 1.672_621_923_69e-27;
/// Elementary charge (C).
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;
/// Vacuum permeability (H/m).
pub const MU0: f64 = 1.256_637_062_12e-6;

/// Gauss (T).
pub const GAUSS: f64 = 1e-4;
/// Microgauss (T).
pub const MICROGAUSS: f64 = 1e-6 * GAUSS;

/// Number density of one particle per cm³ (m⁻³).
pub const PER_CM3: f64 = 1e6;
/// Diffusion coefficient unit cm²/s (m²/s).
pub const CM2_PER_S: f64 = CENTIMETER * CENTIMETER / SECOND;

#[inline]
pub fn pow2(x: f64) -> f64 {
    x * x
}

#[inline]
pub fn pow3(x: f64) -> f64 {
    x * x * x
}

#[inline]
pub fn pow4(x: f64) -> f64 {
    let x2 = x * x;
    x2 * x2
}
