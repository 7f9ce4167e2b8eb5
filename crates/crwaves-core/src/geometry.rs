// ─────────────────────────────────────────────────────────────────────
// CR Waves — Transport Geometry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Planar slab and spherical halo discretizations of the height operator.
//!
//! Each variant owns its coefficient assembly, boundary rows, write-back and
//! volume weighting, so the solver loop never branches on the mode.

use crwaves_math::tridiag::solve_tridiagonal;
use crwaves_types::config::GeometryMode;
use crwaves_types::error::{CrwError, CrwResult};
use crwaves_types::units::{pow2, PARSEC};
use ndarray::{ArrayView1, ArrayViewMut1};
use std::f64::consts::PI;

/// Radius floor of the spherical geometric term.
pub const DEFAULT_R_FLOOR: f64 = 0.01 * PARSEC;

/// Reference disc radius of the planar volume integral.
pub const PLANAR_REFERENCE_RADIUS: f64 = 2.0 * PARSEC;

/// Diagonals and right-hand side of one slice's implicit step.
#[derive(Debug, Clone, PartialEq)]
pub struct TridiagonalSystem {
    pub central: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
    pub rhs: Vec<f64>,
}

impl TridiagonalSystem {
    pub fn with_size(n: usize) -> Self {
        TridiagonalSystem {
            central: vec![0.0; n],
            upper: vec![0.0; n.saturating_sub(1)],
            lower: vec![0.0; n.saturating_sub(1)],
            rhs: vec![0.0; n],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.central.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.central.is_empty()
    }

    pub fn solve(&self) -> CrwResult<Vec<f64>> {
        solve_tridiagonal(&self.central, &self.upper, &self.lower, &self.rhs)
    }
}

/// Inputs of one momentum slice along the height axis.
#[derive(Debug, Clone, Copy)]
pub struct SliceInputs<'a> {
    pub f: ArrayView1<'a, f64>,
    pub d_zz: ArrayView1<'a, f64>,
    pub q: ArrayView1<'a, f64>,
    pub z: ArrayView1<'a, f64>,
    pub dz: f64,
    pub dt: f64,
    /// Crank–Nicolson half step, `TimeStep::dt_half`
    pub dt_half: f64,
    /// Source weight: decay profile divided by the transport operator count
    pub source_weight: f64,
}

/// Operator coefficients of one row, U/C/L of the discretized
/// ∂/∂z(D ∂f/∂z) [+ 2D/r ∂f/∂z].
#[derive(Debug, Clone, Copy, PartialEq)]
struct RowCoefficients {
    upper: f64,
    central: f64,
    lower: f64,
}

fn diffusion_coefficients(d_zz: &ArrayView1<'_, f64>, iz: usize, dz: f64) -> RowCoefficients {
    let n = d_zz.len();
    let d = d_zz[iz];
    let d_up = if iz + 1 < n { d_zz[iz + 1] } else { d };
    let d_do = if iz > 0 { d_zz[iz - 1] } else { d };
    let d_dz2 = d / pow2(dz);
    let dd_4dz2 = (d_up - d_do) / 4.0 / pow2(dz);
    RowCoefficients {
        upper: d_dz2 + dd_4dz2,
        central: 2.0 * d_dz2,
        lower: d_dz2 - dd_4dz2,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    /// Slab symmetric about the mid-plane; both height ends are fixed.
    Planar,
    /// Radial halo from the origin; the outer radius is fixed.
    Spherical { r_floor: f64 },
}

impl From<GeometryMode> for Geometry {
    fn from(mode: GeometryMode) -> Self {
        match mode {
            GeometryMode::Planar => Geometry::Planar,
            GeometryMode::Spherical => Geometry::Spherical {
                r_floor: DEFAULT_R_FLOOR,
            },
        }
    }
}

impl Geometry {
    pub fn mode(&self) -> GeometryMode {
        match self {
            Geometry::Planar => GeometryMode::Planar,
            Geometry::Spherical { .. } => GeometryMode::Spherical,
        }
    }

    /// First height index advanced by the implicit solve.
    pub fn first_row(&self) -> usize {
        match self {
            Geometry::Planar => 1,
            Geometry::Spherical { .. } => 0,
        }
    }

    /// Number of unknowns for a height axis of `z_size` samples.
    pub fn system_size(&self, z_size: usize) -> usize {
        match self {
            Geometry::Planar => z_size.saturating_sub(2),
            Geometry::Spherical { .. } => z_size.saturating_sub(1),
        }
    }

    /// Reject height axes too short for the implicit solve.
    pub fn check_size(&self, z_size: usize) -> CrwResult<()> {
        let n = self.system_size(z_size);
        if n < 2 {
            return Err(CrwError::ConfigError(format!(
                "{:?} transport needs at least 2 unknowns, height axis of {z_size} gives {n}",
                self.mode()
            )));
        }
        Ok(())
    }

    /// Crank–Nicolson system for one momentum slice.
    pub fn assemble(&self, inputs: &SliceInputs<'_>) -> CrwResult<TridiagonalSystem> {
        self.check_size(inputs.f.len())?;
        Ok(match self {
            Geometry::Planar => assemble_planar(inputs),
            Geometry::Spherical { r_floor } => assemble_spherical(inputs, *r_floor),
        })
    }

    /// Copy a solution back into the slice, clamped to non-negative values.
    pub fn write_back(&self, solution: &[f64], mut f: ArrayViewMut1<'_, f64>) {
        let first = self.first_row();
        match self {
            Geometry::Planar => {
                // Mirror average about the mid-plane.
                let n = solution.len();
                for i in 0..n {
                    let value = 0.5 * (solution[i] + solution[n - 1 - i]);
                    f[first + i] = value.max(0.0);
                }
            }
            Geometry::Spherical { .. } => {
                for (i, value) in solution.iter().enumerate() {
                    f[first + i] = value.max(0.0);
                }
            }
        }
    }

    /// Height indices of the open outer faces.
    pub fn outer_faces(&self, z_size: usize) -> Vec<usize> {
        match self {
            Geometry::Planar => vec![0, z_size - 1],
            Geometry::Spherical { .. } => vec![z_size - 1],
        }
    }

    /// Height weight of the volume integral.
    #[inline]
    pub fn volume_weight(&self, z: f64) -> f64 {
        match self {
            Geometry::Planar => 1.0,
            Geometry::Spherical { .. } => pow2(z),
        }
    }

    /// Angular and areal prefactor of the volume integral.
    pub fn volume_prefactor(&self) -> f64 {
        match self {
            Geometry::Planar => 4.0 * pow2(PI) * pow2(PLANAR_REFERENCE_RADIUS),
            Geometry::Spherical { .. } => pow2(4.0 * PI),
        }
    }
}

fn assemble_planar(inputs: &SliceInputs<'_>) -> TridiagonalSystem {
    let z_size = inputs.f.len();
    let n = z_size - 2;
    let dt_half = inputs.dt_half;
    let mut sys = TridiagonalSystem::with_size(n);

    for iz in 1..z_size - 1 {
        let row = iz - 1;
        let c = diffusion_coefficients(&inputs.d_zz, iz, inputs.dz);
        sys.central[row] = 1.0 + dt_half * c.central;
        let upper = -dt_half * c.upper;
        let lower = -dt_half * c.lower;
        let f = &inputs.f;

        let mut rhs = f[iz] * (2.0 - sys.central[row]);
        if iz < z_size - 2 {
            sys.upper[row] = upper;
            rhs -= f[iz + 1] * upper;
        } else {
            rhs += inputs.dt * c.upper * f[iz + 1];
        }
        if iz > 1 {
            sys.lower[row - 1] = lower;
            rhs -= f[iz - 1] * lower;
        } else {
            rhs += inputs.dt * c.lower * f[iz - 1];
        }
        sys.rhs[row] = rhs + inputs.dt * inputs.q[iz] * inputs.source_weight;
    }
    sys
}

fn assemble_spherical(inputs: &SliceInputs<'_>, r_floor: f64) -> TridiagonalSystem {
    let z_size = inputs.f.len();
    let n = z_size - 1;
    let dt_half = inputs.dt_half;
    let mut sys = TridiagonalSystem::with_size(n);

    for iz in 0..z_size - 1 {
        let mut c = diffusion_coefficients(&inputs.d_zz, iz, inputs.dz);
        let r = inputs.z[iz].abs().max(r_floor);
        let geometric = inputs.d_zz[iz] / inputs.dz / r;
        c.upper += geometric;
        c.lower -= geometric;

        sys.central[iz] = 1.0 + dt_half * c.central;
        let upper = -dt_half * c.upper;
        let lower = -dt_half * c.lower;
        let f = &inputs.f;

        let mut rhs = f[iz] * (2.0 - sys.central[iz]);
        if iz == 0 {
            // Reflecting origin: the ghost below the origin mirrors f[1].
            sys.upper[0] = upper + lower;
            rhs -= f[1] * sys.upper[0];
        } else if iz < z_size - 2 {
            sys.upper[iz] = upper;
            rhs -= f[iz + 1] * upper;
        } else {
            rhs += inputs.dt * c.upper * f[iz + 1];
        }
        if iz > 0 {
            sys.lower[iz - 1] = lower;
            rhs -= f[iz - 1] * lower;
        }
        sys.rhs[iz] = rhs + inputs.dt * inputs.q[iz] * inputs.source_weight;
    }
    sys
}
