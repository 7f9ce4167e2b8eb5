// ─────────────────────────────────────────────────────────────────────
// CR Waves — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{CrwError, CrwResult};
use ndarray::{Array1, Array2};

/// Strictly increasing 1D sample axis, fixed once built.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxis {
    values: Array1<f64>,
}

impl GridAxis {
    /// Wrap precomputed samples. Needs at least two finite, strictly
    /// increasing values.
    pub fn new(values: Array1<f64>) -> CrwResult<Self> {
        if values.len() < 2 {
            return Err(CrwError::AxisError(format!(
                "axis needs at least 2 samples, got {}",
                values.len()
            )));
        }
        if let Some(bad) = values.iter().position(|v| !v.is_finite()) {
            return Err(CrwError::AxisError(format!(
                "axis sample {bad} is not finite"
            )));
        }
        for i in 1..values.len() {
            if values[i] <= values[i - 1] {
                return Err(CrwError::AxisError(format!(
                    "axis not strictly increasing at {i}: {} <= {}",
                    values[i],
                    values[i - 1]
                )));
            }
        }
        Ok(GridAxis { values })
    }

    /// `n` evenly spaced samples on [min, max].
    pub fn linear(min: f64, max: f64, n: usize) -> CrwResult<Self> {
        Self::new(Array1::linspace(min, max, n))
    }

    /// `n` log-spaced samples on [min, max]; both ends must be positive.
    pub fn logarithmic(min: f64, max: f64, n: usize) -> CrwResult<Self> {
        if !(min > 0.0 && max > 0.0) {
            return Err(CrwError::AxisError(format!(
                "logarithmic axis needs positive bounds, got [{min}, {max}]"
            )));
        }
        let axis = Array1::linspace(min.ln(), max.ln(), n).mapv(f64::exp);
        Self::new(axis)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn at(&self, i: usize) -> f64 {
        self.values[i]
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn first(&self) -> f64 {
        self.values[0]
    }

    pub fn last(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// Spacing of the first interval. Exact for linear axes.
    pub fn spacing(&self) -> f64 {
        self.values[1] - self.values[0]
    }

    /// Logarithmic spacing of the first interval. Exact for log axes.
    pub fn log_spacing(&self) -> f64 {
        (self.values[1] / self.values[0]).ln()
    }
}

/// CR distribution, wave field and their coefficients on the (p, z) grid.
///
/// Every field is indexed `[momentum-index, height-index]` with shape
/// `(p.len(), z.len())`. `f_cr` and `w_sg` are evolved state; `q_cr`,
/// `w_ism` and `dp_dt` are constant inputs; `d_zz`, `df_dz` and `v_a`
/// are derived and recomputed between solver calls.
#[derive(Debug, Clone)]
pub struct CrFields {
    pub p: GridAxis,
    pub z: GridAxis,
    pub f_cr: Array2<f64>,
    pub q_cr: Array2<f64>,
    pub w_ism: Array2<f64>,
    pub w_sg: Array2<f64>,
    pub d_zz: Array2<f64>,
    pub df_dz: Array2<f64>,
    pub dp_dt: Array2<f64>,
    pub v_a: Array2<f64>,
    /// Height spacing [m]
    pub dz: f64,
    /// Logarithmic momentum spacing
    pub dlnp: f64,
}

impl CrFields {
    /// All fields zeroed; spacings taken from the axes.
    pub fn zeros(p: GridAxis, z: GridAxis) -> Self {
        let shape = (p.len(), z.len());
        let dz = z.spacing();
        let dlnp = p.log_spacing();
        CrFields {
            p,
            z,
            f_cr: Array2::zeros(shape),
            q_cr: Array2::zeros(shape),
            w_ism: Array2::zeros(shape),
            w_sg: Array2::zeros(shape),
            d_zz: Array2::zeros(shape),
            df_dz: Array2::zeros(shape),
            dp_dt: Array2::zeros(shape),
            v_a: Array2::zeros(shape),
            dz,
            dlnp,
        }
    }

    #[inline]
    pub fn p_size(&self) -> usize {
        self.p.len()
    }

    #[inline]
    pub fn z_size(&self) -> usize {
        self.z.len()
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.p.len(), self.z.len())
    }

    /// Verify every field still matches the axes.
    pub fn check_shapes(&self) -> CrwResult<()> {
        let expected = self.shape();
        let fields: [(&'static str, &Array2<f64>); 8] = [
            ("f_cr", &self.f_cr),
            ("Q_cr", &self.q_cr),
            ("W_ISM", &self.w_ism),
            ("W_sg", &self.w_sg),
            ("D_zz", &self.d_zz),
            ("df_dz", &self.df_dz),
            ("dp_dt", &self.dp_dt),
            ("v_A", &self.v_a),
        ];
        for (field, array) in fields {
            if array.dim() != expected {
                return Err(CrwError::ShapeMismatch {
                    field,
                    expected,
                    found: array.dim(),
                });
            }
        }
        if !self.dz.is_finite() || self.dz <= 0.0 {
            return Err(CrwError::AxisError(format!(
                "dz must be finite and > 0, got {}",
                self.dz
            )));
        }
        if !self.dlnp.is_finite() || self.dlnp <= 0.0 {
            return Err(CrwError::AxisError(format!(
                "dlnp must be finite and > 0, got {}",
                self.dlnp
            )));
        }
        Ok(())
    }
}
