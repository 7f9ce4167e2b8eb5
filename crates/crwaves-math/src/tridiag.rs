// ─────────────────────────────────────────────────────────────────────
// CR Waves — Tridiag
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Thomas algorithm for tridiagonal systems.
//!
//! Diagonals are passed in the compact layout used by the transport
//! solvers: the off-diagonals are one element shorter than the main one.

use crwaves_types::error::{CrwError, CrwResult};

/// Solve the tridiagonal system A x = rhs.
///
/// - `central`: main diagonal \[n\]
/// - `upper`: super-diagonal \[n-1\], `upper[i]` couples row i to x\[i+1\]
/// - `lower`: sub-diagonal \[n-1\], `lower[i]` couples row i+1 to x\[i\]
/// - `rhs`: right-hand side \[n\]
///
/// No pivoting. Diagonal dominance is the caller's responsibility; a zero
/// or non-finite pivot is reported as `CrwError::LinAlg` instead of being
/// propagated as NaN.
pub fn solve_tridiagonal(
    central: &[f64],
    upper: &[f64],
    lower: &[f64],
    rhs: &[f64],
) -> CrwResult<Vec<f64>> {
    let n = central.len();
    if n == 0 {
        return Err(CrwError::LinAlg("system size must be > 0".to_string()));
    }
    if rhs.len() != n || upper.len() + 1 != n || lower.len() + 1 != n {
        return Err(CrwError::LinAlg(format!(
            "inconsistent sizes: central={n}, upper={}, lower={}, rhs={}",
            upper.len(),
            lower.len(),
            rhs.len()
        )));
    }

    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];

    // Forward sweep
    let mut den = central[0];
    check_pivot(den, 0)?;
    if n > 1 {
        c_prime[0] = upper[0] / den;
    }
    d_prime[0] = rhs[0] / den;

    for i in 1..n {
        den = central[i] - lower[i - 1] * c_prime[i - 1];
        check_pivot(den, i)?;
        if i < n - 1 {
            c_prime[i] = upper[i] / den;
        }
        d_prime[i] = (rhs[i] - lower[i - 1] * d_prime[i - 1]) / den;
    }

    // Back substitution
    let mut x = vec![0.0; n];
    x[n - 1] = d_prime[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d_prime[i] - c_prime[i] * x[i + 1];
    }

    if let Some(bad) = x.iter().position(|v| !v.is_finite()) {
        return Err(CrwError::LinAlg(format!(
            "non-finite solution component at row {bad}"
        )));
    }
    Ok(x)
}

#[inline]
fn check_pivot(den: f64, row: usize) -> CrwResult<()> {
    if den == 0.0 || !den.is_finite() {
        return Err(CrwError::LinAlg(format!(
            "singular or ill-conditioned system: pivot {den} at row {row}"
        )));
    }
    Ok(())
}
