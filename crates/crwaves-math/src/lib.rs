//! Numerical primitives for CR Waves.

pub mod tridiag;
