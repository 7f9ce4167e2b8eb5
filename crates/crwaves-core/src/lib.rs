//! Cosmic-ray and self-generated wave evolution engine.
//!
//! Setup and physics helpers, the three split operators (spatial
//! transport, momentum transport, wave growth/damping), diagnostics,
//! snapshot dumps and the time-stepping driver, plus a closed-form
//! reference run for the spatial transport.

pub mod analytic;
pub mod diagnostics;
pub mod diffusion;
pub mod driver;
pub mod dump;
pub mod geometry;
pub mod momentum;
pub mod physics;
pub mod setup;
pub mod spatial;
pub mod splitting;
pub mod waves;
