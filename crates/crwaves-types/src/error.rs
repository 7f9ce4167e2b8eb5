use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrwError {
    #[error("Solver diverged at step {step}: {message}")]
    SolverDiverged { step: usize, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Field shape mismatch for {field}: expected {expected:?}, got {found:?}")]
    ShapeMismatch {
        field: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Axis error: {0}")]
    AxisError(String),

    #[error("Physics constraint violated: {0}")]
    PhysicsViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("NPZ write error: {0}")]
    Npz(#[from] ndarray_npy::WriteNpzError),

    #[error("Linear algebra error: {0}")]
    LinAlg(String),
}

pub type CrwResult<T> = Result<T, CrwError>;
