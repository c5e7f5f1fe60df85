//! Error types for klm_core

use thiserror::Error;

/// Errors raised while wiring up motion primitives
///
/// None of these surface while an animation is running. Runtime faults
/// (disposed subjects, missing observers, bad durations) are absorbed with
/// safe defaults; these variants only come out of construction-time
/// validation and configuration loading.
#[derive(Error, Debug)]
pub enum MotionError {
    /// The visibility-watching capability is not available in this runtime
    #[error("Visibility observer unavailable: {0}")]
    ObserverUnavailable(String),

    /// A visibility threshold outside (0, 1]
    #[error("Invalid visibility threshold: {0} (expected a value in (0, 1])")]
    InvalidThreshold(f64),

    /// Motion configuration could not be parsed or is inconsistent
    #[error("Invalid motion configuration: {0}")]
    Config(String),

    /// Failed to read a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for klm operations
pub type Result<T> = std::result::Result<T, MotionError>;
