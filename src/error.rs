//! Error types for conformance runs.
//!
//! Only failures that stop a case are represented here. A driver reporting
//! the wrong error code for an invalid call is a test outcome, recorded in
//! the `TestContext`, not an `Err`.

use crate::gl::ErrorCode;
use thiserror::Error;

/// Errors that abort a conformance case.
#[derive(Error, Debug)]
pub enum CaseError {
    /// A required extension is missing; the case cannot run.
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// A setup call (object creation, binding, allocation, query) raised an
    /// unexpected GL error.
    #[error("Setup failed: {step} (glGetError returned {code})")]
    Setup { step: String, code: ErrorCode },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reference driver rejected its configuration.
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}

impl CaseError {
    /// Creates a setup error for the given step.
    pub fn setup(step: impl Into<String>, code: ErrorCode) -> Self {
        CaseError::Setup {
            step: step.into(),
            code,
        }
    }
}

/// Reference driver configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DriverError {
    /// Texel size range is empty or non-positive.
    #[error("Invalid texel range {axis}: min {min}, max {max}")]
    InvalidTexelRange {
        axis: &'static str,
        min: i32,
        max: i32,
    },

    /// A limit that must be at least one was not.
    #[error("Invalid limit {name}: {value} (must be >= 1)")]
    InvalidLimit { name: &'static str, value: i32 },
}
