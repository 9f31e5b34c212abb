//! Error types for recon-wasm

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, solving or rendering a reconstruction
#[derive(Debug, Error)]
pub enum ReconError {
    /// Operand length inconsistent with the matrix shape
    #[error("Dimension mismatch in {operation}: expected length {expected}, got {actual}")]
    DimensionMismatch {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Matrix with a zero dimension
    #[error("Sensing matrix must be at least 1x1, got {rows}x{cols}")]
    EmptyMatrix { rows: usize, cols: usize },

    /// NaN or infinite value in a solver input
    #[error("Non-finite value in {operand}")]
    NonFiniteInput { operand: &'static str },

    /// Residual norm became NaN or infinite while iterating
    #[error("Residual norm is not finite after iteration {iteration}")]
    NumericDegeneracy { iteration: usize },

    /// Iteration cap of zero
    #[error("Iteration budget must be at least 1")]
    InvalidIterationBudget,

    /// Tolerance that is negative, NaN or infinite
    #[error("Tolerance must be finite and non-negative, got {tolerance}")]
    InvalidTolerance { tolerance: f64 },

    /// Sensing matrix file absent
    #[error("Matrix file not found at {}", path.display())]
    MatrixNotFound { path: PathBuf },

    /// Sensing matrix file present but unreadable as a dense numeric table
    #[error("Malformed matrix file {} (line {line}): {message}", path.display())]
    MalformedMatrix {
        path: PathBuf,
        line: u64,
        message: String,
    },

    /// Request payload failed validation
    #[error("Malformed request: {message}")]
    MalformedRequest { message: String },

    /// Configuration file failed to parse or validate
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// PNG encoding or writing failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReconError {
    pub(crate) fn malformed_request(message: impl Into<String>) -> Self {
        ReconError::MalformedRequest {
            message: message.into(),
        }
    }
}

/// Result type for reconstruction operations
pub type Result<T> = std::result::Result<T, ReconError>;
