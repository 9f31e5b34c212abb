//! Iteration control shared by the CG solvers
//!
//! Both solvers stop on the first iteration whose residual norm drops strictly
//! below the tolerance, or after `max_iterations` iterations. Either way they
//! report how many iterations actually ran (1-indexed) and the residual norm
//! observed at that point.

use crate::error::{ReconError, Result};
use crate::linalg::SensingMatrix;

/// Residual-norm threshold used by the reconstruction pipeline
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Iteration cap used when the caller has no reason to reduce it
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Convergence threshold and iteration cap for one solve
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IterationControl {
    tolerance: f64,
    max_iterations: usize,
}

impl IterationControl {
    /// # Arguments
    /// * `tolerance` - Residual norm below which the iterate is accepted
    /// * `max_iterations` - Hard iteration cap, at least 1
    pub fn new(tolerance: f64, max_iterations: usize) -> Result<Self> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ReconError::InvalidTolerance { tolerance });
        }
        if max_iterations == 0 {
            return Err(ReconError::InvalidIterationBudget);
        }
        Ok(Self {
            tolerance,
            max_iterations,
        })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn is_converged(&self, residual_norm: f64) -> bool {
        residual_norm < self.tolerance
    }

    /// Build the report for a solve that stopped at `iteration`
    pub(crate) fn report(&self, iteration: usize, residual_norm: f64) -> IterationReport {
        let termination = if self.is_converged(residual_norm) {
            Termination::Converged
        } else {
            Termination::IterationLimit
        };
        IterationReport {
            iterations_run: iteration,
            final_residual_norm: residual_norm,
            termination,
        }
    }
}

impl Default for IterationControl {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Why a solve stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Residual norm fell below the tolerance
    Converged,
    /// Iteration cap reached first
    IterationLimit,
}

/// Diagnostics returned alongside the solution
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IterationReport {
    pub iterations_run: usize,
    pub final_residual_norm: f64,
    pub termination: Termination,
}

impl IterationReport {
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

/// Solution vector plus diagnostics
#[derive(Clone, Debug, PartialEq)]
pub struct Reconstruction {
    pub solution: Vec<f64>,
    pub report: IterationReport,
}

/// Shape and finiteness checks run once before any iteration
pub(crate) fn validate_inputs(h: &SensingMatrix, g: &[f64]) -> Result<()> {
    if g.len() != h.rows() {
        return Err(ReconError::DimensionMismatch {
            operation: "measured signal",
            expected: h.rows(),
            actual: g.len(),
        });
    }
    if !h.is_finite() {
        return Err(ReconError::NonFiniteInput {
            operand: "sensing matrix",
        });
    }
    if g.iter().any(|v| !v.is_finite()) {
        return Err(ReconError::NonFiniteInput {
            operand: "measured signal",
        });
    }
    Ok(())
}

/// `numerator / denominator`, or 0 when the denominator is exactly zero
#[inline]
pub(crate) fn guarded_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_budget() {
        assert!(matches!(
            IterationControl::new(1e-4, 0),
            Err(ReconError::InvalidIterationBudget)
        ));
    }

    #[test]
    fn test_rejects_bad_tolerance() {
        assert!(IterationControl::new(-1.0, 5).is_err());
        assert!(IterationControl::new(f64::NAN, 5).is_err());
        assert!(IterationControl::new(f64::INFINITY, 5).is_err());
        assert!(IterationControl::new(0.0, 5).is_ok());
    }

    #[test]
    fn test_default() {
        let control = IterationControl::default();
        assert_eq!(control.tolerance(), 1e-4);
        assert_eq!(control.max_iterations(), 10);
    }

    #[test]
    fn test_convergence_is_strict() {
        let control = IterationControl::new(1e-4, 3).unwrap();
        assert!(control.is_converged(9.9e-5));
        assert!(!control.is_converged(1e-4));
    }

    #[test]
    fn test_report_termination() {
        let control = IterationControl::new(1e-4, 3).unwrap();
        assert_eq!(control.report(1, 0.0).termination, Termination::Converged);
        let report = control.report(3, 0.5);
        assert_eq!(report.termination, Termination::IterationLimit);
        assert_eq!(report.iterations_run, 3);
        assert!(!report.converged());
    }

    #[test]
    fn test_guarded_ratio() {
        assert_eq!(guarded_ratio(3.0, 0.0), 0.0);
        assert_eq!(guarded_ratio(3.0, 2.0), 1.5);
    }

    #[test]
    fn test_validate_inputs() {
        let h = SensingMatrix::identity(2).unwrap();
        assert!(validate_inputs(&h, &[1.0, 2.0]).is_ok());
        assert!(matches!(
            validate_inputs(&h, &[1.0]),
            Err(ReconError::DimensionMismatch { expected: 2, actual: 1, .. })
        ));
        assert!(matches!(
            validate_inputs(&h, &[1.0, f64::NAN]),
            Err(ReconError::NonFiniteInput { operand: "measured signal" })
        ));
    }
}
