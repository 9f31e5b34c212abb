//! Iterative solvers for image reconstruction
//!
//! This module provides the two conjugate-gradient variants used to solve
//! H f = g in the least-squares sense:
//! - CGNR: CG on the normal equations, residual space
//! - CGNE: CG on the normal equations of the second kind (Craig's method)
//!
//! Both share the stopping rule and report in `control`.

pub mod cgne;
pub mod cgnr;
pub mod control;

pub use cgne::*;
pub use cgnr::*;
pub use control::*;

use std::fmt;

use crate::error::Result;
use crate::linalg::SensingMatrix;

/// Which CG variant to run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Cgnr,
    Cgne,
}

impl Algorithm {
    /// Run the selected solver
    pub fn solve(
        self,
        h: &SensingMatrix,
        g: &[f64],
        control: &IterationControl,
    ) -> Result<Reconstruction> {
        self.solve_with_progress(h, g, control, |_, _| {})
    }

    /// Run the selected solver, reporting (iteration, residual_norm) per iteration
    pub fn solve_with_progress<F>(
        self,
        h: &SensingMatrix,
        g: &[f64],
        control: &IterationControl,
        progress_callback: F,
    ) -> Result<Reconstruction>
    where
        F: FnMut(usize, f64),
    {
        match self {
            Algorithm::Cgnr => cgnr_with_progress(h, g, control, progress_callback),
            Algorithm::Cgne => cgne_with_progress(h, g, control, progress_callback),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Cgnr => write!(f, "cgnr"),
            Algorithm::Cgne => write!(f, "cgne"),
        }
    }
}
