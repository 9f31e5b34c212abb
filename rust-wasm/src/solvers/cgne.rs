//! CGNE solver
//!
//! Conjugate gradient on H Hᵗ y = g with f = Hᵗ y (Craig's method), written
//! directly in terms of f. The search direction is built from a fresh Hᵗr
//! after every residual update, and only ||r||² is carried between iterations.
//!
//! Mathematically it matches CGNR on consistent systems, but it follows its
//! own rounding trajectory and minimizes the error rather than the residual.
//! On inconsistent systems the residual is not monotone and can grow.

use tracing::{debug, info};

use crate::error::{ReconError, Result};
use crate::linalg::{matvec, matvec_transpose, SensingMatrix};
use crate::solvers::control::{guarded_ratio, validate_inputs, IterationControl, Reconstruction};
use crate::utils::simd_ops::{axpy_f64, norm_squared_f64, xpby_f64};

/// CGNE reconstruction
///
/// # Arguments
/// * `h` - Sensing matrix (m × n)
/// * `g` - Measured signal (length m)
/// * `control` - Tolerance and iteration cap
///
/// # Returns
/// Solution (length n) and iteration report
pub fn cgne(h: &SensingMatrix, g: &[f64], control: &IterationControl) -> Result<Reconstruction> {
    cgne_with_progress(h, g, control, |_, _| {})
}

/// CGNE with progress callback
///
/// The callback receives (iteration, residual_norm) once per completed
/// iteration, 1-indexed.
pub fn cgne_with_progress<F>(
    h: &SensingMatrix,
    g: &[f64],
    control: &IterationControl,
    mut progress_callback: F,
) -> Result<Reconstruction>
where
    F: FnMut(usize, f64),
{
    validate_inputs(h, g)?;
    let (m, n) = h.shape();
    debug!(m, n, tolerance = control.tolerance(), max_iter = control.max_iterations(), "starting CGNE");

    let mut f = vec![0.0; n];
    let mut r = g.to_vec();
    let mut p = matvec_transpose(h, &r)?;
    let mut rsold = norm_squared_f64(&r);

    let mut error = rsold.sqrt();

    for iter in 1..=control.max_iterations() {
        let pp = norm_squared_f64(&p);
        if pp == 0.0 {
            debug!(iter, "search direction vanished, taking a zero step");
        }
        let alpha = guarded_ratio(rsold, pp);

        // f = f + alpha*p
        axpy_f64(&mut f, alpha, &p);

        // r = r - alpha*H*p
        let hp = matvec(h, &p)?;
        axpy_f64(&mut r, -alpha, &hp);

        let rsnew = norm_squared_f64(&r);
        error = rsnew.sqrt();
        if !error.is_finite() {
            return Err(ReconError::NumericDegeneracy { iteration: iter });
        }

        debug!(iter, residual_norm = error, "CGNE iteration");
        progress_callback(iter, error);

        if control.is_converged(error) {
            info!(iterations = iter, residual_norm = error, "CGNE converged");
            return Ok(Reconstruction {
                solution: f,
                report: control.report(iter, error),
            });
        }

        let beta = guarded_ratio(rsnew, rsold);

        // p = Hᵗr + beta*p
        let htr = matvec_transpose(h, &r)?;
        xpby_f64(&mut p, &htr, beta);

        rsold = rsnew;
    }

    info!(
        iterations = control.max_iterations(),
        residual_norm = error,
        "CGNE reached the iteration limit"
    );
    Ok(Reconstruction {
        solution: f,
        report: control.report(control.max_iterations(), error),
    })
}
