//! CGNR solver
//!
//! Conjugate gradient on the normal equations HᵗH f = Hᵗg, run in residual
//! space. The normal-equation residual z = Hᵗr is tracked alongside r, and
//! HᵗH is never formed. Each iteration costs one H·p and one Hᵗ·r.
//!
//! Works for rectangular H: for an inconsistent overdetermined system the
//! iterates approach the least-squares solution and the residual norm levels
//! off at ||g - H f*||.

use tracing::{debug, info};

use crate::error::{ReconError, Result};
use crate::linalg::{matvec, matvec_transpose, norm2, SensingMatrix};
use crate::solvers::control::{guarded_ratio, validate_inputs, IterationControl, Reconstruction};
use crate::utils::simd_ops::{axpy_f64, norm_squared_f64, xpby_f64};

/// CGNR reconstruction
///
/// # Arguments
/// * `h` - Sensing matrix (m × n)
/// * `g` - Measured signal (length m)
/// * `control` - Tolerance and iteration cap
///
/// # Returns
/// Solution (length n) and iteration report
pub fn cgnr(h: &SensingMatrix, g: &[f64], control: &IterationControl) -> Result<Reconstruction> {
    cgnr_with_progress(h, g, control, |_, _| {})
}

/// CGNR with progress callback
///
/// The callback receives (iteration, residual_norm) once per completed
/// iteration, 1-indexed.
pub fn cgnr_with_progress<F>(
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
    debug!(m, n, tolerance = control.tolerance(), max_iter = control.max_iterations(), "starting CGNR");

    let mut f = vec![0.0; n];
    let mut r = g.to_vec();

    // z = Hᵗr, p = z
    let mut p = matvec_transpose(h, &r)?;
    let mut norm_z_sq = norm_squared_f64(&p);

    let mut residual_norm = norm2(&r);

    for iter in 1..=control.max_iterations() {
        // w = H p
        let w = matvec(h, &p)?;
        let norm_w_sq = norm_squared_f64(&w);
        if norm_w_sq == 0.0 {
            debug!(iter, "H·p vanished, taking a zero step");
        }
        let alpha = guarded_ratio(norm_z_sq, norm_w_sq);

        // f = f + alpha*p, r = r - alpha*w
        axpy_f64(&mut f, alpha, &p);
        axpy_f64(&mut r, -alpha, &w);

        let z_next = matvec_transpose(h, &r)?;
        let norm_z_next_sq = norm_squared_f64(&z_next);
        let beta = guarded_ratio(norm_z_next_sq, norm_z_sq);

        // p = z_next + beta*p
        xpby_f64(&mut p, &z_next, beta);
        norm_z_sq = norm_z_next_sq;

        residual_norm = norm2(&r);
        if !residual_norm.is_finite() {
            return Err(ReconError::NumericDegeneracy { iteration: iter });
        }

        debug!(iter, residual_norm, "CGNR iteration");
        progress_callback(iter, residual_norm);

        if control.is_converged(residual_norm) {
            info!(iterations = iter, residual_norm, "CGNR converged");
            return Ok(Reconstruction {
                solution: f,
                report: control.report(iter, residual_norm),
            });
        }
    }

    info!(
        iterations = control.max_iterations(),
        residual_norm, "CGNR reached the iteration limit"
    );
    Ok(Reconstruction {
        solution: f,
        report: control.report(control.max_iterations(), residual_norm),
    })
}
