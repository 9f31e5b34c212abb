//! recon-wasm: CGNR/CGNE image reconstruction from projection measurements
//!
//! Solves H f = g for an image f given a dense sensing matrix H (m × n) and
//! measured signal g, using conjugate gradient on the normal equations. Runs
//! natively (the `recon` binary) or compiled to WebAssembly.
//!
//! # Modules
//! - `linalg`: Dense sensing matrix and H·v / Hᵗ·v / dot / norm primitives
//! - `solvers`: CGNR, CGNE and the shared iteration control
//! - `pipeline`: Request parsing, matrix loading, rasterization, responses
//! - `config`: TOML configuration
//! - `logging`: `tracing` subscriber setup
//! - `utils`: SIMD vector kernels (optional, with `simd` feature)

pub mod error;
pub mod linalg;
pub mod solvers;
pub mod utils;

pub mod config;
pub mod logging;
pub mod pipeline;

pub use error::ReconError;
pub use linalg::SensingMatrix;
pub use solvers::{Algorithm, IterationControl, IterationReport, Reconstruction, Termination};

use wasm_bindgen::prelude::*;

use crate::config::IterationBudget;
use crate::pipeline::request::{parse_algorithm, SignalClass};
use crate::solvers::control::DEFAULT_TOLERANCE;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

#[cfg(target_arch = "wasm32")]
macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! console_log {
    ($($t:tt)*) => (tracing::debug!($($t)*))
}

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// ============================================================================
// WASM Exports: Solvers
// ============================================================================

/// Solve with a flat row-major matrix, returning the packed result
///
/// Layout: `[f_0, .., f_{n-1}, iterations_run, final_residual_norm]`
fn solve_flat<F>(
    algorithm: Algorithm,
    matrix: &[f64],
    rows: usize,
    cols: usize,
    signal: &[f64],
    tol: f64,
    max_iter: usize,
    progress: F,
) -> error::Result<Vec<f64>>
where
    F: FnMut(usize, f64),
{
    let h = SensingMatrix::from_row_major(rows, cols, matrix.to_vec())?;
    let control = IterationControl::new(tol, max_iter)?;
    let reconstruction = algorithm.solve_with_progress(&h, signal, &control, progress)?;

    let mut result = reconstruction.solution;
    result.push(reconstruction.report.iterations_run as f64);
    result.push(reconstruction.report.final_residual_norm);
    Ok(result)
}

fn to_js_error(e: ReconError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// CGNR reconstruction
///
/// # Arguments
/// * `matrix` - Sensing matrix, row-major (rows * cols)
/// * `rows`, `cols` - Matrix dimensions (m measurements, n unknowns)
/// * `signal` - Measured signal (rows)
/// * `tol` - Residual norm tolerance
/// * `max_iter` - Maximum iterations (at least 1)
///
/// # Returns
/// Solution (cols) followed by iterations run and final residual norm
#[wasm_bindgen]
pub fn cgnr_wasm(
    matrix: &[f64],
    rows: usize,
    cols: usize,
    signal: &[f64],
    tol: f64,
    max_iter: usize,
) -> Result<Vec<f64>, JsValue> {
    console_log!("WASM CGNR: {}x{}, tol={:e}, max_iter={}", rows, cols, tol, max_iter);

    let result = solve_flat(Algorithm::Cgnr, matrix, rows, cols, signal, tol, max_iter, |_, _| {})
        .map_err(to_js_error)?;

    console_log!("WASM CGNR complete");
    Ok(result)
}

/// CGNR with progress callback
///
/// The callback receives (iteration, residualNorm) after every iteration.
#[wasm_bindgen]
pub fn cgnr_wasm_with_progress(
    matrix: &[f64],
    rows: usize,
    cols: usize,
    signal: &[f64],
    tol: f64,
    max_iter: usize,
    progress_callback: &js_sys::Function,
) -> Result<Vec<f64>, JsValue> {
    console_log!("WASM CGNR with progress: {}x{}, max_iter={}", rows, cols, max_iter);

    let callback = progress_callback.clone();
    let result = solve_flat(
        Algorithm::Cgnr, matrix, rows, cols, signal, tol, max_iter,
        |iter, residual| {
            let this = JsValue::null();
            let _ = callback.call2(&this, &JsValue::from(iter as u32), &JsValue::from(residual));
        }
    ).map_err(to_js_error)?;

    console_log!("WASM CGNR complete");
    Ok(result)
}

/// CGNE reconstruction
///
/// Same arguments and result layout as `cgnr_wasm`.
#[wasm_bindgen]
pub fn cgne_wasm(
    matrix: &[f64],
    rows: usize,
    cols: usize,
    signal: &[f64],
    tol: f64,
    max_iter: usize,
) -> Result<Vec<f64>, JsValue> {
    console_log!("WASM CGNE: {}x{}, tol={:e}, max_iter={}", rows, cols, tol, max_iter);

    let result = solve_flat(Algorithm::Cgne, matrix, rows, cols, signal, tol, max_iter, |_, _| {})
        .map_err(to_js_error)?;

    console_log!("WASM CGNE complete");
    Ok(result)
}

/// CGNE with progress callback
#[wasm_bindgen]
pub fn cgne_wasm_with_progress(
    matrix: &[f64],
    rows: usize,
    cols: usize,
    signal: &[f64],
    tol: f64,
    max_iter: usize,
    progress_callback: &js_sys::Function,
) -> Result<Vec<f64>, JsValue> {
    console_log!("WASM CGNE with progress: {}x{}, max_iter={}", rows, cols, max_iter);

    let callback = progress_callback.clone();
    let result = solve_flat(
        Algorithm::Cgne, matrix, rows, cols, signal, tol, max_iter,
        |iter, residual| {
            let this = JsValue::null();
            let _ = callback.call2(&this, &JsValue::from(iter as u32), &JsValue::from(residual));
        }
    ).map_err(to_js_error)?;

    console_log!("WASM CGNE complete");
    Ok(result)
}

// ============================================================================
// WASM Exports: Pipeline
// ============================================================================

fn reconstruct_flat(
    matrix: &[f64],
    rows: usize,
    cols: usize,
    signal: &[f64],
    algorithm: u32,
    signal_class: u32,
) -> error::Result<Vec<f64>> {
    let algorithm = parse_algorithm(&algorithm.to_string())?;
    let max_iter = SignalClass(signal_class).iteration_budget(&IterationBudget::default());
    solve_flat(algorithm, matrix, rows, cols, signal, DEFAULT_TOLERANCE, max_iter, |_, _| {})
}

/// In-memory reconstruction with the request-level selectors
///
/// # Arguments
/// * `matrix`, `rows`, `cols`, `signal` - As for `cgnr_wasm`
/// * `algorithm` - 1 = CGNR, 2 = CGNE
/// * `signal_class` - Signal-type class (3 and 6 run a single iteration)
///
/// # Returns
/// Solution followed by iterations run and final residual norm
#[wasm_bindgen]
pub fn reconstruct_wasm(
    matrix: &[f64],
    rows: usize,
    cols: usize,
    signal: &[f64],
    algorithm: u32,
    signal_class: u32,
) -> Result<Vec<f64>, JsValue> {
    console_log!("WASM reconstruct: {}x{}, algorithm={}, class={}", rows, cols, algorithm, signal_class);

    let result = reconstruct_flat(matrix, rows, cols, signal, algorithm, signal_class)
        .map_err(to_js_error)?;

    console_log!("WASM reconstruct complete");
    Ok(result)
}

/// Min-max normalize a solution to 8-bit intensities (row-major raster)
#[wasm_bindgen]
pub fn normalize_image_wasm(values: &[f64]) -> Vec<u8> {
    pipeline::raster::normalize_to_u8(values)
}

/// Get version string
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const DIAGONAL: [f64; 4] = [2.0, 0.0, 0.0, 3.0];

    #[test]
    fn test_version() {
        let version = get_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn test_cgnr_wasm_layout() {
        let result = cgnr_wasm(&DIAGONAL, 2, 2, &[4.0, 9.0], 1e-4, 10).unwrap();
        assert_eq!(result.len(), 4);
        assert_abs_diff_eq!(result[0], 2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(result[1], 3.0, epsilon = 1e-8);
        assert!(result[2] >= 1.0 && result[2] <= 3.0);
        assert!(result[3] < 1e-4);
    }

    #[test]
    fn test_cgne_wasm_layout() {
        let result = cgne_wasm(&DIAGONAL, 2, 2, &[4.0, 9.0], 1e-4, 10).unwrap();
        assert_abs_diff_eq!(result[0], 2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(result[1], 3.0, epsilon = 1e-8);
    }

    #[test]
    fn test_reconstruct_reduced_budget() {
        let result = reconstruct_wasm(&DIAGONAL, 2, 2, &[4.0, 9.0], 1, 3).unwrap();
        assert_eq!(result[2], 1.0);
        assert!(result[3] > 1e-4);
    }

    #[test]
    fn test_flat_errors() {
        assert!(matches!(
            solve_flat(Algorithm::Cgnr, &DIAGONAL, 2, 3, &[1.0, 1.0], 1e-4, 10, |_, _| {}),
            Err(ReconError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            solve_flat(Algorithm::Cgne, &DIAGONAL, 2, 2, &[1.0, 1.0], 1e-4, 0, |_, _| {}),
            Err(ReconError::InvalidIterationBudget)
        ));
        assert!(matches!(
            reconstruct_flat(&DIAGONAL, 2, 2, &[1.0, 1.0], 7, 1),
            Err(ReconError::MalformedRequest { .. })
        ));
    }

    #[test]
    fn test_normalize_image_wasm() {
        assert_eq!(normalize_image_wasm(&[1.0, 2.0]), vec![0, 255]);
    }
}
