//! Reconstruction pipeline
//!
//! request → sensing matrix → iteration budget → CGNR/CGNE → image or warning
//!
//! - `request`: typed, validated JSON request
//! - `matrix_io`: `H-<id>.csv(.gz)` loading
//! - `raster`: solution vector to 8-bit PNG
//! - `response`: `success` / `warning` / `error` result

pub mod matrix_io;
pub mod raster;
pub mod request;
pub mod response;

pub use request::{MatrixId, ReconstructionRequest, SignalClass};
pub use response::ReconstructionResponse;

use std::path::Path;

use tracing::{error, info, info_span, warn};

use crate::config::ReconConfig;
use crate::error::Result;
use crate::linalg::SensingMatrix;
use crate::solvers::{IterationControl, Reconstruction};

/// Solve one request against an already loaded matrix
///
/// Picks the iteration budget from the signal class, then runs the selected
/// solver with the configured tolerance.
pub fn solve_request(
    h: &SensingMatrix,
    request: &ReconstructionRequest,
    config: &ReconConfig,
) -> Result<Reconstruction> {
    let max_iterations = request.signal_class.iteration_budget(&config.budget);
    let control = IterationControl::new(config.tolerance, max_iterations)?;
    info!(
        algorithm = %request.algorithm,
        signal_class = request.signal_class.0,
        max_iterations,
        "solving"
    );
    request.algorithm.solve(h, &request.signal, &control)
}

/// Turn a finished solve into a response, writing the PNG when possible
pub fn render_outcome(reconstruction: &Reconstruction, output_path: &Path) -> Result<ReconstructionResponse> {
    let n = reconstruction.solution.len();
    let report = reconstruction.report;

    match raster::square_side(n) {
        Some(side) => {
            raster::write_png(&reconstruction.solution, side, output_path)?;
            Ok(ReconstructionResponse::Success {
                image_path: output_path.display().to_string(),
                iterations: report.iterations_run,
                final_error: report.final_residual_norm,
            })
        }
        None => {
            warn!(n, "solution length is not a perfect square, skipping image");
            Ok(ReconstructionResponse::Warning {
                message: format!(
                    "Reconstruction finished after {} iterations, but no image was generated \
                     (vector length {} is not a perfect square)",
                    report.iterations_run, n
                ),
            })
        }
    }
}

/// Load the matrix, solve and render one request
pub fn reconstruct(request: &ReconstructionRequest, config: &ReconConfig) -> Result<ReconstructionResponse> {
    let span = info_span!("reconstruct", id = request.id.as_deref().unwrap_or("-"), matrix = %request.matrix);
    let _guard = span.enter();

    let h = matrix_io::load_matrix(&config.matrix_dir, &request.matrix)?;
    let reconstruction = solve_request(&h, request, config)?;
    render_outcome(&reconstruction, &config.output_path)
}

/// Handle a raw JSON request; every failure becomes an `error` response
pub fn handle_json(input: &str, config: &ReconConfig) -> ReconstructionResponse {
    let outcome = ReconstructionRequest::from_json(input).and_then(|request| reconstruct(&request, config));
    match outcome {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "reconstruction failed");
            ReconstructionResponse::Error { message: e.to_string() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::{Algorithm, Termination};
    use approx::assert_abs_diff_eq;

    fn request(algorithm: Algorithm, class: u32, signal: Vec<f64>) -> ReconstructionRequest {
        ReconstructionRequest {
            id: None,
            matrix: MatrixId::new("1").unwrap(),
            signal,
            algorithm,
            signal_class: SignalClass(class),
        }
    }

    fn diagonal() -> SensingMatrix {
        SensingMatrix::from_rows(&[vec![2.0, 0.0], vec![0.0, 3.0]]).unwrap()
    }

    #[test]
    fn test_reduced_budget_classes() {
        let config = ReconConfig::default();
        for class in [3, 6] {
            for algorithm in [Algorithm::Cgnr, Algorithm::Cgne] {
                let result = solve_request(&diagonal(), &request(algorithm, class, vec![4.0, 9.0]), &config).unwrap();
                assert_eq!(result.report.iterations_run, 1);
                assert_eq!(result.report.termination, Termination::IterationLimit);
                assert!(result.report.final_residual_norm > config.tolerance);
            }
        }
    }

    #[test]
    fn test_full_budget_converges() {
        let config = ReconConfig::default();
        for algorithm in [Algorithm::Cgnr, Algorithm::Cgne] {
            let result = solve_request(&diagonal(), &request(algorithm, 1, vec![4.0, 9.0]), &config).unwrap();
            assert!(result.report.converged());
            assert!(result.report.iterations_run <= 3);
            assert_abs_diff_eq!(result.solution[0], 2.0, epsilon = 1e-8);
            assert_abs_diff_eq!(result.solution[1], 3.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_signal_length_mismatch() {
        let config = ReconConfig::default();
        let err = solve_request(&diagonal(), &request(Algorithm::Cgnr, 1, vec![1.0, 2.0, 3.0]), &config).unwrap_err();
        assert!(matches!(err, crate::error::ReconError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_non_square_solution_warns() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("out.png");
        let h = SensingMatrix::identity(10).unwrap();
        let config = ReconConfig::default();

        let result = solve_request(&h, &request(Algorithm::Cgne, 1, vec![1.0; 10]), &config).unwrap();
        let response = render_outcome(&result, &output).unwrap();

        assert!(matches!(response, ReconstructionResponse::Warning { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_square_solution_succeeds() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("out.png");
        let h = SensingMatrix::identity(4).unwrap();
        let config = ReconConfig::default();

        let result =
            solve_request(&h, &request(Algorithm::Cgnr, 1, vec![0.0, 1.0, 2.0, 3.0]), &config).unwrap();
        match render_outcome(&result, &output).unwrap() {
            ReconstructionResponse::Success { image_path, iterations, final_error } => {
                assert_eq!(image_path, output.display().to_string());
                assert_eq!(iterations, 1);
                assert!(final_error < 1e-4);
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert!(output.exists());
    }

    #[test]
    fn test_handle_json_reports_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ReconConfig {
            matrix_dir: dir.path().to_path_buf(),
            ..ReconConfig::default()
        };

        let response = handle_json("not json", &config);
        assert!(response.is_error());

        let response = handle_json(
            r#"{"typeMatrix": 5, "signalV": [1.0], "algorithm": 1, "typeSignal": 1}"#,
            &config,
        );
        match response {
            ReconstructionResponse::Error { message } => assert!(message.contains("H-5.csv")),
            other => panic!("expected error, got {other:?}"),
        }
    }
}
