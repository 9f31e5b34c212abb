//! Reconstruction configuration
//!
//! Loaded from a TOML file; every key is optional and falls back to the
//! defaults below.
//!
//! ```toml
//! matrix_dir = "Matrix"
//! output_path = "reconstruction.png"
//! tolerance = 1e-4
//!
//! [budget]
//! reduced_classes = [3, 6]
//! reduced_iterations = 1
//! full_iterations = 10
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReconError, Result};
use crate::logging::LogConfig;
use crate::solvers::control::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};

/// Iteration budget per signal-type class
///
/// Classes listed in `reduced_classes` get `reduced_iterations`; every other
/// class gets `full_iterations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterationBudget {
    pub reduced_classes: Vec<u32>,
    pub reduced_iterations: usize,
    pub full_iterations: usize,
}

impl Default for IterationBudget {
    fn default() -> Self {
        Self {
            reduced_classes: vec![3, 6],
            reduced_iterations: 1,
            full_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl IterationBudget {
    pub fn max_iterations(&self, class: u32) -> usize {
        if self.reduced_classes.contains(&class) {
            self.reduced_iterations
        } else {
            self.full_iterations
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    /// Directory holding `H-<id>.csv` / `H-<id>.csv.gz`
    pub matrix_dir: PathBuf,
    /// Where the PNG is written
    pub output_path: PathBuf,
    pub tolerance: f64,
    pub budget: IterationBudget,
    pub logging: LogConfig,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            matrix_dir: PathBuf::from("Matrix"),
            output_path: PathBuf::from("reconstruction.png"),
            tolerance: DEFAULT_TOLERANCE,
            budget: IterationBudget::default(),
            logging: LogConfig::default(),
        }
    }
}

impl ReconConfig {
    /// Load and validate a TOML configuration file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ReconError::Config {
            message: format!("Failed to read '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ReconError::Config {
            message: format!("Failed to parse TOML configuration: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ReconError::Config {
                message: format!("tolerance must be finite and non-negative, got {}", self.tolerance),
            });
        }
        if self.budget.reduced_iterations == 0 || self.budget.full_iterations == 0 {
            return Err(ReconError::Config {
                message: "iteration budgets must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
