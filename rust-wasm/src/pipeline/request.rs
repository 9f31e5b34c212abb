//! Reconstruction request
//!
//! The JSON payload names the sensing matrix, carries the measured signal and
//! picks the algorithm and signal-type class. Keys follow the solver script
//! (`typeMatrix`, `signalV`, `algorithm`, `typeSignal`); the service DTO names
//! (`matrix`, `signalData`, `signal`) are accepted as aliases. Numeric fields
//! may arrive as integers, integral floats (`3.0`) or numeric strings.

use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::config::IterationBudget;
use crate::error::{ReconError, Result};
use crate::solvers::Algorithm;

/// Number or string, as sent by loosely typed clients
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Integer(v) => v.to_string(),
            // 3.0 formats as "3"; fractional values keep their '.' and fail to parse
            Scalar::Float(v) => v.to_string(),
            Scalar::Text(s) => s.trim().to_string(),
        }
    }
}

/// Sensing matrix identifier, interpolated into `H-<id>.csv`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatrixId(String);

impl MatrixId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(ReconError::malformed_request("matrix identifier is empty"));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ReconError::malformed_request(format!(
                "matrix identifier '{}' may only contain ASCII letters, digits, '-' or '_'",
                id
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatrixId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MatrixId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Scalar::deserialize(deserializer)?;
        MatrixId::new(raw.into_text()).map_err(serde::de::Error::custom)
    }
}

/// Signal-type class; decides the iteration budget
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignalClass(pub u32);

impl SignalClass {
    pub fn iteration_budget(self, budget: &IterationBudget) -> usize {
        budget.max_iterations(self.0)
    }
}

impl<'de> Deserialize<'de> for SignalClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = Scalar::deserialize(deserializer)?.into_text();
        text.parse::<u32>().map(SignalClass).map_err(|_| {
            serde::de::Error::custom(format!(
                "signal type class must be a non-negative integer, got '{}'",
                text
            ))
        })
    }
}

/// Parse an algorithm selector: 1 / "cgnr" or 2 / "cgne"
pub fn parse_algorithm(selector: &str) -> Result<Algorithm> {
    match selector.trim().to_ascii_lowercase().as_str() {
        "1" | "cgnr" => Ok(Algorithm::Cgnr),
        "2" | "cgne" => Ok(Algorithm::Cgne),
        other => Err(ReconError::malformed_request(format!(
            "unknown algorithm '{}', expected 1 (CGNR) or 2 (CGNE)",
            other
        ))),
    }
}

fn deserialize_algorithm<'de, D>(deserializer: D) -> std::result::Result<Algorithm, D::Error>
where
    D: Deserializer<'de>,
{
    let text = Scalar::deserialize(deserializer)?.into_text();
    parse_algorithm(&text).map_err(serde::de::Error::custom)
}

/// Validated reconstruction request
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ReconstructionRequest {
    /// Caller's job id, only used for log correlation
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "typeMatrix", alias = "matrix")]
    pub matrix: MatrixId,
    #[serde(rename = "signalV", alias = "signalData")]
    pub signal: Vec<f64>,
    #[serde(deserialize_with = "deserialize_algorithm")]
    pub algorithm: Algorithm,
    #[serde(rename = "typeSignal", alias = "signal")]
    pub signal_class: SignalClass,
}

impl ReconstructionRequest {
    /// Parse and validate a JSON request
    pub fn from_json(input: &str) -> Result<Self> {
        let request: Self = serde_json::from_str(input)
            .map_err(|e| ReconError::malformed_request(format!("could not decode JSON: {}", e)))?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.signal.is_empty() {
            return Err(ReconError::malformed_request("signal vector is empty"));
        }
        if let Some(idx) = self.signal.iter().position(|v| !v.is_finite()) {
            return Err(ReconError::malformed_request(format!(
                "signal vector has a non-finite value at index {}",
                idx
            )));
        }
        Ok(())
    }
}
