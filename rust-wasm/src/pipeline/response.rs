//! Structured reconstruction result, one JSON object tagged by `status`

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ReconstructionResponse {
    /// Image written
    Success {
        #[serde(rename = "imagePath")]
        image_path: String,
        iterations: usize,
        #[serde(rename = "finalError")]
        final_error: f64,
    },
    /// Solve finished but the solution could not be shown as a square image
    Warning { message: String },
    Error { message: String },
}

impl ReconstructionResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, ReconstructionResponse::Error { .. })
    }

    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => format!(
                r#"{{"status":"error","message":"could not encode response: {}"}}"#,
                e.to_string().replace('"', "'")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_success_shape() {
        let response = ReconstructionResponse::Success {
            image_path: "reconstruction.png".to_string(),
            iterations: 4,
            final_error: 2.5e-5,
        };
        let value: Value = serde_json::from_str(&response.to_json()).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "success",
                "imagePath": "reconstruction.png",
                "iterations": 4,
                "finalError": 2.5e-5
            })
        );
    }

    #[test]
    fn test_warning_and_error_shape() {
        let warning: Value = serde_json::from_str(
            &ReconstructionResponse::Warning { message: "no image".into() }.to_json(),
        )
        .unwrap();
        assert_eq!(warning, json!({"status": "warning", "message": "no image"}));

        let error = ReconstructionResponse::Error { message: "boom".into() };
        assert!(error.is_error());
        let value: Value = serde_json::from_str(&error.to_json()).unwrap();
        assert_eq!(value["status"], "error");
    }
}
