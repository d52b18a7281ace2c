// src/models/api.rs
// DOCUMENTATION: Request and response DTOs for the HTTP API

use crate::models::{ComparisonReport, ScrollReport};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Session identifier supplied with an upload
/// DOCUMENTATION: Becomes a directory name, so only a safe alphabet is accepted
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SessionParams {
    #[validate(length(min = 1, max = 64), custom = "validate_session_id")]
    pub session_id: String,
}

fn validate_session_id(id: &str) -> Result<(), ValidationError> {
    if id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("session_id_charset"))
    }
}

/// Response for POST /api/compare
#[derive(Debug, Serialize, Deserialize)]
pub struct CompareResponse {
    pub success: bool,
    pub session_id: String,
    pub comparison: ComparisonReport,
    pub video1_report: ScrollReport,
    pub video2_report: ScrollReport,
    /// URL of the side-by-side dashboard image
    pub dashboard_image: String,
    /// URL of the first video's dashboard image
    pub video1_analysis: String,
    /// URL of the second video's dashboard image
    pub video2_analysis: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_validation() {
        let ok = SessionParams {
            session_id: "run_2024-01".to_string(),
        };
        assert!(ok.validate().is_ok());

        let traversal = SessionParams {
            session_id: "../etc".to_string(),
        };
        assert!(traversal.validate().is_err());

        let empty = SessionParams {
            session_id: String::new(),
        };
        assert!(empty.validate().is_err());

        let long = SessionParams {
            session_id: "a".repeat(65),
        };
        assert!(long.validate().is_err());
    }
}
