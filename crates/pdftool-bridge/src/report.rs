//! JSON response returned to the uploading client

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::Artifact;

/// `{"success": true, "downloadUrl": ...}` or `{"success": false, "error": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResponse {
    pub fn success(download_url: impl Into<String>) -> Self {
        Self {
            success: true,
            download_url: Some(download_url.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            download_url: None,
            error: Some(error.into()),
        }
    }
}

impl From<&Artifact> for UploadResponse {
    fn from(artifact: &Artifact) -> Self {
        UploadResponse::success(artifact.download_url.clone())
    }
}

impl From<&BridgeError> for UploadResponse {
    fn from(err: &BridgeError) -> Self {
        UploadResponse::failure(err.public_message())
    }
}

impl From<&Result<Artifact, BridgeError>> for UploadResponse {
    fn from(outcome: &Result<Artifact, BridgeError>) -> Self {
        match outcome {
            Ok(artifact) => artifact.into(),
            Err(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn success_shape() {
        let artifact = Artifact {
            file_name: "ocr_result_5.txt".into(),
            path: PathBuf::from("/srv/uploads/ocr_result_5.txt"),
            download_url: "uploads/ocr_result_5.txt".into(),
        };
        let value = serde_json::to_value(UploadResponse::from(&artifact)).unwrap();
        assert_eq!(
            value,
            json!({"success": true, "downloadUrl": "uploads/ocr_result_5.txt"})
        );
    }

    #[test]
    fn failure_shape() {
        let outcome: Result<Artifact, BridgeError> = Err(BridgeError::MissingInput);
        let value = serde_json::to_value(UploadResponse::from(&outcome)).unwrap();
        assert_eq!(
            value,
            json!({"success": false, "error": "missing parameters or files"})
        );
    }

    #[test]
    fn tool_failure_keeps_output() {
        let err = BridgeError::NonZeroExit {
            code: 1,
            output: vec!["line one".into(), "line two".into()],
        };
        let response = UploadResponse::from(&err);
        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("tool failed. Output: line one\nline two")
        );
    }
}
