use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Missing parameters or files")]
    MissingInput,

    #[error("No uploaded file could be staged")]
    NoFilesStaged,

    #[error("Unsupported operation: {0}")]
    InvalidOperation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Failed to launch {}: {source}", .program.display())]
    ProcessLaunch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tool exited with status {code}")]
    NonZeroExit { code: i32, output: Vec<String> },

    #[error("Tool timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Tool succeeded but produced no artifact: {0}")]
    MissingArtifact(String),
}

impl BridgeError {
    /// Message placed in the `error` field of the JSON response.
    ///
    /// Only `NonZeroExit` carries tool-provided text; every other kind maps to a
    /// fixed sentence so storage paths never leak to the client.
    pub fn public_message(&self) -> String {
        match self {
            BridgeError::MissingInput => "missing parameters or files".to_string(),
            BridgeError::NoFilesStaged => "failed to save any files".to_string(),
            BridgeError::InvalidOperation(op) => format!("unsupported function: {}", op),
            BridgeError::Storage(_) => "failed to prepare storage".to_string(),
            BridgeError::ProcessLaunch { .. } => "tool could not be started".to_string(),
            BridgeError::NonZeroExit { output, .. } => {
                format!("tool failed. Output: {}", output.join("\n"))
            }
            BridgeError::Timeout(limit) => {
                format!("tool timed out after {} seconds", limit.as_secs())
            }
            BridgeError::MissingArtifact(_) => "tool produced no output file".to_string(),
        }
    }
}
