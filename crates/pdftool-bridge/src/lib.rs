//! Upload-to-process bridge for pdf_tool
//!
//! Stages uploaded documents into a storage directory, runs the external
//! `pdf_tool` binary on them and reports where the produced artifact can be
//! downloaded. The pipeline is strictly linear per request:
//!
//! 1. intake check (`function` and at least one `files` part present)
//! 2. [`stage::stage_uploads`] writes each part under a unique name
//! 3. [`invocation::Invocation`] builds the argv
//! 4. [`runner::run`] executes it with a timeout
//! 5. [`report::UploadResponse`] shapes the JSON answer
//!
//! Nothing is shared between requests except the storage directory.

pub mod config;
pub mod error;
pub mod invocation;
pub mod operation;
pub mod report;
pub mod runner;
pub mod stage;

#[cfg(all(test, unix))]
mod testutil;

use std::path::PathBuf;

use tracing::{debug, info};

pub use config::BridgeConfig;
pub use error::BridgeError;
pub use invocation::Invocation;
pub use operation::{ArtifactKind, Operation};
pub use report::UploadResponse;
pub use runner::ExecutionResult;
pub use stage::{StagedFile, UploadPart};

/// Request fields relevant to the bridge, as extracted by the HTTP layer
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Value of the `function` field
    pub function: Option<String>,
    /// Every part sent under the `files` field
    pub parts: Vec<UploadPart>,
}

/// Artifact produced by a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub path: PathBuf,
    pub download_url: String,
}

/// Run the whole pipeline for one request.
///
/// Missing input is rejected before anything touches the filesystem.
pub async fn process_upload(
    config: &BridgeConfig,
    request: UploadRequest,
) -> Result<Artifact, BridgeError> {
    let function = request
        .function
        .filter(|f| !f.is_empty())
        .ok_or(BridgeError::MissingInput)?;
    // Plain form values sent under `files` are not uploads at all
    if !request.parts.iter().any(|part| part.file_name.is_some()) {
        return Err(BridgeError::MissingInput);
    }
    let operation: Operation = function.parse()?;

    let staged = stage::stage_uploads(&config.storage_dir, request.parts).await?;

    let invocation = Invocation::build(config, operation, &staged);
    info!(
        "Running {} on {} file(s) -> {}",
        invocation.operation,
        staged.len(),
        invocation.output_file_name()
    );

    let result = runner::run(&invocation, config.timeout).await?;
    for line in &result.output {
        debug!("tool: {}", line);
    }

    let file_name = invocation.output_file_name().to_string();
    if !tokio::fs::try_exists(invocation.output_path())
        .await
        .unwrap_or(false)
    {
        return Err(BridgeError::MissingArtifact(file_name));
    }

    info!("Produced {}", file_name);
    Ok(Artifact {
        download_url: config.download_url(&file_name),
        path: invocation.output_path,
        file_name,
    })
}
