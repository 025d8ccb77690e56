//! Process-wide configuration for the upload bridge
//!
//! Built once at startup and shared read-only by every request. The tool
//! path in particular must come from here and never from request data.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the processing tool, relative to the working directory
pub const DEFAULT_TOOL_PATH: &str = "../pdf_tool";

/// Default URL segment the storage directory is served under
pub const DEFAULT_PUBLIC_PREFIX: &str = "uploads";

/// Default upper bound for one tool run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Trusted path of the processing tool binary
    pub tool_path: PathBuf,
    /// Absolute directory holding staged uploads and produced artifacts
    pub storage_dir: PathBuf,
    /// URL segment (no slashes at either end) under which `storage_dir` is served
    pub public_prefix: String,
    /// Maximum wall-clock time for one tool run
    pub timeout: Duration,
}

impl BridgeConfig {
    /// Create a configuration with default prefix and timeout.
    ///
    /// A relative `storage_dir` is resolved against the current directory so
    /// every staged path is absolute. The tool stops collecting `-i` inputs at
    /// the first argument starting with `-`, which an absolute path never does.
    pub fn new(tool_path: impl Into<PathBuf>, storage_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self {
            tool_path: tool_path.into(),
            storage_dir: std::path::absolute(storage_dir.as_ref())?,
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_public_prefix(mut self, prefix: impl AsRef<str>) -> Self {
        self.public_prefix = prefix.as_ref().trim_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Public URL of a file stored directly in `storage_dir`
    pub fn download_url(&self, file_name: &str) -> String {
        if self.public_prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.public_prefix, file_name)
        }
    }
}
