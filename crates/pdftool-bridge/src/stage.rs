//! Upload staging
//!
//! Persists uploaded parts into the storage directory under names of the form
//! `<unique prefix>_<client base name>`. Parts that were not received as real
//! file transfers, or that fail to write, are skipped with a warning; only an
//! empty result is an error. Partial success counts as success.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::BridgeError;

/// One `files` part as received by the HTTP layer
#[derive(Debug, Clone)]
pub struct UploadPart {
    /// Client-supplied file name. `None` means the part was a plain form
    /// value rather than a file transfer.
    pub file_name: Option<String>,
    /// Body of the part, or `None` if the transfer broke off
    pub data: Option<Bytes>,
}

impl UploadPart {
    pub fn received(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            data: Some(data.into()),
        }
    }

    pub fn failed(file_name: Option<String>) -> Self {
        Self {
            file_name,
            data: None,
        }
    }
}

/// An upload persisted in the storage directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Name sent by the client; informational only
    pub original_name: String,
    /// `<prefix>_<base name>` as written to disk
    pub stored_name: String,
    /// Absolute path inside the storage directory
    pub path: PathBuf,
}

/// Create the storage directory if it does not exist yet.
pub async fn ensure_storage_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o777);
    builder.create(dir).await
}

/// Strip every directory component from a client-supplied file name.
///
/// Both `/` and `\` count as separators since browsers on Windows may send
/// full paths. Returns `None` when nothing usable is left.
pub fn base_name(client_name: &str) -> Option<&str> {
    let base = client_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base == "." || base == ".." || base.contains('\0') {
        None
    } else {
        Some(base)
    }
}

/// Collision-resistant prefix for one staged file
pub fn unique_prefix() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Stage every acceptable part into `storage_dir`.
pub async fn stage_uploads(
    storage_dir: &Path,
    parts: Vec<UploadPart>,
) -> Result<Vec<StagedFile>, BridgeError> {
    ensure_storage_dir(storage_dir).await?;

    let total = parts.len();
    let mut staged = Vec::with_capacity(total);

    for (index, part) in parts.into_iter().enumerate() {
        let Some(original_name) = part.file_name else {
            warn!("Skipping part {}: not a file upload", index);
            continue;
        };
        let Some(data) = part.data else {
            warn!("Skipping part {} ({}): transfer incomplete", index, original_name);
            continue;
        };
        let Some(base) = base_name(&original_name) else {
            warn!("Skipping part {}: unusable file name {:?}", index, original_name);
            continue;
        };

        let stored_name = format!("{}_{}", unique_prefix(), base);
        let path = storage_dir.join(&stored_name);

        match write_new_file(&path, &data).await {
            Ok(()) => {
                debug!("Staged {} ({} bytes) as {}", original_name, data.len(), stored_name);
                staged.push(StagedFile {
                    original_name,
                    stored_name,
                    path,
                });
            }
            Err(e) => {
                warn!("Skipping part {} ({}): {}", index, original_name, e);
                let _ = tokio::fs::remove_file(&path).await;
            }
        }
    }

    if staged.is_empty() {
        return Err(BridgeError::NoFilesStaged);
    }

    info!("Staged {} of {} uploaded parts", staged.len(), total);
    Ok(staged)
}

// `create_new` refuses to touch an existing file, so a prefix collision can
// never overwrite an earlier upload.
async fn write_new_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(data).await?;
    file.flush().await?;
    Ok(())
}
