//! API handlers for the pdftool server
//!
//! Provides endpoints for:
//! - Document upload and processing
//! - Operation listing
//! - Health checks

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use pdftool_bridge::{process_upload, Operation, UploadPart, UploadRequest, UploadResponse};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::AppState;

/// Form field carrying the operation name
const FUNCTION_FIELD: &str = "function";

/// Form field carrying the documents. PHP-style forms send `files[]`.
const FILES_FIELDS: [&str; 2] = ["files", "files[]"];

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pdftool-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Operation list response
#[derive(Serialize)]
pub struct OperationListResponse {
    pub success: bool,
    pub operations: Vec<OperationInfo>,
    pub count: usize,
}

/// Operation metadata
#[derive(Serialize)]
pub struct OperationInfo {
    pub name: String,
    pub description: String,
    pub extension: String,
}

/// Handler: GET /api/operations
pub async fn handle_list_operations() -> Json<OperationListResponse> {
    let operations: Vec<OperationInfo> = Operation::KNOWN
        .iter()
        .map(|op| OperationInfo {
            name: op.as_str().to_string(),
            description: op.description().to_string(),
            extension: op.artifact_kind().extension().to_string(),
        })
        .collect();

    let count = operations.len();
    Json(OperationListResponse {
        success: true,
        operations,
        count,
    })
}

/// Handler: POST /api/upload (also mounted at /upload.php)
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ServerError> {
    let request = match multipart {
        Ok(multipart) => read_upload_request(multipart).await,
        Err(rejection) => {
            debug!("Not a multipart request: {}", rejection);
            UploadRequest::default()
        }
    };

    info!(
        "Upload request: function={:?}, parts={}",
        request.function,
        request.parts.len()
    );

    let artifact = process_upload(&state.config, request).await?;
    Ok(Json(UploadResponse::from(&artifact)))
}

/// Pull the `function` value and every `files` part out of the form.
///
/// A part whose body cannot be read is recorded as a failed transfer and
/// ends the scan, since the rest of the stream is unusable after that.
async fn read_upload_request(mut multipart: Multipart) -> UploadRequest {
    let mut request = UploadRequest::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart body: {}", e);
                break;
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        if name == FUNCTION_FIELD {
            match field.text().await {
                Ok(value) => request.function = Some(value),
                Err(e) => {
                    warn!("Could not read '{}' field: {}", FUNCTION_FIELD, e);
                    break;
                }
            }
        } else if FILES_FIELDS.contains(&name.as_str()) {
            let file_name = field.file_name().map(str::to_string);
            match field.bytes().await {
                Ok(data) => request.parts.push(UploadPart {
                    file_name,
                    data: Some(data),
                }),
                Err(e) => {
                    warn!("Upload of {:?} broke off: {}", file_name, e);
                    request.parts.push(UploadPart::failed(file_name));
                    break;
                }
            }
        } else {
            debug!("Ignoring form field '{}'", name);
        }
    }

    request
}
