//! Error types for the pdftool server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdftool_bridge::{BridgeError, UploadResponse};
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Bridge(err) => match err {
                BridgeError::MissingInput | BridgeError::InvalidOperation(_) => {
                    StatusCode::BAD_REQUEST
                }
                BridgeError::NoFilesStaged => StatusCode::UNPROCESSABLE_ENTITY,
                BridgeError::NonZeroExit { .. } | BridgeError::MissingArtifact(_) => {
                    StatusCode::BAD_GATEWAY
                }
                BridgeError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                BridgeError::Storage(_) | BridgeError::ProcessLaunch { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ServerError::Bridge(err) => {
                if status.is_server_error() {
                    tracing::error!("Upload failed: {}", err);
                } else {
                    tracing::info!("Upload rejected: {}", err);
                }
                UploadResponse::from(err)
            }
        };

        (status, Json(body)).into_response()
    }
}
