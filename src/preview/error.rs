use crate::content::ContentError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Content API unavailable: {0}")]
    Upstream(#[source] ContentError),

    #[error("Failed to sign preview session: {0}")]
    Signing(String),
}

impl From<ContentError> for PreviewError {
    fn from(error: ContentError) -> Self {
        match error {
            ContentError::Rejected { .. } => PreviewError::InvalidToken,
            other => PreviewError::Upstream(other),
        }
    }
}

impl IntoResponse for PreviewError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            PreviewError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            PreviewError::Upstream(e) => {
                error!("Preview resolution failed: {}", e);
                (StatusCode::BAD_GATEWAY, "Content API unavailable")
            }
            PreviewError::Signing(e) => {
                error!("Failed to sign preview session: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
