use crate::content::ContentError;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("Content API error: {0}")]
    Content(#[from] ContentError),

    #[error("Template error: {0}")]
    Template(String),
}

impl PageError {
    pub fn status(&self) -> StatusCode {
        match self {
            PageError::Content(_) => StatusCode::BAD_GATEWAY,
            PageError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        error!("Page generation failed: {}", self);
        let message = match self {
            PageError::Content(ContentError::Rejected { .. }) => {
                "Content API rejected the request"
            }
            PageError::Content(_) => "Content API unavailable",
            PageError::Template(_) => "Template error",
        };
        let body = format!(
            "<!DOCTYPE html><html lang=\"pt-BR\"><head><meta charset=\"utf-8\"><title>{message}</title></head><body><h1>{message}</h1></body></html>"
        );
        (self.status(), Html(body)).into_response()
    }
}
