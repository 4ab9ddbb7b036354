use super::{PreviewError, PreviewSession};
use crate::{
    AppState,
    content::Document,
    posts::types::{POST_TYPE, post_url},
};
use axum::{
    extract::{Query, State},
    http::{
        StatusCode,
        header::{LOCATION, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

/// Where a document lives on the site: posts under `/post/<uid>`, anything
/// else on the home page.
pub fn link_resolver<D>(document: &Document<D>) -> String {
    match &document.uid {
        Some(uid) if document.doc_type == POST_TYPE => post_url(uid),
        _ => "/".to_string(),
    }
}

pub async fn preview_handler(
    State(app_state): State<AppState>,
    Query(query): Query<PreviewQuery>,
) -> Result<Response, PreviewError> {
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    let (Some(token), Some(document_id)) = (non_empty(query.token), non_empty(query.document_id))
    else {
        warn!("Preview request without token or documentId");
        return Err(PreviewError::InvalidToken);
    };

    let location = app_state
        .content
        .resolve_preview(
            &token,
            &document_id,
            link_resolver::<serde_json::Value>,
            "/",
        )
        .await?
        .filter(|location| !location.is_empty())
        .ok_or_else(|| {
            warn!("Preview token rejected for document {}", document_id);
            PreviewError::InvalidToken
        })?;

    let session = PreviewSession::new(token);
    let cookie = session.to_cookie(
        &app_state.config.app.preview_secret,
        app_state.config.secure_cookies(),
    )?;

    info!(
        "Preview session started for document {}, redirecting to {}",
        document_id, location
    );

    Ok((
        StatusCode::FOUND,
        [(LOCATION, location), (SET_COOKIE, cookie)],
    )
        .into_response())
}

pub async fn exit_preview_handler() -> Response {
    info!("Preview session ended");
    (
        StatusCode::TEMPORARY_REDIRECT,
        [
            (LOCATION, "/".to_string()),
            (SET_COOKIE, PreviewSession::clear_cookie()),
        ],
    )
        .into_response()
}
