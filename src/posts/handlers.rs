use super::{
    error::PageError,
    list::PostFeed,
    render::{next_batch_url, render_page, summary_view},
    types::{Page, PageKey, SummaryData},
};
use crate::{
    AppState,
    cache::Lookup,
    content::ContentError,
    preview::PreviewSession,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

const PREVIEW_CACHE_CONTROL: &str = "private, no-store";

pub async fn index_handler(State(app_state): State<AppState>, headers: HeaderMap) -> Response {
    serve_page(app_state, PageKey::Index, &headers).await
}

pub async fn post_handler(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Response {
    serve_page(app_state, PageKey::Post(slug), &headers).await
}

async fn serve_page(app_state: AppState, key: PageKey, headers: &HeaderMap) -> Response {
    if let Some(session) =
        PreviewSession::from_headers(headers, &app_state.config.app.preview_secret)
    {
        debug!("Rendering {} for preview session", key);
        return match render_page(&app_state, &key, Some(&session)).await {
            Ok(page) => page_response(page, PREVIEW_CACHE_CONTROL),
            Err(PageError::Content(ContentError::Rejected { status })) => {
                info!(
                    "Preview ref rejected with status {}, ending preview session",
                    status
                );
                end_preview_response(&key)
            }
            Err(e) => e.into_response(),
        };
    }

    let cache_control = shared_cache_control(&app_state);
    match app_state.pages.lookup(&key).await {
        Lookup::Fresh(html) => html_response(html, &cache_control),
        Lookup::Stale(html) => {
            spawn_regeneration(app_state.clone(), key);
            html_response(html, &cache_control)
        }
        Lookup::Missing => match generate(&app_state, &key).await {
            Ok(page) => page_response(page, &cache_control),
            Err(e) => e.into_response(),
        },
    }
}

/// Generates a page outside any preview session and updates the cache
/// with the outcome. Redirects are never cached.
async fn generate(app_state: &AppState, key: &PageKey) -> Result<Page, PageError> {
    let page = render_page(app_state, key, None).await?;
    match &page {
        Page::Html(html) => app_state.pages.store(key.clone(), html.clone()).await,
        Page::Redirect(_) => app_state.pages.remove(key).await,
    }
    Ok(page)
}

/// Rebuilds a stale page in the background. A failed rebuild keeps serving
/// the stale copy.
fn spawn_regeneration(app_state: AppState, key: PageKey) {
    tokio::spawn(async move {
        if !app_state.pages.begin_regeneration(&key).await {
            debug!("Regeneration of {} already running", key);
            return;
        }

        info!("Regenerating stale page {}", key);
        if let Err(e) = generate(&app_state, &key).await {
            warn!("Regeneration of {} failed, keeping stale page: {}", key, e);
        }

        app_state.pages.end_regeneration(&key).await;
    });
}

/// Drops a preview session the content API no longer accepts and sends the
/// editor back to the published version of the same page.
fn end_preview_response(key: &PageKey) -> Response {
    (
        StatusCode::TEMPORARY_REDIRECT,
        [
            (header::LOCATION, key.to_string()),
            (header::SET_COOKIE, PreviewSession::clear_cookie()),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
    )
        .into_response()
}

fn shared_cache_control(app_state: &AppState) -> String {
    format!(
        "public, s-maxage={}, stale-while-revalidate",
        app_state.config.cache.revalidate_seconds
    )
}

fn page_response(page: Page, cache_control: &str) -> Response {
    match page {
        Page::Html(html) => html_response(html, cache_control),
        Page::Redirect(location) => (
            StatusCode::TEMPORARY_REDIRECT,
            [
                (header::LOCATION, location),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
        )
            .into_response(),
    }
}

fn html_response(html: String, cache_control: &str) -> Response {
    let mut response = Html(html).into_response();
    if let Ok(value) = HeaderValue::from_str(cache_control) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    response
}

#[derive(Debug, Deserialize)]
pub struct LoadMoreQuery {
    cursor: Option<String>,
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// Next batch of the post list, addressed by a cursor handle previously
/// handed out in a page or an earlier batch.
pub async fn load_more_handler(
    State(app_state): State<AppState>,
    Query(query): Query<LoadMoreQuery>,
) -> Response {
    let Some(handle) = query.cursor.filter(|cursor| !cursor.is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "Missing cursor");
    };
    let Some(upstream) = app_state.cursors.resolve(&handle).await else {
        debug!("Unknown cursor handle {}", handle);
        return json_error(StatusCode::NOT_FOUND, "Unknown cursor");
    };

    let response = match app_state
        .content
        .fetch_page::<SummaryData>(&upstream)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to load more posts: {}", e);
            return json_error(StatusCode::BAD_GATEWAY, "Content API unavailable");
        }
    };

    let feed = PostFeed::from_response(response);
    let results: Vec<serde_json::Value> = feed.results.iter().map(summary_view).collect();
    let next_page = next_batch_url(&app_state, feed.next_page.as_deref()).await;

    Json(json!({
        "results": results,
        "next_page": next_page,
    }))
    .into_response()
}
