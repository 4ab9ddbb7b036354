use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc, time::Duration};

pub mod cache;
pub mod content;
pub mod posts;
pub mod preview;
pub mod startup_checks;
pub mod static_files;
pub mod templating;


#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    #[serde(default)]
    pub content: ContentConfig,
    pub templates: TemplateConfig,
    pub static_files: StaticConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
    /// Key for signing the preview session cookie.
    pub preview_secret: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Where the content API lives and how hard to try reaching it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    pub endpoint: String,
    /// Environment variable holding the access token. The token itself is
    /// never read from the config file.
    pub access_token_env: String,
    pub page_size: usize,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://spacetravellingworld.cdn.prismic.io/api/v2".to_string(),
            access_token_env: "PRISMIC_ACCESS_TOKEN".to_string(),
            page_size: 2,
            request_timeout_secs: 10,
            max_retries: 2,
            retry_backoff_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub revalidate_seconds: u64,
    pub cursor_ttl_seconds: u64,
    /// Render the home page and every post before accepting requests.
    pub pregenerate: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            revalidate_seconds: 1800,
            cursor_ttl_seconds: 86400,
            pregenerate: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticConfig {
    pub directory: PathBuf,
}

pub const DEFAULT_PREVIEW_SECRET: &str = "change-me-in-production";

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            app: AppConfig {
                name: "spacetraveling".to_string(),
                log_level: "info".to_string(),
                preview_secret: DEFAULT_PREVIEW_SECRET.to_string(),
                base_url: None,
            },
            content: ContentConfig::default(),
            templates: TemplateConfig {
                directory: PathBuf::from("templates"),
            },
            static_files: StaticConfig {
                directory: PathBuf::from("static"),
            },
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    /// Cookies get the `Secure` attribute when the site is served over https.
    pub fn secure_cookies(&self) -> bool {
        self.app
            .base_url
            .as_deref()
            .is_some_and(|url| url.starts_with("https://"))
    }
}

use axum::{
    Router,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
};
use content::{AccessToken, ContentClient, ContentError};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub template_engine: Arc<templating::TemplateEngine>,
    pub static_handler: static_files::StaticFileHandler,
    pub content: ContentClient,
    pub pages: cache::PageCache<posts::PageKey>,
    pub cursors: posts::CursorRegistry,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config, access_token: AccessToken) -> Result<Self, ContentError> {
        let template_engine = Arc::new(templating::TemplateEngine::new(
            config.templates.directory.clone(),
        ));

        let static_handler =
            static_files::StaticFileHandler::new(config.static_files.directory.clone());
        static_handler.refresh_file_versions().await;

        let content = ContentClient::new(&config.content, access_token)?;

        Ok(Self {
            template_engine,
            static_handler,
            content,
            pages: cache::PageCache::new(Duration::from_secs(config.cache.revalidate_seconds)),
            cursors: posts::CursorRegistry::new(Duration::from_secs(
                config.cache.cursor_ttl_seconds,
            )),
            config,
        })
    }
}

#[derive(serde::Deserialize)]
struct StaticQuery {
    v: Option<String>,
}

async fn static_file_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
    axum::extract::Query(query): axum::extract::Query<StaticQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    app_state
        .static_handler
        .serve(&path, query.v.is_some(), &headers)
        .await
}

/// Builds the state and the router. Pages are generated on demand; call
/// [`posts::pregenerate`] on the state first to warm the cache.
pub async fn create_app(config: Config, access_token: AccessToken) -> Result<Router, ContentError> {
    let app_state = AppState::new(config, access_token).await?;
    Ok(router(app_state))
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/", axum::routing::get(posts::handlers::index_handler))
        .route(
            "/post/{slug}",
            axum::routing::get(posts::handlers::post_handler),
        )
        .route(
            "/api/posts",
            axum::routing::get(posts::handlers::load_more_handler),
        )
        .route(
            "/api/preview",
            axum::routing::get(preview::preview_handler),
        )
        .route(
            "/api/exit-preview",
            axum::routing::get(preview::exit_preview_handler),
        )
        .route("/static/{*path}", axum::routing::get(static_file_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    // Query strings may hold preview tokens; log paths only.
                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        path = %request.uri().path(),
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let headers = request.headers();
                    let user_agent = headers
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");
                    let referer = headers
                        .get("referer")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %request.method(),
                        path = %request.uri().path(),
                        user_agent = %user_agent,
                        referer = %referer,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let status = response.status();
                        let size = response
                            .headers()
                            .get("content-length")
                            .and_then(|h| h.to_str().ok())
                            .unwrap_or("-");

                        tracing::info!(
                            target: "access_log",
                            status = %status,
                            size = %size,
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}
