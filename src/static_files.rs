use axum::{
    body::Body,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
    sync::Arc,
    time::UNIX_EPOCH,
};
use tokio::{fs::File, sync::RwLock};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

/// Serves the stylesheet, the load-more script and images, with
/// mtime-based version query strings for cache busting.
#[derive(Clone)]
pub struct StaticFileHandler {
    pub static_dir: PathBuf,
    file_versions: Arc<RwLock<HashMap<String, u64>>>,
}

impl StaticFileHandler {
    pub fn new(static_dir: PathBuf) -> Self {
        Self {
            static_dir,
            file_versions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn refresh_file_versions(&self) {
        info!("Refreshing static file versions");
        let mut versions = self.file_versions.write().await;
        versions.clear();

        let Ok(mut entries) = tokio::fs::read_dir(&self.static_dir).await else {
            warn!("Static directory {:?} is not readable", self.static_dir);
            return;
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if let Ok(metadata) = entry.metadata().await
                && metadata.is_file()
                && let Some(ext) = path.extension()
                && (ext == "css" || ext == "js")
                && let Ok(modified) = metadata.modified()
                && let Ok(duration) = modified.duration_since(UNIX_EPOCH)
                && let Some(file_name) = path.file_name().and_then(|name| name.to_str())
            {
                versions.insert(file_name.to_string(), duration.as_secs());
                debug!("File version: {} -> {}", file_name, duration.as_secs());
            }
        }
    }

    pub async fn get_file_version(&self, filename: &str) -> Option<u64> {
        let versions = self.file_versions.read().await;
        versions.get(filename).copied()
    }

    /// `/static/style.css` becomes `/static/style.css?v=<mtime>` once the
    /// file's version is known.
    pub async fn get_versioned_url(&self, path: &str) -> String {
        let filename = path.rsplit('/').next().unwrap_or(path);

        match self.get_file_version(filename).await {
            Some(version) => format!("{}?v={}", path, version),
            None => path.to_string(),
        }
    }

    pub async fn serve(&self, path: &str, has_version: bool, request_headers: &HeaderMap) -> Response {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            error!("Path traversal attempt: {:?}", relative);
            return (StatusCode::FORBIDDEN, "Forbidden").into_response();
        }
        let file_path = self.static_dir.join(relative);

        debug!("Attempting to serve static file: {:?}", file_path);

        let metadata = match tokio::fs::metadata(&file_path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return (StatusCode::NOT_FOUND, "File not found").into_response(),
            Err(e) => {
                debug!("Failed to get metadata for {:?}: {}", file_path, e);
                return (StatusCode::NOT_FOUND, "File not found").into_response();
            }
        };

        let etag = metadata
            .modified()
            .ok()
            .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
            .map(|duration| format!("\"{}-{}\"", duration.as_secs(), metadata.len()));

        if let Some(etag) = &etag
            && request_headers
                .get(header::IF_NONE_MATCH)
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value == etag)
        {
            return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag.clone())]).into_response();
        }

        let file = match File::open(&file_path).await {
            Ok(file) => file,
            Err(e) => {
                debug!("Failed to open file {:?}: {}", file_path, e);
                return (StatusCode::NOT_FOUND, "File not found").into_response();
            }
        };

        let content_type = mime_guess::from_path(&file_path)
            .first_or_octet_stream()
            .to_string();

        let cache_control = if has_version {
            "public, max-age=31536000, immutable"
        } else if content_type.starts_with("image/") {
            "public, max-age=31536000"
        } else if content_type.starts_with("text/css")
            || content_type.contains("javascript")
        {
            "public, max-age=300, must-revalidate"
        } else {
            "public, max-age=3600"
        };

        let mut response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, cache_control);

        if let Ok(modified) = metadata.modified() {
            response = response.header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified));
        }
        if let Some(etag) = etag {
            response = response.header(header::ETAG, etag);
        }

        let body = Body::from_stream(ReaderStream::new(file));
        response.body(body).unwrap_or_else(|e| {
            error!("Failed to build static response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
    }
}
