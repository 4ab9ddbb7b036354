#![allow(dead_code)]

//! In-process stand-in for the Prismic v2 REST API plus app setup helpers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_test::TestServer;
use serde_json::{Value, json};
use spacetravelling::{AppState, Config, content::AccessToken, router};
use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
};
use url::Url;

pub const ACCESS_TOKEN: &str = "test-token";
pub const MASTER_REF: &str = "master-ref";
pub const PREVIEW_REF: &str = "preview-token";
pub const PREVIEW_SECRET: &str = "test-preview-secret";

#[derive(Default)]
struct MockData {
    published: Vec<Value>,
    drafts: Vec<Value>,
    fail_next: u32,
    requests: usize,
}

#[derive(Clone)]
pub struct MockContentApi {
    endpoint: String,
    data: Arc<Mutex<MockData>>,
}

impl MockContentApi {
    pub async fn start(published: Vec<Value>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let api = Self {
            endpoint: format!("http://{}/api/v2", addr),
            data: Arc::new(Mutex::new(MockData {
                published,
                ..MockData::default()
            })),
        };

        let app = Router::new()
            .route("/api/v2", get(api_root))
            .route("/api/v2/documents/search", get(search))
            .with_state(api.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        api
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Documents only visible through the preview ref.
    pub fn add_draft(&self, document: Value) {
        self.data.lock().unwrap().drafts.push(document);
    }

    pub fn set_title(&self, uid: &str, title: &str) {
        let mut data = self.data.lock().unwrap();
        for document in data.published.iter_mut() {
            if document["uid"] == uid {
                document["data"]["title"] = json!(title);
            }
        }
    }

    /// The next `count` requests answer 503.
    pub fn fail_next(&self, count: u32) {
        self.data.lock().unwrap().fail_next = count;
    }

    pub fn requests(&self) -> usize {
        self.data.lock().unwrap().requests
    }
}

/// Records the request and answers the shared failure modes.
fn precheck(api: &MockContentApi, params: &HashMap<String, String>) -> Option<Response> {
    let mut data = api.data.lock().unwrap();
    data.requests += 1;

    if params.get("access_token").map(String::as_str) != Some(ACCESS_TOKEN) {
        return Some(
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Invalid access token"})),
            )
                .into_response(),
        );
    }
    if data.fail_next > 0 {
        data.fail_next -= 1;
        return Some(StatusCode::SERVICE_UNAVAILABLE.into_response());
    }
    None
}

async fn api_root(
    State(api): State<MockContentApi>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(response) = precheck(&api, &params) {
        return response;
    }
    Json(json!({
        "refs": [
            {"id": "master", "ref": MASTER_REF, "label": "Master", "isMasterRef": true}
        ]
    }))
    .into_response()
}

async fn search(
    State(api): State<MockContentApi>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(response) = precheck(&api, &params) {
        return response;
    }

    let mut documents = {
        let data = api.data.lock().unwrap();
        match params.get("ref").map(String::as_str) {
            Some(MASTER_REF) => data.published.clone(),
            Some(PREVIEW_REF) => data
                .published
                .iter()
                .chain(data.drafts.iter())
                .cloned()
                .collect(),
            _ => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"message": "Ref not found"})),
                )
                    .into_response();
            }
        }
    };

    for (path, value) in predicates(params.get("q").map(String::as_str).unwrap_or("")) {
        documents.retain(|document| field(document, &path) == Some(value.as_str()));
    }

    sort(&mut documents, params.get("orderings").map(String::as_str));

    if let Some(after) = params.get("after")
        && let Some(position) = documents.iter().position(|d| d["id"] == after.as_str())
    {
        documents.drain(..=position);
    }

    let page_size: usize = params
        .get("pageSize")
        .and_then(|v| v.parse().ok())
        .unwrap_or(20);
    let page: usize = params
        .get("page")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);
    let total = documents.len();
    let total_pages = total.div_ceil(page_size).max(1);

    let results: Vec<Value> = documents
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    let next_page = (page < total_pages).then(|| {
        let mut url = Url::parse(&format!("{}/documents/search", api.endpoint)).unwrap();
        let mut pairs: Vec<(&String, &String)> =
            params.iter().filter(|(key, _)| *key != "page").collect();
        pairs.sort();
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in pairs {
                query.append_pair(key, value);
            }
            query.append_pair("page", &(page + 1).to_string());
        }
        url.to_string()
    });

    Json(json!({
        "page": page,
        "results_per_page": page_size,
        "results_size": results.len(),
        "total_results_size": total,
        "total_pages": total_pages,
        "next_page": next_page,
        "prev_page": null,
        "results": results,
    }))
    .into_response()
}

fn predicates(q: &str) -> Vec<(String, String)> {
    q.split("[at(")
        .skip(1)
        .filter_map(|part| {
            let (path, rest) = part.split_once(", \"")?;
            let (value, _) = rest.split_once("\")]")?;
            Some((path.to_string(), value.to_string()))
        })
        .collect()
}

fn field<'a>(document: &'a Value, path: &str) -> Option<&'a str> {
    match path {
        "document.type" => document["type"].as_str(),
        "document.id" => document["id"].as_str(),
        "my.posts.uid" if document["type"] == "posts" => document["uid"].as_str(),
        _ => None,
    }
}

fn sort(documents: &mut [Value], orderings: Option<&str>) {
    let key = |document: &Value, name: &str| document[name].as_str().unwrap_or("").to_string();
    match orderings {
        Some("[document.last_publication_date desc]") => {
            documents.sort_by_key(|d| std::cmp::Reverse(key(d, "last_publication_date")))
        }
        Some("[document.first_publication_date desc]") => {
            documents.sort_by_key(|d| std::cmp::Reverse(key(d, "first_publication_date")))
        }
        Some("[document.first_publication_date]") => {
            documents.sort_by_key(|d| key(d, "first_publication_date"))
        }
        _ => {}
    }
}

pub fn words(count: usize) -> String {
    vec!["palavra"; count].join(" ")
}

/// A `posts` document with a single 250-word section.
pub fn post(id: &str, uid: &str, title: &str, first: &str, last: &str) -> Value {
    json!({
        "id": id,
        "uid": uid,
        "type": "posts",
        "first_publication_date": first,
        "last_publication_date": last,
        "data": {
            "title": title,
            "subtitle": format!("Subtítulo de {}", title),
            "author": "Joseph Oliveira",
            "banner": {"url": format!("https://images.prismic.io/spacetraveling/{}.png", uid)},
            "content": [{
                "heading": "Introdução",
                "body": [
                    {"type": "paragraph", "text": words(200), "spans": []},
                    {"type": "paragraph", "text": words(49), "spans": [
                        {"start": 0, "end": 7, "type": "strong"}
                    ]}
                ]
            }]
        }
    })
}

/// Three published posts: `a` (oldest), `b` (edited), `c` (newest).
pub fn three_posts() -> Vec<Value> {
    vec![
        post(
            "YA",
            "a",
            "Primeiro post",
            "2021-01-10T10:00:00+0000",
            "2021-01-10T10:00:00+0000",
        ),
        post(
            "YB",
            "b",
            "Como utilizar Hooks",
            "2021-03-15T15:49:00+0000",
            "2021-03-20T18:30:00+0000",
        ),
        post(
            "YC",
            "c",
            "Criando um app CRA do zero",
            "2021-04-01T09:00:00+0000",
            "2021-04-01T09:00:00+0000",
        ),
    ]
}

pub fn test_config(endpoint: &str) -> Config {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let mut config = Config::default();
    config.server.port = 0;
    config.app.log_level = "error".to_string();
    config.app.preview_secret = PREVIEW_SECRET.to_string();
    config.app.base_url = Some("http://localhost:3000".to_string());
    config.content.endpoint = endpoint.to_string();
    config.content.request_timeout_secs = 5;
    config.content.retry_backoff_ms = 10;
    config.cache.pregenerate = false;
    config.templates.directory = root.join("templates");
    config.static_files.directory = root.join("static");
    config
}

pub async fn spawn_app(config: Config) -> (AppState, TestServer) {
    let state = AppState::new(config, AccessToken::new(ACCESS_TOKEN))
        .await
        .unwrap();
    let app = router(state.clone());
    let server = TestServer::new(app.into_make_service()).unwrap();
    (state, server)
}
