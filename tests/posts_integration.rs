mod common;

use axum::http::{StatusCode, header};
use common::{ACCESS_TOKEN, MockContentApi, post, spawn_app, test_config, three_posts};
use serde_json::Value;
use spacetravelling::posts;
use std::time::Duration;

fn load_more_url(html: &str) -> Option<String> {
    let start = html.find("data-next=\"")? + "data-next=\"".len();
    let end = html[start..].find('"')? + start;
    Some(html[start..end].to_string())
}

fn header_value(response: &axum_test::TestResponse, name: header::HeaderName) -> String {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_index_lists_first_page_by_last_edit() {
    let api = MockContentApi::start(three_posts()).await;
    let (_state, server) = spawn_app(test_config(api.endpoint())).await;

    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();

    // page size 2, ordered by last publication date: c (Apr), then b (edited Mar 20)
    let c = html.find(r#"data-uid="c""#).unwrap();
    let b = html.find(r#"data-uid="b""#).unwrap();
    assert!(c < b);
    assert!(!html.contains(r#"data-uid="a""#));

    assert!(html.contains("Criando um app CRA do zero"));
    assert!(html.contains("Subtítulo de Como utilizar Hooks"));
    assert!(html.contains("Joseph Oliveira"));
    assert!(html.contains("15 mar 2021"));
    assert!(html.contains("Carregar mais posts"));
    assert!(!html.contains("Sair do modo Preview"));
    assert!(!html.contains(ACCESS_TOKEN));

    assert_eq!(
        header_value(&response, header::CACHE_CONTROL),
        "public, s-maxage=1800, stale-while-revalidate"
    );
}

#[tokio::test]
async fn test_single_post_has_no_load_more() {
    let api = MockContentApi::start(vec![post(
        "YA",
        "only",
        "Único post",
        "2021-01-10T10:00:00+0000",
        "2021-01-10T10:00:00+0000",
    )])
    .await;
    let (_state, server) = spawn_app(test_config(api.endpoint())).await;

    let html = server.get("/").await.text();
    assert_eq!(html.matches("data-uid=").count(), 1);
    assert!(html.contains(r#"data-uid="only""#));
    assert!(!html.contains("Carregar mais posts"));
    assert!(load_more_url(&html).is_none());
    assert!(!html.contains("Sair do modo Preview"));
}

#[tokio::test]
async fn test_load_more_returns_next_batch() {
    let api = MockContentApi::start(three_posts()).await;
    let (_state, server) = spawn_app(test_config(api.endpoint())).await;

    let html = server.get("/").await.text();
    let next = load_more_url(&html).unwrap();
    assert!(next.starts_with("/api/posts?cursor="));

    let response = server.get(&next).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(!response.text().contains(ACCESS_TOKEN));

    let batch: Value = response.json();
    let results = batch["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["uid"], "a");
    assert_eq!(results[0]["url"], "/post/a");
    assert_eq!(results[0]["data"]["title"], "Primeiro post");
    assert_eq!(results[0]["date_formatted"], "10 jan 2021");
    assert!(batch["next_page"].is_null());
}

#[tokio::test]
async fn test_load_more_follows_the_cursor_chain() {
    let documents = (1..=5)
        .map(|i| {
            let date = format!("2021-0{}-01T10:00:00+0000", i);
            post(&format!("Y{}", i), &format!("p{}", i), &format!("Post {}", i), &date, &date)
        })
        .collect();
    let api = MockContentApi::start(documents).await;
    let (_state, server) = spawn_app(test_config(api.endpoint())).await;

    let html = server.get("/").await.text();
    let mut next = load_more_url(&html);
    let mut uids = Vec::new();
    while let Some(url) = next {
        let batch: Value = server.get(&url).await.json();
        for post in batch["results"].as_array().unwrap() {
            uids.push(post["uid"].as_str().unwrap().to_string());
        }
        next = batch["next_page"].as_str().map(str::to_string);
    }

    assert_eq!(uids, vec!["p3", "p2", "p1"]);
}

#[tokio::test]
async fn test_unknown_cursor() {
    let api = MockContentApi::start(three_posts()).await;
    let (_state, server) = spawn_app(test_config(api.endpoint())).await;

    let response = server.get("/api/posts?cursor=deadbeef").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], "Unknown cursor");

    let response = server.get("/api/posts").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_post_detail_renders() {
    let api = MockContentApi::start(three_posts()).await;
    let (_state, server) = spawn_app(test_config(api.endpoint())).await;

    let response = server.get("/post/b").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let html = response.text();

    assert!(html.contains("<h1>Como utilizar Hooks</h1>"));
    assert!(html.contains("https://images.prismic.io/spacetraveling/b.png"));
    assert!(html.contains("15 mar 2021"));
    assert!(html.contains("2 min"));
    assert!(html.contains("* editado em 20 mar 2021, às 18:30"));
    assert!(html.contains("<h2>Introdução</h2>"));
    assert!(html.contains("<p><strong>palavra</strong> palavra"));

    // Newer neighbour under "Post Anterior", older under "Próximo Post".
    assert!(html.contains("Criando um app ..."));
    assert!(html.contains(r#"<a href="/post/c">Post Anterior</a>"#));
    assert!(html.contains("Primeiro post..."));
    assert!(html.contains(r#"<a href="/post/a">Próximo Post</a>"#));
    assert!(!html.contains(ACCESS_TOKEN));
}

#[tokio::test]
async fn test_detail_page_resolves_master_ref_once() {
    let api = MockContentApi::start(three_posts()).await;
    let (_state, server) = spawn_app(test_config(api.endpoint())).await;

    let before = api.requests();
    assert_eq!(server.get("/post/b").await.status_code(), StatusCode::OK);
    // One API root lookup, then the post and its two neighbours.
    assert_eq!(api.requests() - before, 4);
}

#[tokio::test]
async fn test_unedited_post_has_no_edited_line() {
    let api = MockContentApi::start(three_posts()).await;
    let (_state, server) = spawn_app(test_config(api.endpoint())).await;

    let html = server.get("/post/c").await.text();
    assert!(!html.contains("editado em"));
    assert!(!html.contains("Post Anterior"));
    assert!(html.contains(r#"<a href="/post/b">Próximo Post</a>"#));
}

#[tokio::test]
async fn test_unknown_slug_redirects_home() {
    let api = MockContentApi::start(three_posts()).await;
    let (state, server) = spawn_app(test_config(api.endpoint())).await;

    let response = server.get("/post/does-not-exist").await;
    assert_eq!(response.status_code(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(header_value(&response, header::LOCATION), "/");
    assert!(state.pages.is_empty().await);
}

#[tokio::test]
async fn test_upstream_outage_is_bad_gateway() {
    let api = MockContentApi::start(three_posts()).await;
    let (_state, server) = spawn_app(test_config(api.endpoint())).await;

    api.fail_next(100);
    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let api = MockContentApi::start(three_posts()).await;
    let (_state, server) = spawn_app(test_config(api.endpoint())).await;

    api.fail_next(2);
    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_pregenerated_pages_survive_outage() {
    let api = MockContentApi::start(three_posts()).await;
    let (state, server) = spawn_app(test_config(api.endpoint())).await;

    let generated = posts::pregenerate(&state).await.unwrap();
    assert_eq!(generated, 4);
    assert_eq!(state.pages.len().await, 4);

    api.fail_next(100);
    let before = api.requests();
    for path in ["/", "/post/a", "/post/b", "/post/c"] {
        assert_eq!(server.get(path).await.status_code(), StatusCode::OK);
    }
    assert_eq!(api.requests(), before);
}

#[tokio::test]
async fn test_stale_page_is_served_then_regenerated() {
    let api = MockContentApi::start(three_posts()).await;
    let mut config = test_config(api.endpoint());
    config.cache.revalidate_seconds = 0;
    let (_state, server) = spawn_app(config).await;

    let html = server.get("/post/b").await.text();
    assert!(html.contains("<h1>Como utilizar Hooks</h1>"));

    api.set_title("b", "Hooks revisitados");

    // The stale copy is served while the new one is built.
    let html = server.get("/post/b").await.text();
    assert!(html.contains("<h1>Como utilizar Hooks</h1>"));

    let mut regenerated = false;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if server
            .get("/post/b")
            .await
            .text()
            .contains("<h1>Hooks revisitados</h1>")
        {
            regenerated = true;
            break;
        }
    }
    assert!(regenerated);
}

#[tokio::test]
async fn test_static_assets_are_served() {
    let api = MockContentApi::start(three_posts()).await;
    let (_state, server) = spawn_app(test_config(api.endpoint())).await;

    let html = server.get("/").await.text();
    assert!(html.contains("/static/style.css?v="));
    assert!(html.contains("/static/load-more.js?v="));

    let response = server.get("/static/load-more.js").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(header_value(&response, header::CONTENT_TYPE).contains("javascript"));
    assert!(response.text().contains("Carregando..."));

    let response = server.get("/static/style.css?v=1").await;
    assert_eq!(
        header_value(&response, header::CACHE_CONTROL),
        "public, max-age=31536000, immutable"
    );

    let response = server.get("/static/missing.css").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
