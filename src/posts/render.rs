use super::{
    cursor::load_more_url,
    detail::generate_detail,
    error::PageError,
    format::{format_datetime, format_optional_date, truncate_title},
    list::{PostFeed, enumerate_paths, first_page},
    types::{DetailProps, Page, PageKey, PostLink, PostSummary, post_url},
};
use crate::{AppState, content::richtext, preview::PreviewSession};
use serde_json::json;
use tracing::{error, info, warn};

const INDEX_TEMPLATE: &str = "index.html.liquid";
const POST_TEMPLATE: &str = "post.html.liquid";
const STYLE_PATH: &str = "/static/style.css";
const SCRIPT_PATH: &str = "/static/load-more.js";

/// Generates one page, against the preview ref when a session is given.
/// A slug without a post becomes a redirect to the home page.
pub async fn render_page(
    app_state: &AppState,
    key: &PageKey,
    preview: Option<&PreviewSession>,
) -> Result<Page, PageError> {
    let client = app_state
        .content
        .scoped(preview.map(|session| session.reference().to_string()));

    match key {
        PageKey::Index => {
            let feed = first_page(&client, app_state.config.content.page_size).await?;
            render_index(app_state, &feed, client.is_preview())
                .await
                .map(Page::Html)
        }
        PageKey::Post(slug) => match generate_detail(&client, slug).await? {
            Some(props) => render_post(app_state, &props).await.map(Page::Html),
            None => Ok(Page::Redirect("/".to_string())),
        },
    }
}

/// JSON shape of a post in the list, shared by the home page and the
/// load-more endpoint.
pub fn summary_view(post: &PostSummary) -> serde_json::Value {
    json!({
        "uid": post.uid,
        "url": post.url(),
        "first_publication_date": post.first_publication_date,
        "date_formatted": format_optional_date(post.first_publication_date.as_ref()),
        "data": {
            "title": post.data.title,
            "subtitle": post.data.subtitle,
            "author": post.data.author,
        },
    })
}

/// Browser URL for the batch after `next_page`, if any.
pub async fn next_batch_url(app_state: &AppState, next_page: Option<&str>) -> Option<String> {
    match next_page {
        Some(upstream) => {
            let handle = app_state.cursors.register(upstream.to_string()).await;
            Some(load_more_url(&handle))
        }
        None => None,
    }
}

async fn asset_globals(app_state: &AppState) -> (String, String) {
    (
        app_state.static_handler.get_versioned_url(STYLE_PATH).await,
        app_state.static_handler.get_versioned_url(SCRIPT_PATH).await,
    )
}

async fn render_index(
    app_state: &AppState,
    feed: &PostFeed,
    preview: bool,
) -> Result<String, PageError> {
    let posts: Vec<serde_json::Value> = feed.results.iter().map(summary_view).collect();
    let load_more = next_batch_url(app_state, feed.next_page.as_deref()).await;
    let (style_url, script_url) = asset_globals(app_state).await;

    let globals = liquid::object!({
        "page_title": "Home",
        "site_name": app_state.config.app.name,
        "posts": posts,
        "load_more_url": load_more,
        "preview": preview,
        "style_url": style_url,
        "script_url": script_url,
    });

    app_state
        .template_engine
        .render_template(INDEX_TEMPLATE, globals)
        .await
        .map_err(PageError::Template)
}

fn link_view(link: Option<&PostLink>) -> serde_json::Value {
    match link {
        Some(link) => json!({
            "url": post_url(&link.uid),
            "title": link.title,
            "title_short": truncate_title(&link.title),
        }),
        None => serde_json::Value::Null,
    }
}

async fn render_post(app_state: &AppState, props: &DetailProps) -> Result<String, PageError> {
    let post = &props.post;
    let content: Vec<serde_json::Value> = post
        .data
        .content
        .iter()
        .map(|section| {
            json!({
                "heading": section.heading,
                "body_html": richtext::as_html(&section.body),
            })
        })
        .collect();

    let edited_formatted = post
        .last_publication_date
        .as_ref()
        .filter(|_| post.was_edited())
        .map(format_datetime);

    let banner_alt = post
        .data
        .banner
        .alt
        .clone()
        .unwrap_or_else(|| post.data.title.clone());

    let (style_url, script_url) = asset_globals(app_state).await;

    let globals = liquid::object!({
        "page_title": post.data.title,
        "site_name": app_state.config.app.name,
        "post": {
            "uid": post.uid,
            "title": post.data.title,
            "subtitle": post.data.subtitle,
            "author": post.data.author,
            "banner_url": post.data.banner.url,
            "banner_alt": banner_alt,
            "date_formatted": format_optional_date(post.first_publication_date.as_ref()),
            "edited_formatted": edited_formatted,
            "content": content,
        },
        "reading_time": props.reading_time,
        "prev_page": link_view(props.prev_page.as_ref()),
        "next_page": link_view(props.next_page.as_ref()),
        "preview": props.preview,
        "style_url": style_url,
        "script_url": script_url,
    });

    app_state
        .template_engine
        .render_template(POST_TEMPLATE, globals)
        .await
        .map_err(PageError::Template)
}

/// Renders the home page and every published post into the page cache.
/// Returns how many pages were cached.
pub async fn pregenerate(app_state: &AppState) -> Result<usize, PageError> {
    let uids = enumerate_paths(&app_state.content.scoped(None)).await?;

    let keys = std::iter::once(PageKey::Index).chain(uids.into_iter().map(PageKey::Post));
    let mut generated = 0;
    for key in keys {
        match render_page(app_state, &key, None).await {
            Ok(Page::Html(html)) => {
                app_state.pages.store(key, html).await;
                generated += 1;
            }
            Ok(Page::Redirect(_)) => warn!("Post {} disappeared during pre-generation", key),
            Err(e) => error!("Failed to pre-generate {}: {}", key, e),
        }
    }

    info!("Pre-generated {} pages", generated);
    Ok(generated)
}
