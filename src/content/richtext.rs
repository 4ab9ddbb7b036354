//! Structured rich text as delivered by the content API, and its plain
//! text and HTML renderings.
//!
//! Span offsets are treated as character offsets into `text`.

use serde::{Deserialize, Serialize};

use super::types::null_as_default;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Preformatted,
    ListItem,
    OListItem,
    Image,
    Embed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spans: Vec<Span>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub oembed: Option<Embed>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Embed {
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default)]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type", default)]
    pub doc_type: Option<String>,
}

/// Plain text of every block, joined with a single space.
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .map(|block| block.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut html = String::new();
    let mut open_list: Option<BlockKind> = None;

    for block in blocks {
        let list_kind = matches!(block.kind, BlockKind::ListItem | BlockKind::OListItem)
            .then_some(block.kind);

        if open_list != list_kind {
            if let Some(kind) = open_list {
                html.push_str(list_close(kind));
            }
            if let Some(kind) = list_kind {
                html.push_str(list_open(kind));
            }
            open_list = list_kind;
        }

        match block.kind {
            BlockKind::Paragraph => wrap(&mut html, "p", block),
            BlockKind::Heading1 => wrap(&mut html, "h1", block),
            BlockKind::Heading2 => wrap(&mut html, "h2", block),
            BlockKind::Heading3 => wrap(&mut html, "h3", block),
            BlockKind::Heading4 => wrap(&mut html, "h4", block),
            BlockKind::Heading5 => wrap(&mut html, "h5", block),
            BlockKind::Heading6 => wrap(&mut html, "h6", block),
            BlockKind::Preformatted => wrap(&mut html, "pre", block),
            BlockKind::ListItem | BlockKind::OListItem => wrap(&mut html, "li", block),
            BlockKind::Image => {
                if let Some(url) = &block.url {
                    html.push_str(&format!(
                        r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                        escape_html(url),
                        escape_html(block.alt.as_deref().unwrap_or(""))
                    ));
                }
            }
            BlockKind::Embed => {
                if let Some(embed) = &block.oembed {
                    html.push_str(&format!(
                        r#"<div data-oembed="{}">{}</div>"#,
                        escape_html(embed.embed_url.as_deref().unwrap_or("")),
                        embed.html.as_deref().unwrap_or("")
                    ));
                }
            }
            BlockKind::Unknown => {}
        }
    }

    if let Some(kind) = open_list {
        html.push_str(list_close(kind));
    }

    html
}

fn list_open(kind: BlockKind) -> &'static str {
    if kind == BlockKind::OListItem {
        "<ol>"
    } else {
        "<ul>"
    }
}

fn list_close(kind: BlockKind) -> &'static str {
    if kind == BlockKind::OListItem {
        "</ol>"
    } else {
        "</ul>"
    }
}

fn wrap(html: &mut String, tag: &str, block: &RichTextBlock) {
    html.push('<');
    html.push_str(tag);
    html.push('>');
    html.push_str(&render_spans(&block.text, &block.spans));
    html.push_str("</");
    html.push_str(tag);
    html.push('>');
}

fn render_spans(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();

    let mut spans: Vec<&Span> = spans
        .iter()
        .filter(|span| span.start < span.end && span.end <= chars.len())
        .collect();
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut open: Vec<&Span> = Vec::new();
    let mut next = 0;

    for (index, c) in chars.iter().enumerate() {
        close_ended(&mut out, &mut open, index);

        while next < spans.len() && spans[next].start == index {
            out.push_str(&open_tag(spans[next]));
            open.push(spans[next]);
            next += 1;
        }

        match c {
            '\n' => out.push_str("<br />"),
            _ => push_escaped(&mut out, *c),
        }
    }

    close_ended(&mut out, &mut open, chars.len());
    out
}

/// Closes every open span that ends at `index`. Spans opened inside one of
/// those but still running are closed and reopened to keep the markup nested.
fn close_ended<'a>(out: &mut String, open: &mut Vec<&'a Span>, index: usize) {
    let Some(first_ended) = open.iter().position(|span| span.end <= index) else {
        return;
    };

    let reopen: Vec<&Span> = open[first_ended..]
        .iter()
        .filter(|span| span.end > index)
        .copied()
        .collect();

    for span in open[first_ended..].iter().rev() {
        out.push_str(close_tag(span));
    }
    open.truncate(first_ended);

    for span in reopen {
        out.push_str(&open_tag(span));
        open.push(span);
    }
}

fn open_tag(span: &Span) -> String {
    let data = span.data.clone().unwrap_or_default();
    match span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink => {
            let href = match (&data.url, &data.uid, data.doc_type.as_deref()) {
                (Some(url), _, _) => url.clone(),
                (None, Some(uid), Some("posts")) => format!("/post/{}", urlencoding::encode(uid)),
                _ => "/".to_string(),
            };
            match &data.target {
                Some(target) => format!(
                    r#"<a href="{}" target="{}" rel="noopener">"#,
                    escape_html(&href),
                    escape_html(target)
                ),
                None => format!(r#"<a href="{}">"#, escape_html(&href)),
            }
        }
        SpanKind::Label => format!(
            r#"<span class="{}">"#,
            escape_html(data.label.as_deref().unwrap_or(""))
        ),
        SpanKind::Unknown => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink => "</a>",
        SpanKind::Label | SpanKind::Unknown => "</span>",
    }
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(c),
    }
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        push_escaped(&mut out, c);
    }
    out
}
