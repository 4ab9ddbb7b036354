use crate::content::{Document, RichTextBlock, types::null_as_default};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const POST_TYPE: &str = "posts";

/// `data` of a full post document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtitle: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub banner: Banner,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<ContentSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub heading: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: Vec<RichTextBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: String,
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub last_publication_date: Option<DateTime<Utc>>,
    pub data: PostData,
}

impl Post {
    /// Posts are routed by uid, so a document without one is not a post.
    pub fn from_document(document: Document<PostData>) -> Option<Self> {
        Some(Self {
            id: document.id,
            uid: document.uid?,
            first_publication_date: document.first_publication_date,
            last_publication_date: document.last_publication_date,
            data: document.data,
        })
    }

    pub fn was_edited(&self) -> bool {
        self.first_publication_date != self.last_publication_date
    }
}

/// The fields of `data` shown in the post list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtitle: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub data: SummaryData,
}

impl PostSummary {
    pub fn from_document(document: Document<SummaryData>) -> Option<Self> {
        Some(Self {
            uid: document.uid?,
            first_publication_date: document.first_publication_date,
            data: document.data,
        })
    }

    pub fn url(&self) -> String {
        post_url(&self.uid)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighbourData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
}

/// A previous/next link target on the detail page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostLink {
    pub uid: String,
    pub title: String,
}

impl PostLink {
    pub fn from_document(document: Document<NeighbourData>) -> Option<Self> {
        Some(Self {
            uid: document.uid?,
            title: document.data.title,
        })
    }
}

/// Everything the detail template needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailProps {
    pub post: Post,
    pub next_page: Option<PostLink>,
    pub prev_page: Option<PostLink>,
    pub reading_time: usize,
    pub preview: bool,
}

pub fn post_url(uid: &str) -> String {
    format!("/post/{}", urlencoding::encode(uid))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageKey {
    Index,
    Post(String),
}

impl std::fmt::Display for PageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageKey::Index => write!(f, "/"),
            PageKey::Post(slug) => write!(f, "{}", post_url(slug)),
        }
    }
}

/// Outcome of generating a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Html(String),
    /// Non-permanent redirect to the given location.
    Redirect(String),
}
