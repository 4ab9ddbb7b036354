//! Client for the headless content API (Prismic v2 REST).
//!
//! The client is built once at startup from [`crate::ContentConfig`] and an
//! [`AccessToken`] and is cheap to clone. Page generation works through a
//! [`ScopedClient`], which pins every query to either the master ref or the
//! ref carried by an editor's preview session.

pub mod client;
pub mod error;
pub mod query;
pub mod richtext;
pub mod types;

pub use client::{AccessToken, ContentClient, RetryPolicy, ScopedClient};
pub use error::ContentError;
pub use query::{Predicate, QueryOptions};
pub use richtext::RichTextBlock;
pub use types::{ApiRoot, Document, SearchResponse};
