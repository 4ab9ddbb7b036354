use super::types::{POST_TYPE, PostSummary, SummaryData};
use crate::content::{
    ContentClient, ContentError, Predicate, QueryOptions, ScopedClient, SearchResponse,
    query::ORDER_LAST_PUBLICATION_DESC,
};
use tracing::{debug, info};

/// Page size used when walking every post for pre-generation.
const ENUMERATION_PAGE_SIZE: usize = 100;

/// The post list shown on the home page, plus the upstream cursor for the
/// next batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFeed {
    pub results: Vec<PostSummary>,
    pub next_page: Option<String>,
}

impl PostFeed {
    pub fn from_response(response: SearchResponse<SummaryData>) -> Self {
        Self {
            results: response
                .results
                .into_iter()
                .filter_map(PostSummary::from_document)
                .collect(),
            next_page: response.next_page,
        }
    }

    pub fn can_load_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Appends a batch, skipping posts already listed, and moves the cursor
    /// to the batch's `next_page`. Returns the posts actually appended.
    pub fn extend(&mut self, batch: PostFeed) -> Vec<PostSummary> {
        let mut added = Vec::new();
        for post in batch.results {
            if self.results.iter().any(|existing| existing.uid == post.uid) {
                debug!("Skipping duplicate post {}", post.uid);
                continue;
            }
            self.results.push(post.clone());
            added.push(post);
        }
        self.next_page = batch.next_page;
        added
    }

    /// Fetches and appends the next batch. Returns `false` without any
    /// request when there is nothing left to load.
    pub async fn load_more(&mut self, client: &ContentClient) -> Result<bool, ContentError> {
        let Some(cursor) = self.next_page.as_deref() else {
            return Ok(false);
        };
        let batch = PostFeed::from_response(client.fetch_page(cursor).await?);
        self.extend(batch);
        Ok(true)
    }
}

/// First page of posts, most recently edited first.
pub async fn first_page(client: &ScopedClient, page_size: usize) -> Result<PostFeed, ContentError> {
    let response = client
        .query::<SummaryData>(
            &[Predicate::document_type(POST_TYPE)],
            &QueryOptions::new()
                .page_size(page_size)
                .orderings(ORDER_LAST_PUBLICATION_DESC),
        )
        .await?;
    Ok(PostFeed::from_response(response))
}

/// Every post uid, following the cursor chain to the end.
pub async fn enumerate_paths(client: &ScopedClient) -> Result<Vec<String>, ContentError> {
    let mut feed = first_page(client, ENUMERATION_PAGE_SIZE).await?;
    while feed.load_more(client.client()).await? {}

    let uids: Vec<String> = feed.results.into_iter().map(|post| post.uid).collect();
    info!("Enumerated {} post paths", uids.len());
    Ok(uids)
}
