use super::{
    reading_time::estimate_reading_time,
    types::{DetailProps, NeighbourData, POST_TYPE, Post, PostData, PostLink},
};
use crate::content::{
    ContentError, Predicate, QueryOptions, ScopedClient,
    query::{ORDER_FIRST_PUBLICATION_ASC, ORDER_FIRST_PUBLICATION_DESC},
};
use tracing::debug;

/// Loads a post by slug together with its neighbours in publication order.
/// `Ok(None)` when no post has that slug in the client's ref.
pub async fn generate_detail(
    client: &ScopedClient,
    slug: &str,
) -> Result<Option<DetailProps>, ContentError> {
    let Some(document) = client.get_by_uid::<PostData>(POST_TYPE, slug).await? else {
        debug!("No post with slug {}", slug);
        return Ok(None);
    };
    let Some(post) = Post::from_document(document) else {
        return Ok(None);
    };

    let (next_page, prev_page) = tokio::try_join!(
        neighbour(client, &post.id, ORDER_FIRST_PUBLICATION_DESC),
        neighbour(client, &post.id, ORDER_FIRST_PUBLICATION_ASC),
    )?;

    Ok(Some(DetailProps {
        reading_time: estimate_reading_time(&post.data.content),
        post,
        next_page,
        prev_page,
        preview: client.is_preview(),
    }))
}

/// The first post after `id` in the given ordering.
async fn neighbour(
    client: &ScopedClient,
    id: &str,
    orderings: &str,
) -> Result<Option<PostLink>, ContentError> {
    let response = client
        .query::<NeighbourData>(
            &[Predicate::document_type(POST_TYPE)],
            &QueryOptions::new().page_size(1).after(id).orderings(orderings),
        )
        .await?;
    Ok(response
        .results
        .into_iter()
        .next()
        .and_then(PostLink::from_document))
}
