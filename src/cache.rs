//! In-memory store of generated pages with stale-while-revalidate semantics.
//!
//! A page younger than the revalidation window is served as is. An older
//! page is still served, but the caller should regenerate it in the
//! background. Only one regeneration per page runs at a time.

use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Fresh(String),
    Stale(String),
    Missing,
}

struct CachedPage {
    html: String,
    generated_at: Instant,
}

#[derive(Clone)]
pub struct PageCache<K> {
    revalidate_after: Duration,
    entries: Arc<RwLock<HashMap<K, CachedPage>>>,
    regenerating: Arc<RwLock<HashSet<K>>>,
}

impl<K> PageCache<K>
where
    K: Eq + Hash + Clone + std::fmt::Display,
{
    pub fn new(revalidate_after: Duration) -> Self {
        Self {
            revalidate_after,
            entries: Arc::new(RwLock::new(HashMap::new())),
            regenerating: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    pub async fn lookup(&self, key: &K) -> Lookup {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(page) if page.generated_at.elapsed() < self.revalidate_after => {
                Lookup::Fresh(page.html.clone())
            }
            Some(page) => Lookup::Stale(page.html.clone()),
            None => Lookup::Missing,
        }
    }

    pub async fn store(&self, key: K, html: String) {
        debug!("Caching page {}", key);
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CachedPage {
                html,
                generated_at: Instant::now(),
            },
        );
    }

    pub async fn remove(&self, key: &K) {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            debug!("Dropped cached page {}", key);
        }
    }

    /// Claims the regeneration of `key`. `false` when another task already
    /// holds it.
    pub async fn begin_regeneration(&self, key: &K) -> bool {
        let mut regenerating = self.regenerating.write().await;
        regenerating.insert(key.clone())
    }

    pub async fn end_regeneration(&self, key: &K) {
        let mut regenerating = self.regenerating.write().await;
        regenerating.remove(key);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
