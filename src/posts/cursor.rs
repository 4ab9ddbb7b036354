//! Opaque handles for upstream pagination cursors.
//!
//! The content API's `next_page` URLs carry the access token, so they never
//! leave the server. The browser only sees an opaque handle that maps back to
//! the upstream URL until it expires.

use rand::Rng;
use sha2::{Digest, Sha256};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CursorEntry {
    upstream: String,
    expires_at: i64,
}

/// Handles are derived from the upstream URL with a per-process key, so a
/// URL always maps to the same handle. A page still holding a handle that
/// expired gets it back working as soon as the page is regenerated.
#[derive(Debug, Clone)]
pub struct CursorRegistry {
    ttl: Duration,
    key: Arc<[u8; 32]>,
    entries: Arc<RwLock<HashMap<String, CursorEntry>>>,
}

impl CursorRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            key: Arc::new(rand::rng().random::<[u8; 32]>()),
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn expiry(&self) -> i64 {
        chrono::Utc::now().timestamp() + self.ttl.as_secs() as i64
    }

    /// Returns the handle for `upstream` and re-arms its expiry.
    pub async fn register(&self, upstream: String) -> String {
        let now = chrono::Utc::now().timestamp();
        let handle = self.handle_for(&upstream);
        let mut entries = self.entries.write().await;

        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            handle.clone(),
            CursorEntry {
                upstream,
                expires_at: self.expiry(),
            },
        );
        handle
    }

    /// Upstream URL behind `handle`. Every hit extends the handle's life.
    pub async fn resolve(&self, handle: &str) -> Option<String> {
        let now = chrono::Utc::now().timestamp();
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(handle)
            .filter(|entry| entry.expires_at > now)?;
        entry.expires_at = self.expiry();
        Some(entry.upstream.clone())
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn handle_for(&self, upstream: &str) -> String {
        let digest = Sha256::new()
            .chain_update(self.key.as_slice())
            .chain_update(upstream.as_bytes())
            .finalize();
        digest[..16].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Browser-facing URL for a cursor handle.
pub fn load_more_url(handle: &str) -> String {
    format!("/api/posts?cursor={}", handle)
}
