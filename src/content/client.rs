use super::{
    error::ContentError,
    query::{Predicate, QueryOptions, predicate_query},
    types::{ApiRoot, Document, SearchResponse},
};
use crate::ContentConfig;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::{fmt, sync::Arc, time::Duration};
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

/// The content API access token. Only ever written into outgoing request
/// URLs; `Debug` and `Display` are redacted.
#[derive(Clone)]
pub struct AccessToken(Arc<str>);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::from(token.into()))
    }

    pub fn from_env(variable: &str) -> Result<Self, ContentError> {
        match std::env::var(variable) {
            Ok(token) if !token.trim().is_empty() => Ok(Self::new(token.trim())),
            _ => Err(ContentError::MissingAccessToken(variable.to_string())),
        }
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[derive(Clone, Debug)]
pub struct ContentClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: AccessToken,
    retry: RetryPolicy,
}

impl ContentClient {
    pub fn new(config: &ContentConfig, access_token: AccessToken) -> Result<Self, ContentError> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        Url::parse(&endpoint)?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("spacetravelling/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ContentError::Client(e.without_url().to_string()))?;

        Ok(Self {
            http,
            endpoint,
            access_token,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                backoff: Duration::from_millis(config.retry_backoff_ms),
            },
        })
    }

    /// A client whose queries resolve against `preview_ref` when present,
    /// otherwise against the master ref current at its first query.
    pub fn scoped(&self, preview_ref: Option<String>) -> ScopedClient {
        ScopedClient {
            client: self.clone(),
            preview: preview_ref.is_some(),
            reference: Arc::new(OnceCell::new_with(preview_ref)),
        }
    }

    pub async fn master_ref(&self) -> Result<String, ContentError> {
        let mut url = Url::parse(&self.endpoint)?;
        url.query_pairs_mut()
            .append_pair("access_token", self.access_token.expose());

        let root: ApiRoot = self.get_json(url).await?;
        root.master_ref()
            .map(str::to_string)
            .ok_or(ContentError::NoMasterRef)
    }

    /// Fetches a `next_page` cursor exactly as the API returned it.
    pub async fn fetch_page<D: DeserializeOwned>(
        &self,
        cursor: &str,
    ) -> Result<SearchResponse<D>, ContentError> {
        let url = Url::parse(cursor)?;
        self.get_json(url).await
    }

    /// Validates a preview token against a document.
    ///
    /// Returns `Ok(None)` when the API rejects the token, the path produced
    /// by `link_resolver` for the document, or `default_url` when the ref is
    /// valid but the document is not visible in it.
    pub async fn resolve_preview<F>(
        &self,
        token: &str,
        document_id: &str,
        link_resolver: F,
        default_url: &str,
    ) -> Result<Option<String>, ContentError>
    where
        F: Fn(&Document<serde_json::Value>) -> String,
    {
        let scoped = self.scoped(Some(token.to_string()));
        match scoped.get_by_id::<serde_json::Value>(document_id).await {
            Ok(Some(document)) => Ok(Some(link_resolver(&document))),
            Ok(None) => Ok(Some(default_url.to_string())),
            Err(ContentError::Rejected { status }) => {
                debug!("Preview token rejected by content API with status {}", status);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn search_url(
        &self,
        reference: &str,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<Url, ContentError> {
        let mut url = Url::parse(&format!("{}/documents/search", self.endpoint))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", reference);
            pairs.append_pair("q", &predicate_query(predicates));
            for (key, value) in options.query_pairs() {
                pairs.append_pair(key, &value);
            }
            pairs.append_pair("access_token", self.access_token.expose());
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ContentError> {
        let mut attempt = 0;
        loop {
            match self.get_json_once(&url).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt);
                    attempt += 1;
                    warn!(
                        path = %url.path(),
                        attempt,
                        "Content API request failed, retrying in {:?}: {}",
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_json_once<T: DeserializeOwned>(&self, url: &Url) -> Result<T, ContentError> {
        debug!(path = %url.path(), "Content API request");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(ContentError::from_transport)?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ContentError::UpstreamUnavailable(format!(
                "status {}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(ContentError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(ContentError::from_transport)?;
        serde_json::from_slice(&body).map_err(|e| ContentError::Decode(e.to_string()))
    }
}

/// A [`ContentClient`] pinned to one content ref for the duration of a page
/// generation. The master ref is looked up once and shared by every clone.
#[derive(Clone, Debug)]
pub struct ScopedClient {
    client: ContentClient,
    preview: bool,
    reference: Arc<OnceCell<String>>,
}

impl ScopedClient {
    pub fn is_preview(&self) -> bool {
        self.preview
    }

    pub fn client(&self) -> &ContentClient {
        &self.client
    }

    async fn reference(&self) -> Result<&str, ContentError> {
        self.reference
            .get_or_try_init(|| self.client.master_ref())
            .await
            .map(String::as_str)
    }

    pub async fn query<D: DeserializeOwned>(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<SearchResponse<D>, ContentError> {
        let reference = self.reference().await?;
        let url = self.client.search_url(reference, predicates, options)?;
        self.client.get_json(url).await
    }

    pub async fn get_by_uid<D: DeserializeOwned>(
        &self,
        doc_type: &str,
        uid: &str,
    ) -> Result<Option<Document<D>>, ContentError> {
        let predicates = [Predicate::uid(doc_type, uid)];
        let response = self
            .query::<D>(&predicates, &QueryOptions::new().page_size(1))
            .await?;
        Ok(response.results.into_iter().next())
    }

    pub async fn get_by_id<D: DeserializeOwned>(
        &self,
        id: &str,
    ) -> Result<Option<Document<D>>, ContentError> {
        let predicates = [Predicate::id(id)];
        let response = self
            .query::<D>(&predicates, &QueryOptions::new().page_size(1))
            .await?;
        Ok(response.results.into_iter().next())
    }
}
