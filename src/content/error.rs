use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Access token environment variable {0} is not set")]
    MissingAccessToken(String),

    #[error("Invalid content API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Content API unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Content API rejected the request with status {status}")]
    Rejected { status: u16 },

    #[error("Failed to decode content API response: {0}")]
    Decode(String),

    #[error("Content API returned no master ref")]
    NoMasterRef,
}

impl ContentError {
    /// Failures worth another attempt: transport errors, timeouts and 5xx/429.
    pub fn is_transient(&self) -> bool {
        matches!(self, ContentError::UpstreamUnavailable(_))
    }

    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        // reqwest includes the request URL in its message, and ours carry the token
        let error = error.without_url();
        if error.is_decode() {
            ContentError::Decode(error.to_string())
        } else {
            ContentError::UpstreamUnavailable(error.to_string())
        }
    }
}
