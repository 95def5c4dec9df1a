use std::sync::Arc;
use thiserror::Error;

/// Failure talking to the remote catalog.
///
/// `Status` and `Transport` are the two flavours of a remote fetch failure;
/// both carry the URL that was attempted. Errors are cheap to clone so one
/// failed upstream call can be handed to every caller waiting on it.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The service answered with a non-success status.
    #[error("upstream returned status {status} for {url}")]
    Status { url: String, status: u16 },

    /// The request never completed, or the body could not be decoded.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Arc<reqwest::Error>,
    },

    /// Single-product lookup found nothing.
    #[error("product {id} not found")]
    NotFound { id: u64 },
}

impl CatalogError {
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        CatalogError::Transport {
            url: url.into(),
            source: Arc::new(source),
        }
    }

    /// URL of the failed request, when one was made.
    pub fn url(&self) -> Option<&str> {
        match self {
            CatalogError::Status { url, .. } | CatalogError::Transport { url, .. } => Some(url),
            CatalogError::NotFound { .. } => None,
        }
    }

    /// HTTP status of the failed request, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Status { status, .. } => Some(*status),
            CatalogError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            CatalogError::NotFound { .. } => Some(404),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }
}

/// A listing parameter that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("invalid category {0:?}")]
    InvalidCategory(String),

    #[error("invalid sort order {0:?}, expected \"asc\" or \"desc\"")]
    InvalidOrder(String),
}
