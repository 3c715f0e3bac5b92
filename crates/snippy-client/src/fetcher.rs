//! List fetcher trait

use async_trait::async_trait;
use snippy_core::{FilterSet, PageResult};
use thiserror::Error;

use crate::Credential;

/// Failures a fetch surfaces to its caller
///
/// Shape errors in the response body are not in this list: fetchers absorb
/// them into an empty page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Network error: {0}")]
    Network(String),
}

/// Reads one page of snippets matching a filter set
#[async_trait]
pub trait ListFetcher: Send + Sync {
    /// Perform exactly one read, with no retries
    ///
    /// Without a credential this must return `FetchError::Unauthenticated`
    /// without touching the network.
    async fn fetch(
        &self,
        filters: &FilterSet,
        credential: Option<&Credential>,
    ) -> Result<PageResult, FetchError>;
}
