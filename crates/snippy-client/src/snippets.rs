//! REST implementation of `ListFetcher`

use async_trait::async_trait;
use snippy_core::{FilterSet, PageResult, query};
use tracing::{debug, warn};

use crate::Credential;
use crate::fetcher::{FetchError, ListFetcher};
use crate::response;
use crate::transport::{ListRequest, Transport};

/// Fetches snippet pages from `<base_url><list_path>?<query>`
pub struct SnippetFetcher<T> {
    transport: T,
    endpoint: String,
}

impl<T: Transport> SnippetFetcher<T> {
    pub fn new(transport: T, base_url: &str, list_path: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let endpoint = if list_path.starts_with('/') {
            format!("{}{}", base, list_path)
        } else {
            format!("{}/{}", base, list_path)
        };
        Self {
            transport,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Full request URL for a filter set, query exactly as the codec emits it
    pub fn request_url(&self, filters: &FilterSet) -> String {
        let query = query::encode(filters);
        if query.is_empty() {
            self.endpoint.clone()
        } else {
            format!("{}?{}", self.endpoint, query)
        }
    }
}

#[async_trait]
impl<T: Transport> ListFetcher for SnippetFetcher<T> {
    async fn fetch(
        &self,
        filters: &FilterSet,
        credential: Option<&Credential>,
    ) -> Result<PageResult, FetchError> {
        let Some(credential) = credential else {
            debug!("no credential, skipping snippet fetch");
            return Err(FetchError::Unauthenticated);
        };

        let request = ListRequest {
            url: self.request_url(filters),
            credential: credential.clone(),
        };
        debug!(url = %request.url, "fetching snippets");

        let response = self.transport.get(request).await.map_err(|e| {
            warn!(error = %e, "snippet fetch failed");
            FetchError::Network(e.to_string())
        })?;

        if !response.is_success() {
            warn!(status = response.status, "snippet fetch returned an error status");
            return Err(FetchError::Network(format!("HTTP error {}", response.status)));
        }

        match response::parse_page(&response.body, filters) {
            Ok(page) => Ok(page),
            Err(e) => {
                warn!(error = %e, "malformed snippet list response, treating as empty");
                Ok(PageResult::empty(filters))
            }
        }
    }
}
