//! HTTP transport used by `SnippetFetcher`

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::Credential;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// An authenticated GET against a list endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub url: String,
    pub credential: Credential,
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: ListRequest) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: ListRequest) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .get(&request.url)
            .bearer_auth(request.credential.bearer())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}
