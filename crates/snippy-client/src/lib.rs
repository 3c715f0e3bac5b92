//! Snippet list client
//!
//! This crate provides:
//! - The `ListFetcher` seam the synchronizer reads pages through
//! - `SnippetFetcher`, the REST implementation, over a pluggable `Transport`
//! - Credential handling

pub mod credential;
pub mod fetcher;
pub mod response;
pub mod snippets;
pub mod transport;

pub use credential::{Credential, CredentialProvider, SharedCredentials, StaticCredentials};
pub use fetcher::{FetchError, ListFetcher};
pub use response::MalformedResponse;
pub use snippets::SnippetFetcher;
pub use transport::{HttpTransport, ListRequest, RawResponse, Transport, TransportError};
