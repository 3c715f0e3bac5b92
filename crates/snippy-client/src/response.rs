//! List endpoint response parsing

use serde::Deserialize;
use snippy_core::{FilterSet, PageResult, Snippet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MalformedResponse {
    #[error("Invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Response is missing `{0}`")]
    MissingField(&'static str),
}

/// Wire shape of `GET /snippets`
#[derive(Debug, Deserialize)]
struct SnippetListResponse {
    snippets: Option<Vec<Snippet>>,
    page: Option<u32>,
    per_page: Option<u32>,
    total_pages: Option<u32>,
    total_items: Option<u64>,
    prev_page: Option<String>,
    next_page: Option<String>,
}

/// Parse a list response body
///
/// `snippets` and `total_pages` are required. The page coordinates fall back
/// to what was requested when the server leaves them out.
pub fn parse_page(body: &[u8], requested: &FilterSet) -> Result<PageResult, MalformedResponse> {
    let wire: SnippetListResponse = serde_json::from_slice(body)?;

    let items = wire
        .snippets
        .ok_or(MalformedResponse::MissingField("snippets"))?;
    let total_pages = wire
        .total_pages
        .ok_or(MalformedResponse::MissingField("total_pages"))?;

    Ok(PageResult {
        total_items: wire.total_items.unwrap_or(items.len() as u64),
        items,
        page: wire.page.unwrap_or(requested.page),
        per_page: wire.per_page.unwrap_or(requested.per_page),
        total_pages,
        prev_page: wire.prev_page,
        next_page: wire.next_page,
    })
}
