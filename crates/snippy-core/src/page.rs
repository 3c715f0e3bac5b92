//! Page domain model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::FilterSet;

/// One snippet as returned by the list endpoint
///
/// Only `uuid` matters to list synchronization; the remaining fields are
/// carried for display and default when the server leaves them out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub uuid: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Snippet {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            title: title.into(),
            language: String::new(),
            is_private: false,
            description: String::new(),
            tags: Vec::new(),
            content: None,
        }
    }
}

/// One page of snippets plus pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// Server order, never re-sorted locally
    pub items: Vec<Snippet>,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
}

impl PageResult {
    /// Structurally valid "no results" page for the given filters
    pub fn empty(filters: &FilterSet) -> Self {
        Self {
            items: Vec::new(),
            page: filters.page,
            per_page: filters.per_page,
            total_pages: 0,
            total_items: 0,
            prev_page: None,
            next_page: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `1 <= page <= max(total_pages, 1)`
    pub fn page_in_range(&self) -> bool {
        self.page >= 1 && self.page <= self.total_pages.max(1)
    }

    /// Item keys in server order
    pub fn ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.items.iter().map(|s| s.uuid)
    }
}
