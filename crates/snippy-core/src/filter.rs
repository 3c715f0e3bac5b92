//! Filter domain model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::ParseError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 20;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Snippet language, matched case-insensitively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Python, Language::JavaScript];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::UnknownLanguage(s.to_string()))
    }
}

/// Visibility filter. Absent means "all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Only the exact literals are accepted.
impl FromStr for Visibility {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(ParseError::UnknownVisibility(other.to_string())),
        }
    }
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`)
pub fn parse_date(s: &str) -> Result<Date, ParseError> {
    Date::parse(s.trim(), DATE_FORMAT).map_err(|_| ParseError::InvalidDate(s.to_string()))
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

/// The structured description of which snippets to list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    pub page: u32,
    pub per_page: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_before: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_after: Option<Date>,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            tags: Vec::new(),
            language: None,
            visibility: None,
            username: None,
            created_before: None,
            created_after: None,
        }
    }
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_created_before(mut self, date: Date) -> Self {
        self.created_before = Some(date);
        self
    }

    pub fn with_created_after(mut self, date: Date) -> Self {
        self.created_after = Some(date);
        self
    }

    /// Bring every field into its canonical form:
    /// - page >= 1
    /// - per_page in 1..=MAX_PER_PAGE (0 falls back to the default)
    /// - tags non-empty and de-duplicated, first occurrence wins
    /// - empty username dropped
    pub fn normalized(mut self) -> Self {
        if self.page == 0 {
            self.page = DEFAULT_PAGE;
        }
        self.per_page = match self.per_page {
            0 => DEFAULT_PER_PAGE,
            n => n.min(MAX_PER_PAGE),
        };

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        self.tags = tags;

        self.username = self.username.filter(|u| !u.is_empty());
        self
    }

    pub fn is_normalized(&self) -> bool {
        self.clone().normalized() == *self
    }

    /// Compute the next filter set for a user edit
    ///
    /// Any edit other than a page move starts over at page 1.
    pub fn apply(&self, action: FilterAction) -> FilterSet {
        let mut next = self.clone();
        match action {
            FilterAction::SetPage(page) => next.page = page.max(DEFAULT_PAGE),
            FilterAction::NextPage => next.page = self.page.saturating_add(1),
            FilterAction::PrevPage => next.page = self.page.saturating_sub(1).max(DEFAULT_PAGE),
            FilterAction::SetPerPage(per_page) => {
                next.per_page = per_page;
                next.page = DEFAULT_PAGE;
            }
            FilterAction::AddTag(tag) => {
                next.tags.push(tag);
                next.page = DEFAULT_PAGE;
            }
            FilterAction::RemoveTag(tag) => {
                next.tags.retain(|t| *t != tag);
                next.page = DEFAULT_PAGE;
            }
            FilterAction::ToggleTag(tag) => {
                if next.tags.contains(&tag) {
                    next.tags.retain(|t| *t != tag);
                } else {
                    next.tags.push(tag);
                }
                next.page = DEFAULT_PAGE;
            }
            FilterAction::ClearTags => {
                next.tags.clear();
                next.page = DEFAULT_PAGE;
            }
            FilterAction::SetLanguage(language) => {
                next.language = language;
                next.page = DEFAULT_PAGE;
            }
            FilterAction::SetVisibility(visibility) => {
                next.visibility = visibility;
                next.page = DEFAULT_PAGE;
            }
            FilterAction::SetUsername(username) => {
                next.username = username;
                next.page = DEFAULT_PAGE;
            }
            FilterAction::SetCreatedBefore(date) => {
                next.created_before = date;
                next.page = DEFAULT_PAGE;
            }
            FilterAction::SetCreatedAfter(date) => {
                next.created_after = date;
                next.page = DEFAULT_PAGE;
            }
            FilterAction::Reset => next = FilterSet::default(),
        }
        next.normalized()
    }
}

/// A user edit to the active filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction {
    SetPage(u32),
    NextPage,
    PrevPage,
    SetPerPage(u32),
    AddTag(String),
    RemoveTag(String),
    ToggleTag(String),
    ClearTags,
    SetLanguage(Option<Language>),
    SetVisibility(Option<Visibility>),
    SetUsername(Option<String>),
    SetCreatedBefore(Option<Date>),
    SetCreatedAfter(Option<Date>),
    Reset,
}
