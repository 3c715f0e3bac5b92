//! Query codec - FilterSet <-> URL query string
//!
//! Both directions are total: `encode` always produces a canonical string and
//! `decode` degrades malformed input to defaults instead of failing.
//!
//! Laws:
//! - `decode(&encode(f)) == f` for every normalized `f`
//! - `encode(&decode(&encode(f))) == encode(f)`

use std::borrow::Cow;

use tracing::trace;
use url::form_urlencoded;

use crate::filter::{self, DEFAULT_PAGE, DEFAULT_PER_PAGE, FilterSet, Language, Visibility};

pub const PAGE: &str = "page";
pub const PER_PAGE: &str = "per_page";
pub const TAGS: &str = "tags";
pub const LANGUAGE: &str = "language";
pub const VISIBILITY: &str = "visibility";
pub const USERNAME: &str = "username";
pub const CREATED_BEFORE: &str = "created_before";
pub const CREATED_AFTER: &str = "created_after";

/// Encode filters as a query string (no leading `?`)
///
/// Fields at their default are omitted, tags are emitted as repeated `tags=`
/// pairs and keys always appear in the same order.
pub fn encode(filters: &FilterSet) -> String {
    let filters = filters.clone().normalized();
    let mut out = form_urlencoded::Serializer::new(String::new());

    if filters.page != DEFAULT_PAGE {
        out.append_pair(PAGE, &filters.page.to_string());
    }
    if filters.per_page != DEFAULT_PER_PAGE {
        out.append_pair(PER_PAGE, &filters.per_page.to_string());
    }
    for tag in &filters.tags {
        out.append_pair(TAGS, tag);
    }
    if let Some(language) = filters.language {
        out.append_pair(LANGUAGE, language.as_str());
    }
    if let Some(visibility) = filters.visibility {
        out.append_pair(VISIBILITY, visibility.as_str());
    }
    if let Some(username) = &filters.username {
        out.append_pair(USERNAME, username);
    }
    if let Some(date) = filters.created_before {
        out.append_pair(CREATED_BEFORE, &filter::format_date(date));
    }
    if let Some(date) = filters.created_after {
        out.append_pair(CREATED_AFTER, &filter::format_date(date));
    }

    out.finish()
}

/// Decode a query string (with or without a leading `?`) into filters
///
/// Scalar parameters take their first occurrence. Unknown parameters are
/// ignored.
pub fn decode(query: &str) -> FilterSet {
    let query = query.strip_prefix('?').unwrap_or(query);
    let pairs: Vec<(Cow<'_, str>, Cow<'_, str>)> =
        form_urlencoded::parse(query.as_bytes()).collect();

    let first = |key: &str| first_value(&pairs, key);

    let filters = FilterSet {
        page: first(PAGE).and_then(parse_positive).unwrap_or(DEFAULT_PAGE),
        per_page: first(PER_PAGE)
            .and_then(parse_positive)
            .unwrap_or(DEFAULT_PER_PAGE),
        tags: pairs
            .iter()
            .filter(|(k, _)| k == TAGS)
            .map(|(_, v)| v.to_string())
            .collect(),
        language: first(LANGUAGE).and_then(|v| v.parse::<Language>().ok()),
        visibility: first(VISIBILITY).and_then(|v| v.parse::<Visibility>().ok()),
        username: first(USERNAME).map(str::to_string),
        created_before: first(CREATED_BEFORE).and_then(|v| filter::parse_date(v).ok()),
        created_after: first(CREATED_AFTER).and_then(|v| filter::parse_date(v).ok()),
    };

    for (key, _) in &pairs {
        if !is_known(key) {
            trace!(key = %key, "ignoring unknown query parameter");
        }
    }

    filters.normalized()
}

fn first_value<'a>(pairs: &'a [(Cow<'_, str>, Cow<'_, str>)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.as_ref())
}

fn parse_positive(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

fn is_known(key: &str) -> bool {
    matches!(
        key,
        PAGE | PER_PAGE | TAGS | LANGUAGE | VISIBILITY | USERNAME | CREATED_BEFORE | CREATED_AFTER
    )
}
