//! Core domain models and logic for snippy
//!
//! This crate contains:
//! - Filter model (FilterSet, FilterAction reducer)
//! - Query codec (FilterSet <-> URL query string)
//! - Page model (PageResult, Snippet)
//! - Pagination control layout

pub mod error;
pub mod filter;
pub mod page;
pub mod pagination;
pub mod query;

pub use error::ParseError;
pub use filter::{FilterAction, FilterSet, Language, Visibility};
pub use page::{PageResult, Snippet};
pub use pagination::PageItem;
