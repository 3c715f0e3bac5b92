use thiserror::Error;

/// Errors raised when parsing user-supplied filter values outside the query
/// codec. The codec itself never fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Unknown visibility: {0} (expected `public` or `private`)")]
    UnknownVisibility(String),

    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),
}
