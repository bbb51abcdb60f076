//! Error types for rvh

use thiserror::Error;

/// Main error type for rvh operations
#[derive(Debug, Error)]
pub enum RvhError {
    #[error("Failed to fetch {url}: {cause}")]
    FetchFailed { url: String, cause: String },

    #[error("Malformed details panel: {0}")]
    MalformedDetails(String),

    #[error("No verification link found in page scripts")]
    NoVpiReference,

    #[error("Verification page asked for a second refresh")]
    RefreshLoop,

    #[error("Unrecognized verification page: {0}")]
    UnrecognizedPageShape(String),

    #[error("No results found")]
    NoResults,

    #[error("Invalid selection {index}: expected 0..{count}")]
    InvalidSelection { index: usize, count: usize },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP client error: {0}")]
    ClientError(String),

    #[error("Selector error: {0}")]
    SelectorError(String),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),
}

impl RvhError {
    /// Build a `FetchFailed` from any displayable cause
    pub fn fetch_failed(url: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        RvhError::FetchFailed {
            url: url.into(),
            cause: cause.to_string(),
        }
    }

    /// Check if error points at a change in the upstream page format
    pub fn is_upstream_format_error(&self) -> bool {
        matches!(
            self,
            RvhError::MalformedDetails(_)
                | RvhError::NoVpiReference
                | RvhError::UnrecognizedPageShape(_)
        )
    }

    /// Short advice printed under the error, if any
    pub fn hint(&self) -> Option<&'static str> {
        if self.is_upstream_format_error() {
            Some("The site's page format may have changed")
        } else {
            match self {
                RvhError::RefreshLoop => Some("The site kept asking for a refresh; try again later"),
                RvhError::NoResults => Some("Try --loose to search for the words in any order"),
                _ => None,
            }
        }
    }
}
