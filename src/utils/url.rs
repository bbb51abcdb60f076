//! URL utilities for the video host: base URL, search URLs and link joining

use crate::error::RvhError;
use url::form_urlencoded;
use url::Url;

/// Host the tool talks to unless overridden
pub const DEFAULT_BASE_URL: &str = "http://veehd.com";

/// Site configuration shared by the fetcher, extractor and resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    base_url: Url,
}

impl SiteConfig {
    /// Create a site configuration rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self, RvhError> {
        let parsed = Url::parse(base_url)?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RvhError::InvalidUrl(format!(
                "Unsupported scheme in base URL: {}",
                parsed.scheme()
            )));
        }
        if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
            return Err(RvhError::InvalidUrl(format!(
                "Base URL has no host: {}",
                base_url
            )));
        }

        // Keep a trailing slash so relative joins stay under a mirror prefix
        let mut parsed = parsed;
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        Ok(Self { base_url: parsed })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the search URL for an already formatted query
    ///
    /// `search` is joined relative to the base, so a path prefix is kept.
    pub fn search_url(&self, query: &str) -> Result<Url, RvhError> {
        let mut url = self.base_url.join("search")?;
        url.set_query(Some(&format!("q={}", query)));
        Ok(url)
    }

    /// Resolve a site-relative (or absolute) reference against the base URL
    pub fn absolute(&self, reference: &str) -> Result<Url, RvhError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(RvhError::InvalidUrl("Empty link reference".to_string()));
        }
        Ok(self.base_url.join(reference)?)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
        }
    }
}

/// Turn CLI words into the `q` parameter value
///
/// Words are joined by single spaces, optionally wrapped in double quotes for
/// an exact-phrase search, then form-encoded so spaces become `+`.
pub fn format_query<S: AsRef<str>>(words: &[S], exact: bool) -> String {
    let joined = words
        .iter()
        .map(|w| w.as_ref().trim())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let phrase = if exact {
        format!("\"{}\"", joined)
    } else {
        joined
    };

    form_urlencoded::byte_serialize(phrase.as_bytes()).collect()
}
