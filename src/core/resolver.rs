//! Download link resolution
//!
//! A detail page embeds, somewhere in its inline scripts, the path of a
//! verification ("vpi") page. That page either carries the final link under a
//! heading, or an iframe whose source must be visited once to provision the
//! link server-side, after which the verification page is fetched again.
//!
//! ```text
//! Start -> LocatedVpiUrl -> PageFetched -> Resolved
//!                                       -> AwaitingRefresh -> Refetched -> Resolved
//! (any state may fail)
//! ```

use crate::core::extractor::selector;
use crate::error::RvhError;
use crate::platform::{PageFetcher, ParsedPage, Patterns};
use crate::utils::SiteConfig;
use scraper::Selector;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Final download link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    url: Url,
}

impl ResolvedLink {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for ResolvedLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// What a verification page turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageShape {
    /// Frame present; its source is the warm-up URL
    NeedsRefresh { warmup: String },
    /// Heading present; link is the first anchor's href
    Ready { link: String },
    /// Neither, or a recognized element missing its attribute
    Unrecognized(String),
}

/// Resolver state machine states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveState {
    Start,
    LocatedVpiUrl { vpi_url: Url },
    PageFetched { vpi_url: Url, shape: PageShape },
    AwaitingRefresh { vpi_url: Url, warmup_url: Url },
    Refetched { shape: PageShape },
    Resolved(Url),
}

impl ResolveState {
    /// State name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ResolveState::Start => "Start",
            ResolveState::LocatedVpiUrl { .. } => "LocatedVpiUrl",
            ResolveState::PageFetched { .. } => "PageFetched",
            ResolveState::AwaitingRefresh { .. } => "AwaitingRefresh",
            ResolveState::Refetched { .. } => "Refetched",
            ResolveState::Resolved(_) => "Resolved",
        }
    }
}

/// Walks a detail page to its final download link
pub struct LinkResolver {
    fetcher: Arc<dyn PageFetcher>,
    site: SiteConfig,
    patterns: Arc<Patterns>,
    scripts: Selector,
    frame: Selector,
    heading: Selector,
    anchor: Selector,
}

impl LinkResolver {
    /// Create a resolver
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        site: SiteConfig,
        patterns: Arc<Patterns>,
    ) -> Result<Self, RvhError> {
        Ok(Self {
            fetcher,
            site,
            patterns,
            scripts: selector(r#"script:not([type]), script[type="text/javascript"]"#)?,
            frame: selector("iframe")?,
            heading: selector("h2")?,
            anchor: selector("a")?,
        })
    }

    /// Resolve the download link behind a detail page
    ///
    /// Fetches run strictly in order. At most one warm-up fetch and one
    /// re-fetch are made; a second frame is a `RefreshLoop`.
    pub async fn resolve(&self, detail_url: &Url) -> Result<ResolvedLink, RvhError> {
        let mut state = ResolveState::Start;

        loop {
            debug!("Resolver state: {}", state.name());

            state = match state {
                ResolveState::Start => {
                    let page = self.fetcher.fetch(detail_url).await?;
                    let path = self.find_vpi_path(&page).ok_or(RvhError::NoVpiReference)?;
                    ResolveState::LocatedVpiUrl {
                        vpi_url: self.site.absolute(&path)?,
                    }
                }
                ResolveState::LocatedVpiUrl { vpi_url } => {
                    let page = self.fetcher.fetch(&vpi_url).await?;
                    ResolveState::PageFetched {
                        shape: self.classify(&page),
                        vpi_url,
                    }
                }
                ResolveState::PageFetched { vpi_url, shape } => match shape {
                    PageShape::NeedsRefresh { warmup } => ResolveState::AwaitingRefresh {
                        warmup_url: self.site.absolute(&warmup)?,
                        vpi_url,
                    },
                    PageShape::Ready { link } => ResolveState::Resolved(self.final_link(&link)?),
                    PageShape::Unrecognized(reason) => {
                        return Err(RvhError::UnrecognizedPageShape(reason))
                    }
                },
                ResolveState::AwaitingRefresh {
                    vpi_url,
                    warmup_url,
                } => {
                    debug!("Warming up {} before re-fetching {}", warmup_url, vpi_url);
                    self.fetcher.fetch_discard(&warmup_url).await?;
                    let page = self.fetcher.fetch(&vpi_url).await?;
                    ResolveState::Refetched {
                        shape: self.classify(&page),
                    }
                }
                ResolveState::Refetched { shape } => match shape {
                    PageShape::NeedsRefresh { .. } => return Err(RvhError::RefreshLoop),
                    PageShape::Ready { link } => ResolveState::Resolved(self.final_link(&link)?),
                    PageShape::Unrecognized(reason) => {
                        return Err(RvhError::UnrecognizedPageShape(reason))
                    }
                },
                ResolveState::Resolved(url) => {
                    info!("Resolved {} -> {}", detail_url, url);
                    return Ok(ResolvedLink::new(url));
                }
            };
        }
    }

    /// Join a ready page's link against the site; only http(s) is a download
    fn final_link(&self, href: &str) -> Result<Url, RvhError> {
        let url = self.site.absolute(href)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RvhError::UnrecognizedPageShape(format!(
                "link is not a download URL: {}",
                href
            )));
        }
        Ok(url)
    }

    /// Find the verification path in the first inline script that has one
    pub fn find_vpi_path(&self, page: &ParsedPage) -> Option<String> {
        let document = page.document();
        document.select(&self.scripts).find_map(|script| {
            let body = script.text().collect::<String>();
            self.patterns.find_vpi_path(&body).map(str::to_string)
        })
    }

    /// Decide what kind of verification page this is
    pub fn classify(&self, page: &ParsedPage) -> PageShape {
        let document = page.document();

        if let Some(frame) = document.select(&self.frame).next() {
            return match frame.value().attr("src") {
                Some(src) if !src.trim().is_empty() => PageShape::NeedsRefresh {
                    warmup: src.to_string(),
                },
                _ => PageShape::Unrecognized("frame without a source".to_string()),
            };
        }

        if document.select(&self.heading).next().is_some() {
            return match document
                .select(&self.anchor)
                .next()
                .and_then(|a| a.value().attr("href"))
            {
                Some(href) if !href.trim().is_empty() => PageShape::Ready {
                    link: href.to_string(),
                },
                _ => PageShape::Unrecognized("heading without a link".to_string()),
            };
        }

        PageShape::Unrecognized(format!("no frame or heading at {}", page.url()))
    }
}
