//! Field extraction from search listings and detail pages

use crate::core::search_result::Resolution;
use crate::error::RvhError;
use crate::platform::{ParsedPage, Patterns};
use crate::utils::{collapse_whitespace, normalize_lines, SiteConfig};
use scraper::{ElementRef, Selector};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Parse a CSS selector, reporting failures as a typed error
pub(crate) fn selector(css: &str) -> Result<Selector, RvhError> {
    Selector::parse(css).map_err(|e| RvhError::SelectorError(format!("{}: {:?}", css, e)))
}

/// Fields read from one row of the search listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFields {
    pub title: String,
    pub url: Url,
    pub description: String,
    pub duration: String,
    pub size: String,
    pub posted: String,
    pub view_count: String,
}

/// Rows kept from a listing page, and how many were dropped
#[derive(Debug, Clone, Default)]
pub struct ListingScan {
    pub rows: Vec<ListingFields>,
    pub skipped: usize,
}

/// Reads search listing rows
pub struct ListingExtractor {
    site: SiteConfig,
    rows: Selector,
    title: Selector,
    description: Selector,
    details: Selector,
    error_marker: Selector,
}

impl ListingExtractor {
    /// Create a listing extractor resolving links against `site`
    pub fn new(site: SiteConfig) -> Result<Self, RvhError> {
        Ok(Self {
            site,
            rows: selector("table.movieList > tbody > tr")?,
            title: selector("td > h2 > a")?,
            description: selector("td > span:nth-child(4)")?,
            details: selector("td > span > span.dr")?,
            error_marker: selector(".error_message")?,
        })
    }

    /// Extract every well-formed row of a search results page
    pub fn extract_rows(&self, page: &ParsedPage) -> ListingScan {
        let document = page.document();
        let mut scan = ListingScan::default();

        for row in document.select(&self.rows) {
            match self.extract_listing_fields(row) {
                Some(fields) => scan.rows.push(fields),
                None => scan.skipped += 1,
            }
        }

        debug!(
            "Listing {}: {} rows kept, {} skipped",
            page.url(),
            scan.rows.len(),
            scan.skipped
        );
        scan
    }

    /// Extract the fields of one listing row
    ///
    /// Returns `None` for placeholder/error rows and rows missing the title
    /// link or any of the four detail spans.
    pub fn extract_listing_fields(&self, row: ElementRef<'_>) -> Option<ListingFields> {
        if row.select(&self.error_marker).next().is_some() {
            debug!("Skipping error row");
            return None;
        }

        let anchor = row.select(&self.title).next()?;
        let title = collapse_whitespace(&anchor.text().collect::<String>());
        let href = anchor.value().attr("href")?;
        let url = match self.site.absolute(href) {
            Ok(url) => url,
            Err(e) => {
                warn!("Skipping row with bad link {:?}: {}", href, e);
                return None;
            }
        };

        let description = row
            .select(&self.description)
            .next()
            .map(|span| normalize_lines(&span.text().collect::<String>()))
            .unwrap_or_default();

        let details: Vec<String> = row
            .select(&self.details)
            .map(|span| collapse_whitespace(&span.text().collect::<String>()))
            .collect();
        if details.len() < 4 || details[..4].iter().any(|d| d.is_empty()) {
            debug!("Skipping row {:?}: {} detail spans", title, details.len());
            return None;
        }

        let mut details = details.into_iter();
        Some(ListingFields {
            title,
            url,
            description,
            duration: details.next()?,
            size: details.next()?,
            posted: details.next()?,
            view_count: details.next()?,
        })
    }
}

/// Fields read from a detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailInfo {
    pub media_type: String,
    pub bitrate: u32,
    pub resolution: Resolution,
    pub description: String,
}

/// One observed detail page format
pub trait DetailFields: Send + Sync {
    /// Short name for logs
    fn format_name(&self) -> &'static str;

    /// Extract all detail fields, or fail without a partial result
    fn extract(&self, page: &ParsedPage) -> Result<DetailInfo, RvhError>;
}

/// Detail pages with a `.info` table: technical text in column two, description in column three
pub struct InfoPanelFormat {
    patterns: Arc<Patterns>,
    panel: Selector,
    description: Selector,
}

impl InfoPanelFormat {
    pub fn new(patterns: Arc<Patterns>) -> Result<Self, RvhError> {
        Ok(Self {
            patterns,
            panel: selector(".info > table > tbody > tr > td:nth-child(2) > div")?,
            description: selector(".info > table > tbody > tr > td:nth-child(3) > span > div")?,
        })
    }

    /// Match the technical attributes in the panel text
    pub fn parse_panel(&self, text: &str) -> Result<(String, u32, Resolution), RvhError> {
        let bitrate = self
            .patterns
            .bitrate
            .captures(text)
            .ok_or_else(|| RvhError::MalformedDetails("bitrate not found".to_string()))?;
        let resolution = self
            .patterns
            .resolution
            .captures(text)
            .ok_or_else(|| RvhError::MalformedDetails("resolution not found".to_string()))?;
        let media_type = self
            .patterns
            .media_type
            .captures(text)
            .ok_or_else(|| RvhError::MalformedDetails("type not found".to_string()))?;

        let bitrate = parse_number(&bitrate[1], "bitrate")?;
        let width = parse_number(&resolution[1], "resolution width")?;
        let height = parse_number(&resolution[2], "resolution height")?;
        if width == 0 || height == 0 {
            return Err(RvhError::MalformedDetails(format!(
                "resolution {}x{} is empty",
                width, height
            )));
        }

        Ok((
            media_type[1].to_string(),
            bitrate,
            Resolution::new(width, height),
        ))
    }
}

impl DetailFields for InfoPanelFormat {
    fn format_name(&self) -> &'static str {
        "info-panel"
    }

    fn extract(&self, page: &ParsedPage) -> Result<DetailInfo, RvhError> {
        let document = page.document();

        // <br>-separated lines come back as separate text nodes
        let panel_text = document
            .select(&self.panel)
            .flat_map(|div| div.text())
            .collect::<Vec<_>>()
            .join("\n");
        let (media_type, bitrate, resolution) = self.parse_panel(&panel_text)?;

        let description = document
            .select(&self.description)
            .map(direct_text)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(DetailInfo {
            media_type,
            bitrate,
            resolution,
            description: normalize_lines(description.trim()),
        })
    }
}

fn parse_number(digits: &str, field: &str) -> Result<u32, RvhError> {
    digits
        .parse::<u32>()
        .map_err(|e| RvhError::MalformedDetails(format!("{} {:?}: {}", field, digits, e)))
}

/// Text of an element's direct text-node children, skipping nested elements
pub fn direct_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    for child in element.children() {
        if let Some(node) = child.value().as_text() {
            text.push_str(node);
        }
    }
    text
}
