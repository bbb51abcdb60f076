//! Search result records and their quality ordering

use crate::core::extractor::{DetailInfo, ListingFields};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use url::Url;

/// Frame size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Create a new Resolution
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel count
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Technical attributes scraped from a detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnicalInfo {
    /// Container/codec category, e.g. "divx"
    pub media_type: String,
    /// Bitrate in kb/s
    pub bitrate: u32,
    /// Frame size
    pub resolution: Resolution,
}

/// Ordering key: pixel area first, bitrate breaks ties
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct QualityScore {
    pub area: u64,
    pub bitrate: u32,
}

/// One item found by a search
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Position in the search listing
    pub id: usize,
    /// Title
    pub title: String,
    /// Absolute detail-page URL
    pub url: Url,
    /// Short description
    pub description: String,
    /// Duration as shown in the listing
    pub duration: String,
    /// File size as shown in the listing
    pub size: String,
    /// Posted date as shown in the listing
    pub posted: String,
    /// View count as shown in the listing
    pub view_count: String,
    /// Filled in by enrichment
    pub technical: Option<TechnicalInfo>,
}

impl SearchResult {
    /// Create a result stub from a listing row
    pub fn from_listing(id: usize, fields: ListingFields) -> Self {
        Self {
            id,
            title: fields.title,
            url: fields.url,
            description: fields.description,
            duration: fields.duration,
            size: fields.size,
            posted: fields.posted,
            view_count: fields.view_count,
            technical: None,
        }
    }

    /// Check if enrichment has run
    pub fn is_enriched(&self) -> bool {
        self.technical.is_some()
    }

    /// Bitrate in kb/s, zero before enrichment
    pub fn bitrate(&self) -> u32 {
        self.technical.as_ref().map_or(0, |t| t.bitrate)
    }

    /// Frame size, if known
    pub fn resolution(&self) -> Option<Resolution> {
        self.technical.as_ref().map(|t| t.resolution)
    }

    /// Media type, if known
    pub fn media_type(&self) -> Option<&str> {
        self.technical.as_ref().map(|t| t.media_type.as_str())
    }

    /// Ordering key for quality sorts
    pub fn quality_score(&self) -> QualityScore {
        self.technical
            .as_ref()
            .map(|t| QualityScore {
                area: t.resolution.area(),
                bitrate: t.bitrate,
            })
            .unwrap_or_default()
    }

    /// Apply detail-page fields in one step
    pub fn apply_details(&mut self, info: DetailInfo) {
        if !info.description.is_empty() {
            self.description = info.description;
        }
        self.technical = Some(TechnicalInfo {
            media_type: info.media_type,
            bitrate: info.bitrate,
            resolution: info.resolution,
        });
    }
}

/// Compare two results by quality score
pub fn compare_quality(a: &SearchResult, b: &SearchResult) -> Ordering {
    a.quality_score().cmp(&b.quality_score())
}

/// Sort results by quality; ascending puts the best result last
pub fn sort_by_quality(results: &mut [SearchResult], descending: bool) {
    results.sort_by(|a, b| {
        let ordering = compare_quality(a, b);
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}
