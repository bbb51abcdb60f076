//! Text patterns matched against the host's pages
//!
//! Compiled once at startup and shared read-only (usually behind an `Arc`).

use crate::error::RvhError;
use regex::Regex;

/// Compiled text patterns for the host's page format
#[derive(Debug, Clone)]
pub struct Patterns {
    /// Quoted verification path inside an inline script, e.g. `"/vpi?h=..&do=d&.."`
    pub vpi: Regex,
    /// `bitrate: 1234 kb/s`
    pub bitrate: Regex,
    /// `resolution: 1280x720`
    pub resolution: Regex,
    /// `type: divx`
    pub media_type: Regex,
}

impl Patterns {
    /// Compile all patterns
    pub fn new() -> Result<Self, RvhError> {
        Ok(Self {
            vpi: Regex::new(r#""(/vpi?[^"]+do=d[^"]*)""#)?,
            bitrate: Regex::new(r"bitrate: (\d+) kb/s")?,
            resolution: Regex::new(r"resolution: (\d+)x(\d+)")?,
            media_type: Regex::new(r"type: (\w+)")?,
        })
    }

    /// Find the verification path in a script body, without the quotes
    pub fn find_vpi_path<'a>(&self, script: &'a str) -> Option<&'a str> {
        self.vpi
            .captures(script)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}
