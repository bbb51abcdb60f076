//! # rvh - video host search and link resolver
//!
//! Searches a video host, scrapes technical details for each hit, and walks
//! the host's verification pages to a direct download link.
//!
//! ## Features
//!
//! - Search listing scraping with placeholder-row skipping
//! - Type, bitrate and resolution from detail pages
//! - Quality ordering (resolution area, then bitrate)
//! - Link resolution with the host's one-time warm-up refresh
//!
//! ## Example
//!
//! ```rust,no_run
//! use rvh::{Aggregator, SearchOptions};
//! use rvh::utils::format_query;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let aggregator = Aggregator::new(SearchOptions::default())?;
//!
//!     let mut results = aggregator.search(&format_query(&["big", "buck", "bunny"], true)).await?;
//!     aggregator.enrich(&mut results[0]).await?;
//!
//!     let link = aggregator.resolve(&results[0]).await?;
//!     println!("{}", link);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod platform;
pub mod utils;

// Re-export main types
pub use crate::core::{Aggregator, LinkResolver, ResolvedLink, SearchOptions, SearchResult};
pub use error::RvhError;

/// Result type alias for rvh operations
pub type Result<T> = std::result::Result<T, RvhError>;
