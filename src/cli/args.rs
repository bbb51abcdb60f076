//! Command line argument parsing

use crate::core::SearchOptions;
use crate::error::RvhError;
use crate::platform::HttpClientConfig;
use crate::utils::{format_query, DEFAULT_BASE_URL};
use clap::Parser;
use std::time::Duration;

/// Search a video host and print a direct download link
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Search query
    #[arg(required = true, value_name = "QUERY")]
    pub query: Vec<String>,

    /// Sort results by quality (resolution, then bitrate), best last
    #[arg(short, long)]
    pub sort: bool,

    /// With --sort, put the best result first
    #[arg(short, long)]
    pub reverse: bool,

    /// Skip fetching detail pages (no type, bitrate or resolution)
    #[arg(long)]
    pub no_details: bool,

    /// Don't wrap the query in quotes (match words, not the phrase)
    #[arg(long)]
    pub loose: bool,

    /// Result id to resolve without prompting
    #[arg(short = 'n', long, value_name = "ID")]
    pub select: Option<usize>,

    /// Print results and exit without resolving a link
    #[arg(short, long)]
    pub list_only: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// HTTP timeout per request (e.g., 30s, 1m)
    #[arg(long, value_name = "DURATION", default_value = "30s")]
    pub timeout: humantime::Duration,

    /// Override User-Agent header
    #[arg(long, value_name = "USER_AGENT")]
    pub user_agent: Option<String>,

    /// Proxy URL (http/https/socks)
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Site to search
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Detail pages fetched in parallel
    #[arg(long, default_value = "4")]
    pub concurrency: usize,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (only errors and the link)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Get HTTP timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        self.timeout.into()
    }

    /// Query string sent to the site
    pub fn query_string(&self) -> String {
        format_query(&self.query, !self.loose)
    }

    /// HTTP client settings from the flags
    pub fn http_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig::default().with_timeout(self.timeout_duration());
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent);
        }
        if let Some(proxy) = &self.proxy {
            config = config.with_proxy(proxy);
        }
        config
    }

    /// Search settings from the flags
    pub fn search_options(&self) -> Result<SearchOptions, RvhError> {
        Ok(SearchOptions::default()
            .with_base_url(&self.base_url)?
            .with_http(self.http_config())
            .with_concurrency(self.concurrency))
    }

    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (only errors)
    Quiet,
    /// Normal
    Normal,
    /// Verbose (debug info)
    Verbose,
}

// Implement Default for Args to make tests work
impl Default for Args {
    fn default() -> Self {
        Self {
            query: Vec::new(),
            sort: false,
            reverse: false,
            no_details: false,
            loose: false,
            select: None,
            list_only: false,
            json: false,
            timeout: humantime::Duration::from(Duration::from_secs(30)),
            user_agent: None,
            proxy: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: 4,
            verbose: false,
            quiet: false,
        }
    }
}
