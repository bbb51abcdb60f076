//! Output formatting and progress display

use crate::cli::args::VerbosityLevel;
use crate::core::{ResolvedLink, SearchResult};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// Output formatter for rvh
///
/// Everything except results and the resolved link goes to stderr, so
/// `rvh -q -n 0 query` prints nothing but the URL on stdout.
pub struct OutputFormatter {
    verbosity: VerbosityLevel,
    progress_bar: Option<ProgressBar>,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            progress_bar: None,
        }
    }

    /// Create a progress bar for detail page fetches
    pub fn create_progress_bar(&mut self, total: u64) -> Option<ProgressBar> {
        if self.verbosity == VerbosityLevel::Quiet {
            return None;
        }

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let progress_bar = ProgressBar::new(total);
        progress_bar.set_style(style);
        progress_bar.set_message("Fetching details...");

        self.progress_bar = Some(progress_bar.clone());
        Some(progress_bar)
    }

    /// Advance progress bar by one
    pub fn inc_progress(&self) {
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.inc(1);
        }
    }

    /// Finish progress bar
    pub fn finish_progress(&self) {
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.finish_and_clear();
        }
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            eprintln!("ℹ️  {}", message);
        }
    }

    /// Print warning message
    pub fn warning(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            eprintln!("⚠️  {}", message);
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        eprintln!("❌ {}", message);
    }

    /// Print result count
    pub fn print_found(&self, count: usize) {
        self.info(&format!("Found {} results...", count));
    }

    /// Print results as colored records
    pub fn print_results(&self, results: &[SearchResult]) {
        for result in results {
            println!("{}", format_result(result));
        }
    }

    /// Print results as pretty JSON
    pub fn print_json(&self, results: &[SearchResult]) -> Result<(), serde_json::Error> {
        println!("{}", serde_json::to_string_pretty(results)?);
        Ok(())
    }

    /// Print the selection prompt
    pub fn print_prompt(&self, count: usize) {
        eprint!("Select a result [0-{}]: ", count.saturating_sub(1));
    }

    /// Print the resolved link, regardless of verbosity
    pub fn print_link(&self, link: &ResolvedLink) {
        println!("{}", link);
    }
}

/// Format one result as a multi-line colored record
pub fn format_result(result: &SearchResult) -> String {
    let mut out = format!(
        "{}: {}\n",
        result.id.to_string().red().on_black(),
        result.title.yellow()
    );

    if !result.description.is_empty() {
        out.push_str(&format!("{}\n", result.description.bright_white()));
    }

    let mut details = vec![
        result.duration.as_str(),
        result.size.as_str(),
        result.posted.as_str(),
        result.view_count.as_str(),
    ];
    if let Some(media_type) = result.media_type() {
        details.push(media_type);
    }
    out.push_str(&format!("{}\n", details.join(" - ").blue()));

    if let Some(technical) = &result.technical {
        out.push_str(&format!(
            "{}\n",
            format!("{} kb/s - {}", technical.bitrate, technical.resolution)
                .green()
                .on_black()
        ));
    }

    out
}
