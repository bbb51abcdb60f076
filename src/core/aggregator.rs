//! Search orchestration: listing, enrichment and link resolution

use crate::core::extractor::{DetailFields, InfoPanelFormat, ListingExtractor};
use crate::core::resolver::{LinkResolver, ResolvedLink};
use crate::core::search_result::SearchResult;
use crate::error::RvhError;
use crate::platform::{HttpClientConfig, HttpFetcher, PageFetcher, Patterns};
use crate::utils::SiteConfig;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Search configuration
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Host to search
    pub site: SiteConfig,
    /// HTTP client settings
    pub http: HttpClientConfig,
    /// Detail pages fetched at once during enrichment
    pub concurrency: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            http: HttpClientConfig::default(),
            concurrency: 4,
        }
    }
}

impl SearchOptions {
    /// Search a different host
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, RvhError> {
        self.site = SiteConfig::new(base_url)?;
        Ok(self)
    }

    /// Set the HTTP client settings
    pub fn with_http(mut self, http: HttpClientConfig) -> Self {
        self.http = http;
        self
    }

    /// Set how many detail pages are fetched at once (at least one)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Runs searches and hands results to the extractor and resolver
pub struct Aggregator {
    options: SearchOptions,
    fetcher: Arc<dyn PageFetcher>,
    listing: ListingExtractor,
    details: Arc<dyn DetailFields>,
    resolver: LinkResolver,
}

impl Aggregator {
    /// Create an aggregator backed by an HTTP fetcher
    pub fn new(options: SearchOptions) -> Result<Self, RvhError> {
        let fetcher = Arc::new(HttpFetcher::with_config(options.http.clone())?);
        Self::with_fetcher(options, fetcher)
    }

    /// Create an aggregator on top of any page fetcher
    pub fn with_fetcher(
        options: SearchOptions,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self, RvhError> {
        let patterns = Arc::new(Patterns::new()?);

        Ok(Self {
            listing: ListingExtractor::new(options.site.clone())?,
            details: Arc::new(InfoPanelFormat::new(patterns.clone())?),
            resolver: LinkResolver::new(fetcher.clone(), options.site.clone(), patterns)?,
            fetcher,
            options,
        })
    }

    /// Use a different detail page format
    pub fn with_detail_format(mut self, format: Arc<dyn DetailFields>) -> Self {
        self.details = format;
        self
    }

    /// Search the host with an already formatted query
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, RvhError> {
        let url = self.options.site.search_url(query)?;
        info!("Searching {}", url);

        let page = self.fetcher.fetch(&url).await?;
        let scan = self.listing.extract_rows(&page);
        if scan.skipped > 0 {
            debug!("Skipped {} malformed rows", scan.skipped);
        }

        let results: Vec<SearchResult> = scan
            .rows
            .into_iter()
            .enumerate()
            .map(|(id, fields)| SearchResult::from_listing(id, fields))
            .collect();

        if results.is_empty() {
            return Err(RvhError::NoResults);
        }

        info!("Found {} results", results.len());
        Ok(results)
    }

    /// Fill in a result's technical attributes from its detail page
    pub async fn enrich(&self, result: &mut SearchResult) -> Result<(), RvhError> {
        let page = self.fetcher.fetch(&result.url).await?;
        let info = self.details.extract(&page)?;

        debug!(
            "Enriched #{} via {}: {} {} kb/s {}",
            result.id,
            self.details.format_name(),
            info.media_type,
            info.bitrate,
            info.resolution
        );
        result.apply_details(info);
        Ok(())
    }

    /// Enrich every result, a few at a time
    ///
    /// Returns the id and error of each result that could not be enriched;
    /// the others are enriched regardless. `on_done` runs after each attempt.
    pub async fn enrich_all<F>(
        &self,
        results: &mut [SearchResult],
        on_done: F,
    ) -> Vec<(usize, RvhError)>
    where
        F: Fn(&SearchResult),
    {
        let on_done = &on_done;
        let concurrency = self.options.concurrency.max(1);

        let failures: Vec<(usize, RvhError)> = stream::iter(results.iter_mut())
            .map(move |result| async move {
                let outcome = self.enrich(result).await;
                on_done(result);
                outcome.err().map(|e| (result.id, e))
            })
            .buffer_unordered(concurrency)
            .filter_map(|failure| async move { failure })
            .collect()
            .await;

        for (id, error) in &failures {
            warn!("Could not enrich result #{}: {}", id, error);
        }
        failures
    }

    /// Resolve the download link of a result
    pub async fn resolve(&self, result: &SearchResult) -> Result<ResolvedLink, RvhError> {
        info!("Resolving #{} {}", result.id, result.url);
        self.resolver.resolve(&result.url).await
    }
}

/// Pick the result with the given id
pub fn select(results: &[SearchResult], id: usize) -> Result<&SearchResult, RvhError> {
    results
        .iter()
        .find(|r| r.id == id)
        .ok_or(RvhError::InvalidSelection {
            index: id,
            count: results.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extractor::{selector, DetailInfo};
    use crate::core::search_result::Resolution;
    use crate::platform::ParsedPage;
    use crate::platform::testing::ScriptedFetcher;
    use crate::utils::format_query;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SEARCH_URL: &str = "http://host/search?q=%22big+buck%22";

    fn row(slug: &str, title: &str) -> String {
        format!(
            r#"<tr><td>
                <h2><a href="/video/{slug}">{title}</a></h2>
                <span>uploader</span>
                <span><span class="dr">1:00:00</span><span class="dr">500 MB</span><span class="dr">today</span><span class="dr">7</span></span>
                <span>About {title}</span>
            </td></tr>"#
        )
    }

    fn listing(rows: &[String]) -> String {
        format!(
            r#"<html><body><table class="movieList">{}</table></body></html>"#,
            rows.concat()
        )
    }

    fn detail(kind: &str, bitrate: u32, width: u32, height: u32) -> String {
        format!(
            r#"<div class="info"><table><tr><td></td>
               <td><div>type: {kind}<br>bitrate: {bitrate} kb/s<br>resolution: {width}x{height}</div></td>
               <td><span><div>Full text<a>more</a></div></span></td>
               </tr></table></div>"#
        )
    }

    fn aggregator(fetcher: ScriptedFetcher) -> (Aggregator, Arc<ScriptedFetcher>) {
        let fetcher = Arc::new(fetcher);
        let options = SearchOptions {
            site: SiteConfig::new("http://host").unwrap(),
            ..Default::default()
        };
        (
            Aggregator::with_fetcher(options, fetcher.clone()).unwrap(),
            fetcher,
        )
    }

    fn query() -> String {
        format_query(&["big", "buck"], true)
    }

    /// Detail pages that carry their attributes in `<meta>` tags
    struct MetaTagFormat;

    impl MetaTagFormat {
        fn meta(page: &ParsedPage, name: &str) -> Result<String, RvhError> {
            let document = page.document();
            let selector = selector(&format!(r#"meta[name="{}"]"#, name))?;
            document
                .select(&selector)
                .next()
                .and_then(|m| m.value().attr("content"))
                .map(str::to_string)
                .ok_or_else(|| RvhError::MalformedDetails(format!("{} not found", name)))
        }
    }

    impl DetailFields for MetaTagFormat {
        fn format_name(&self) -> &'static str {
            "meta-tags"
        }

        fn extract(&self, page: &ParsedPage) -> Result<DetailInfo, RvhError> {
            let number = |name: &str| -> Result<u32, RvhError> {
                Self::meta(page, name)?
                    .parse()
                    .map_err(|_| RvhError::MalformedDetails(format!("{} is not a number", name)))
            };
            Ok(DetailInfo {
                media_type: Self::meta(page, "type")?,
                bitrate: number("bitrate")?,
                resolution: Resolution::new(number("width")?, number("height")?),
                description: String::new(),
            })
        }
    }

    #[test]
    fn test_search_options_default() {
        let options = SearchOptions::default();
        assert_eq!(options.concurrency, 4);
        assert_eq!(options.site.base_url().as_str(), "http://veehd.com/");
    }

    #[test]
    fn test_search_options_builders() {
        let options = SearchOptions::default()
            .with_base_url("https://mirror.example/")
            .unwrap()
            .with_http(HttpClientConfig::default().with_user_agent("rvh-test"))
            .with_concurrency(0);

        assert_eq!(options.site.base_url().as_str(), "https://mirror.example/");
        assert_eq!(options.http.user_agent.as_deref(), Some("rvh-test"));
        assert_eq!(options.concurrency, 1);
        assert!(SearchOptions::default().with_base_url("ftp://host").is_err());
    }

    #[tokio::test]
    async fn test_search_builds_results() {
        let error_row = r#"<tr><td><p class="error_message">gone</p></td></tr>"#.to_string();
        let page = listing(&[row("1_a", "Alpha"), error_row, row("2_b", "Beta")]);
        let (aggregator, fetcher) = aggregator(ScriptedFetcher::new().page(SEARCH_URL, &[&page]));

        let results = aggregator.search(&query()).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, 0);
        assert_eq!(results[0].title, "Alpha");
        assert_eq!(results[1].id, 1);
        assert_eq!(results[1].url.as_str(), "http://host/video/2_b");
        assert!(results.iter().all(|r| !r.is_enriched()));
        assert_eq!(fetcher.fetches(SEARCH_URL), 1);
    }

    #[tokio::test]
    async fn test_search_without_usable_rows() {
        let page = listing(&[r#"<tr><td><div class="error_message">No results</div></td></tr>"#.to_string()]);
        let (aggregator, _) = aggregator(ScriptedFetcher::new().page(SEARCH_URL, &[&page]));

        let err = aggregator.search(&query()).await.unwrap_err();
        assert!(matches!(err, RvhError::NoResults));
    }

    #[tokio::test]
    async fn test_search_fetch_failure() {
        let (aggregator, _) = aggregator(ScriptedFetcher::new());
        let err = aggregator.search(&query()).await.unwrap_err();
        assert!(matches!(err, RvhError::FetchFailed { .. }));
    }

    #[tokio::test]
    async fn test_enrich_and_enrich_all() {
        let page = listing(&[row("1_a", "Alpha"), row("2_b", "Beta"), row("3_c", "Gamma")]);
        let (aggregator, _) = aggregator(
            ScriptedFetcher::new()
                .page(SEARCH_URL, &[&page])
                .page("http://host/video/1_a", &[&detail("divx", 700, 640, 480)])
                .page("http://host/video/2_b", &["<html><body>moved</body></html>"])
                .page("http://host/video/3_c", &[&detail("mp4", 500, 1280, 720)]),
        );

        let mut results = aggregator.search(&query()).await.unwrap();
        let done = AtomicUsize::new(0);
        let failures = aggregator
            .enrich_all(&mut results, |_| {
                done.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, 1);
        assert!(matches!(failures[0].1, RvhError::MalformedDetails(_)));

        assert_eq!(results[0].bitrate(), 700);
        assert_eq!(results[0].resolution(), Some(Resolution::new(640, 480)));
        assert_eq!(results[0].description, "Full text");
        assert!(!results[1].is_enriched());
        assert_eq!(results[1].description, "About Beta");
        assert_eq!(results[2].media_type(), Some("mp4"));
    }

    #[tokio::test]
    async fn test_enrich_with_other_detail_format() {
        let page = listing(&[row("1_a", "Alpha")]);
        let meta = r#"<html><head>
            <meta name="type" content="mkv"><meta name="bitrate" content="2400">
            <meta name="width" content="1920"><meta name="height" content="1080">
            </head><body></body></html>"#;
        let (aggregator, _) = aggregator(
            ScriptedFetcher::new()
                .page(SEARCH_URL, &[&page])
                .page("http://host/video/1_a", &[meta]),
        );
        let aggregator = aggregator.with_detail_format(Arc::new(MetaTagFormat));

        let mut results = aggregator.search(&query()).await.unwrap();
        aggregator.enrich(&mut results[0]).await.unwrap();

        assert_eq!(results[0].media_type(), Some("mkv"));
        assert_eq!(results[0].bitrate(), 2400);
        assert_eq!(results[0].resolution(), Some(Resolution::new(1920, 1080)));
        // Empty detail description keeps the listing text
        assert_eq!(results[0].description, "About Alpha");
    }

    #[tokio::test]
    async fn test_resolve_without_vpi_reference() {
        let page = listing(&[row("1_a", "Alpha")]);
        let (aggregator, _) = aggregator(
            ScriptedFetcher::new()
                .page(SEARCH_URL, &[&page])
                .page(
                    "http://host/video/1_a",
                    &[r#"<script type="text/javascript">var x = "/play?id=1";</script>"#],
                ),
        );

        let results = aggregator.search(&query()).await.unwrap();
        let err = aggregator.resolve(&results[0]).await.unwrap_err();
        assert!(matches!(err, RvhError::NoVpiReference));
    }

    #[tokio::test]
    async fn test_resolve_selected_result() {
        let page = listing(&[row("1_a", "Alpha"), row("2_b", "Beta")]);
        let (aggregator, _) = aggregator(
            ScriptedFetcher::new()
                .page(SEARCH_URL, &[&page])
                .page(
                    "http://host/video/2_b",
                    &[r#"<script type="text/javascript">load("/vpi?h=2&do=d");</script>"#],
                )
                .page(
                    "http://host/vpi?h=2&do=d",
                    &[r#"<h2>Ready</h2><a href="http://host/dl/abc123">dl</a>"#],
                ),
        );

        let results = aggregator.search(&query()).await.unwrap();
        let chosen = select(&results, 1).unwrap();
        let link = aggregator.resolve(chosen).await.unwrap();
        assert_eq!(link.to_string(), "http://host/dl/abc123");
    }

    #[tokio::test]
    async fn test_select_out_of_range() {
        let page = listing(&[row("1_a", "Alpha")]);
        let (aggregator, _) = aggregator(ScriptedFetcher::new().page(SEARCH_URL, &[&page]));
        let results = aggregator.search(&query()).await.unwrap();

        match select(&results, 5) {
            Err(RvhError::InvalidSelection { index, count }) => {
                assert_eq!(index, 5);
                assert_eq!(count, 1);
            }
            other => panic!("unexpected: {:?}", other.map(|r| r.id)),
        }
    }
}
