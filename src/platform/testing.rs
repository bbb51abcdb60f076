//! Scripted in-memory fetcher for unit tests

use crate::error::RvhError;
use crate::platform::{PageFetcher, ParsedPage};
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

/// Kind of request a `ScriptedFetcher` saw
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Fetch(String),
    Discard(String),
}

/// Serves canned bodies per URL and records every request in order
///
/// The n-th fetch of a URL gets the n-th body; the last body repeats.
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, Vec<String>>,
    hits: Mutex<HashMap<String, usize>>,
    log: Mutex<Vec<Request>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the bodies served for `url`, in order
    pub fn page(mut self, url: &str, bodies: &[&str]) -> Self {
        self.pages.insert(
            url.to_string(),
            bodies.iter().map(|b| b.to_string()).collect(),
        );
        self
    }

    /// Requests seen so far
    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().unwrap().clone()
    }

    fn count(&self, request: Request) -> usize {
        self.requests().iter().filter(|r| **r == request).count()
    }

    pub fn fetches(&self, url: &str) -> usize {
        self.count(Request::Fetch(url.to_string()))
    }

    pub fn discards(&self, url: &str) -> usize {
        self.count(Request::Discard(url.to_string()))
    }

    fn next_body(&self, url: &Url) -> Result<String, RvhError> {
        let bodies = self
            .pages
            .get(url.as_str())
            .filter(|b| !b.is_empty())
            .ok_or_else(|| RvhError::fetch_failed(url.as_str(), "HTTP 404 Not Found"))?;

        let mut hits = self.hits.lock().unwrap();
        let hit = hits.entry(url.to_string()).or_insert(0);
        let body = bodies[(*hit).min(bodies.len() - 1)].clone();
        *hit += 1;
        Ok(body)
    }
}

#[async_trait::async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> Result<ParsedPage, RvhError> {
        self.log
            .lock()
            .unwrap()
            .push(Request::Fetch(url.to_string()));
        let body = self.next_body(url)?;
        Ok(ParsedPage::new(url.clone(), body))
    }

    async fn fetch_discard(&self, url: &Url) -> Result<(), RvhError> {
        self.log
            .lock()
            .unwrap()
            .push(Request::Discard(url.to_string()));
        self.next_body(url).map(|_| ())
    }
}
