//! Video host plumbing: page fetching and page text patterns

pub mod fetcher;
pub mod patterns;

#[cfg(test)]
pub(crate) mod testing;

pub use fetcher::*;
pub use patterns::*;
