//! Core functionality for rvh

pub mod aggregator;
pub mod extractor;
pub mod resolver;
pub mod search_result;

pub use aggregator::*;
pub use extractor::*;
pub use resolver::*;
pub use search_result::*;
