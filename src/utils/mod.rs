//! Utility functions for rvh

pub mod text;
pub mod url;

pub use self::text::*;
pub use self::url::*;
