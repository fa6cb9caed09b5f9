//! Data models for the publication pipeline
//!
//! Each course domain has three shapes: the raw snapshot as the store returns
//! it, a sanitized draft that the schema validates, and the fully typed model
//! a passing validation yields.

mod asset;
mod chapter;
mod course;
mod lesson;
mod pricing;
mod validation;

pub use asset::*;
pub use chapter::*;
pub use course::*;
pub use lesson::*;
pub use pricing::*;
pub use validation::*;

/// Trim a nullable text column; blank values are treated as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
