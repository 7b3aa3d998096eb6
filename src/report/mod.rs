//! Reporting: formatted terminal tables and file exports.
//!
//! We keep formatting code in one place so:
//! - the pipeline/aggregation code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

pub mod export;
pub mod format;

pub use format::*;
