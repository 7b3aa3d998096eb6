//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the raw and canonical table types (`RawTable`, `WorkingTable`, `CostRecord`)
//! - the cost bucketing table (`COST_BUCKETS`, `CostCategory`)
//! - aggregation result rows (`SummaryStats`, `PlantAverage`, ...)
//! - filter parameters shared by the CLI and TUI (`QueryParams`)

pub mod types;

pub use types::*;
