//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - held in-memory as the canonical working table
//! - filtered/aggregated repeatedly without copies of anything but rows
//! - exported to CSV/JSON

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::Serialize;

/// Cost bucket for a unit variable cost value.
///
/// Buckets are closed on the lower bound and open on the upper bound; the last
/// bucket is unbounded. The boundaries live in [`COST_BUCKETS`] so the
/// thresholds exist in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CostCategory {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// Ordered `(lower_bound, category)` table: a cost belongs to the last bucket
/// whose lower bound it reaches.
pub const COST_BUCKETS: [(f64, CostCategory); 4] = [
    (0.0, CostCategory::Low),
    (100.0, CostCategory::Medium),
    (300.0, CostCategory::High),
    (600.0, CostCategory::VeryHigh),
];

impl CostCategory {
    pub const ALL: [CostCategory; 4] = [
        CostCategory::Low,
        CostCategory::Medium,
        CostCategory::High,
        CostCategory::VeryHigh,
    ];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            CostCategory::Low => "Low",
            CostCategory::Medium => "Medium",
            CostCategory::High => "High",
            CostCategory::VeryHigh => "Very High",
        }
    }

    /// Bucket a cost value. Total over non-negative finite inputs; negative or
    /// non-finite values are out of domain and yield `None`.
    pub fn from_cost(cost: f64) -> Option<CostCategory> {
        if !cost.is_finite() || cost < 0.0 {
            return None;
        }
        let mut category = COST_BUCKETS[0].1;
        for &(lower, cat) in &COST_BUCKETS {
            if cost >= lower {
                category = cat;
            } else {
                break;
            }
        }
        Some(category)
    }
}

/// Grouping key for the spread (box-plot style) view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKey {
    #[default]
    Subsystem,
    CostCategory,
}

impl GroupKey {
    pub fn display_name(self) -> &'static str {
        match self {
            GroupKey::Subsystem => "subsystem",
            GroupKey::CostCategory => "cost category",
        }
    }

    /// The other key (the TUI toggles between the two).
    pub fn toggled(self) -> GroupKey {
        match self {
            GroupKey::Subsystem => GroupKey::CostCategory,
            GroupKey::CostCategory => GroupKey::Subsystem,
        }
    }
}

/// What to do with a row that fails to parse (bad timestamp, bad cost).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BadRowPolicy {
    /// Drop the offending row and record it in the row-error report.
    Skip,
    /// Abort the load on the first offending row.
    Fail,
}

/// A raw row as read from the CSV: strings only.
///
/// Type coercion is deliberately not the loader's job; keeping the raw strings
/// lets the transformer produce row-level errors with the original values and
/// line numbers.
#[derive(Debug, Clone)]
pub struct RawRow {
    /// 1-based line number in the source file (header is line 1).
    pub line: usize,
    pub plant: String,
    pub subsystem: String,
    pub start_time: String,
    pub end_time: String,
    /// Missing/empty cost cells are `None` here; the transformer fills them.
    pub unit_variable_cost: Option<String>,
    /// Values of passthrough columns, aligned with `RawTable::extra_columns`.
    pub extras: Vec<String>,
}

/// Loader output: schema-validated but uncoerced rows.
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Names of input columns beyond the required schema, in input order.
    pub extra_columns: Vec<String>,
    pub rows: Vec<RawRow>,
    /// Records the CSV reader itself could not decode (bad UTF-8 etc.).
    /// The transformer folds these into its row-error report.
    pub read_errors: Vec<RowError>,
}

/// One row of the canonical working table.
#[derive(Debug, Clone)]
pub struct CostRecord {
    pub plant: String,
    pub subsystem: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    /// Non-negative; missing input values are filled with 0.
    pub unit_variable_cost: f64,

    /// ISO-8601 week number of `start_time` (1-53).
    pub iso_week: u32,
    /// Bucket of `unit_variable_cost`.
    pub cost_category: CostCategory,
    /// `start_time` formatted `YYYY-MM`; the month-filter key.
    pub year_month: String,

    /// Passthrough values, aligned with `WorkingTable::extra_columns`.
    pub extras: Vec<String>,
}

/// The canonical table: deduplicated, sorted ascending by `start_time`
/// (stable, so ties keep input order). Built once per load and treated as
/// read-only; every aggregation returns an independent result.
#[derive(Debug, Clone)]
pub struct WorkingTable {
    pub extra_columns: Vec<String>,
    pub records: Vec<CostRecord>,
}

/// A row-level defect found while transforming the raw table.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Descriptive statistics of `unit_variable_cost` over some row set.
///
/// `median` duplicates `p50`; both stay present for interface compatibility
/// with downstream consumers of the stats export. `std`/`variance` use the
/// sample (n-1) convention and are NaN for fewer than two rows; everything
/// except `count` is NaN for an empty input.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
    pub median: f64,
    pub variance: f64,
}

/// Mean cost of one plant (for the top-plants ranking).
#[derive(Debug, Clone, Serialize)]
pub struct PlantAverage {
    pub plant: String,
    /// Number of rows behind the average.
    pub count: usize,
    pub avg_cost: f64,
}

/// One point of a cost-over-time series.
#[derive(Debug, Clone, Serialize)]
pub struct TimePoint {
    pub start_time: NaiveDateTime,
    pub cost: f64,
}

/// One equal-width histogram bin over the cost axis.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Five-number summary of one group (the spread view).
#[derive(Debug, Clone, Serialize)]
pub struct GroupSpread {
    pub label: String,
    pub count: usize,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

/// Filter/aggregation parameters shared by the CLI and the TUI.
#[derive(Debug, Clone)]
pub struct QueryParams {
    pub subsystem: Option<String>,
    pub month: Option<String>,
    pub plant: Option<String>,
    pub group_by: GroupKey,
    pub top_n: usize,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            subsystem: None,
            month: None,
            plant: None,
            group_by: GroupKey::Subsystem,
            top_n: 10,
        }
    }
}

/// A load request as understood by the pipeline (derived from CLI flags).
#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub csv_path: PathBuf,
    pub bad_rows: BadRowPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_bounds_are_closed_below_open_above() {
        assert_eq!(CostCategory::from_cost(0.0), Some(CostCategory::Low));
        assert_eq!(CostCategory::from_cost(99.99), Some(CostCategory::Low));
        assert_eq!(CostCategory::from_cost(100.0), Some(CostCategory::Medium));
        assert_eq!(CostCategory::from_cost(299.99), Some(CostCategory::Medium));
        assert_eq!(CostCategory::from_cost(300.0), Some(CostCategory::High));
        assert_eq!(CostCategory::from_cost(600.0), Some(CostCategory::VeryHigh));
        assert_eq!(CostCategory::from_cost(1e9), Some(CostCategory::VeryHigh));
    }

    #[test]
    fn negative_or_non_finite_costs_are_out_of_domain() {
        assert_eq!(CostCategory::from_cost(-0.01), None);
        assert_eq!(CostCategory::from_cost(f64::NAN), None);
        assert_eq!(CostCategory::from_cost(f64::INFINITY), None);
    }
}
