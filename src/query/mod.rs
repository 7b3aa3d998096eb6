//! Pure aggregation over the working table.
//!
//! Every operation here takes a record slice plus parameters and returns an
//! independent result: nothing mutates the canonical table, nothing retains
//! state between calls, and the same arguments always produce the same output.
//!
//! Empty inputs are not errors — filters return empty vectors and statistics
//! return NaN-valued results the callers render as such.

pub mod stats;

pub use stats::*;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDateTime;

use crate::domain::{
    CostCategory, CostRecord, GroupKey, GroupSpread, HistogramBin, PlantAverage, TimePoint,
};

/// Bin count used by the distribution chart.
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// All distinct subsystem values, lexicographically sorted.
pub fn distinct_subsystems(records: &[CostRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.subsystem.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// All distinct `YYYY-MM` keys, sorted (lexicographic == chronological).
pub fn distinct_months(records: &[CostRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.year_month.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// All distinct plant names, lexicographically sorted.
pub fn distinct_plants(records: &[CostRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.plant.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Rows whose `year_month` equals `month`; `None` is the identity filter.
pub fn filter_by_month(records: &[CostRecord], month: Option<&str>) -> Vec<CostRecord> {
    filter_by(records, month, |r| &r.year_month)
}

/// Rows whose subsystem equals `subsystem`; `None` is the identity filter.
pub fn filter_by_subsystem(records: &[CostRecord], subsystem: Option<&str>) -> Vec<CostRecord> {
    filter_by(records, subsystem, |r| &r.subsystem)
}

/// Rows whose plant equals `plant`; `None` is the identity filter.
pub fn filter_by_plant(records: &[CostRecord], plant: Option<&str>) -> Vec<CostRecord> {
    filter_by(records, plant, |r| &r.plant)
}

fn filter_by(
    records: &[CostRecord],
    value: Option<&str>,
    key: impl Fn(&CostRecord) -> &str,
) -> Vec<CostRecord> {
    match value {
        None => records.to_vec(),
        Some(v) => records.iter().filter(|r| key(r) == v).cloned().collect(),
    }
}

/// Mean cost per plant, descending, truncated to the first `top_n` entries.
///
/// The sort is stable, so plants with equal averages keep the order in which
/// they first appear in the input.
pub fn average_cost_by_plant(records: &[CostRecord], top_n: usize) -> Vec<PlantAverage> {
    let mut order: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, f64, usize)> = Vec::new();

    for r in records {
        let idx = *order.entry(r.plant.as_str()).or_insert_with(|| {
            groups.push((r.plant.clone(), 0.0, 0));
            groups.len() - 1
        });
        groups[idx].1 += r.unit_variable_cost;
        groups[idx].2 += 1;
    }

    let mut out: Vec<PlantAverage> = groups
        .into_iter()
        .map(|(plant, sum, count)| PlantAverage {
            plant,
            count,
            avg_cost: sum / count as f64,
        })
        .collect();

    out.sort_by(|a, b| {
        b.avg_cost
            .partial_cmp(&a.avg_cost)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out.truncate(top_n);
    out
}

/// Mean cost per exact `start_time`, ascending.
pub fn average_cost_over_time(records: &[CostRecord]) -> Vec<TimePoint> {
    let mut order: HashMap<NaiveDateTime, usize> = HashMap::new();
    let mut groups: Vec<(NaiveDateTime, f64, usize)> = Vec::new();

    for r in records {
        let idx = *order.entry(r.start_time).or_insert_with(|| {
            groups.push((r.start_time, 0.0, 0));
            groups.len() - 1
        });
        groups[idx].1 += r.unit_variable_cost;
        groups[idx].2 += 1;
    }

    let mut out: Vec<TimePoint> = groups
        .into_iter()
        .map(|(start_time, sum, count)| TimePoint {
            start_time,
            cost: sum / count as f64,
        })
        .collect();

    out.sort_by_key(|p| p.start_time);
    out
}

/// Per-row cost series of one plant (not grouped), in table order.
pub fn plant_cost_series(records: &[CostRecord], plant: &str) -> Vec<TimePoint> {
    records
        .iter()
        .filter(|r| r.plant == plant)
        .map(|r| TimePoint {
            start_time: r.start_time,
            cost: r.unit_variable_cost,
        })
        .collect()
}

/// Equal-width histogram over `[min, max]` of the costs.
///
/// Counts sum to the input length; an empty input (or zero bins) yields an
/// empty vector. An all-equal input falls back to unit-width bins with every
/// row in the first one.
pub fn cost_histogram(records: &[CostRecord], n_bins: usize) -> Vec<HistogramBin> {
    if records.is_empty() || n_bins == 0 {
        return Vec::new();
    }

    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for r in records {
        lo = lo.min(r.unit_variable_cost);
        hi = hi.max(r.unit_variable_cost);
    }
    if !(lo.is_finite() && hi.is_finite()) {
        return Vec::new();
    }

    let width = if hi > lo { (hi - lo) / n_bins as f64 } else { 1.0 };
    let mut counts = vec![0usize; n_bins];
    for r in records {
        let idx = ((r.unit_variable_cost - lo) / width).floor() as usize;
        counts[idx.min(n_bins - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + i as f64 * width,
            upper: lo + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

/// Per-group five-number summary of the costs.
///
/// Subsystem groups come out lexicographically sorted; cost-category groups
/// come out in bucket order. Groups with no rows are omitted.
pub fn group_spread(records: &[CostRecord], key: GroupKey) -> Vec<GroupSpread> {
    match key {
        GroupKey::Subsystem => {
            let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
            for r in records {
                groups
                    .entry(r.subsystem.as_str())
                    .or_default()
                    .push(r.unit_variable_cost);
            }
            groups
                .into_iter()
                .map(|(label, values)| spread_of(label.to_string(), values))
                .collect()
        }
        GroupKey::CostCategory => {
            let mut out = Vec::new();
            for category in CostCategory::ALL {
                let values: Vec<f64> = records
                    .iter()
                    .filter(|r| r.cost_category == category)
                    .map(|r| r.unit_variable_cost)
                    .collect();
                if !values.is_empty() {
                    out.push(spread_of(category.display_name().to_string(), values));
                }
            }
            out
        }
    }
}

fn spread_of(label: String, mut values: Vec<f64>) -> GroupSpread {
    values.sort_by(f64::total_cmp);
    GroupSpread {
        label,
        count: values.len(),
        min: values.first().copied().unwrap_or(f64::NAN),
        p25: stats::quantile(&values, 0.25),
        p50: stats::quantile(&values, 0.50),
        p75: stats::quantile(&values, 0.75),
        max: values.last().copied().unwrap_or(f64::NAN),
    }
}
