//! Descriptive statistics of unit variable cost.

use crate::domain::{CostRecord, SummaryStats};

/// Compute the summary statistics of `unit_variable_cost` over `records`.
///
/// Zero rows is not an error: every statistic except `count` comes back NaN
/// and formatters render it as such. `std`/`variance` use the sample (n-1)
/// convention, so a single row also yields NaN for both.
pub fn summary_stats(records: &[CostRecord]) -> SummaryStats {
    let mut values: Vec<f64> = records.iter().map(|r| r.unit_variable_cost).collect();
    values.sort_by(f64::total_cmp);

    let count = values.len();
    if count == 0 {
        return SummaryStats {
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            p25: f64::NAN,
            p50: f64::NAN,
            p75: f64::NAN,
            max: f64::NAN,
            median: f64::NAN,
            variance: f64::NAN,
        };
    }

    let mean = values.iter().sum::<f64>() / count as f64;
    let variance = if count < 2 {
        f64::NAN
    } else {
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64
    };

    let p50 = quantile(&values, 0.50);

    SummaryStats {
        count,
        mean,
        std: variance.sqrt(),
        min: values[0],
        p25: quantile(&values, 0.25),
        p50,
        p75: quantile(&values, 0.75),
        max: values[count - 1],
        median: p50,
        variance,
    }
}

/// Quantile of an ascending-sorted slice, with linear interpolation between
/// the two closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CostCategory;
    use chrono::{NaiveDate, NaiveTime};

    fn record(cost: f64) -> CostRecord {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_time(NaiveTime::MIN);
        CostRecord {
            plant: "UTE A".to_string(),
            subsystem: "N".to_string(),
            start_time: start,
            end_time: start,
            unit_variable_cost: cost,
            iso_week: 1,
            cost_category: CostCategory::from_cost(cost).unwrap(),
            year_month: "2024-01".to_string(),
            extras: Vec::new(),
        }
    }

    #[test]
    fn stats_on_known_values() {
        let records: Vec<CostRecord> = [10.0, 20.0, 30.0, 40.0].iter().map(|&v| record(v)).collect();
        let stats = summary_stats(&records);

        assert_eq!(stats.count, 4);
        assert!((stats.mean - 25.0).abs() < 1e-12);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 40.0);
        assert!((stats.p25 - 17.5).abs() < 1e-12);
        assert!((stats.p50 - 25.0).abs() < 1e-12);
        assert!((stats.p75 - 32.5).abs() < 1e-12);
        assert_eq!(stats.median, stats.p50);
        assert!((stats.variance - 500.0 / 3.0).abs() < 1e-9);
        assert!((stats.std - (500.0_f64 / 3.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn empty_input_yields_nan_stats() {
        let stats = summary_stats(&[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
        assert!(stats.median.is_nan());
        assert!(stats.variance.is_nan());
    }

    #[test]
    fn single_row_has_undefined_spread() {
        let stats = summary_stats(&[record(42.0)]);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean, 42.0);
        assert_eq!(stats.min, 42.0);
        assert_eq!(stats.max, 42.0);
        assert_eq!(stats.median, 42.0);
        assert!(stats.std.is_nan());
        assert!(stats.variance.is_nan());
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&values, 0.25) - 1.75).abs() < 1e-12);
        assert!((quantile(&values, 0.0) - 1.0).abs() < 1e-12);
        assert!((quantile(&values, 1.0) - 4.0).abs() < 1e-12);
        assert!(quantile(&[], 0.5).is_nan());
    }
}
