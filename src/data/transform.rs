//! Raw-table cleanup and column derivation.
//!
//! This module turns the loader's string rows into the canonical working
//! table. Design goals:
//!
//! - **Row-level validation**: a bad timestamp or cost condemns one row, not
//!   the load (unless the `fail` policy is selected)
//! - **Deterministic derivation**: every derived column is a total function of
//!   the row it belongs to
//! - **Separation of concerns**: no aggregation logic here

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::{
    BadRowPolicy, CostCategory, CostRecord, RawRow, RawTable, RowError, WorkingTable,
};
use crate::error::AppError;

/// Transform output: canonical table + row-error report.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub table: WorkingTable,
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: Vec<RowError>,
}

/// Clean the raw table and derive the computed columns.
///
/// Steps, in order: parse timestamps, fill missing costs with 0, drop exact
/// duplicates (first occurrence wins), bucket costs, derive `iso_week` and
/// `year_month`, stable-sort ascending by `start_time`.
pub fn transform(raw: &RawTable, policy: BadRowPolicy) -> Result<TransformOutput, AppError> {
    if policy == BadRowPolicy::Fail {
        if let Some(err) = raw.read_errors.first() {
            return Err(AppError::parse(format!("Line {}: {}", err.line, err.message)));
        }
    }
    let mut row_errors = raw.read_errors.clone();

    let rows_read = raw.rows.len() + raw.read_errors.len();
    let mut records = Vec::with_capacity(raw.rows.len());
    let mut seen = HashSet::new();

    for row in &raw.rows {
        match build_record(row) {
            Ok(record) => {
                if seen.insert(dedup_key(&record)) {
                    records.push(record);
                }
            }
            Err(message) => match policy {
                BadRowPolicy::Skip => row_errors.push(RowError {
                    line: row.line,
                    message,
                }),
                BadRowPolicy::Fail => {
                    return Err(AppError::parse(format!("Line {}: {message}", row.line)));
                }
            },
        }
    }

    if records.is_empty() {
        return Err(AppError::parse("No valid rows remain after cleaning."));
    }

    // Stable, so rows sharing a start time keep their input order.
    records.sort_by_key(|r| r.start_time);

    let rows_used = records.len();
    Ok(TransformOutput {
        table: WorkingTable {
            extra_columns: raw.extra_columns.clone(),
            records,
        },
        rows_read,
        rows_used,
        row_errors,
    })
}

fn build_record(row: &RawRow) -> Result<CostRecord, String> {
    if row.plant.is_empty() {
        return Err("Missing `usina` value.".to_string());
    }
    if row.subsystem.is_empty() {
        return Err("Missing `subsistema` value.".to_string());
    }

    let start_time = parse_timestamp(&row.start_time)?;
    let end_time = parse_timestamp(&row.end_time)?;

    // A missing cost cell means "no cost reported", which the dashboard
    // treats as zero; a present-but-malformed cell is a row defect.
    let unit_variable_cost = match &row.unit_variable_cost {
        None => 0.0,
        Some(s) => parse_cost(s)?,
    };

    let cost_category = CostCategory::from_cost(unit_variable_cost)
        .ok_or_else(|| format!("Cost value '{unit_variable_cost}' is out of domain (must be non-negative)."))?;

    Ok(CostRecord {
        plant: row.plant.clone(),
        subsystem: row.subsystem.clone(),
        start_time,
        end_time,
        unit_variable_cost,
        iso_week: start_time.iso_week().week(),
        cost_category,
        year_month: start_time.format("%Y-%m").to_string(),
        extras: row.extras.clone(),
    })
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    // ONS exports use ISO dates; date-time and day-first variants show up in
    // hand-edited files. The accepted set is fixed to keep parsing
    // deterministic.
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    const DATE_FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d.and_time(NaiveTime::MIN));
        }
    }
    Err(format!(
        "Invalid timestamp '{s}'. Expected YYYY-MM-DD (with optional time), DD/MM/YYYY, DD-MM-YYYY, or YYYY/MM/DD."
    ))
}

fn parse_cost(s: &str) -> Result<f64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid cost value '{s}'."))?;
    if !v.is_finite() {
        return Err(format!("Invalid cost value '{s}'."));
    }
    Ok(v)
}

type DedupKey = (String, String, NaiveDateTime, NaiveDateTime, u64, Vec<String>);

fn dedup_key(record: &CostRecord) -> DedupKey {
    (
        record.plant.clone(),
        record.subsystem.clone(),
        record.start_time,
        record.end_time,
        // Bit pattern so -0.0/0.0 and NaN quirks can't merge distinct rows;
        // costs are finite and non-negative by this point anyway.
        record.unit_variable_cost.to_bits(),
        record.extras.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row(line: usize, plant: &str, start: &str, cost: Option<&str>) -> RawRow {
        RawRow {
            line,
            plant: plant.to_string(),
            subsystem: "N".to_string(),
            start_time: start.to_string(),
            end_time: start.to_string(),
            unit_variable_cost: cost.map(str::to_string),
            extras: Vec::new(),
        }
    }

    fn raw_table(rows: Vec<RawRow>) -> RawTable {
        RawTable {
            extra_columns: Vec::new(),
            rows,
            read_errors: Vec::new(),
        }
    }

    #[test]
    fn derives_week_month_and_category() {
        let raw = raw_table(vec![raw_row(2, "UTE A", "2024-01-04", Some("150"))]);
        let out = transform(&raw, BadRowPolicy::Skip).unwrap();

        let record = &out.table.records[0];
        assert_eq!(record.iso_week, 1);
        assert_eq!(record.year_month, "2024-01");
        assert_eq!(record.cost_category, CostCategory::Medium);
        assert_eq!(out.rows_read, 1);
        assert_eq!(out.rows_used, 1);
    }

    #[test]
    fn missing_cost_fills_to_zero_and_buckets_low() {
        let raw = raw_table(vec![raw_row(2, "UTE A", "2024-01-01", None)]);
        let out = transform(&raw, BadRowPolicy::Skip).unwrap();

        let record = &out.table.records[0];
        assert_eq!(record.unit_variable_cost, 0.0);
        assert_eq!(record.cost_category, CostCategory::Low);
        assert!(out.row_errors.is_empty());
    }

    #[test]
    fn exact_duplicates_are_dropped_once() {
        let raw = raw_table(vec![
            raw_row(2, "UTE A", "2024-01-01", Some("50")),
            raw_row(3, "UTE A", "2024-01-01", Some("50")),
            // Same plant and period, different cost: not a duplicate.
            raw_row(4, "UTE A", "2024-01-01", Some("51")),
        ]);
        let out = transform(&raw, BadRowPolicy::Skip).unwrap();

        assert_eq!(out.rows_used, 2);
        assert_eq!(out.table.records.len(), 2);
    }

    #[test]
    fn sort_is_stable_for_equal_start_times() {
        let raw = raw_table(vec![
            raw_row(2, "UTE B", "2024-02-01", Some("10")),
            raw_row(3, "UTE A", "2024-01-01", Some("20")),
            raw_row(4, "UTE C", "2024-02-01", Some("30")),
        ]);
        let out = transform(&raw, BadRowPolicy::Skip).unwrap();

        let plants: Vec<&str> = out.table.records.iter().map(|r| r.plant.as_str()).collect();
        assert_eq!(plants, vec!["UTE A", "UTE B", "UTE C"]);
    }

    #[test]
    fn bad_timestamp_is_skipped_and_reported() {
        let raw = raw_table(vec![
            raw_row(2, "UTE A", "not-a-date", Some("50")),
            raw_row(3, "UTE B", "2024-01-01", Some("50")),
        ]);
        let out = transform(&raw, BadRowPolicy::Skip).unwrap();

        assert_eq!(out.rows_used, 1);
        assert_eq!(out.row_errors.len(), 1);
        assert_eq!(out.row_errors[0].line, 2);
    }

    #[test]
    fn fail_policy_aborts_on_first_bad_row() {
        let raw = raw_table(vec![raw_row(2, "UTE A", "not-a-date", Some("50"))]);
        let err = transform(&raw, BadRowPolicy::Fail).unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Parse);
        assert!(err.to_string().contains("Line 2"));
    }

    #[test]
    fn negative_cost_is_out_of_domain() {
        let raw = raw_table(vec![
            raw_row(2, "UTE A", "2024-01-01", Some("-5")),
            raw_row(3, "UTE B", "2024-01-01", Some("5")),
        ]);
        let out = transform(&raw, BadRowPolicy::Skip).unwrap();

        assert_eq!(out.rows_used, 1);
        assert_eq!(out.row_errors.len(), 1);
    }

    #[test]
    fn zero_valid_rows_is_fatal() {
        let raw = raw_table(vec![raw_row(2, "UTE A", "bogus", Some("50"))]);
        let err = transform(&raw, BadRowPolicy::Skip).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Parse);
    }

    #[test]
    fn transform_is_idempotent_on_clean_data() {
        let raw = raw_table(vec![
            raw_row(2, "UTE B", "2024-02-01 00:00:00", Some("120")),
            raw_row(3, "UTE A", "2024-01-01 00:00:00", Some("340.5")),
        ]);
        let first = transform(&raw, BadRowPolicy::Skip).unwrap();

        // Round-trip the working table back through the transformer.
        let rows: Vec<RawRow> = first
            .table
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| RawRow {
                line: i + 2,
                plant: r.plant.clone(),
                subsystem: r.subsystem.clone(),
                start_time: r.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                end_time: r.end_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                unit_variable_cost: Some(r.unit_variable_cost.to_string()),
                extras: r.extras.clone(),
            })
            .collect();
        let second = transform(&raw_table(rows), BadRowPolicy::Skip).unwrap();

        assert_eq!(second.rows_used, first.rows_used);
        for (a, b) in first.table.records.iter().zip(&second.table.records) {
            assert_eq!(a.iso_week, b.iso_week);
            assert_eq!(a.cost_category, b.cost_category);
            assert_eq!(a.year_month, b.year_month);
            assert_eq!(a.start_time, b.start_time);
        }
    }
}
