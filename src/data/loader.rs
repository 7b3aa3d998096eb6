//! CSV loading and schema validation.
//!
//! The loader turns the source file into a [`RawTable`]: strings only, no type
//! coercion. Design goals:
//!
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **No value validation here** — the transformer owns coercion so that row
//!   errors carry original values and line numbers
//! - **Passthrough** for any columns beyond the required schema

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{RawRow, RawTable, RowError};
use crate::error::AppError;

pub const COL_PLANT: &str = "usina";
pub const COL_SUBSYSTEM: &str = "subsistema";
pub const COL_START: &str = "data_inicio";
pub const COL_END: &str = "data_fim";
pub const COL_COST: &str = "custo_variavel_unitario";

const REQUIRED_COLUMNS: [&str; 5] = [COL_PLANT, COL_SUBSYSTEM, COL_START, COL_END, COL_COST];

/// Read a CVU CSV into a raw table.
pub fn load_raw(path: &Path) -> Result<RawTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::io(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let plant_idx = require_column(&header_map, COL_PLANT)?;
    let subsystem_idx = require_column(&header_map, COL_SUBSYSTEM)?;
    let start_idx = require_column(&header_map, COL_START)?;
    let end_idx = require_column(&header_map, COL_END)?;
    let cost_idx = require_column(&header_map, COL_COST)?;

    // Passthrough columns keep their input order.
    let mut extra_columns = Vec::new();
    let mut extra_indices = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        let name = normalize_header_name(name);
        if !REQUIRED_COLUMNS.contains(&name.as_str()) {
            extra_columns.push(name);
            extra_indices.push(idx);
        }
    }

    let mut rows = Vec::new();
    let mut read_errors = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                read_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        rows.push(RawRow {
            line,
            plant: field(&record, plant_idx),
            subsystem: field(&record, subsystem_idx),
            start_time: field(&record, start_idx),
            end_time: field(&record, end_idx),
            unit_variable_cost: opt_field(&record, cost_idx),
            extras: extra_indices.iter().map(|&i| field(&record, i)).collect(),
        });
    }

    Ok(RawTable {
        extra_columns,
        rows,
        read_errors,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿usina"). If we don't strip it, schema validation
    // will incorrectly report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !header_map.contains_key(**c))
        .map(|c| format!("`{c}`"))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::schema(format!(
            "Missing required column(s): {}",
            missing.join(", ")
        )))
    }
}

fn require_column(header_map: &HashMap<String, usize>, name: &str) -> Result<usize, AppError> {
    header_map
        .get(name)
        .copied()
        .ok_or_else(|| AppError::schema(format!("Missing required column: `{name}`")))
}

fn field(record: &StringRecord, idx: usize) -> String {
    record.get(idx).map(str::trim).unwrap_or_default().to_string()
}

fn opt_field(record: &StringRecord, idx: usize) -> Option<String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_rows_and_passthrough_columns() {
        let file = write_csv(
            "usina,subsistema,data_inicio,data_fim,custo_variavel_unitario,fonte\n\
             UTE A,N,2024-01-01,2024-01-07,150.5,gas\n\
             UTE B,S,2024-01-01,2024-01-07,,carvao\n",
        );

        let table = load_raw(file.path()).unwrap();
        assert_eq!(table.extra_columns, vec!["fonte".to_string()]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].line, 2);
        assert_eq!(table.rows[0].plant, "UTE A");
        assert_eq!(table.rows[0].unit_variable_cost.as_deref(), Some("150.5"));
        assert_eq!(table.rows[0].extras, vec!["gas".to_string()]);
        assert_eq!(table.rows[1].unit_variable_cost, None);
        assert!(table.read_errors.is_empty());
    }

    #[test]
    fn missing_columns_are_a_schema_error() {
        let file = write_csv("usina,data_inicio\nUTE A,2024-01-01\n");

        let err = load_raw(file.path()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Schema);
        let message = err.to_string();
        assert!(message.contains("subsistema"));
        assert!(message.contains("custo_variavel_unitario"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_raw(Path::new("/nonexistent/cvu.csv")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }

    #[test]
    fn bom_and_case_in_headers_are_tolerated() {
        let file = write_csv(
            "\u{feff}Usina,SUBSISTEMA,data_inicio,data_fim,custo_variavel_unitario\n\
             UTE A,NE,2024-02-01,2024-02-07,90\n",
        );

        let table = load_raw(file.path()).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].subsystem, "NE");
    }
}
