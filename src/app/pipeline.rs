//! Shared load pipeline used by both the CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load CSV -> clean/derive -> index distinct filter values
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::path::PathBuf;

use crate::data;
use crate::domain::{CostRecord, LoadConfig, QueryParams, RowError, WorkingTable};
use crate::error::AppError;
use crate::query;

/// The canonical table plus everything the front-ends need to populate their
/// selectors: built once per load, read-only afterwards.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub source: PathBuf,
    pub table: WorkingTable,
    /// Distinct filter values, each sorted (see `query`).
    pub subsystems: Vec<String>,
    pub months: Vec<String>,
    pub plants: Vec<String>,
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: Vec<RowError>,
}

/// Execute the full load pipeline.
pub fn load_dashboard(config: &LoadConfig) -> Result<DashboardData, AppError> {
    let raw = data::loader::load_raw(&config.csv_path)?;
    let out = data::transform::transform(&raw, config.bad_rows)?;

    let records = &out.table.records;
    Ok(DashboardData {
        source: config.csv_path.clone(),
        subsystems: query::distinct_subsystems(records),
        months: query::distinct_months(records),
        plants: query::distinct_plants(records),
        rows_read: out.rows_read,
        rows_used: out.rows_used,
        row_errors: out.row_errors,
        table: out.table,
    })
}

/// Apply the subsystem, month, and plant filters in sequence.
///
/// Absent filters are identities, so the combination covers every filter
/// shape the front-ends ask for.
pub fn apply_filters(records: &[CostRecord], params: &QueryParams) -> Vec<CostRecord> {
    let filtered = query::filter_by_subsystem(records, params.subsystem.as_deref());
    let filtered = query::filter_by_month(&filtered, params.month.as_deref());
    query::filter_by_plant(&filtered, params.plant.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BadRowPolicy;
    use std::io::Write;

    #[test]
    fn csv_to_filtered_stats_end_to_end() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "usina,subsistema,data_inicio,data_fim,custo_variavel_unitario\n\
             UTE A,N,2024-01-01,2024-01-07,10\n\
             UTE B,N,2024-01-08,2024-01-14,20\n\
             UTE C,S,2024-01-15,2024-01-21,30\n\
             UTE D,S,2024-02-01,2024-02-07,40\n\
             UTE E,N,2024-02-08,2024-02-14,50\n"
        )
        .unwrap();
        file.flush().unwrap();

        let config = LoadConfig {
            csv_path: file.path().to_path_buf(),
            bad_rows: BadRowPolicy::Skip,
        };
        let data = load_dashboard(&config).unwrap();

        assert_eq!(data.rows_used, 5);
        assert_eq!(data.subsystems, vec!["N", "S"]);
        assert_eq!(data.months, vec!["2024-01", "2024-02"]);
        assert_eq!(data.plants.len(), 5);

        let params = QueryParams {
            subsystem: Some("N".to_string()),
            month: Some("2024-01".to_string()),
            ..QueryParams::default()
        };
        let filtered = apply_filters(&data.table.records, &params);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.subsystem == "N" && r.year_month == "2024-01"));

        let stats = query::summary_stats(&filtered);
        assert_eq!(stats.count, 2);
        assert!((stats.mean - 15.0).abs() < 1e-12);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 20.0);
    }
}
