//! File exports: filtered rows as CSV, statistics as JSON.
//!
//! The CSV export is meant to be easy to consume in spreadsheets or downstream
//! scripts; the JSON export is the "portable" representation of one filtered
//! view (filters + statistics + ranking).

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::app::pipeline::{self, DashboardData};
use crate::domain::{CostRecord, GroupKey, PlantAverage, QueryParams, SummaryStats};
use crate::error::AppError;
use crate::query;

/// One filtered view of the dataset, ready for JSON serialization.
#[derive(Debug, Clone, Serialize)]
pub struct StatsExport {
    pub source: String,
    pub subsystem: Option<String>,
    pub month: Option<String>,
    pub plant: Option<String>,
    pub group_by: GroupKey,
    pub top_n: usize,
    pub row_count: usize,
    pub stats: SummaryStats,
    pub top_plants: Vec<PlantAverage>,
}

impl StatsExport {
    /// Build the export for the given data + filters.
    pub fn build(data: &DashboardData, params: &QueryParams) -> StatsExport {
        let filtered = pipeline::apply_filters(&data.table.records, params);
        StatsExport {
            source: data.source.display().to_string(),
            subsystem: params.subsystem.clone(),
            month: params.month.clone(),
            plant: params.plant.clone(),
            group_by: params.group_by,
            top_n: params.top_n,
            row_count: filtered.len(),
            stats: query::summary_stats(&filtered),
            top_plants: query::average_cost_by_plant(&filtered, params.top_n),
        }
    }
}

/// Write filtered records to a CSV file, derived and passthrough columns
/// included.
pub fn write_results_csv(
    path: &Path,
    extra_columns: &[String],
    records: &[CostRecord],
) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    let mut header = String::from(
        "usina,subsistema,data_inicio,data_fim,custo_variavel_unitario,iso_week,cost_category,year_month",
    );
    for col in extra_columns {
        header.push(',');
        header.push_str(col);
    }
    writeln!(file, "{header}")
        .map_err(|e| AppError::io(format!("Failed to write export CSV header: {e}")))?;

    for r in records {
        let mut line = format!(
            "{},{},{},{},{:.4},{},{},{}",
            r.plant,
            r.subsystem,
            r.start_time.format("%Y-%m-%d %H:%M:%S"),
            r.end_time.format("%Y-%m-%d %H:%M:%S"),
            r.unit_variable_cost,
            r.iso_week,
            r.cost_category.display_name(),
            r.year_month,
        );
        for extra in &r.extras {
            line.push(',');
            line.push_str(extra);
        }
        writeln!(file, "{line}")
            .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Write a stats export as pretty-printed JSON.
pub fn write_stats_json(path: &Path, export: &StatsExport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create stats JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, export)
        .map_err(|e| AppError::io(format!("Failed to write stats JSON: {e}")))?;

    Ok(())
}

/// Write a timestamped stats export under `export/` (the TUI export key).
pub fn write_stats_bundle(data: &DashboardData, params: &QueryParams) -> Result<PathBuf, AppError> {
    let dir = PathBuf::from("export");
    create_dir_all(&dir)
        .map_err(|e| AppError::io(format!("Failed to create export dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("cvu_stats_{ts}.json"));

    write_stats_json(&path, &StatsExport::build(data, params))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CostCategory;
    use chrono::{NaiveDate, NaiveTime};

    fn record(plant: &str, cost: f64, extras: Vec<String>) -> CostRecord {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_time(NaiveTime::MIN);
        CostRecord {
            plant: plant.to_string(),
            subsystem: "SE".to_string(),
            start_time: start,
            end_time: start,
            unit_variable_cost: cost,
            iso_week: 10,
            cost_category: CostCategory::from_cost(cost).unwrap(),
            year_month: "2024-03".to_string(),
            extras,
        }
    }

    #[test]
    fn results_csv_includes_derived_and_passthrough_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let records = vec![record("UTE A", 150.0, vec!["gas".to_string()])];
        write_results_csv(&path, &["fonte".to_string()], &records).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert!(header.ends_with(",fonte"));
        assert!(header.contains("year_month"));

        let row = lines.next().unwrap();
        assert!(row.starts_with("UTE A,SE,2024-03-04"));
        assert!(row.contains("Medium"));
        assert!(row.ends_with(",gas"));
    }

    #[test]
    fn stats_json_carries_filters_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");

        let export = StatsExport {
            source: "data.csv".to_string(),
            subsystem: Some("SE".to_string()),
            month: None,
            plant: None,
            group_by: GroupKey::Subsystem,
            top_n: 10,
            row_count: 2,
            stats: crate::query::summary_stats(&[record("A", 100.0, vec![]), record("B", 200.0, vec![])]),
            top_plants: vec![],
        };
        write_stats_json(&path, &export).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["subsystem"], "SE");
        assert_eq!(value["row_count"], 2);
        assert_eq!(value["stats"]["mean"], 150.0);
        assert_eq!(value["stats"]["count"], 2);
    }
}
