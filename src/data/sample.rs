//! Synthetic CVU dataset generation.
//!
//! Deterministic (seeded) weekly cost records for a fixed roster of thermal
//! plants. The generated data intentionally includes missing cost cells and
//! exact duplicate rows so the cleanup pipeline has something to do.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{RawRow, RawTable};
use crate::error::AppError;

/// Daily log-noise applied around each plant's base cost level.
const COST_SIGMA: f64 = 0.25;
/// Share of rows emitted with an empty cost cell.
const MISSING_PROB: f64 = 0.03;
/// Share of rows immediately repeated as an exact duplicate.
const DUPLICATE_PROB: f64 = 0.02;

/// Plant roster: (name, subsystem, base cost level in R$/MWh).
const PLANTS: [(&str, &str, f64); 10] = [
    ("UTE NORTE FLUMINENSE", "SE", 180.0),
    ("TERMORIO", "SE", 240.0),
    ("UTE PIRATININGA", "SE", 95.0),
    ("CANDIOTA III", "S", 120.0),
    ("JORGE LACERDA IV", "S", 310.0),
    ("TERMOPERNAMBUCO", "NE", 150.0),
    ("UTE PECEM II", "NE", 420.0),
    ("PORTO DO ITAQUI", "NE", 260.0),
    ("MAUA 3", "N", 530.0),
    ("APARECIDA PARTE I", "N", 640.0),
];

/// Generate `count` synthetic rows (duplicates included in the count).
pub fn generate_sample(count: usize, seed: u64) -> Result<RawTable, AppError> {
    if count == 0 {
        return Err(AppError::config("Sample count must be > 0."));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::term(format!("Noise distribution error: {e}")))?;

    let base_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();

    let mut rows: Vec<RawRow> = Vec::with_capacity(count);
    let mut i = 0usize;
    while rows.len() < count {
        let (plant, subsystem, base_cost) = PLANTS[i % PLANTS.len()];
        let week = i / PLANTS.len();
        i += 1;

        let start = base_date + Duration::days(7 * week as i64);
        let end = start + Duration::days(6);

        let cost = if rng.gen_bool(MISSING_PROB) {
            None
        } else {
            let z: f64 = normal.sample(&mut rng);
            Some(format!("{:.2}", base_cost * (COST_SIGMA * z).exp()))
        };

        let row = RawRow {
            line: rows.len() + 2,
            plant: plant.to_string(),
            subsystem: subsystem.to_string(),
            start_time: start.format("%Y-%m-%d").to_string(),
            end_time: end.format("%Y-%m-%d").to_string(),
            unit_variable_cost: cost,
            extras: Vec::new(),
        };

        let duplicate = rng.gen_bool(DUPLICATE_PROB);
        rows.push(row);
        if duplicate && rows.len() < count {
            let mut dup = rows[rows.len() - 1].clone();
            dup.line = rows.len() + 2;
            rows.push(dup);
        }
    }

    Ok(RawTable {
        extra_columns: Vec::new(),
        rows,
        read_errors: Vec::new(),
    })
}

/// Write a synthetic dataset as a loadable CSV.
pub fn write_sample_csv(path: &Path, count: usize, seed: u64) -> Result<usize, AppError> {
    let table = generate_sample(count, seed)?;

    let mut file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create sample CSV '{}': {e}", path.display())))?;

    writeln!(
        file,
        "usina,subsistema,data_inicio,data_fim,custo_variavel_unitario"
    )
    .map_err(|e| AppError::io(format!("Failed to write sample CSV header: {e}")))?;

    for row in &table.rows {
        writeln!(
            file,
            "{},{},{},{},{}",
            row.plant,
            row.subsystem,
            row.start_time,
            row.end_time,
            row.unit_variable_cost.as_deref().unwrap_or(""),
        )
        .map_err(|e| AppError::io(format!("Failed to write sample CSV row: {e}")))?;
    }

    Ok(table.rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::transform::transform;
    use crate::domain::BadRowPolicy;

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = generate_sample(50, 7).unwrap();
        let b = generate_sample(50, 7).unwrap();

        assert_eq!(a.rows.len(), 50);
        for (x, y) in a.rows.iter().zip(&b.rows) {
            assert_eq!(x.plant, y.plant);
            assert_eq!(x.start_time, y.start_time);
            assert_eq!(x.unit_variable_cost, y.unit_variable_cost);
        }
    }

    #[test]
    fn sample_survives_the_transformer_without_row_errors() {
        let raw = generate_sample(200, 42).unwrap();
        let out = transform(&raw, BadRowPolicy::Skip).unwrap();

        // Missing costs fill to zero; only exact duplicates may reduce the count.
        assert!(out.row_errors.is_empty());
        assert!(out.rows_used <= 200);
        assert!(out.rows_used > 0);
    }

    #[test]
    fn zero_count_is_a_config_error() {
        let err = generate_sample(0, 1).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }
}
