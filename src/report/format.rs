//! Formatted terminal output for run summaries, statistics, and rankings.

use crate::app::pipeline::DashboardData;
use crate::domain::{GroupKey, GroupSpread, PlantAverage, QueryParams, SummaryStats};

/// Format the run summary: source, row accounting, and active filters.
pub fn format_run_summary(data: &DashboardData, params: &QueryParams, filtered_rows: usize) -> String {
    let mut out = String::new();

    out.push_str("=== cvu - Thermal Plant Variable Cost Summary ===\n");
    out.push_str(&format!("Source: {}\n", data.source.display()));
    out.push_str(&format!(
        "Rows: read={} used={} skipped={}\n",
        data.rows_read,
        data.rows_used,
        data.row_errors.len()
    ));

    let months = match (data.months.first(), data.months.last()) {
        (Some(first), Some(last)) if first != last => format!("{first}..{last}"),
        (Some(first), _) => first.clone(),
        _ => "-".to_string(),
    };
    out.push_str(&format!(
        "Coverage: months={months} | subsystems={} | plants={}\n",
        data.subsystems.len(),
        data.plants.len()
    ));

    out.push_str(&format!(
        "Filters: subsystem={} | month={} | plant={} -> {filtered_rows} row(s)\n",
        params.subsystem.as_deref().unwrap_or("-"),
        params.month.as_deref().unwrap_or("-"),
        params.plant.as_deref().unwrap_or("-"),
    ));

    if !data.row_errors.is_empty() {
        out.push_str("\nSkipped rows:\n");
        for err in data.row_errors.iter().take(5) {
            out.push_str(&format!("- line {}: {}\n", err.line, err.message));
        }
        if data.row_errors.len() > 5 {
            out.push_str(&format!("- ... and {} more\n", data.row_errors.len() - 5));
        }
    }

    out
}

/// Format the summary statistics of the filtered costs.
pub fn format_stats_table(stats: &SummaryStats) -> String {
    let mut out = String::new();

    out.push_str("Unit variable cost statistics:\n");
    out.push_str(&format!("{:<10} {:>12}\n", "count", stats.count));
    for (name, value) in [
        ("mean", stats.mean),
        ("std", stats.std),
        ("min", stats.min),
        ("25%", stats.p25),
        ("50%", stats.p50),
        ("75%", stats.p75),
        ("max", stats.max),
        ("median", stats.median),
        ("variance", stats.variance),
    ] {
        out.push_str(&format!("{:<10} {:>12}\n", name, fmt_stat(value)));
    }

    out
}

/// Format the top-plants ranking table.
pub fn format_top_plants(top: &[PlantAverage]) -> String {
    let mut out = String::new();

    out.push_str("Top plants by average cost:\n");
    out.push_str(&format!("{:<4} {:<32} {:>6} {:>12}\n", "#", "plant", "rows", "avg cost"));
    out.push_str(&format!("{:-<4} {:-<32} {:-<6} {:-<12}\n", "", "", "", ""));

    for (idx, entry) in top.iter().enumerate() {
        out.push_str(&format!(
            "{:<4} {:<32} {:>6} {:>12.2}\n",
            idx + 1,
            truncate(&entry.plant, 32),
            entry.count,
            entry.avg_cost,
        ));
    }
    if top.is_empty() {
        out.push_str("(no rows)\n");
    }

    out
}

/// Format the per-group five-number summary table.
pub fn format_group_spread(groups: &[GroupSpread], key: GroupKey) -> String {
    let mut out = String::new();

    out.push_str(&format!("Cost spread by {}:\n", key.display_name()));
    out.push_str(&format!(
        "{:<16} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
        "group", "rows", "min", "25%", "median", "75%", "max"
    ));
    out.push_str(&format!(
        "{:-<16} {:-<6} {:-<10} {:-<10} {:-<10} {:-<10} {:-<10}\n",
        "", "", "", "", "", "", ""
    ));

    for g in groups {
        out.push_str(&format!(
            "{:<16} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
            truncate(&g.label, 16),
            g.count,
            fmt_stat(g.min),
            fmt_stat(g.p25),
            fmt_stat(g.p50),
            fmt_stat(g.p75),
            fmt_stat(g.max),
        ));
    }
    if groups.is_empty() {
        out.push_str("(no rows)\n");
    }

    out
}

/// Render one statistic; NaN (undefined) prints as `-`.
pub fn fmt_stat(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.2}")
    } else {
        "-".to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
