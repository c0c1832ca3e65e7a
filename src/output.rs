use crate::types::{ChangeLogEntry, ChangeLogRow, FacilitySummary, SummaryRow};
use crate::util::{format_delta, format_int, format_number};
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn summary_rows(summaries: &[FacilitySummary]) -> Vec<SummaryRow> {
    summaries
        .iter()
        .map(|s| SummaryRow {
            title: s.title.clone(),
            energized: format_int(s.energized),
            increase: format_delta(s.increase),
            in_progress: format_int(s.in_progress),
            planned: format_int(s.planned),
            target: format_int(s.target),
            target_achieved: format!("{}%", format_number(s.percent * 100.0, 1)),
        })
        .collect()
}

/// Undefined percentages (previous count of zero) render as `n/a`.
pub fn change_log_rows(entries: &[ChangeLogEntry]) -> Vec<ChangeLogRow> {
    entries
        .iter()
        .map(|e| ChangeLogRow {
            status: e.status.to_string(),
            previous: format_int(e.previous_count),
            current: format_int(e.current_count),
            change: format_delta(e.change),
            percent_change: match e.percent_change {
                Some(p) if p > 0.0 => format!("+{:.1}%", p),
                Some(p) => format!("{:.1}%", p),
                None => "n/a".to_string(),
            },
        })
        .collect()
}
