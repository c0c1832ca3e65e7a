use crate::error::SnapshotError;
use crate::types::{FacilityMetrics, FacilityRecord, FacilityType, RawRow, Status};
use crate::util::{parse_count, parse_date_safe, parse_metric};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 4] = ["date", "status", "type", "n_facilities"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub dropped_dates: usize,
    pub dropped_statuses: usize,
    pub parse_errors: usize,
}

/// Validated facility-status time series. Aggregators only ever borrow it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotTable {
    records: Vec<FacilityRecord>,
}

impl SnapshotTable {
    pub fn from_records(records: Vec<FacilityRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[FacilityRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct observation dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let set: BTreeSet<NaiveDate> = self.records.iter().map(|r| r.date).collect();
        set.into_iter().collect()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.date).max()
    }

    /// `"Total"` followed by every distinct type label, sorted.
    pub fn facility_types(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .records
            .iter()
            .map(|r| r.facility_type.as_str())
            .filter(|t| !t.is_empty())
            .collect();
        std::iter::once(FacilityType::TOTAL_LABEL)
            .chain(set)
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Delimited(u8),
    Spreadsheet,
}

impl SourceFormat {
    fn from_path(path: &Path) -> Result<Self, SnapshotError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(SourceFormat::Delimited(b',')),
            "tsv" => Ok(SourceFormat::Delimited(b'\t')),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(SourceFormat::Spreadsheet),
            _ => Err(SnapshotError::UnsupportedFormat(ext)),
        }
    }
}

/// Load a snapshot file. Missing files and unknown extensions are errors;
/// individual bad rows are dropped and counted in the report.
///
/// Rows whose status is not one of the four canonical labels are dropped
/// (`LoadReport::dropped_statuses`), so they never count toward a summary's
/// `in_progress`.
pub fn load(path: &Path) -> Result<(SnapshotTable, LoadReport), SnapshotError> {
    if !path.exists() {
        return Err(SnapshotError::SourceNotFound(path.to_path_buf()));
    }
    let format = SourceFormat::from_path(path)?;
    let (table, report) = match format {
        SourceFormat::Delimited(delimiter) => {
            let file = std::fs::File::open(path)?;
            load_from_reader(file, delimiter)?
        }
        SourceFormat::Spreadsheet => {
            let (headers, rows) = read_spreadsheet(path)?;
            warn_missing_columns(&headers);
            clean_rows(rows.iter().map(|r| r.deserialize::<RawRow>(Some(&headers))))
        }
    };
    tracing::info!(
        path = %path.display(),
        total_rows = report.total_rows,
        kept_rows = report.kept_rows,
        dropped_dates = report.dropped_dates,
        dropped_statuses = report.dropped_statuses,
        parse_errors = report.parse_errors,
        "snapshot loaded"
    );
    Ok((table, report))
}

/// Load an in-memory delimited table, header row first.
pub fn load_from_reader<R: Read>(
    reader: R,
    delimiter: u8,
) -> Result<(SnapshotTable, LoadReport), SnapshotError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .delimiter(delimiter)
        .trim(Trim::Headers)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    warn_missing_columns(&headers);
    Ok(clean_rows(rdr.deserialize::<RawRow>()))
}

fn warn_missing_columns(headers: &StringRecord) {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            tracing::warn!(column, "required column missing from snapshot header");
        }
    }
}

fn clean_rows<I>(rows: I) -> (SnapshotTable, LoadReport)
where
    I: IntoIterator<Item = Result<RawRow, csv::Error>>,
{
    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for result in rows {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(err) => {
                tracing::debug!(row = report.total_rows, %err, "unreadable row skipped");
                report.parse_errors += 1;
                continue;
            }
        };

        let Some(date) = parse_date_safe(row.date.as_deref()) else {
            report.dropped_dates += 1;
            continue;
        };
        let Some(status) = row.status.as_deref().and_then(Status::parse) else {
            tracing::debug!(row = report.total_rows, status = ?row.status, "unknown status skipped");
            report.dropped_statuses += 1;
            continue;
        };

        records.push(FacilityRecord {
            date,
            facility_type: row.facility_type.as_deref().unwrap_or_default().trim().to_string(),
            status,
            n_facilities: parse_count(row.n_facilities.as_deref()),
            metrics: FacilityMetrics {
                total_beneficiaries: parse_metric(row.total_beneficiaries.as_deref()),
                female_beneficiaries: parse_metric(row.female_beneficiaries.as_deref()),
                male_beneficiaries: parse_metric(row.male_beneficiaries.as_deref()),
                solar_capacity_kw: parse_metric(row.solar_capacity_kw.as_deref()),
                storage_capacity_kwh: parse_metric(row.storage_capacity_kwh.as_deref()),
            },
        });
    }

    report.kept_rows = records.len();
    (SnapshotTable::from_records(records), report)
}

/// First worksheet as string records; the first row is the header.
fn read_spreadsheet(path: &Path) -> Result<(StringRecord, Vec<StringRecord>), SnapshotError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SnapshotError::Spreadsheet("workbook has no worksheets".to_string()))??;

    let mut rows = range.rows();
    let Some(header_cells) = rows.next() else {
        return Ok((StringRecord::new(), Vec::new()));
    };
    let headers: StringRecord = header_cells
        .iter()
        .map(|c| cell_to_string(c).trim().to_string())
        .collect();
    let records = rows
        .map(|cells| cells.iter().map(cell_to_string).collect::<StringRecord>())
        .collect();
    Ok((headers, records))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) => s.clone(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.date().format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}
