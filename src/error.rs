use std::path::PathBuf;
use thiserror::Error;

/// Structural failures of a snapshot load. Row-level problems never show up
/// here; those rows are skipped and counted in the load report instead.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot source not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("unsupported snapshot format: {0:?}")]
    UnsupportedFormat(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<calamine::Error> for SnapshotError {
    fn from(err: calamine::Error) -> Self {
        SnapshotError::Spreadsheet(err.to_string())
    }
}
