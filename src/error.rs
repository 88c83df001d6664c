use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading an input file. Bad cell values are never errors;
/// they are coerced during ingestion.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("unsupported file format: {0} (expected .parquet or .csv)")]
    UnsupportedFormat(PathBuf),

    #[error("CSV parse failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("parquet read failed: {0}")]
    Parquet(#[from] polars::prelude::PolarsError),
}

/// Failures while building or writing a category workbook.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("category {0} has no rows to export")]
    Empty(String),

    #[error("spreadsheet writer failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
