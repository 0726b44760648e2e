use std::io;

use thiserror::Error;

/// Why a file could not be turned into a [`Table`](crate::data::model::Table).
///
/// Every variant is fatal for the load attempt; no partial table is kept.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("The uploaded file contains no data")]
    EmptyTable,
    #[error("Error reading file: {0}")]
    Parse(String),
}

impl From<anyhow::Error> for LoadError {
    fn from(err: anyhow::Error) -> Self {
        LoadError::Parse(format!("{err:#}"))
    }
}

/// Reasons an analysis run is refused. All are recoverable by fixing the input.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("at least one criterion required")]
    NoCriteria,
    #[error("no products selected")]
    NoItemsSelected,
    #[error("no test data loaded")]
    NoTable,
}

/// Failure while writing the results workbook.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("writing workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("nothing to export: run an analysis first")]
    NoResults,
}
