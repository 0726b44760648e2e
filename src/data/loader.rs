use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use calamine::{Data, Reader, Sheets};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;
use serde_json::Value as JsonValue;

use super::model::{CellValue, RawTable, Table};
use crate::errors::LoadError;

// ---------------------------------------------------------------------------
// Supported formats
// ---------------------------------------------------------------------------

/// File formats a test-result table can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Any workbook calamine understands; only the first sheet is read.
    Spreadsheet,
    Csv,
    /// Records-oriented array of objects.
    Json,
    Parquet,
}

impl FileFormat {
    /// Extensions offered by the open dialog, per format.
    pub const SPREADSHEET_EXTENSIONS: [&'static str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(FileFormat::Spreadsheet),
            "csv" => Some(FileFormat::Csv),
            "json" => Some(FileFormat::Json),
            "parquet" | "pq" => Some(FileFormat::Parquet),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
            .ok_or_else(|| LoadError::Parse(format!("Unsupported file extension: .{ext}")))
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a test-result table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – first sheet, header row first
/// * `.csv`     – header row with column names
/// * `.json`    – `[{ "ITEM_NUMBER": ..., "RESPONSE": ..., ... }, ...]`
/// * `.parquet` – flat columns
pub fn load_file(path: &Path) -> Result<Table, LoadError> {
    let format = FileFormat::from_path(path)?;
    let raw = match format {
        FileFormat::Spreadsheet => {
            let workbook = calamine::open_workbook_auto(path).context("opening workbook")?;
            read_spreadsheet(workbook)?
        }
        FileFormat::Csv => {
            let reader = csv::ReaderBuilder::new()
                .flexible(true)
                .from_path(path)
                .context("opening CSV")?;
            read_csv(reader)?
        }
        FileFormat::Json => read_json(File::open(path).context("opening JSON file")?)?,
        FileFormat::Parquet => {
            read_parquet(File::open(path).context("opening parquet file")?)?
        }
    };
    log::debug!(
        "parsed {} rows x {} columns from {}",
        raw.rows.len(),
        raw.headers.len(),
        path.display()
    );
    Table::from_raw(raw)
}

/// Load a test-result table from an uploaded blob already held in memory.
pub fn load_bytes(format: FileFormat, bytes: Vec<u8>) -> Result<Table, LoadError> {
    let raw = match format {
        FileFormat::Spreadsheet => {
            let workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
                .context("opening workbook")?;
            read_spreadsheet(workbook)?
        }
        FileFormat::Csv => {
            let reader = csv::ReaderBuilder::new()
                .flexible(true)
                .from_reader(bytes.as_slice());
            read_csv(reader)?
        }
        FileFormat::Json => read_json(bytes.as_slice())?,
        FileFormat::Parquet => read_parquet(bytes::Bytes::from(bytes))?,
    };
    Table::from_raw(raw)
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// First sheet only; the first used row is the header.  Rows with no
/// populated cell at all are skipped.
fn read_spreadsheet<RS: Read + Seek>(mut workbook: Sheets<RS>) -> Result<RawTable> {
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no sheets")?
        .context("reading first sheet")?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(header_text).collect())
        .unwrap_or_default();

    let rows = rows
        .map(|row| row.iter().map(data_to_cell).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.is_null()))
        .collect();

    Ok(RawTable { headers, rows })
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn data_to_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTimeIso(s) => CellValue::Date(s.clone()),
        Data::Empty | Data::Error(_) => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with column names, one measurement per line.
/// Cell types are guessed per cell.
fn read_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<RawTable> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Ok(RawTable { headers, rows })
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "ITEM_NUMBER": "P1", "TEST_NUMBER": 1, "RESULT_NAME": "Warp", "RESPONSE": 5.0 },
///   ...
/// ]
/// ```
///
/// Columns are the union of keys, in first-seen order.
fn read_json<R: Read>(reader: R) -> Result<RawTable> {
    let root: JsonValue = serde_json::from_reader(reader).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map_or(CellValue::Null, json_to_cell))
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet table.  Every column becomes a table column.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet<T: ChunkReader + 'static>(source: T) -> Result<RawTable> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(source).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok(RawTable { headers, rows })
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            array_value_to_string(col, row).map_or(CellValue::Null, CellValue::Date)
        }
        _ => array_value_to_string(col, row).map_or(CellValue::Null, CellValue::String),
    }
}
