use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::constants::columns;
use crate::errors::LoadError;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the source table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common spreadsheet cell types.
/// Used as a `BTreeMap` / `BTreeSet` key downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text for simplicity.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so CellValue can key a BTreeMap --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text form used for key columns; `None` for null cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

/// Coerce a cell to a number, the way every numeric aggregate and the
/// classifier read `RESPONSE`.
///
/// Text is trimmed and parsed as `f64`; booleans count as `1` / `0`.
/// NaN never comes back as a number.
pub fn try_parse_numeric(value: &CellValue) -> Option<f64> {
    let parsed = match value {
        CellValue::Float(v) => *v,
        CellValue::Integer(i) => *i as f64,
        CellValue::Bool(b) => f64::from(u8::from(*b)),
        CellValue::String(s) => s.trim().parse::<f64>().ok()?,
        CellValue::Date(_) | CellValue::Null => return None,
    };
    (!parsed.is_nan()).then_some(parsed)
}

// ---------------------------------------------------------------------------
// RawTable – a parsed but unvalidated grid
// ---------------------------------------------------------------------------

/// Header row plus data rows, exactly as a format parser produced them.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

// ---------------------------------------------------------------------------
// Record – one measurement row
// ---------------------------------------------------------------------------

/// A single measurement (one row of the source table).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Product the measurement belongs to; `None` for an empty cell.
    pub item_number: Option<String>,
    /// Test session identifier.
    pub test_number: CellValue,
    /// Measurement name; `None` for an empty cell.
    pub result_name: Option<String>,
    /// Raw recorded value, numeric or not.
    pub response: CellValue,
    /// Every other source column: column_name → value.
    pub extra: BTreeMap<String, CellValue>,
}

impl Record {
    /// Cell for any source column, required or pass-through.
    pub fn value(&self, column: &str) -> CellValue {
        match column {
            columns::ITEM_NUMBER => text_cell(&self.item_number),
            columns::TEST_NUMBER => self.test_number.clone(),
            columns::RESULT_NAME => text_cell(&self.result_name),
            columns::RESPONSE => self.response.clone(),
            other => self.extra.get(other).cloned().unwrap_or(CellValue::Null),
        }
    }

    /// Numeric reading of `response`, if it has one.
    pub fn numeric_response(&self) -> Option<f64> {
        try_parse_numeric(&self.response)
    }
}

fn text_cell(value: &Option<String>) -> CellValue {
    value
        .as_ref()
        .map_or(CellValue::Null, |s| CellValue::String(s.clone()))
}

/// Make header names distinct without reordering them.
///
/// A blank header becomes `Unnamed: <index>`; a repeat of an earlier name
/// gets the first free `.1`, `.2`, ... suffix (`NOTE`, `NOTE.1`).
pub fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut repeats: BTreeMap<String, usize> = BTreeMap::new();
    let mut out = Vec::with_capacity(headers.len());

    for (idx, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            header
        };
        let mut name = base.clone();
        while seen.contains(&name) {
            let n = repeats.entry(base.clone()).or_insert(0);
            *n += 1;
            name = format!("{base}.{n}");
        }
        seen.insert(name.clone());
        out.push(name);
    }
    out
}

// ---------------------------------------------------------------------------
// Table – the complete loaded test-result set
// ---------------------------------------------------------------------------

/// The validated table of measurements, in source row order.
#[derive(Debug, Clone)]
pub struct Table {
    /// Source column names in file order (required and pass-through).
    pub columns: Vec<String>,
    /// All measurements (rows).
    pub records: Vec<Record>,
}

impl Table {
    /// Validate a parsed grid and split out the required columns.
    ///
    /// Column presence is checked before emptiness, so a header-only file
    /// missing columns reports the missing names.
    ///
    /// Blank and repeated headers are renamed first (see [`unique_headers`]),
    /// so every pass-through column keeps its own cells.
    pub fn from_raw(raw: RawTable) -> Result<Self, LoadError> {
        let headers = unique_headers(raw.headers);
        let position = |name: &str| headers.iter().position(|h| h == name);

        let missing: Vec<String> = columns::REQUIRED
            .into_iter()
            .filter(|&name| position(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns(missing));
        }
        if raw.rows.is_empty() {
            return Err(LoadError::EmptyTable);
        }

        let mut required = [0usize; 4];
        for (slot, name) in required.iter_mut().zip(columns::REQUIRED) {
            *slot = position(name)
                .ok_or_else(|| LoadError::MissingColumns(vec![name.to_string()]))?;
        }
        let [item_idx, test_idx, result_idx, response_idx] = required;

        let records = raw
            .rows
            .into_iter()
            .map(|row| {
                let cell = |idx: usize| row.get(idx).cloned().unwrap_or(CellValue::Null);
                let mut extra = BTreeMap::new();
                for (col_idx, col_name) in headers.iter().enumerate() {
                    if required.contains(&col_idx) {
                        continue;
                    }
                    extra.insert(col_name.clone(), cell(col_idx));
                }
                Record {
                    item_number: cell(item_idx).as_text(),
                    test_number: cell(test_idx),
                    result_name: cell(result_idx).as_text(),
                    response: cell(response_idx),
                    extra,
                }
            })
            .collect();

        Ok(Table {
            columns: headers,
            records,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows belonging to one product, in source order.
    pub fn records_for<'a>(&'a self, item_number: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records
            .iter()
            .filter(move |r| r.item_number.as_deref() == Some(item_number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headers: &[&str], rows: Vec<Vec<CellValue>>) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn numeric_coercion_follows_cell_type() {
        assert_eq!(try_parse_numeric(&CellValue::Float(2.5)), Some(2.5));
        assert_eq!(try_parse_numeric(&CellValue::Integer(-3)), Some(-3.0));
        assert_eq!(try_parse_numeric(&CellValue::from(" 4.75 ")), Some(4.75));
        assert_eq!(try_parse_numeric(&CellValue::Bool(true)), Some(1.0));
        assert_eq!(try_parse_numeric(&CellValue::from("N/A")), None);
        assert_eq!(try_parse_numeric(&CellValue::from("")), None);
        assert_eq!(try_parse_numeric(&CellValue::from("nan")), None);
        assert_eq!(try_parse_numeric(&CellValue::Float(f64::NAN)), None);
        assert_eq!(try_parse_numeric(&CellValue::Date("2024-01-01".into())), None);
        assert_eq!(try_parse_numeric(&CellValue::Null), None);
    }

    #[test]
    fn whole_floats_render_without_fraction() {
        assert_eq!(CellValue::Float(1001.0).to_string(), "1001");
        assert_eq!(CellValue::Float(3.25).to_string(), "3.25");
        assert_eq!(CellValue::Null.as_text(), None);
    }

    #[test]
    fn missing_columns_are_reported_in_required_order() {
        let err = Table::from_raw(raw(&["RESPONSE", "ITEM_NUMBER"], vec![])).unwrap_err();
        assert_eq!(
            err,
            LoadError::MissingColumns(vec!["TEST_NUMBER".into(), "RESULT_NAME".into()])
        );
        assert_eq!(
            err.to_string(),
            "Missing required columns: TEST_NUMBER, RESULT_NAME"
        );
    }

    #[test]
    fn header_only_table_is_empty() {
        let err = Table::from_raw(raw(&columns::REQUIRED, vec![])).unwrap_err();
        assert_eq!(err, LoadError::EmptyTable);
    }

    #[test]
    fn extra_columns_pass_through_and_short_rows_pad_with_null() {
        let table = Table::from_raw(raw(
            &["OPERATOR", "ITEM_NUMBER", "TEST_NUMBER", "RESULT_NAME", "RESPONSE"],
            vec![
                vec!["Ann".into(), "P1".into(), 7i64.into(), "Warp".into(), 5.0f64.into()],
                vec!["Bob".into(), "P1".into()],
            ],
        ))
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns[0], "OPERATOR");
        let first = &table.records[0];
        assert_eq!(first.item_number.as_deref(), Some("P1"));
        assert_eq!(first.value("OPERATOR"), CellValue::from("Ann"));
        assert_eq!(first.value("RESULT_NAME"), CellValue::from("Warp"));
        assert_eq!(first.numeric_response(), Some(5.0));

        let second = &table.records[1];
        assert_eq!(second.result_name, None);
        assert!(second.response.is_null());
        assert_eq!(second.value("RESULT_NAME"), CellValue::Null);
    }

    #[test]
    fn blank_and_repeated_headers_get_distinct_names() {
        let headers = ["NOTE", "", "NOTE", "NOTE.1", "NOTE", " "]
            .map(String::from)
            .to_vec();
        assert_eq!(
            unique_headers(headers),
            vec!["NOTE", "Unnamed: 1", "NOTE.1", "NOTE.1.1", "NOTE.2", "Unnamed: 5"]
        );
    }

    #[test]
    fn repeated_extra_columns_keep_their_own_cells() {
        let table = Table::from_raw(raw(
            &["ITEM_NUMBER", "TEST_NUMBER", "RESULT_NAME", "RESPONSE", "NOTE", "NOTE", ""],
            vec![vec![
                "P1".into(),
                1i64.into(),
                "Warp".into(),
                5.0f64.into(),
                "first".into(),
                "second".into(),
                "third".into(),
            ]],
        ))
        .unwrap();

        assert_eq!(table.columns[4..], ["NOTE", "NOTE.1", "Unnamed: 6"]);
        let record = &table.records[0];
        assert_eq!(record.value("NOTE"), CellValue::from("first"));
        assert_eq!(record.value("NOTE.1"), CellValue::from("second"));
        assert_eq!(record.value("Unnamed: 6"), CellValue::from("third"));
    }
}
