use std::fmt;

use serde::Serialize;

use super::criteria::{Bounds, CriteriaMap};
use crate::constants::columns;
use crate::data::model::{CellValue, Record, Table};
use crate::errors::AnalysisError;

// ---------------------------------------------------------------------------
// Outlier label
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutlierStatus {
    #[default]
    Normal,
    Abnormal,
}

impl OutlierStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OutlierStatus::Normal => "NORMAL",
            OutlierStatus::Abnormal => "ABNORMAL",
        }
    }

    pub fn is_abnormal(self) -> bool {
        self == OutlierStatus::Abnormal
    }
}

impl fmt::Display for OutlierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ClassifiedRecord – a record plus the bounds it was judged against
// ---------------------------------------------------------------------------

/// One source row after classification.
///
/// Bounds are only present when a criterion existed for the row's
/// measurement name.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRecord {
    pub record: Record,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    pub status: OutlierStatus,
}

impl ClassifiedRecord {
    pub fn is_abnormal(&self) -> bool {
        self.status.is_abnormal()
    }

    /// Cell for any source column or one of the appended result columns.
    pub fn value(&self, column: &str) -> CellValue {
        let bound = |b: Option<f64>| b.map_or(CellValue::Null, CellValue::Float);
        match column {
            columns::LOWER_BOUND => bound(self.lower_bound),
            columns::UPPER_BOUND => bound(self.upper_bound),
            columns::IS_OUTLIER => CellValue::String(self.status.as_str().to_string()),
            other => self.record.value(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Label one record against the criteria.
///
/// Only a numeric response strictly outside a matching criterion's bounds is
/// abnormal.  Rows without a criterion, and rows whose response does not
/// coerce to a number, stay normal.
pub fn classify_record(record: &Record, criteria: &CriteriaMap) -> ClassifiedRecord {
    let bounds: Option<Bounds> = record
        .result_name
        .as_ref()
        .and_then(|name| criteria.get(name))
        .copied();

    let status = match (bounds, record.numeric_response()) {
        (Some(b), Some(value)) if b.excludes(value) => OutlierStatus::Abnormal,
        _ => OutlierStatus::Normal,
    };

    ClassifiedRecord {
        record: record.clone(),
        lower_bound: bounds.map(|b| b.lower),
        upper_bound: bounds.map(|b| b.upper),
        status,
    }
}

/// Classify every row of one product, in source order.
///
/// The product is matched by exact, case-sensitive equality.  An empty
/// criteria map is refused rather than producing an all-normal result.
pub fn classify(
    table: &Table,
    item_number: &str,
    criteria: &CriteriaMap,
) -> Result<Vec<ClassifiedRecord>, AnalysisError> {
    if criteria.is_empty() {
        return Err(AnalysisError::NoCriteria);
    }

    let classified: Vec<ClassifiedRecord> = table
        .records_for(item_number)
        .map(|record| classify_record(record, criteria))
        .collect();

    log::debug!(
        "classified {} rows for {item_number}: {} abnormal",
        classified.len(),
        classified.iter().filter(|c| c.is_abnormal()).count()
    );
    Ok(classified)
}

/// Classify several products and concatenate the results in the order the
/// products are given.
pub fn classify_items<S: AsRef<str>>(
    table: &Table,
    items: &[S],
    criteria: &CriteriaMap,
) -> Result<Vec<ClassifiedRecord>, AnalysisError> {
    if criteria.is_empty() {
        return Err(AnalysisError::NoCriteria);
    }
    let mut all = Vec::new();
    for item in items {
        all.extend(classify(table, item.as_ref(), criteria)?);
    }
    Ok(all)
}
