use std::collections::BTreeSet;

use serde::Serialize;

use super::model::{CellValue, Table};
use crate::constants::analysis::EXCLUDED_RESULT_NAMES;

/// Headline counts shown once a file is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub total_rows: usize,
    /// Distinct non-null `ITEM_NUMBER`s.
    pub total_items: usize,
    /// Distinct non-null `TEST_NUMBER`s.
    pub total_tests: usize,
}

/// Distinct products, ascending, nulls dropped.
pub fn list_item_numbers(table: &Table) -> Vec<String> {
    table
        .records
        .iter()
        .filter_map(|r| r.item_number.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Whether a measurement may be bound-checked (summary fields may not).
pub fn is_analyzable(result_name: &str) -> bool {
    !EXCLUDED_RESULT_NAMES.contains(&result_name)
}

/// Distinct measurement names, optionally scoped to one product, ascending,
/// without the summary/meta fields.
pub fn list_analyzable_result_names(table: &Table, item_number: Option<&str>) -> Vec<String> {
    table
        .records
        .iter()
        .filter(|r| item_number.map_or(true, |item| r.item_number.as_deref() == Some(item)))
        .filter_map(|r| r.result_name.as_deref())
        .filter(|name| is_analyzable(name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Union of [`list_analyzable_result_names`] over a product selection.
pub fn list_analyzable_result_names_for<S: AsRef<str>>(table: &Table, items: &[S]) -> Vec<String> {
    items
        .iter()
        .flat_map(|item| list_analyzable_result_names(table, Some(item.as_ref())))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Number of distinct test sessions recorded for one product.
pub fn test_session_count(table: &Table, item_number: &str) -> usize {
    table
        .records_for(item_number)
        .map(|r| &r.test_number)
        .filter(|t| !t.is_null())
        .collect::<BTreeSet<&CellValue>>()
        .len()
}

pub fn basic_stats(table: &Table) -> TableStats {
    let total_items = table
        .records
        .iter()
        .filter_map(|r| r.item_number.as_deref())
        .collect::<BTreeSet<_>>()
        .len();
    let total_tests = table
        .records
        .iter()
        .map(|r| &r.test_number)
        .filter(|t| !t.is_null())
        .collect::<BTreeSet<_>>()
        .len();

    TableStats {
        total_rows: table.len(),
        total_items,
        total_tests,
    }
}
