use std::collections::BTreeSet;
use std::path::Path;

use crate::analysis::classify::{classify_items, ClassifiedRecord};
use crate::analysis::criteria::{Bounds, CriteriaMap, Criterion, criteria_map};
use crate::analysis::range::{combined_range, quartile_bounds, ValueRange};
use crate::data::catalog::{
    basic_stats, list_analyzable_result_names_for, list_item_numbers, test_session_count, TableStats,
};
use crate::data::loader::load_file;
use crate::data::model::Table;
use crate::errors::{AnalysisError, ExportError, LoadError};
use crate::export::save_results;

// ---------------------------------------------------------------------------
// Filter rows and analysis runs
// ---------------------------------------------------------------------------

/// One editable line of the criteria editor.
///
/// A row without a measurement name yet contributes nothing to a run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterRow {
    pub result_name: Option<String>,
    pub bounds: Bounds,
}

/// Context shown next to a filter row: observed span and suggested bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterHint {
    pub range: ValueRange,
    pub quartiles: Option<Bounds>,
}

/// Output of the last successful run.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub records: Vec<ClassifiedRecord>,
    pub items_processed: usize,
    pub filters_applied: usize,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering.
#[derive(Debug, Default)]
pub struct AppState {
    /// Loaded table (None until user loads a file).
    pub table: Option<Table>,

    /// File name the table came from.
    pub source_name: Option<String>,

    /// Products included in the next run.
    pub selected_items: BTreeSet<String>,

    /// Criteria editor rows, in display order.
    pub filters: Vec<FilterRow>,

    /// Result of the last run, cleared on demand.
    pub results: Option<AnalysisRun>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Ingest a newly loaded table and select every product.
    ///
    /// Results from a previous table are dropped; the filter list is kept.
    pub fn set_table(&mut self, table: Table, source_name: impl Into<String>) {
        self.selected_items = list_item_numbers(&table).into_iter().collect();
        self.table = Some(table);
        self.source_name = Some(source_name.into());
        self.results = None;
        self.status_message = None;
    }

    /// Load a file and make it the session's table.
    ///
    /// On failure the previous table, if any, stays in place.
    pub fn load_path(&mut self, path: &Path) -> Result<(), LoadError> {
        match load_file(path) {
            Ok(table) => {
                log::info!(
                    "Loaded {} rows with columns {:?} from {}",
                    table.len(),
                    table.columns,
                    path.display()
                );
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.set_table(table, name);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn table_stats(&self) -> Option<TableStats> {
        self.table.as_ref().map(basic_stats)
    }

    /// All products in the table, ascending.
    pub fn item_numbers(&self) -> Vec<String> {
        self.table.as_ref().map(list_item_numbers).unwrap_or_default()
    }

    fn selected(&self) -> Vec<&str> {
        self.selected_items.iter().map(String::as_str).collect()
    }

    // -- product selection --

    /// Toggle a single product in the selection.
    pub fn toggle_item(&mut self, item: &str) {
        if !self.selected_items.remove(item) {
            self.selected_items.insert(item.to_string());
        }
    }

    pub fn select_all_items(&mut self) {
        self.selected_items = self.item_numbers().into_iter().collect();
    }

    pub fn select_no_items(&mut self) {
        self.selected_items.clear();
    }

    /// Test sessions across the selection (summed per product).
    pub fn selected_test_sessions(&self) -> usize {
        let Some(table) = &self.table else {
            return 0;
        };
        self.selected_items
            .iter()
            .map(|item| test_session_count(table, item))
            .sum()
    }

    /// Measurement names a filter may target for the current selection.
    pub fn analyzable_result_names(&self) -> Vec<String> {
        match &self.table {
            Some(table) => list_analyzable_result_names_for(table, self.selected().as_slice()),
            None => Vec::new(),
        }
    }

    // -- filters --

    /// Quartile suggestion for `result_name` over the selection, `0/0` without
    /// numeric data.
    pub fn suggested_bounds(&self, result_name: &str) -> Bounds {
        self.table
            .as_ref()
            .and_then(|t| quartile_bounds(t, self.selected().as_slice(), result_name))
            .unwrap_or_default()
    }

    /// Append a filter targeting the first measurement no filter uses yet.
    pub fn add_filter(&mut self) {
        let names = self.analyzable_result_names();
        let target = names
            .iter()
            .find(|name| !self.filters.iter().any(|f| f.result_name.as_ref() == Some(*name)))
            .or_else(|| names.first())
            .cloned();

        let bounds = target
            .as_deref()
            .map(|name| self.suggested_bounds(name))
            .unwrap_or_default();
        self.filters.push(FilterRow {
            result_name: target,
            bounds,
        });
    }

    /// Point a filter at another measurement and re-suggest its bounds.
    pub fn retarget_filter(&mut self, index: usize, result_name: &str) {
        let bounds = self.suggested_bounds(result_name);
        if let Some(filter) = self.filters.get_mut(index) {
            filter.result_name = Some(result_name.to_string());
            filter.bounds = bounds;
        }
    }

    pub fn set_filter_bounds(&mut self, index: usize, bounds: Bounds) {
        if let Some(filter) = self.filters.get_mut(index) {
            filter.bounds = bounds;
        }
    }

    pub fn remove_filter(&mut self, index: usize) {
        if index < self.filters.len() {
            self.filters.remove(index);
        }
    }

    /// Observed range and quartiles for a filter's measurement.
    pub fn filter_hint(&self, index: usize) -> Option<FilterHint> {
        let table = self.table.as_ref()?;
        let name = self.filters.get(index)?.result_name.as_deref()?;
        let selected = self.selected();
        Some(FilterHint {
            range: combined_range(table, selected.as_slice(), name)?,
            quartiles: quartile_bounds(table, selected.as_slice(), name),
        })
    }

    /// Criteria built from the filter rows; a later row for the same
    /// measurement replaces an earlier one.
    pub fn criteria(&self) -> CriteriaMap {
        let named: Vec<Criterion> = self
            .filters
            .iter()
            .enumerate()
            .filter_map(|(i, f)| {
                let Some(name) = f.result_name.as_ref() else {
                    log::warn!("skipping filter {} with no measurement selected", i + 1);
                    return None;
                };
                Some(Criterion {
                    result_name: name.clone(),
                    bounds: f.bounds,
                })
            })
            .collect();
        criteria_map(&named)
    }

    // -- runs --

    /// Classify every selected product against the current criteria.
    pub fn run_analysis(&mut self) -> Result<&AnalysisRun, AnalysisError> {
        let outcome = self.classify_selection();
        match outcome {
            Ok(records) => {
                let run = AnalysisRun {
                    records,
                    items_processed: self.selected_items.len(),
                    filters_applied: self.filters.len(),
                };
                let message = format!(
                    "Analysis complete! Processed {} product(s) with {} filter(s)",
                    run.items_processed, run.filters_applied
                );
                log::info!("{message}");
                self.status_message = Some(message);
                Ok(self.results.insert(run))
            }
            Err(e) => {
                log::warn!("analysis refused: {e}");
                self.status_message = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn classify_selection(&self) -> Result<Vec<ClassifiedRecord>, AnalysisError> {
        let table = self.table.as_ref().ok_or(AnalysisError::NoTable)?;
        if self.selected_items.is_empty() {
            return Err(AnalysisError::NoItemsSelected);
        }
        classify_items(table, self.selected().as_slice(), &self.criteria())
    }

    /// Drop the last run, back to the pre-analysis view.
    pub fn clear_results(&mut self) {
        self.results = None;
        self.status_message = None;
    }

    /// Write the last run to an `.xlsx` workbook.
    pub fn export_results(&self, path: &Path) -> Result<(), ExportError> {
        let (Some(table), Some(run)) = (&self.table, &self.results) else {
            return Err(ExportError::NoResults);
        };
        save_results(path, &table.columns, &run.records)
    }
}
