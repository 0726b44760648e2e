use anomaly_detector::analysis::criteria::Bounds;
use anomaly_detector::constants::export::DEFAULT_FILE_NAME;
use anomaly_detector::data::loader::FileFormat;
use anomaly_detector::state::AppState;
use eframe::egui::{self, RichText, ScrollArea, Ui};

// ---------------------------------------------------------------------------
// Left side panel – products and criteria
// ---------------------------------------------------------------------------

/// Deferred edits, applied once the filter rows are drawn.
enum FilterAction {
    Retarget(usize, String),
    SetBounds(usize, Bounds),
    Remove(usize),
}

/// Render the left panel: product selection, criteria editor, run controls.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Select Products");
    ui.separator();

    if state.table.is_none() {
        ui.label("No test results loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            product_selection(ui, state);
            ui.separator();
            criteria_editor(ui, state);
        });
}

fn product_selection(ui: &mut Ui, state: &mut AppState) {
    let items = state.item_numbers();

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all_items();
        }
        if ui.small_button("None").clicked() {
            state.select_no_items();
        }
    });

    egui::CollapsingHeader::new(
        RichText::new(format!(
            "ITEM_NUMBER  ({}/{})",
            state.selected_items.len(),
            items.len()
        ))
        .strong(),
    )
    .default_open(true)
    .show(ui, |ui: &mut Ui| {
        for item in &items {
            let mut checked = state.selected_items.contains(item);
            if ui.checkbox(&mut checked, item.as_str()).changed() {
                state.toggle_item(item);
            }
        }
    });

    ui.label(format!(
        "{} product(s), {} test sessions",
        state.selected_items.len(),
        state.selected_test_sessions()
    ));
}

fn criteria_editor(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Detection Criteria");
    ui.label(
        RichText::new("Add filters to detect anomalies. Values outside the ranges will be flagged.")
            .small()
            .weak(),
    );

    let names = state.analyzable_result_names();
    if names.is_empty() {
        ui.colored_label(
            egui::Color32::YELLOW,
            "No analyzable test types found for selected products",
        );
        return;
    }
    ui.label(RichText::new(format!("{} test types available for analysis", names.len())).small());
    ui.add_space(4.0);

    let mut actions = Vec::new();
    for (i, filter) in state.filters.iter().enumerate() {
        ui.group(|ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                let current = filter.result_name.clone().unwrap_or_default();
                egui::ComboBox::from_id_salt(("result_name", i))
                    .selected_text(current.as_str())
                    .width(170.0)
                    .show_ui(ui, |ui: &mut Ui| {
                        for name in &names {
                            if ui.selectable_label(current == *name, name.as_str()).clicked()
                                && current != *name
                            {
                                actions.push(FilterAction::Retarget(i, name.clone()));
                            }
                        }
                    });

                let mut bounds = filter.bounds;
                let lower = ui.add(
                    egui::DragValue::new(&mut bounds.lower)
                        .speed(0.01)
                        .fixed_decimals(3)
                        .prefix("Lower "),
                );
                let upper = ui.add(
                    egui::DragValue::new(&mut bounds.upper)
                        .speed(0.01)
                        .fixed_decimals(3)
                        .prefix("Upper "),
                );
                if lower.changed() || upper.changed() {
                    actions.push(FilterAction::SetBounds(i, bounds));
                }

                if ui.small_button("✕").on_hover_text("Remove").clicked() {
                    actions.push(FilterAction::Remove(i));
                }
            });

            if let Some(hint) = state.filter_hint(i) {
                let mut caption = format!(
                    "Data range: {:.3} to {:.3}",
                    hint.range.min, hint.range.max
                );
                if let Some(q) = hint.quartiles {
                    caption.push_str(&format!(
                        " | Quartile bounds (Q1-Q3): {:.3} to {:.3}",
                        q.lower, q.upper
                    ));
                }
                ui.label(RichText::new(caption).small().weak());
            }
        });
    }

    // Removals last and from the back, so earlier indices stay valid.
    let (removals, edits): (Vec<_>, Vec<_>) = actions
        .into_iter()
        .partition(|a| matches!(a, FilterAction::Remove(_)));
    for action in edits.into_iter().chain(removals.into_iter().rev()) {
        match action {
            FilterAction::Retarget(i, name) => state.retarget_filter(i, &name),
            FilterAction::SetBounds(i, bounds) => state.set_filter_bounds(i, bounds),
            FilterAction::Remove(i) => state.remove_filter(i),
        }
    }

    ui.add_space(6.0);
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("➕ Add Filter").clicked() {
            state.add_filter();
        }
        if ui.button(RichText::new("▶ Run Analysis").strong()).clicked() {
            // Refusals are reported through the status message.
            let _ = state.run_analysis();
        }
        if state.results.is_some() && ui.button("Clear Results").clicked() {
            state.clear_results();
        }
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.results.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export results…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(name), Some(stats)) = (&state.source_name, state.table_stats()) {
            ui.label(format!(
                "File loaded: {name}  ·  {} rows, {} products, {} tests",
                stats.total_rows, stats.total_items, stats.total_tests
            ));
        }

        ui.separator();

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).italics());
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open test results")
        .add_filter(
            "Supported files",
            &["xlsx", "xlsm", "xlsb", "xls", "ods", "csv", "json", "parquet", "pq"],
        )
        .add_filter("Excel / ODS", &FileFormat::SPREADSHEET_EXTENSIONS)
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        // Errors are logged and surfaced via `status_message` by the state.
        let _ = state.load_path(&path);
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export results")
        .set_file_name(DEFAULT_FILE_NAME)
        .add_filter("Excel", &["xlsx"])
        .save_file();

    if let Some(path) = file {
        match state.export_results(&path) {
            Ok(()) => {
                state.status_message = Some(format!("Exported results to {}", path.display()));
            }
            Err(e) => {
                log::error!("Failed to export results: {e}");
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
