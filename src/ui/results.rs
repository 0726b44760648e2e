use anomaly_detector::analysis::classify::ClassifiedRecord;
use anomaly_detector::analysis::summary::{
    abnormal_records, affected_sessions, anomaly_breakdown, summary_stats, ReportSnapshot,
};
use anomaly_detector::constants::columns;
use anomaly_detector::data::model::CellValue;
use anomaly_detector::state::AppState;
use eframe::egui::{Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::highlight_color;
use crate::ui::plot;

// ---------------------------------------------------------------------------
// Results view (central panel)
// ---------------------------------------------------------------------------

/// Render the analysis results, or a hint when nothing has been run yet.
pub fn results_view(ui: &mut Ui, state: &AppState) {
    if state.table.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a test results file to get started  (File → Open…)");
        });
        return;
    }

    let Some(run) = &state.results else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Add filters and run the analysis");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Analysis Results");
            summary_metrics(ui, &run.records);
            ui.separator();

            let abnormal = abnormal_records(&run.records);
            if abnormal.is_empty() {
                ui.colored_label(
                    Color32::DARK_GREEN,
                    "No anomalies detected! All measurements are within acceptable ranges.",
                );
                return;
            }

            ui.strong("Detailed Anomaly Records");
            ui.push_id("abnormal_records", |ui: &mut Ui| abnormal_table(ui, &abnormal));
            ui.add_space(8.0);

            ui.strong("Affected Test Sessions");
            ui.push_id("affected_sessions", |ui: &mut Ui| sessions_table(ui, &run.records));
            ui.add_space(8.0);

            ui.strong("Anomalies by Test Type");
            plot::breakdown_chart(ui, &anomaly_breakdown(&run.records));

            ui.add_space(8.0);
            if ui.button("Copy report as JSON").clicked() {
                match ReportSnapshot::from_classified(&run.records).to_json() {
                    Ok(json) => ui.ctx().copy_text(json),
                    Err(e) => log::error!("Failed to serialize report: {e}"),
                }
            }
        });
}

fn summary_metrics(ui: &mut Ui, records: &[ClassifiedRecord]) {
    let stats = summary_stats(records);
    ui.horizontal(|ui: &mut Ui| {
        metric(ui, "Total Analyzed", stats.total_analyzed.to_string());
        metric(ui, "Normal", stats.normal_count.to_string());
        metric(ui, "Abnormal", stats.abnormal_count.to_string());
        metric(ui, "% Abnormal", format!("{:.1}%", stats.percent_abnormal));
    });
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.group(|ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.label(RichText::new(label).small().weak());
            ui.label(RichText::new(value).heading());
        });
    });
}

fn cell_text(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn abnormal_table(ui: &mut Ui, rows: &[&ClassifiedRecord]) {
    let fill = highlight_color();
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(280.0)
        .columns(Column::auto().at_least(70.0), columns::DISPLAY.len())
        .header(20.0, |mut header| {
            for name in columns::DISPLAY {
                header.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|mut body| {
            for record in rows {
                body.row(18.0, |mut row| {
                    for name in columns::DISPLAY {
                        row.col(|ui| {
                            let text = cell_text(&record.value(name));
                            if name == columns::IS_OUTLIER {
                                ui.label(RichText::new(text).color(Color32::BLACK).background_color(fill));
                            } else {
                                ui.label(text);
                            }
                        });
                    }
                });
            }
        });
}

fn sessions_table(ui: &mut Ui, records: &[ClassifiedRecord]) {
    let sessions = affected_sessions(records);
    TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(200.0)
        .column(Column::auto().at_least(90.0))
        .column(Column::auto().at_least(90.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for name in [columns::TEST_NUMBER, "anomaly_count", "affected_result_names"] {
                header.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|mut body| {
            for session in &sessions {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(cell_text(&session.test_number));
                    });
                    row.col(|ui| {
                        ui.label(session.anomaly_count.to_string());
                    });
                    row.col(|ui| {
                        ui.label(session.result_names_label());
                    });
                });
            }
        });
}
