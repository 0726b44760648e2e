use anomaly_detector::analysis::summary::BreakdownEntry;
use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Legend, Plot};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Anomaly breakdown chart
// ---------------------------------------------------------------------------

/// One bar per measurement name, height = abnormal rows for that name.
pub fn breakdown_chart(ui: &mut Ui, breakdown: &[BreakdownEntry]) {
    let names: Vec<String> = breakdown.iter().map(|e| e.result_name.clone()).collect();
    let color_map = ColorMap::new(&names);

    Plot::new("anomaly_breakdown")
        .legend(Legend::default())
        .height(220.0)
        .y_axis_label("Anomalies")
        .show_x(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            for (i, entry) in breakdown.iter().enumerate() {
                let color = color_map.color_for(&entry.result_name);
                let bar = Bar::new(i as f64, entry.anomaly_count as f64).width(0.7);
                let chart = BarChart::new(vec![bar])
                    .name(&entry.result_name)
                    .color(color);
                plot_ui.bar_chart(chart);
            }
        });
}
