use crate::best::best_with_confusion;
use crate::chart::{self, ChartData, Rgba};
use crate::data::write_results_csv;
use crate::error::ResultsError;
use crate::models::{AlgorithmResult, AppState, ChartStyle, ConfusionMatrix, NormalizedDataset, Tab};
use crate::selection::algorithm_description;
use eframe::egui;
use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui::{Direction, Layout};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoint, Points, Polygon, Text};
use rfd::FileDialog;
use std::f64::consts::{FRAC_PI_2, TAU};
use tracing::{error, info};

const NO_RESULTS: &str = "No results available. Please run the comparison first.";
const NO_DATASET_RESULTS: &str = "(no results)";
const RADAR_GRID_STEP: f64 = 0.2;

pub fn to_color32(c: Rgba) -> Color32 {
    let alpha = (c.a.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(c.r, c.g, c.b, alpha)
}

/// Four decimals, or `N/A` for a metric the model did not report.
pub fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.4}"),
        None => "N/A".to_string(),
    }
}

pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    let loading = state.is_loading();

    ui.heading("Select Disease Datasets");
    ui.add_space(4.0);
    if state.diseases.is_empty() {
        catalog_placeholder(ui, state, "Loading available diseases...");
    } else {
        for disease in &state.diseases {
            let mut checked = state.selection.has_disease(&disease.id);
            if ui.checkbox(&mut checked, disease.name.as_str()).changed() {
                state.selection.toggle_disease(&disease.id, checked);
            }
            if !disease.description.is_empty() {
                ui.indent(("disease_desc", disease.id.as_str()), |ui| {
                    ui.weak(disease.description.as_str());
                });
            }
        }
        if state.selection.diseases.is_empty() {
            ui.colored_label(Color32::RED, "Please select at least one disease dataset");
        }
    }

    ui.separator();

    ui.heading("Select Algorithms");
    ui.add_space(4.0);
    if state.algorithms.is_empty() {
        catalog_placeholder(ui, state, "Loading available algorithms...");
    } else {
        for algorithm in &state.algorithms {
            let mut checked = state.selection.has_algorithm(&algorithm.id);
            if ui
                .checkbox(&mut checked, algorithm.name.as_str())
                .on_hover_text(algorithm_description(&algorithm.id))
                .changed()
            {
                state.selection.toggle_algorithm(&algorithm.id, checked);
            }
            ui.indent(("algo_desc", algorithm.id.as_str()), |ui| {
                ui.weak(algorithm_description(&algorithm.id));
            });
        }
        if state.selection.algorithms.is_empty() {
            ui.colored_label(Color32::RED, "Please select at least one algorithm");
        }
    }

    ui.separator();

    ui.vertical_centered(|ui| {
        let label = if loading {
            "Processing..."
        } else {
            "Train & Compare Models"
        };
        let enabled = !loading && state.selection.is_ready();
        if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
            state.start_comparison();
        }
        if loading {
            ui.spinner();
        }
    });

    if let Some(err) = &state.error {
        ui.add_space(6.0);
        ui.colored_label(Color32::RED, err);
    }
    if state.catalog_failed && !loading && ui.button("Retry").clicked() {
        state.start_initial_load();
    }

    ui.separator();

    let exportable = matches!(&state.results, Some(Ok(d)) if !d.is_empty());
    if ui
        .add_enabled(exportable, egui::Button::new("Export CSV"))
        .clicked()
    {
        if let Some(Ok(datasets)) = &state.results {
            state.export_status = export_dialog(datasets);
        }
    }
    if let Some(status) = &state.export_status {
        ui.weak(status);
    }
}

fn catalog_placeholder(ui: &mut Ui, state: &AppState, loading_text: &str) {
    if state.catalog_failed {
        ui.colored_label(Color32::RED, "Could not load the catalog.");
    } else {
        ui.weak(loading_text);
    }
}

fn export_dialog(datasets: &[NormalizedDataset]) -> Option<String> {
    let path = FileDialog::new()
        .add_filter("CSV", &["csv"])
        .set_file_name("model_comparison.csv")
        .save_file()?;
    match write_results_csv(&path, datasets) {
        Ok(rows) => {
            info!(rows, path = %path.display(), "export finished");
            Some(format!("Exported {rows} rows to {}", path.display()))
        }
        Err(err) => {
            error!(error = %err, "export failed");
            Some(format!("Export failed: {err}"))
        }
    }
}

pub fn tab_bar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        for &tab in &[Tab::Chart, Tab::Details] {
            let label = match tab {
                Tab::Chart => "Chart",
                Tab::Details => "Details",
            };
            if ui
                .selectable_label(state.selected_tab == tab, label)
                .clicked()
            {
                state.selected_tab = tab;
            }
        }
    });
}

fn results_or_message<'a>(ui: &mut Ui, state: &'a AppState) -> Option<&'a [NormalizedDataset]> {
    match &state.results {
        Some(Ok(datasets)) => Some(datasets.as_slice()),
        Some(Err(ResultsError::UnrecognizedShape(detail))) => {
            ui.weak(NO_RESULTS).on_hover_text(detail.as_str());
            None
        }
        Some(Err(_)) | None => {
            if !state.is_loading() {
                ui.weak(NO_RESULTS);
            }
            None
        }
    }
}

pub fn chart_tab(ui: &mut Ui, state: &mut AppState) {
    let datasets = match &state.results {
        Some(Ok(datasets)) => datasets.clone(),
        _ => {
            results_or_message(ui, state);
            return;
        }
    };

    ui.horizontal(|ui| {
        ui.label("Chart Type");
        egui::ComboBox::from_id_salt("chart_style_combo")
            .selected_text(match state.chart_style {
                ChartStyle::Bar => "Bar Chart",
                ChartStyle::Radar => "Radar Chart",
            })
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut state.chart_style, ChartStyle::Bar, "Bar Chart");
                ui.selectable_value(&mut state.chart_style, ChartStyle::Radar, "Radar Chart");
            });

        if state.chart_style == ChartStyle::Bar {
            ui.add_space(16.0);
            ui.label("Metric");
            egui::ComboBox::from_id_salt("chart_metric_combo")
                .selected_text(state.chart_metric.title())
                .show_ui(ui, |ui| {
                    for metric in chart::metric_options(&datasets) {
                        ui.selectable_value(&mut state.chart_metric, metric, metric.title());
                    }
                });
        }
    });

    ui.separator();

    match chart::build_chart_data(&datasets, state.chart_style, state.chart_metric) {
        Ok(data) => match data.style {
            ChartStyle::Bar => draw_bar_chart(ui, &data),
            ChartStyle::Radar => draw_radar_chart(ui, &data),
        },
        Err(ResultsError::UnsupportedCombination) => {
            ui.colored_label(
                Color32::YELLOW,
                "Radar charts compare metrics within one dataset. Select a single disease or switch to the bar chart.",
            );
        }
        Err(_) => {
            ui.weak("Chart data not available");
        }
    }
    if !state.empty_datasets.is_empty() {
        ui.weak(format!(
            "Not charted {NO_DATASET_RESULTS}: {}",
            state.empty_datasets.join(", ")
        ));
    }
}

fn draw_bar_chart(ui: &mut Ui, data: &ChartData) {
    let n_series = data.series.len().max(1);
    let group_width = 0.8;
    let bar_width = group_width / n_series as f64;

    let charts: Vec<BarChart> = data
        .series
        .iter()
        .enumerate()
        .map(|(s_idx, series)| {
            let bars: Vec<Bar> = series
                .values
                .iter()
                .enumerate()
                .filter_map(|(i, value)| {
                    let value = (*value)?;
                    let x = i as f64 - group_width / 2.0 + bar_width * (s_idx as f64 + 0.5);
                    Some(
                        Bar::new(x, value)
                            .width(bar_width * 0.9)
                            .fill(to_color32(series.fill.at(i)))
                            .stroke(Stroke::new(
                                series.border_width,
                                to_color32(series.border.at(i)),
                            ))
                            .name(data.labels.get(i).cloned().unwrap_or_default()),
                    )
                })
                .collect();
            BarChart::new(bars).name(&series.label)
        })
        .collect();

    let labels = data.labels.clone();
    ui.label(RichText::new("Model Performance Comparison").strong());
    Plot::new("comparison_bar_chart")
        .legend(Legend::default())
        .height(400.0)
        .include_y(0.0)
        .include_y(1.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .x_axis_formatter(move |mark, _| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

/// Position of `value` on spoke `axis` of an `n`-spoke radar, first spoke up.
fn radar_point(axis: usize, n: usize, value: f64) -> [f64; 2] {
    let angle = FRAC_PI_2 - TAU * axis as f64 / n as f64;
    [value * angle.cos(), value * angle.sin()]
}

fn draw_radar_chart(ui: &mut Ui, data: &ChartData) {
    let n = data.labels.len();
    if n < 3 {
        ui.weak("Chart data not available");
        return;
    }

    ui.label(RichText::new("Algorithm Performance Across Metrics").strong());
    Plot::new("comparison_radar_chart")
        .legend(Legend::default())
        .height(420.0)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .include_x(-1.3)
        .include_x(1.3)
        .include_y(-1.2)
        .include_y(1.2)
        .show(ui, |plot_ui| {
            let grid = Color32::from_gray(110);
            let steps = (1.0 / RADAR_GRID_STEP).round() as usize;
            for step in 1..=steps {
                let r = step as f64 * RADAR_GRID_STEP;
                let ring: Vec<[f64; 2]> = (0..=n).map(|i| radar_point(i % n, n, r)).collect();
                plot_ui.line(Line::new(ring).color(grid).width(0.5));
            }
            for (i, label) in data.labels.iter().enumerate() {
                plot_ui.line(Line::new(vec![[0.0, 0.0], radar_point(i, n, 1.0)]).color(grid).width(0.5));
                let [x, y] = radar_point(i, n, 1.12);
                plot_ui.text(Text::new(PlotPoint::new(x, y), label.as_str()));
            }

            for series in &data.series {
                let vertices: Vec<[f64; 2]> = series
                    .values
                    .iter()
                    .enumerate()
                    .filter_map(|(i, v)| v.map(|v| radar_point(i, n, v)))
                    .collect();
                let border = to_color32(series.border.at(0));
                plot_ui.polygon(
                    Polygon::new(vertices.clone())
                        .fill_color(to_color32(series.fill.at(0)))
                        .stroke(Stroke::new(series.border_width, border))
                        .name(&series.label),
                );
                plot_ui.points(Points::new(vertices).radius(3.0).color(border).name(&series.label));
            }
        });
}

pub fn details_tab(ui: &mut Ui, state: &mut AppState) {
    let Some(datasets) = results_or_message(ui, state) else {
        return;
    };

    egui::ScrollArea::vertical().show(ui, |ui| {
        for (idx, dataset) in datasets.iter().enumerate() {
            ui.push_id(("dataset_results", idx), |ui| {
                ui.heading(dataset.label.as_str());
                results_table(ui, &dataset.results);
                ui.add_space(12.0);
                best_model_panel(ui, &dataset.results);
            });
            ui.separator();
        }
        for label in &state.empty_datasets {
            ui.horizontal(|ui| {
                ui.heading(label.as_str());
                ui.weak(NO_DATASET_RESULTS);
            });
            ui.separator();
        }
    });
}

fn results_table(ui: &mut Ui, results: &[AlgorithmResult]) {
    let headers = ["Algorithm", "Accuracy", "Precision", "Recall", "F1 Score", "ROC AUC"];
    let mut builder = TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .cell_layout(Layout::centered_and_justified(Direction::LeftToRight))
        .column(Column::auto().at_least(140.0));
    for _ in 1..headers.len() {
        builder = builder.column(Column::auto().at_least(80.0));
    }

    builder
        .header(20.0, |mut header| {
            for title in headers {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, results.len(), |mut row| {
                let result = &results[row.index()];
                let m = &result.metrics;
                let cells = [
                    result.algorithm_name.clone(),
                    format_metric(Some(m.accuracy)),
                    format_metric(Some(m.precision)),
                    format_metric(Some(m.recall)),
                    format_metric(Some(m.f1_score)),
                    format_metric(m.roc_auc),
                ];
                for cell in cells {
                    row.col(|ui| {
                        ui.label(cell);
                    });
                }
            });
        });
}

fn metric_card(ui: &mut Ui, label: &str, value: f64, color: Color32) {
    ui.group(|ui| {
        ui.vertical(|ui| {
            ui.weak(label);
            ui.label(RichText::new(format_metric(Some(value))).size(22.0).color(color));
        });
    });
}

fn best_model_panel(ui: &mut Ui, results: &[AlgorithmResult]) {
    ui.label(RichText::new("Best Performing Model: Detailed Metrics").strong());
    let (best, confusion) = match best_with_confusion(results) {
        Ok(found) => found,
        Err(_) => {
            ui.weak(NO_RESULTS);
            return;
        }
    };

    ui.label(
        RichText::new(best.algorithm_name.as_str())
            .size(18.0)
            .color(Color32::from_rgb(0x34, 0x98, 0xdb)),
    );
    let m = &best.metrics;
    ui.horizontal_wrapped(|ui| {
        metric_card(ui, "Accuracy", m.accuracy, Color32::from_rgb(0x34, 0x98, 0xdb));
        metric_card(ui, "Precision", m.precision, Color32::from_rgb(0x2e, 0xcc, 0x71));
        metric_card(ui, "Recall", m.recall, Color32::from_rgb(0xe7, 0x4c, 0x3c));
        metric_card(ui, "F1 Score", m.f1_score, Color32::from_rgb(0x9b, 0x59, 0xb6));
        if let Some(auc) = m.roc_auc {
            metric_card(ui, "ROC AUC", auc, Color32::from_rgb(0xf3, 0x9c, 0x12));
        }
    });

    if let Some(cm) = confusion {
        ui.add_space(8.0);
        ui.label("Confusion Matrix");
        confusion_matrix_grid(ui, &cm);
    }
}

fn confusion_matrix_grid(ui: &mut Ui, cm: &ConfusionMatrix) {
    let correct = Color32::from_rgb(0xe8, 0xf5, 0xe9);
    let wrong = Color32::from_rgb(0xff, 0xeb, 0xee);
    let cell = |count: u64, bg: Color32| {
        RichText::new(format!("  {count}  "))
            .background_color(bg)
            .color(Color32::BLACK)
            .monospace()
    };

    egui::Grid::new("confusion_matrix")
        .num_columns(3)
        .spacing([16.0, 6.0])
        .show(ui, |ui| {
            ui.label("");
            ui.strong("Predicted Negative");
            ui.strong("Predicted Positive");
            ui.end_row();

            ui.strong("Actual Negative");
            ui.label(cell(cm.true_negative, correct));
            ui.label(cell(cm.false_positive, wrong));
            ui.end_row();

            ui.strong("Actual Positive");
            ui.label(cell(cm.false_negative, wrong));
            ui.label(cell(cm.true_positive, correct));
            ui.end_row();
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{BORDER_ALPHA, palette_color};

    #[test]
    fn metrics_format_with_placeholder() {
        assert_eq!(format_metric(Some(0.86)), "0.8600");
        assert_eq!(format_metric(Some(0.123456)), "0.1235");
        assert_eq!(format_metric(None), "N/A");
    }

    #[test]
    fn color_conversion_keeps_channels() {
        let c = to_color32(palette_color(0).with_alpha(BORDER_ALPHA));
        assert_eq!(c, Color32::from_rgb(54, 162, 235));
    }

    #[test]
    fn radar_first_spoke_points_up() {
        let [x, y] = radar_point(0, 4, 1.0);
        assert!(x.abs() < 1e-9);
        assert!((y - 1.0).abs() < 1e-9);
        let [x, y] = radar_point(1, 4, 0.5);
        assert!((x - 0.5).abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }
}
