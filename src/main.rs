use disease_ml_compare::config::AppConfig;
use disease_ml_compare::logging;
use disease_ml_compare::models::{AppState, Tab};
use disease_ml_compare::ui;
use eframe::egui;
use eframe::egui::Visuals;
use std::error::Error;
use std::time::Duration;
use tracing::info;

pub struct MyApp {
    state: AppState,
}

impl MyApp {
    fn new(config: AppConfig) -> Self {
        let mut state = AppState::new(config);
        state.start_initial_load();
        Self { state }
    }
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(Visuals::dark());

        logging::drain_into(&mut self.state.debug_output);

        if self.state.poll_requests() {
            ctx.request_repaint();
        } else if self.state.is_loading() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::SidePanel::left("selection_panel")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.heading("ML Disease Classification");
                ui.weak("ML Algorithm Comparison Tool");
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui::side_panel(ui, &mut self.state);
                });
            });

        egui::TopBottomPanel::bottom("debug_panel")
            .resizable(true)
            .min_height(50.0)
            .default_height(self.state.debug_panel_height)
            .show_animated(ctx, self.state.debug_panel_visible, |ui| {
                self.state.debug_panel_height = ui.available_height();

                ui.horizontal(|ui| {
                    ui.heading("Debug Output");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Clear").clicked() {
                            self.state.debug_output.clear();
                        }
                        if ui.button("Hide").clicked() {
                            self.state.debug_panel_visible = false;
                        }
                    });
                });
                ui.separator();

                egui::ScrollArea::vertical()
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        ui.add(
                            egui::TextEdit::multiline(&mut self.state.debug_output)
                                .desired_width(f32::INFINITY)
                                .desired_rows(10)
                                .font(egui::TextStyle::Monospace)
                                .code_editor()
                                .lock_focus(false)
                                .interactive(false),
                        );
                    });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("Disease Classification ML Comparison");
                ui.weak(
                    "Compare multiple machine learning algorithms on different disease datasets to find the best performing models.",
                );
            });
            ui.separator();
            ui::tab_bar(ui, &mut self.state);
            ui.separator();

            match self.state.selected_tab {
                Tab::Chart => ui::chart_tab(ui, &mut self.state),
                Tab::Details => ui::details_tab(ui, &mut self.state),
            }

            if !self.state.debug_panel_visible {
                ui.with_layout(egui::Layout::bottom_up(egui::Align::Center), |ui| {
                    if ui.button("Show Debug Panel").clicked() {
                        self.state.debug_panel_visible = true;
                    }
                });
            }
        });
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load();
    logging::init(&config.log_filter);
    info!(api_url = %config.api_url, "starting");

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Disease ML Comparison",
        options,
        Box::new(|_cc| Ok(Box::new(MyApp::new(config)))),
    )?;

    Ok(())
}
