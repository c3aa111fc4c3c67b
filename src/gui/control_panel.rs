//! Control Panel Widget
//! Left side panel: data source, chart list, export and progress.

use egui::{Color32, RichText, ScrollArea};
use std::path::PathBuf;

/// Row counts of the loaded table, shown under the data source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunCounts {
    pub loaded_rows: usize,
    pub retained_rows: usize,
    pub dual_level_students: usize,
}

/// Left side control panel with file selection and chart navigation.
pub struct ControlPanel {
    pub csv_path: Option<PathBuf>,
    pub counts: Option<RunCounts>,
    pub chart_titles: Vec<String>,
    pub selected: usize,
    pub progress: f32,
    pub status: String,
    pub busy: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            csv_path: None,
            counts: None,
            chart_titles: Vec::new(),
            selected: 0,
            progress: 0.0,
            status: "Ready".to_string(),
            busy: false,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the chart list after a run, keeping the selection when possible.
    pub fn update_charts(&mut self, titles: Vec<String>, counts: RunCounts) {
        if self.selected >= titles.len() {
            self.selected = 0;
        }
        self.chart_titles = titles;
        self.counts = Some(counts);
    }

    pub fn clear(&mut self) {
        self.chart_titles.clear();
        self.counts = None;
        self.selected = 0;
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🎓 Egressos Explorer")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.csv_path.is_some() {
                            Color32::WHITE
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add_enabled_ui(!self.busy, |ui| {
                            if ui.button("📂 Open CSV…").clicked() {
                                action = ControlPanelAction::BrowseCsv;
                            }
                        });
                    });
                });

                if let Some(counts) = &self.counts {
                    ui.add_space(4.0);
                    ui.label(
                        RichText::new(format!(
                            "{} rows read, {} kept, {} in both levels",
                            counts.loaded_rows, counts.retained_rows, counts.dual_level_students
                        ))
                        .size(11.0)
                        .color(Color32::GRAY),
                    );
                }
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Charts =====
        ui.label(RichText::new("📈 Charts").size(14.0).strong());
        ui.add_space(5.0);

        if self.chart_titles.is_empty() {
            ui.label(RichText::new("No charts yet").size(12.0).color(Color32::GRAY));
        } else {
            ScrollArea::vertical()
                .id_salt("chart_list")
                .max_height(360.0)
                .show(ui, |ui| {
                    for (idx, title) in self.chart_titles.iter().enumerate() {
                        let text = format!("{:02}  {}", idx + 1, title);
                        if ui.selectable_label(self.selected == idx, text).clicked() {
                            self.selected = idx;
                            action = ControlPanelAction::SelectChart(idx);
                        }
                    }
                });
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export =====
        ui.vertical_centered(|ui| {
            let export_enabled = !self.busy && !self.chart_titles.is_empty();
            ui.add_enabled_ui(export_enabled, |ui| {
                let button = egui::Button::new(RichText::new("💾 Export PNGs…").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportPngs;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.busy),
        );

        ui.add_space(5.0);

        let status_color = if self.status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.progress >= 100.0 {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    SelectChart(usize),
    ExportPngs,
}
