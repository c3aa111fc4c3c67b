//! Egressos Explorer Main Application
//! Main window with control panel and chart viewer.

use crate::charts::{prepare_all, ChartRenderer, PreparedChart};
use crate::config::AnalysisConfig;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction, RunCounts};
use crate::pipeline::{self, AnalysisOutput};
use egui::SidePanel;
use image::RgbImage;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use tracing::{error, info};

/// Messages from the background worker
enum WorkerMessage {
    Progress(f32, String),
    Ready {
        counts: RunCounts,
        charts: Vec<PreparedChart>,
        images: Vec<RgbImage>,
    },
    Exported {
        count: usize,
        dir: PathBuf,
    },
    Error(String),
}

/// Main application window.
pub struct ExplorerApp {
    config: AnalysisConfig,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    worker_rx: Option<Receiver<WorkerMessage>>,
}

impl ExplorerApp {
    /// Create the window; an already analyzed table is rendered right away.
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: AnalysisConfig,
        initial: Option<AnalysisOutput>,
    ) -> Self {
        let mut app = Self {
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            worker_rx: None,
            config,
        };

        if let Some(output) = initial {
            app.control_panel.csv_path = Some(app.config.input.path.clone());
            let (width, height) = (app.config.charts.width, app.config.charts.height);
            app.spawn_worker("Rendering charts...", move |tx| {
                Self::render_output(&tx, output, width, height)
            });
        }

        app
    }

    fn is_busy(&self) -> bool {
        self.worker_rx.is_some()
    }

    /// Run `job` on a background thread, reporting through the channel.
    fn spawn_worker<F>(&mut self, status: &str, job: F)
    where
        F: FnOnce(Sender<WorkerMessage>) -> Result<(), String> + Send + 'static,
    {
        let (tx, rx) = channel();
        self.worker_rx = Some(rx);
        self.control_panel.busy = true;
        self.control_panel.set_progress(5.0, status);

        thread::spawn(move || {
            let error_tx = tx.clone();
            if let Err(e) = job(tx) {
                let _ = error_tx.send(WorkerMessage::Error(e));
            }
        });
    }

    fn render_output(
        tx: &Sender<WorkerMessage>,
        output: AnalysisOutput,
        width: u32,
        height: u32,
    ) -> Result<(), String> {
        let _ = tx.send(WorkerMessage::Progress(50.0, "Preparing charts...".to_string()));
        let charts =
            prepare_all(&output.table, &output.dual_level_records).map_err(|e| e.to_string())?;

        let _ = tx.send(WorkerMessage::Progress(
            70.0,
            format!("Rendering {} charts...", charts.len()),
        ));
        let images = ChartRenderer::render_all(&charts, width, height).map_err(|e| e.to_string())?;

        let counts = RunCounts {
            loaded_rows: output.loaded_rows,
            retained_rows: output.retained_rows,
            dual_level_students: output.dual_level_records.len(),
        };
        let _ = tx.send(WorkerMessage::Ready {
            counts,
            charts,
            images,
        });
        Ok(())
    }

    /// Pick a CSV and run the whole analysis on it.
    fn handle_browse_csv(&mut self) {
        if self.is_busy() {
            return;
        }

        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        else {
            return;
        };

        self.chart_viewer.clear();
        self.control_panel.clear();
        self.control_panel.csv_path = Some(path.clone());
        self.config.input.path = path;

        let config = self.config.clone();
        self.spawn_worker("Loading CSV file...", move |tx| {
            let _ = tx.send(WorkerMessage::Progress(
                20.0,
                "Filtering and deriving metrics...".to_string(),
            ));
            let output = pipeline::run(&config).map_err(|e| e.to_string())?;
            info!("Analyzed {}", config.input.path.display());
            Self::render_output(&tx, output, config.charts.width, config.charts.height)
        });
    }

    /// Pick a folder and write every chart there as PNG.
    fn handle_export_pngs(&mut self) {
        if self.is_busy() || self.chart_viewer.is_empty() {
            return;
        }

        let Some(dir) = rfd::FileDialog::new()
            .set_directory(&self.config.output.chart_dir)
            .pick_folder()
        else {
            return;
        };

        let charts = self.chart_viewer.charts();
        let (width, height) = (self.config.charts.width, self.config.charts.height);
        self.spawn_worker("Exporting PNGs...", move |tx| {
            let paths =
                ChartRenderer::export_all(&charts, &dir, width, height).map_err(|e| e.to_string())?;
            let _ = tx.send(WorkerMessage::Exported {
                count: paths.len(),
                dir,
            });
            Ok(())
        });
    }

    /// Drain worker messages
    fn check_worker(&mut self) {
        let Some(rx) = self.worker_rx.take() else {
            return;
        };
        let mut keep_receiver = true;

        while let Ok(message) = rx.try_recv() {
            match message {
                WorkerMessage::Progress(progress, status) => {
                    self.control_panel.set_progress(progress, &status);
                }
                WorkerMessage::Ready {
                    counts,
                    charts,
                    images,
                } => {
                    let count = charts.len();
                    self.chart_viewer.set_charts(charts, images);
                    self.control_panel
                        .update_charts(self.chart_viewer.titles(), counts);
                    self.chart_viewer.selected = self.control_panel.selected;
                    self.control_panel
                        .set_progress(100.0, &format!("{} charts ready", count));
                    keep_receiver = false;
                }
                WorkerMessage::Exported { count, dir } => {
                    self.control_panel.set_progress(
                        100.0,
                        &format!("{} PNGs written to {}", count, dir.display()),
                    );
                    keep_receiver = false;
                }
                WorkerMessage::Error(e) => {
                    error!("{}", e);
                    self.control_panel.set_progress(0.0, &format!("Error: {}", e));
                    keep_receiver = false;
                }
            }
        }

        if keep_receiver {
            self.worker_rx = Some(rx);
        } else {
            self.control_panel.busy = false;
        }
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_worker();

        if self.is_busy() {
            ctx.request_repaint();
        }

        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(380.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::SelectChart(idx) => self.chart_viewer.selected = idx,
                        ControlPanelAction::ExportPngs => self.handle_export_pngs(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ctx, ui);
        });
    }
}
