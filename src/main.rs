//! Egressos Explorer - graduate records analysis
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing file, bad dates, empty selection, etc.)

use anyhow::{Context, Result};
use eframe::egui;
use egressos_explorer::charts::{prepare_all, ChartRenderer};
use egressos_explorer::cli::Args;
use egressos_explorer::config::{AnalysisConfig, DEFAULT_CONFIG_FILE};
use egressos_explorer::gui::ExplorerApp;
use egressos_explorer::pipeline;
use egressos_explorer::report::RunSummary;
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = Args::parse_args();

    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("Egressos Explorer v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("Analysis failed: {:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Handle --init-config: write a default egressos.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
        std::process::exit(1);
    }

    std::fs::write(path, AnalysisConfig::default_toml())
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Logging was already initialized");
    }
}

fn run(args: Args) -> Result<()> {
    let start = Instant::now();

    let mut config =
        AnalysisConfig::resolve(args.config.as_deref()).context("Failed to load configuration")?;
    config.merge_with_args(&args);
    config.validate()?;

    let output = pipeline::run(&config)
        .with_context(|| format!("Failed to analyze {}", config.input.path.display()))?;

    if let Some(path) = &config.output.summary {
        RunSummary::build(&output)?.write(path)?;
    }

    if !args.headless {
        return launch_viewer(config, output);
    }

    let charts = prepare_all(&output.table, &output.dual_level_records)?;
    let paths = ChartRenderer::export_all(
        &charts,
        &config.output.chart_dir,
        config.charts.width,
        config.charts.height,
    )?;

    println!(
        "{} charts written to {} in {:.1}s",
        paths.len(),
        config.output.chart_dir.display(),
        start.elapsed().as_secs_f64()
    );

    if args.open {
        open::that(&config.output.chart_dir).with_context(|| {
            format!("Failed to open {}", config.output.chart_dir.display())
        })?;
    }
    Ok(())
}

fn launch_viewer(config: AnalysisConfig, output: pipeline::AnalysisOutput) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title("Egressos Explorer"),
        ..Default::default()
    };

    eframe::run_native(
        "Egressos Explorer",
        options,
        Box::new(move |cc| Ok(Box::new(ExplorerApp::new(cc, config, Some(output))))),
    )
    .map_err(|e| anyhow::anyhow!("Viewer failed: {}", e))
}
