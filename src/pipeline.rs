//! Analysis pipeline: load, filter, derive, pair and export.

use crate::config::AnalysisConfig;
use crate::data::{
    dual_level_records, pair_levels, write_dual_level_csv, DataLoader, DeriveError,
    DualLevelError, DualLevelRecord, EgressosTable, LoaderError,
};
use polars::prelude::DataFrame;
use std::path::Path;
use thiserror::Error;
use tracing::{info, info_span, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error(transparent)]
    Derive(#[from] DeriveError),
    #[error(transparent)]
    DualLevel(#[from] DualLevelError),
}

/// Everything later stages need from one run.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub table: EgressosTable,
    pub dual_level: DataFrame,
    pub dual_level_records: Vec<DualLevelRecord>,
    pub loaded_rows: usize,
    pub retained_rows: usize,
}

/// Run the data stages and write the dual-level CSV.
pub fn run(config: &AnalysisConfig) -> Result<AnalysisOutput, PipelineError> {
    let output = analyze(&config.input.path, config)?;
    write_dual_level_csv(&output.dual_level, &config.output.dual_level_csv)?;
    Ok(output)
}

/// Run the data stages on `input` without writing anything.
pub fn analyze(input: &Path, config: &AnalysisConfig) -> Result<AnalysisOutput, PipelineError> {
    let _span = info_span!("analyze", input = %input.display()).entered();

    let raw = DataLoader::load_csv(input)?;
    let loaded_rows = raw.height();

    let selected = DataLoader::filter_programs(&raw, &config.filter)?;
    let retained_rows = selected.height();
    info!(
        "Kept {} of {} rows ({} or {}*, status != {})",
        retained_rows,
        loaded_rows,
        config.filter.program_exact,
        config.filter.program_prefix,
        config.filter.unresolved_status
    );

    let table = EgressosTable::derive(&selected, &config.input.date_format)?;
    let dual_level = pair_levels(&table)?;
    let records = dual_level_records(&dual_level)?;
    if records.is_empty() {
        warn!("No student finished both levels");
    }

    Ok(AnalysisOutput {
        table,
        dual_level,
        dual_level_records: records,
        loaded_rows,
        retained_rows,
    })
}
