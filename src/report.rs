//! JSON run summary: row counts, grouped counts and per-level statistics.

use crate::data::{DeriveError, EgressosTable, Level};
use crate::pipeline::AnalysisOutput;
use crate::stats::{self, DistributionStats, GroupCount, StatsCalculator};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Data(#[from] DeriveError),
    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelSummary {
    pub level: Level,
    pub graduates: usize,
    pub months_to_graduation: DistributionStats,
    pub age_at_graduation: DistributionStats,
    pub graduates_by_year_and_sex: Vec<GroupCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub loaded_rows: usize,
    pub retained_rows: usize,
    pub dual_level_students: usize,
    pub graduates_by_year_and_level: Vec<GroupCount>,
    pub levels: Vec<LevelSummary>,
}

impl RunSummary {
    pub fn build(output: &AnalysisOutput) -> Result<Self, ReportError> {
        let levels = Level::ALL
            .iter()
            .map(|&level| level_summary(&output.table, level))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            loaded_rows: output.loaded_rows,
            retained_rows: output.retained_rows,
            dual_level_students: output.dual_level_records.len(),
            graduates_by_year_and_level: stats::count_by_year_and_level(&output.table)?,
            levels,
        })
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<(), ReportError> {
        let io_err = |source| ReportError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.to_json()?).map_err(io_err)?;
        info!("Wrote run summary to {}", path.display());
        Ok(())
    }
}

fn level_summary(table: &EgressosTable, level: Level) -> Result<LevelSummary, ReportError> {
    let months = table.months_to_graduation(level)?;
    let ages = table.ages_at_graduation(level)?;
    Ok(LevelSummary {
        level,
        graduates: months.len(),
        months_to_graduation: StatsCalculator::compute_descriptive_stats(&months),
        age_at_graduation: StatsCalculator::compute_descriptive_stats(&ages),
        graduates_by_year_and_sex: stats::count_by_year_and_sex(table, level)?,
    })
}
