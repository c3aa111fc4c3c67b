//! Configuration file handling.
//!
//! Loads `egressos.toml` and merges it with command-line arguments.
//! Every field has a default, so an absent file reproduces the fixed
//! analysis: PGCAP and ECO* programs, `n/r` status excluded, ISO dates.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "egressos.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub charts: ChartConfig,
}

/// Source table settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path of the egressos CSV.
    #[serde(default = "default_input")]
    pub path: PathBuf,

    /// chrono format of Adm, Sit and Nascimento.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input(),
            date_format: default_date_format(),
        }
    }
}

fn default_input() -> PathBuf {
    PathBuf::from("Data/egressos.csv")
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

/// Row selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Program kept by exact match.
    #[serde(default = "default_program_exact")]
    pub program_exact: String,

    /// Programs kept by prefix match.
    #[serde(default = "default_program_prefix")]
    pub program_prefix: String,

    /// Status value marking a record whose outcome was never reported.
    #[serde(default = "default_unresolved_status")]
    pub unresolved_status: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            program_exact: default_program_exact(),
            program_prefix: default_program_prefix(),
            unresolved_status: default_unresolved_status(),
        }
    }
}

fn default_program_exact() -> String {
    "PGCAP".to_string()
}

fn default_program_prefix() -> String {
    "ECO".to_string()
}

fn default_unresolved_status() -> String {
    "n/r".to_string()
}

/// Output artifact settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where the dual-level students CSV is written.
    #[serde(default = "default_dual_level_csv")]
    pub dual_level_csv: PathBuf,

    /// Directory for PNG files in headless mode.
    #[serde(default = "default_chart_dir")]
    pub chart_dir: PathBuf,

    /// Optional JSON run summary.
    #[serde(default)]
    pub summary: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dual_level_csv: default_dual_level_csv(),
            chart_dir: default_chart_dir(),
            summary: None,
        }
    }
}

fn default_dual_level_csv() -> PathBuf {
    PathBuf::from("Data/DoisNiveis.csv")
}

fn default_chart_dir() -> PathBuf {
    PathBuf::from("charts")
}

/// Chart image settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_width() -> u32 {
    1200
}

fn default_height() -> u32 {
    800
}

impl AnalysisConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AnalysisConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the explicit file, else `egressos.toml` if present, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::load(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.input.path = input.clone();
        }
        if let Some(ref out) = args.dual_level_output {
            self.output.dual_level_csv = out.clone();
        }
        if let Some(ref dir) = args.output_dir {
            self.output.chart_dir = dir.clone();
        }
        if let Some(ref summary) = args.summary {
            self.output.summary = Some(summary.clone());
        }
        if let Some(width) = args.width {
            self.charts.width = width;
        }
        if let Some(height) = args.height {
            self.charts.height = height;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.charts.width < 200 || self.charts.height < 150 {
            return Err(ConfigError::Invalid(format!(
                "chart size {}x{} is too small (minimum 200x150)",
                self.charts.width, self.charts.height
            )));
        }
        if self.filter.program_exact.is_empty() && self.filter.program_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "filter needs a program name or a program prefix".to_string(),
            ));
        }
        if self.input.date_format.is_empty() {
            return Err(ConfigError::Invalid("date_format is empty".to_string()));
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = AnalysisConfig::default();
        let body = toml::to_string_pretty(&config).unwrap_or_else(|_| String::new());
        format!(
            "# Egressos Explorer configuration\n\
             # Every key is optional; CLI flags override the values below.\n\n{}",
            body
        )
    }
}
