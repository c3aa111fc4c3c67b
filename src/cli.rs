//! Command-line interface argument parsing.

use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

/// Egressos Explorer - graduate records analysis
///
/// Loads the egressos CSV, keeps the target programs, derives graduation
/// duration and age, exports the students that finished both levels and
/// shows the descriptive charts.
///
/// Examples:
///   egressos
///   egressos --input Data/egressos.csv --headless --output-dir charts
///   egressos --headless --summary resumo.json --open
///   egressos --init-config
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Egressos CSV file
    #[arg(short, long, value_name = "FILE", env = "EGRESSOS_INPUT")]
    pub input: Option<PathBuf>,

    /// Output CSV for students with both levels
    #[arg(long, value_name = "FILE")]
    pub dual_level_output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for egressos.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Render the charts to PNG files instead of opening the viewer
    #[arg(long)]
    pub headless: bool,

    /// Directory for the PNG files (headless mode)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Write a JSON summary of counts and statistics
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Open the chart directory with the system viewer after rendering
    #[arg(long, requires = "headless")]
    pub open: bool,

    /// Chart width in pixels
    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    /// Chart height in pixels
    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,

    /// Enable verbose logging output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default egressos.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level for the tracing subscriber.
    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_leave_config_untouched() {
        let args = Args::try_parse_from(["egressos"]).unwrap();
        assert!(args.input.is_none());
        assert!(!args.headless);
        assert_eq!(args.log_level(), Level::INFO);
    }

    #[test]
    fn test_headless_flags() {
        let args = Args::try_parse_from([
            "egressos",
            "--headless",
            "-o",
            "out",
            "--open",
            "--width",
            "1600",
            "-v",
        ])
        .unwrap();
        assert!(args.headless);
        assert!(args.open);
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.width, Some(1600));
        assert_eq!(args.log_level(), Level::DEBUG);
    }

    #[test]
    fn test_open_requires_headless() {
        assert!(Args::try_parse_from(["egressos", "--open"]).is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Args::try_parse_from(["egressos", "-v", "-q"]).is_err());
    }
}
