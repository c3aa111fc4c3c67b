//! CSV Data Loader Module
//! Handles egressos CSV loading, column checks and the program/status filter using Polars.

use crate::config::FilterConfig;
use crate::data::record::{COL_NAME, COL_PROGRAM, COL_STATUS, REQUIRED_COLUMNS};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("No rows left after filtering (program {exact} / prefix {prefix}, status != {sentinel})")]
    EmptySelection {
        exact: String,
        prefix: String,
        sentinel: String,
    },
    #[error("Empty {column} for {name} (row {row})")]
    MissingValue {
        column: &'static str,
        name: String,
        row: usize,
    },
}

/// Loads and filters egressos CSV files with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load an egressos CSV file.
    ///
    /// Every column is read as text so that registration numbers keep their
    /// leading zeros and dates are parsed later with a fixed format.
    pub fn load_csv(file_path: &Path) -> Result<DataFrame, LoaderError> {
        if !file_path.exists() {
            return Err(LoaderError::NotFound(file_path.to_path_buf()));
        }

        let df = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        Self::check_required_columns(&df)?;

        info!(
            "Loaded {} rows, {} columns from {}",
            df.height(),
            df.width(),
            file_path.display()
        );

        Ok(df)
    }

    /// Fail with the full list of absent columns instead of the first one.
    pub fn check_required_columns(df: &DataFrame) -> Result<(), LoaderError> {
        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| !present.iter().any(|p| p == *name))
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(LoaderError::MissingColumns(missing))
        }
    }

    /// Keep rows of the target programs whose status has been reported.
    ///
    /// A row is kept when `Programa` equals the exact program name or starts
    /// with the program prefix, and `Sit` differs from the unresolved marker.
    /// A kept row with an empty `Sit` fails the selection.
    pub fn filter_programs(df: &DataFrame, filter: &FilterConfig) -> Result<DataFrame, LoaderError> {
        let program = col(COL_PROGRAM);
        let exact = program.clone().eq(lit(filter.program_exact.as_str()));
        // An empty prefix would match every program
        let in_programs = if filter.program_prefix.is_empty() {
            exact
        } else {
            exact.or(program.str().starts_with(lit(filter.program_prefix.as_str())))
        };
        let status = col(COL_STATUS);
        let resolved = status
            .clone()
            .is_null()
            .or(status.neq(lit(filter.unresolved_status.as_str())));

        let filtered = df
            .clone()
            .lazy()
            .filter(in_programs.and(resolved))
            .collect()?;

        debug!(
            "Filter kept {} of {} rows",
            filtered.height(),
            df.height()
        );

        if filtered.height() == 0 {
            return Err(LoaderError::EmptySelection {
                exact: filter.program_exact.clone(),
                prefix: filter.program_prefix.clone(),
                sentinel: filter.unresolved_status.clone(),
            });
        }

        Self::check_status_present(&filtered)?;
        Ok(filtered)
    }

    /// `row` is the position in the filtered table.
    fn check_status_present(df: &DataFrame) -> Result<(), LoaderError> {
        let nulls = df.column(COL_STATUS)?.is_null();
        let Some(row) = nulls.into_iter().position(|v| v == Some(true)) else {
            return Ok(());
        };
        let name = df
            .column(COL_NAME)?
            .str()?
            .get(row)
            .unwrap_or_default()
            .to_string();
        Err(LoaderError::MissingValue {
            column: COL_STATUS,
            name,
            row,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::*;

    fn frame(programs: &[&str], status: &[Option<&str>]) -> DataFrame {
        let n = programs.len();
        df!(
            COL_PROGRAM => programs,
            COL_REGISTRATION => (0..n).map(|i| i.to_string()).collect::<Vec<_>>(),
            COL_NAME => (0..n).map(|i| format!("Aluno {}", i)).collect::<Vec<_>>(),
            COL_ADMISSION => vec!["2018-01-01"; n],
            COL_STATUS => status,
            COL_BIRTH => vec!["1990-05-05"; n],
            COL_LEVEL => vec!["MESTRADO"; n],
            COL_SEX => vec!["Feminino"; n],
        )
        .unwrap()
    }

    #[test]
    fn test_filter_keeps_target_programs_with_resolved_status() {
        let df = frame(
            &["PGCAP", "ECOLOGIA", "ECO-ADM", "FISICA", "FISICA", "XPGCAP"],
            &[
                Some("2020-01-01"),
                Some("2021-02-01"),
                Some("n/r"),
                Some("2020-01-01"),
                None,
                Some("2020-01-01"),
            ],
        );

        let filtered = DataLoader::filter_programs(&df, &FilterConfig::default()).unwrap();
        let programs: Vec<&str> = filtered
            .column(COL_PROGRAM)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();

        assert_eq!(programs, vec!["PGCAP", "ECOLOGIA"]);
    }

    #[test]
    fn test_empty_status_in_kept_program_fails() {
        let df = frame(
            &["PGCAP", "PGCAP", "ECOLOGIA"],
            &[Some("2020-01-01"), Some("n/r"), None],
        );
        match DataLoader::filter_programs(&df, &FilterConfig::default()) {
            Err(LoaderError::MissingValue { column, name, row }) => {
                assert_eq!(column, COL_STATUS);
                assert_eq!(name, "Aluno 2");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_filter_reports_empty_selection() {
        let df = frame(&["FISICA"], &[Some("2020-01-01")]);
        let err = DataLoader::filter_programs(&df, &FilterConfig::default()).unwrap_err();
        assert!(matches!(err, LoaderError::EmptySelection { .. }));
    }

    #[test]
    fn test_missing_columns_are_all_listed() {
        let df = df!(COL_PROGRAM => ["PGCAP"], COL_NAME => ["Ana"]).unwrap();
        match DataLoader::check_required_columns(&df) {
            Err(LoaderError::MissingColumns(missing)) => {
                assert_eq!(missing.len(), 6);
                assert!(missing.contains(&COL_STATUS.to_string()));
                assert!(missing.contains(&COL_SEX.to_string()));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = DataLoader::load_csv(Path::new("/definitely/not/here/egressos.csv")).unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
    }
}
