//! Field Deriver Module
//! Parses the date columns and adds the graduation metrics.

use crate::data::record::*;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

/// Days per month used for MesesParaGrad.
pub const DAYS_PER_MONTH: f64 = 30.0;
/// Days per year used for IdadeNaGraduacao.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Day number of 1970-01-01 counted from 0001-01-01 (chrono's CE epoch).
const UNIX_EPOCH_FROM_CE: i32 = 719_163;

#[derive(Error, Debug)]
pub enum DeriveError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Unknown level '{value}' for {name}")]
    UnknownLevel { name: String, value: String },
    #[error("Null value in column {column} at row {row}")]
    NullValue { column: &'static str, row: usize },
    #[error("Date out of range in column {column}: {days} days since epoch")]
    DateOutOfRange { column: &'static str, days: i32 },
}

/// Parse a date column in place with a strict format.
fn parse_date(column: &'static str, format: &str) -> Expr {
    col(column).str().to_date(StrptimeOptions {
        format: Some(format.into()),
        strict: true,
        exact: true,
        cache: true,
    })
}

/// Whole days between two date columns (`later - earlier`).
fn days_between(later: &'static str, earlier: &'static str) -> Expr {
    col(later).cast(DataType::Int32) - col(earlier).cast(DataType::Int32)
}

/// Convert polars' day count into a calendar date.
pub fn date_from_epoch_days(column: &'static str, days: i32) -> Result<NaiveDate, DeriveError> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_FROM_CE)
        .ok_or(DeriveError::DateOutOfRange { column, days })
}

/// Convert a calendar date into polars' day count.
pub fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_FROM_CE
}

/// The filtered egressos table with its derived columns.
#[derive(Debug, Clone)]
pub struct EgressosTable {
    df: DataFrame,
}

impl EgressosTable {
    /// Parse `Adm`, `Sit` and `Nascimento` and compute the four derived columns.
    ///
    /// A date that does not match `date_format` fails the whole table.
    pub fn derive(df: &DataFrame, date_format: &str) -> Result<Self, DeriveError> {
        let parsed = df
            .clone()
            .lazy()
            .with_columns([
                parse_date(COL_ADMISSION, date_format),
                parse_date(COL_STATUS, date_format),
                parse_date(COL_BIRTH, date_format),
            ])
            .with_columns([
                col(COL_ADMISSION).dt().year().alias(COL_ADMISSION_YEAR),
                col(COL_STATUS).dt().year().alias(COL_GRADUATION_YEAR),
                (days_between(COL_STATUS, COL_ADMISSION).cast(DataType::Float64)
                    / lit(DAYS_PER_MONTH))
                .alias(COL_MONTHS_TO_GRADUATION),
                (days_between(COL_STATUS, COL_BIRTH).cast(DataType::Float64)
                    / lit(DAYS_PER_YEAR))
                .alias(COL_AGE_AT_GRADUATION),
            ])
            .collect()?;

        debug!("Derived metrics for {} rows", parsed.height());
        Ok(Self { df: parsed })
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Lazy view restricted to one level.
    pub fn level_frame(&self, level: Level) -> LazyFrame {
        self.df
            .clone()
            .lazy()
            .filter(col(COL_LEVEL).eq(lit(level.label())))
    }

    /// Number of rows of one level.
    pub fn level_count(&self, level: Level) -> Result<usize, DeriveError> {
        Ok(self.level_frame(level).collect()?.height())
    }

    /// Months to graduation of every row of one level.
    pub fn months_to_graduation(&self, level: Level) -> Result<Vec<f64>, DeriveError> {
        Self::float_values(self.level_frame(level), COL_MONTHS_TO_GRADUATION)
    }

    /// Months to graduation of one level for graduation years in `[start, end)`.
    pub fn months_to_graduation_between(
        &self,
        level: Level,
        start: i32,
        end: i32,
    ) -> Result<Vec<f64>, DeriveError> {
        let frame = self.level_frame(level).filter(
            col(COL_GRADUATION_YEAR)
                .gt_eq(lit(start))
                .and(col(COL_GRADUATION_YEAR).lt(lit(end))),
        );
        Self::float_values(frame, COL_MONTHS_TO_GRADUATION)
    }

    /// Age at graduation of every row of one level.
    pub fn ages_at_graduation(&self, level: Level) -> Result<Vec<f64>, DeriveError> {
        Self::float_values(self.level_frame(level), COL_AGE_AT_GRADUATION)
    }

    /// Age at graduation of one level and one sex.
    pub fn ages_at_graduation_for(&self, level: Level, sex: Sex) -> Result<Vec<f64>, DeriveError> {
        let frame = self
            .level_frame(level)
            .filter(col(COL_SEX).eq(lit(sex.label())));
        Self::float_values(frame, COL_AGE_AT_GRADUATION)
    }

    fn float_values(frame: LazyFrame, column: &str) -> Result<Vec<f64>, DeriveError> {
        let df = frame.select([col(column)]).collect()?;
        let values = df
            .column(column)?
            .f64()?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect();
        Ok(values)
    }

    /// Materialize the table as typed rows.
    pub fn records(&self) -> Result<Vec<StudentRecord>, DeriveError> {
        let df = &self.df;
        let programs = df.column(COL_PROGRAM)?.str()?;
        let names = df.column(COL_NAME)?.str()?;
        let registrations = df.column(COL_REGISTRATION)?.str()?;
        let levels = df.column(COL_LEVEL)?.str()?;
        let sexes = df.column(COL_SEX)?.str()?;
        let admission = df.column(COL_ADMISSION)?.cast(&DataType::Int32)?;
        let admission = admission.i32()?;
        let status = df.column(COL_STATUS)?.cast(&DataType::Int32)?;
        let status = status.i32()?;
        let birth = df.column(COL_BIRTH)?.cast(&DataType::Int32)?;
        let birth = birth.i32()?;
        let months = df.column(COL_MONTHS_TO_GRADUATION)?.f64()?;
        let ages = df.column(COL_AGE_AT_GRADUATION)?.f64()?;

        let text = |ca: &StringChunked, column: &'static str, row: usize| -> Result<String, DeriveError> {
            ca.get(row)
                .map(str::to_string)
                .ok_or(DeriveError::NullValue { column, row })
        };
        let date = |ca: &Int32Chunked, column: &'static str, row: usize| -> Result<NaiveDate, DeriveError> {
            let days = ca.get(row).ok_or(DeriveError::NullValue { column, row })?;
            date_from_epoch_days(column, days)
        };

        let mut records = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let name = text(names, COL_NAME, row)?;
            let level_label = text(levels, COL_LEVEL, row)?;
            let level = Level::from_label(&level_label).ok_or_else(|| DeriveError::UnknownLevel {
                name: name.clone(),
                value: level_label.clone(),
            })?;
            let admission_date = date(admission, COL_ADMISSION, row)?;
            let status_date = date(status, COL_STATUS, row)?;

            records.push(StudentRecord {
                program: text(programs, COL_PROGRAM, row)?,
                registration_id: text(registrations, COL_REGISTRATION, row)?,
                admission_date,
                status_date,
                birth_date: date(birth, COL_BIRTH, row)?,
                level,
                sex: Sex::from_label(sexes.get(row).unwrap_or_default()),
                admission_year: admission_date.year(),
                graduation_year: status_date.year(),
                months_to_graduation: months.get(row).ok_or(DeriveError::NullValue {
                    column: COL_MONTHS_TO_GRADUATION,
                    row,
                })?,
                age_at_graduation: ages.get(row).ok_or(DeriveError::NullValue {
                    column: COL_AGE_AT_GRADUATION,
                    row,
                })?,
                name,
            });
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[(&str, &str, &str, &str, &str)]) -> DataFrame {
        df!(
            COL_PROGRAM => rows.iter().map(|_| "PGCAP").collect::<Vec<_>>(),
            COL_REGISTRATION => rows.iter().enumerate().map(|(i, _)| format!("{:04}", i)).collect::<Vec<_>>(),
            COL_NAME => rows.iter().map(|r| r.0).collect::<Vec<_>>(),
            COL_ADMISSION => rows.iter().map(|r| r.1).collect::<Vec<_>>(),
            COL_STATUS => rows.iter().map(|r| r.2).collect::<Vec<_>>(),
            COL_BIRTH => rows.iter().map(|r| r.3).collect::<Vec<_>>(),
            COL_LEVEL => rows.iter().map(|r| r.4).collect::<Vec<_>>(),
            COL_SEX => rows.iter().map(|_| "Masculino").collect::<Vec<_>>(),
        )
        .unwrap()
    }

    #[test]
    fn test_two_years_is_about_24_33_months() {
        let df = raw(&[("Ana", "2018-01-01", "2020-01-01", "1990-01-01", "MESTRADO")]);
        let table = EgressosTable::derive(&df, "%Y-%m-%d").unwrap();

        let months = table.months_to_graduation(Level::Masters).unwrap();
        assert_eq!(months, vec![730.0 / 30.0]);
        assert!((months[0] - 24.33).abs() < 0.01);

        let ages = table.ages_at_graduation(Level::Masters).unwrap();
        let expected_days = (NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
            - NaiveDate::from_ymd_opt(1990, 1, 1).unwrap())
        .num_days() as f64;
        assert_eq!(ages, vec![expected_days / 365.25]);
    }

    #[test]
    fn test_years_are_extracted() {
        let df = raw(&[("Bia", "2015-03-10", "2019-08-30", "1985-07-01", "DOUTORADO")]);
        let table = EgressosTable::derive(&df, "%Y-%m-%d").unwrap();
        let records = table.records().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].admission_year, 2015);
        assert_eq!(records[0].graduation_year, 2019);
        assert_eq!(records[0].level, Level::Doctorate);
        assert_eq!(records[0].registration_id, "0000");
        assert_eq!(
            records[0].months_to_graduation,
            records[0].days_enrolled() as f64 / DAYS_PER_MONTH
        );
    }

    #[test]
    fn test_malformed_date_fails_the_run() {
        let df = raw(&[
            ("Ana", "2018-01-01", "2020-01-01", "1990-01-01", "MESTRADO"),
            ("Caio", "01/02/2018", "2020-01-01", "1990-01-01", "MESTRADO"),
        ]);
        assert!(EgressosTable::derive(&df, "%Y-%m-%d").is_err());
    }

    #[test]
    fn test_decade_slice_is_half_open() {
        let df = raw(&[
            ("A", "2007-01-01", "2009-12-31", "1980-01-01", "MESTRADO"),
            ("B", "2008-01-01", "2010-01-01", "1980-01-01", "MESTRADO"),
            ("C", "2017-01-01", "2019-06-01", "1980-01-01", "MESTRADO"),
        ]);
        let table = EgressosTable::derive(&df, "%Y-%m-%d").unwrap();

        let decade = table
            .months_to_graduation_between(Level::Masters, 2000, 2010)
            .unwrap();
        assert_eq!(decade.len(), 1);
        let decade = table
            .months_to_graduation_between(Level::Masters, 2010, 2020)
            .unwrap();
        assert_eq!(decade.len(), 2);
    }

    #[test]
    fn test_epoch_day_conversion() {
        let date = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(epoch_days(date), 0);
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(date_from_epoch_days(COL_STATUS, epoch_days(date)).unwrap(), date);
    }
}
