//! Dual-Level Module
//! Pairs the Master's and Doctorate rows of students who completed both levels.

use crate::data::deriver::{DeriveError, EgressosTable};
use crate::data::record::*;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub const COL_ADMISSION_MSC: &str = "Adm_MSc";
pub const COL_STATUS_MSC: &str = "Sit_MSc";
pub const COL_ADMISSION_PHD: &str = "Adm_PhD";
pub const COL_STATUS_PHD: &str = "Sit_PhD";

/// Column order of the exported dual-level CSV.
pub const DUAL_LEVEL_COLUMNS: [&str; 9] = [
    COL_PROGRAM,
    COL_REGISTRATION,
    COL_NAME,
    COL_ADMISSION_MSC,
    COL_STATUS_MSC,
    COL_ADMISSION_PHD,
    COL_STATUS_PHD,
    COL_BIRTH,
    COL_SEX,
];

const LEVEL_COUNT: &str = "niveis";

#[derive(Error, Debug)]
pub enum DualLevelError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Derive(#[from] DeriveError),
}

/// A student that finished both the Master's and the Doctorate.
///
/// Program, registration, birth date and sex come from the Master's row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DualLevelRecord {
    pub program: String,
    pub registration_id: String,
    pub name: String,
    pub masters_admission: NaiveDate,
    pub masters_status: NaiveDate,
    pub doctorate_admission: NaiveDate,
    pub doctorate_status: NaiveDate,
    pub birth_date: NaiveDate,
    pub sex: Sex,
}

/// Pair the level rows of every student with exactly two distinct levels.
///
/// A student with repeated rows of one level still yields a single row: the
/// earliest Master's admission and the latest Doctorate admission are kept.
/// Rows are ordered by Master's admission, then by name.
pub fn pair_levels(table: &EgressosTable) -> Result<DataFrame, DualLevelError> {
    let both_levels = table
        .dataframe()
        .clone()
        .lazy()
        .group_by([col(COL_NAME)])
        .agg([col(COL_LEVEL).n_unique().alias(LEVEL_COUNT)])
        .filter(col(LEVEL_COUNT).eq(lit(2)))
        .select([col(COL_NAME)]);

    let masters = one_row_per_name(
        table.level_frame(Level::Masters),
        &[
            (COL_PROGRAM, COL_PROGRAM),
            (COL_REGISTRATION, COL_REGISTRATION),
            (COL_ADMISSION, COL_ADMISSION_MSC),
            (COL_STATUS, COL_STATUS_MSC),
            (COL_BIRTH, COL_BIRTH),
            (COL_SEX, COL_SEX),
        ],
        Pick::First,
    );
    let doctorate = one_row_per_name(
        table.level_frame(Level::Doctorate),
        &[
            (COL_ADMISSION, COL_ADMISSION_PHD),
            (COL_STATUS, COL_STATUS_PHD),
        ],
        Pick::Last,
    );

    let paired = masters
        .inner_join(both_levels, col(COL_NAME), col(COL_NAME))
        .inner_join(doctorate, col(COL_NAME), col(COL_NAME))
        .select(DUAL_LEVEL_COLUMNS.iter().map(|c| col(*c)).collect::<Vec<_>>())
        .sort_by_exprs(
            [col(COL_ADMISSION_MSC), col(COL_NAME)],
            SortMultipleOptions::default(),
        )
        .collect()?;

    debug!("Paired {} dual-level students", paired.height());
    Ok(paired)
}

#[derive(Debug, Clone, Copy)]
enum Pick {
    First,
    Last,
}

/// Collapse a level slice to one row per name, chosen by admission date.
/// `columns` maps source names to output names.
fn one_row_per_name(frame: LazyFrame, columns: &[(&str, &str)], pick: Pick) -> LazyFrame {
    let aggs: Vec<Expr> = columns
        .iter()
        .map(|&(source, target)| {
            let ordered = col(source).sort_by([col(COL_ADMISSION)], SortMultipleOptions::default());
            let picked = match pick {
                Pick::First => ordered.first(),
                Pick::Last => ordered.last(),
            };
            picked.alias(target)
        })
        .collect();
    frame.group_by([col(COL_NAME)]).agg(aggs)
}

/// Write the paired table as CSV, creating the parent directory if needed.
pub fn write_csv(paired: &DataFrame, path: &Path) -> Result<(), DualLevelError> {
    let io_err = |source| DualLevelError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut file = File::create(path).map_err(io_err)?;
    let mut out = paired.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut out)?;

    info!(
        "Wrote {} dual-level students to {}",
        out.height(),
        path.display()
    );
    Ok(())
}

/// Read a dual-level CSV written by [`write_csv`].
pub fn read_csv(path: &Path, date_format: &str) -> Result<Vec<DualLevelRecord>, DualLevelError> {
    // Schema inference is off so every column, registration included, stays text.
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()?
        .with_columns(
            [
                COL_ADMISSION_MSC,
                COL_STATUS_MSC,
                COL_ADMISSION_PHD,
                COL_STATUS_PHD,
                COL_BIRTH,
            ]
            .map(|c| {
                col(c).str().to_date(StrptimeOptions {
                    format: Some(date_format.into()),
                    strict: true,
                    exact: true,
                    cache: true,
                })
            }),
        )
        .collect()?;

    records_from_frame(&df)
}

/// Materialize a paired table as typed records.
pub fn records_from_frame(df: &DataFrame) -> Result<Vec<DualLevelRecord>, DualLevelError> {
    let text = |column: &'static str| -> Result<Vec<Option<String>>, DualLevelError> {
        Ok(df
            .column(column)?
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    };
    let dates = |column: &'static str| -> Result<Vec<Option<i32>>, DualLevelError> {
        let days = df.column(column)?.cast(&DataType::Int32)?;
        Ok(days.i32()?.into_iter().collect())
    };

    let program = text(COL_PROGRAM)?;
    let registration = text(COL_REGISTRATION)?;
    let name = text(COL_NAME)?;
    let sex = text(COL_SEX)?;
    let masters_admission = dates(COL_ADMISSION_MSC)?;
    let masters_status = dates(COL_STATUS_MSC)?;
    let doctorate_admission = dates(COL_ADMISSION_PHD)?;
    let doctorate_status = dates(COL_STATUS_PHD)?;
    let birth = dates(COL_BIRTH)?;

    let required = |value: &Option<String>, column: &'static str, row: usize| {
        value
            .clone()
            .ok_or(DeriveError::NullValue { column, row })
    };
    let date = |value: Option<i32>, column: &'static str, row: usize| -> Result<NaiveDate, DeriveError> {
        let days = value.ok_or(DeriveError::NullValue { column, row })?;
        crate::data::deriver::date_from_epoch_days(column, days)
    };

    (0..df.height())
        .map(|row| -> Result<DualLevelRecord, DualLevelError> {
            Ok(DualLevelRecord {
                program: required(&program[row], COL_PROGRAM, row)?,
                registration_id: required(&registration[row], COL_REGISTRATION, row)?,
                name: required(&name[row], COL_NAME, row)?,
                masters_admission: date(masters_admission[row], COL_ADMISSION_MSC, row)?,
                masters_status: date(masters_status[row], COL_STATUS_MSC, row)?,
                doctorate_admission: date(doctorate_admission[row], COL_ADMISSION_PHD, row)?,
                doctorate_status: date(doctorate_status[row], COL_STATUS_PHD, row)?,
                birth_date: date(birth[row], COL_BIRTH, row)?,
                sex: Sex::from_label(sex[row].as_deref().unwrap_or_default()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, &str, &str, &str)]) -> EgressosTable {
        let df = df!(
            COL_PROGRAM => rows.iter().map(|_| "PGCAP").collect::<Vec<_>>(),
            COL_REGISTRATION => rows.iter().map(|r| r.1).collect::<Vec<_>>(),
            COL_NAME => rows.iter().map(|r| r.0).collect::<Vec<_>>(),
            COL_ADMISSION => rows.iter().map(|r| r.3).collect::<Vec<_>>(),
            COL_STATUS => rows.iter().map(|_| "2022-06-30").collect::<Vec<_>>(),
            COL_BIRTH => rows.iter().map(|_| "1990-01-15").collect::<Vec<_>>(),
            COL_LEVEL => rows.iter().map(|r| r.2).collect::<Vec<_>>(),
            COL_SEX => rows.iter().map(|_| "Feminino").collect::<Vec<_>>(),
        )
        .unwrap();
        EgressosTable::derive(&df, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_pairs_one_row_per_dual_level_student() {
        let table = table(&[
            ("Ana", "10", "MESTRADO", "2012-03-01"),
            ("Ana", "20", "DOUTORADO", "2015-03-01"),
            ("Bruno", "11", "MESTRADO", "2013-03-01"),
            ("Carla", "12", "DOUTORADO", "2014-03-01"),
            ("Davi", "13", "MESTRADO", "2010-03-01"),
            ("Davi", "14", "MESTRADO", "2011-03-01"),
            ("Davi", "15", "DOUTORADO", "2016-03-01"),
        ]);

        let paired = pair_levels(&table).unwrap();
        let records = records_from_frame(&paired).unwrap();

        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Davi", "Ana"]);

        let ana = &records[1];
        assert_eq!(ana.registration_id, "10");
        assert_eq!(
            ana.doctorate_admission,
            NaiveDate::from_ymd_opt(2015, 3, 1).unwrap()
        );
        assert_eq!(ana.sex, Sex::Female);

        // Repeated Master's rows collapse onto the earliest admission
        let davi = &records[0];
        assert_eq!(davi.registration_id, "13");
        assert_eq!(
            davi.masters_admission,
            NaiveDate::from_ymd_opt(2010, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_columns_follow_export_order() {
        let table = table(&[
            ("Ana", "10", "MESTRADO", "2012-03-01"),
            ("Ana", "20", "DOUTORADO", "2015-03-01"),
        ]);
        let paired = pair_levels(&table).unwrap();
        let names: Vec<String> = paired
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, DUAL_LEVEL_COLUMNS.to_vec());
    }

    #[test]
    fn test_sorted_by_masters_admission() {
        let table = table(&[
            ("Zeca", "1", "MESTRADO", "2005-03-01"),
            ("Zeca", "2", "DOUTORADO", "2008-03-01"),
            ("Ana", "3", "MESTRADO", "2012-03-01"),
            ("Ana", "4", "DOUTORADO", "2015-03-01"),
        ]);
        let records = records_from_frame(&pair_levels(&table).unwrap()).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Zeca", "Ana"]);
    }
}
