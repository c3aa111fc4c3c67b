//! Aggregations behind the bar and decade charts.

use crate::data::{DeriveError, EgressosTable, Level, COL_GRADUATION_YEAR, COL_LEVEL, COL_SEX};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

const COUNT: &str = "Numero";

/// Graduation decades, half-open `[start, end)`.
pub const DECADES: [(i32, i32); 6] = [
    (1970, 1980),
    (1980, 1990),
    (1990, 2000),
    (2000, 2010),
    (2010, 2020),
    (2020, 2030),
];

/// Number of graduates of one group in one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub year: i32,
    pub group: String,
    pub count: u32,
}

/// Counts pivoted for a stacked bar: one series per group, aligned on `years`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackedCounts {
    pub years: Vec<i32>,
    pub series: Vec<(String, Vec<u32>)>,
}

impl StackedCounts {
    /// Pivot counts; groups listed in `order` come first, the rest alphabetically.
    pub fn pivot(counts: &[GroupCount], order: &[&str]) -> Self {
        let years: Vec<i32> = counts
            .iter()
            .map(|c| c.year)
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut by_group: BTreeMap<&str, Vec<u32>> = BTreeMap::new();
        for c in counts {
            let column = by_group
                .entry(c.group.as_str())
                .or_insert_with(|| vec![0; years.len()]);
            if let Ok(idx) = years.binary_search(&c.year) {
                column[idx] += c.count;
            }
        }

        let mut series = Vec::with_capacity(by_group.len());
        for name in order {
            if let Some(values) = by_group.remove(name) {
                series.push((name.to_string(), values));
            }
        }
        series.extend(by_group.into_iter().map(|(k, v)| (k.to_string(), v)));

        Self { years, series }
    }

    /// Height of the tallest stack.
    pub fn max_total(&self) -> u32 {
        (0..self.years.len())
            .map(|i| self.series.iter().map(|(_, v)| v[i]).sum::<u32>())
            .max()
            .unwrap_or(0)
    }
}

/// Months to graduation of one decade bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct DecadeGroup {
    /// Position of the bucket in [`DECADES`], used to pick its color.
    pub index: usize,
    pub start: i32,
    pub end: i32,
    pub values: Vec<f64>,
}

impl DecadeGroup {
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// Graduates per (graduation year, level).
pub fn count_by_year_and_level(table: &EgressosTable) -> Result<Vec<GroupCount>, DeriveError> {
    group_counts(table.dataframe().clone().lazy(), COL_LEVEL)
}

/// Graduates of one level per (graduation year, sex).
pub fn count_by_year_and_sex(
    table: &EgressosTable,
    level: Level,
) -> Result<Vec<GroupCount>, DeriveError> {
    group_counts(table.level_frame(level), COL_SEX)
}

fn group_counts(frame: LazyFrame, key: &str) -> Result<Vec<GroupCount>, DeriveError> {
    let df = frame
        .group_by([col(COL_GRADUATION_YEAR), col(key)])
        .agg([len().alias(COUNT)])
        .sort_by_exprs(
            [col(COL_GRADUATION_YEAR), col(key)],
            SortMultipleOptions::default(),
        )
        .collect()?;

    let years = df.column(COL_GRADUATION_YEAR)?.cast(&DataType::Int32)?;
    let groups = df.column(key)?;
    let counts = df.column(COUNT)?.cast(&DataType::UInt32)?;

    let rows = years
        .i32()?
        .into_iter()
        .zip(groups.str()?.into_iter())
        .zip(counts.u32()?.into_iter())
        .filter_map(|((year, group), count)| {
            Some(GroupCount {
                year: year?,
                group: group?.to_string(),
                count: count?,
            })
        })
        .collect();

    Ok(rows)
}

/// Months to graduation per decade of graduation, non-empty buckets only.
pub fn months_by_decade(
    table: &EgressosTable,
    level: Level,
) -> Result<Vec<DecadeGroup>, DeriveError> {
    let mut groups = Vec::new();
    for (index, &(start, end)) in DECADES.iter().enumerate() {
        let values = table.months_to_graduation_between(level, start, end)?;
        if !values.is_empty() {
            groups.push(DecadeGroup {
                index,
                start,
                end,
                values,
            });
        }
    }
    Ok(groups)
}
