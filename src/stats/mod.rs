//! Stats module - Aggregations, descriptive statistics and densities

mod aggregator;
mod calculator;
mod density;

pub use aggregator::{
    count_by_year_and_level, count_by_year_and_sex, months_by_decade, DecadeGroup, GroupCount,
    StackedCounts, DECADES,
};
pub use calculator::{BoxSummary, DistributionStats, StatsCalculator};
pub use density::{gaussian_kde, silverman_bandwidth, DensityCurve};
