//! Data module - CSV loading, filtering and derived metrics

mod deriver;
mod dual_level;
mod loader;
mod record;

pub use deriver::{date_from_epoch_days, epoch_days, DeriveError, EgressosTable, DAYS_PER_MONTH, DAYS_PER_YEAR};
pub use dual_level::{
    pair_levels, read_csv as read_dual_level_csv, records_from_frame as dual_level_records,
    write_csv as write_dual_level_csv, DualLevelError, DualLevelRecord, DUAL_LEVEL_COLUMNS,
};
pub use loader::{DataLoader, LoaderError};
pub use record::*;
