//! Charts module - View preparation and static rendering

mod renderer;
mod views;

pub use renderer::{
    decimal_year, histogram_bins, jitter, violin_outline, width_at, ChartRenderer, RenderError,
    Side,
};
pub use views::{
    prepare, prepare_all, ChartData, ChartView, PreparedChart, ReferenceLines, ViewError,
    ViolinGroup, AGE_BINS, AGE_RANGE,
};
