//! Egressos Explorer - exploratory analysis of graduate records
//!
//! Loads the egressos CSV, keeps the target programs, derives months to
//! graduation and age at graduation, pairs the students that finished
//! both levels and renders the twelve descriptive charts.

pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod gui;
pub mod pipeline;
pub mod report;
pub mod stats;
