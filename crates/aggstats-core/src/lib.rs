//! aggstats-core: Aggregate statistics over tabular records
//!
//! This crate computes correlation, simple linear regression, covariance,
//! and population/sample variance and standard deviation over named numeric
//! fields of a dataset, with an explicit missing-value policy. Every statistic
//! is computed in a single streaming pass with O(1) extra memory.

pub mod dataset;
pub mod engine;
pub mod errors;
pub mod inference;
pub mod moments;
pub mod query;
pub mod types;

pub use dataset::{
    ColumnRow, ColumnTable, Dataset, FieldLookup, NumericColumnView, PairedSample, Record,
    RecordStream, RowTable,
};
pub use engine::AggregateStatsEngine;
pub use errors::{StatsError, StatsResult};
pub use query::{StatKind, StatQuery, StatResult, StatValue, Unit};
pub use types::*;
