//! Reductions of gridded fields into summary statistics
//!
//! # Organization
//!
//! - [`temporal`]: year averaging, threshold counts and time-slice means
//! - [`spatial`]: latitude-weighted means over the horizontal grid
//! - [`composite`]: annual global-mean series
//! - [`quantile`]: per-cell quantiles of the time series
//! - [`indicators`]: annual climate indicators (dry spells, 5-day accumulations)

pub mod composite;
pub mod indicators;
pub mod quantile;
pub mod spatial;
pub mod temporal;

pub use composite::collapse_to_global_time_series;
pub use indicators::{max_5day_accumulation, maximum_consecutive_dry_days, DEFAULT_DRY_THRESHOLD};
pub use quantile::{quantiles_across_time_by_cell, CellQuantileMap, CellQuantiles};
pub use spatial::{collapse_across_space, masked_weights, SpatialCollapse, Weighting};
pub use temporal::{
    average_across_days_of_year, collapse_multiple_time_ranges, collapse_time_range,
    count_above_threshold_by_year, TimeSliceMap,
};
