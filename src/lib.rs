//! grid_collapse: summaries of gridded climate-model output
//!
//! Reduces `(time, lon, lat)` fields held in NetCDF files into the summaries
//! used to report climate projections: annual means, threshold counts,
//! multi-decade time-slice means, latitude-weighted global means, per-cell
//! quantiles and annual indicators. Results can be written back to NetCDF or
//! rendered as SVG maps and line charts.
//!
//! ## Key Features
//!
//! - **Explicit missing data**: every reduction goes through [`MaskedArray`],
//!   so missing cells never leak into sums, counts or weights
//! - **GMST weighting**: global means weighted by the cosine of latitude over
//!   the valid cells only
//! - **Parallel Processing**: per-cell reductions run on Rayon
//! - **NetCDF I/O**: CF time decoding on input, CF-style output with fill values
//! - **Plotting**: shared-scale map panels and styled time-series charts as SVG
//!
//! ## Module Organization
//!
//! - [`masked`]: value-plus-validity arrays and masked reductions
//! - [`fields`]: labeled gridded, annual and spatial fields and time series
//! - [`time`]: partial dates, time slices and CF time decoding
//! - [`aggregation`]: temporal, spatial, quantile and indicator reductions
//! - [`netcdf_io`]: loading fields and writing results
//! - [`render`]: SVG maps and time-series charts
//! - [`parallel`]: thread pool configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use grid_collapse::prelude::*;
//!
//! let file = netcdf::open("tas_day.nc").unwrap();
//! let tas = read_gridded_field(&file, "tas").unwrap();
//!
//! let global = collapse_to_global_time_series(&tas).unwrap();
//! for (year, value) in global.points() {
//!     println!("{}: {:?}", year, value);
//! }
//!
//! let slices = collapse_multiple_time_ranges(&tas, &TimeSlice::default_slices()).unwrap();
//! println!("{} slices", slices.len());
//! ```

pub mod aggregation;
pub mod errors;
pub mod fields;
pub mod masked;
pub mod netcdf_io;
pub mod parallel;
pub mod render;
pub mod time;

pub use aggregation::*;
pub use errors::*;
pub use fields::*;
pub use masked::MaskedArray;
pub use netcdf_io::*;
pub use parallel::*;
pub use render::*;
pub use time::*;

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::aggregation::{
        average_across_days_of_year, collapse_across_space, collapse_multiple_time_ranges,
        collapse_time_range, collapse_to_global_time_series, count_above_threshold_by_year,
        quantiles_across_time_by_cell, SpatialCollapse, TimeSliceMap, Weighting,
    };
    pub use crate::errors::{GridError, Result};
    pub use crate::fields::{AnnualField, GridCell, GriddedField, SpatialField, TimeSeries};
    pub use crate::masked::MaskedArray;
    pub use crate::netcdf_io::{read_gridded_field, NetCDFWriter};
    pub use crate::parallel::ParallelConfig;
    pub use crate::time::{PartialDate, TimeSlice};
}
