//! Shared fixtures for the integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use grid_collapse::{daily_axis, GriddedField, SpatialField, TimeSeries};
use ndarray::{Array2, Array3};

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1995, 1, 1).expect("valid start date")
}

/// A `(time, lon, lat)` field on a daily axis starting 1995-01-01
pub fn spatio_temporal_field(values: Array3<f64>, lon: Vec<f64>, lat: Vec<f64>) -> GriddedField {
    let time = daily_axis(start_date(), values.shape()[0]);
    GriddedField::from_values(values, time, lon, lat)
        .expect("Failed to build gridded field")
        .with_name("tas")
        .with_units("K")
}

/// A single-cell field holding `series` at lat 1, lon 1
pub fn single_cell_field(series: &[f64]) -> GriddedField {
    let values = Array3::from_shape_vec((series.len(), 1, 1), series.to_vec())
        .expect("Failed to shape series");
    spatio_temporal_field(values, vec![1.0], vec![1.0])
}

/// Every cell of a `lon.len() x lat.len()` grid holds the same series
pub fn broadcast_field(series: &[f64], lon: Vec<f64>, lat: Vec<f64>) -> GriddedField {
    let values = Array3::from_shape_fn((series.len(), lon.len(), lat.len()), |(t, _, _)| series[t]);
    spatio_temporal_field(values, lon, lat)
}

/// A `(lon, lat)` field of shape 3 x 2 with values increasing across the grid
pub fn spatial_field() -> SpatialField {
    let values = Array2::from_shape_fn((3, 2), |(i, j)| (i * 2 + j) as f64 / 6.0);
    SpatialField::from_values(values, vec![-120.0, 0.0, 120.0], vec![-45.0, 45.0])
        .expect("Failed to build spatial field")
}

/// A yearly series 2000..2010 following `f`
pub fn annual_series(f: impl Fn(i32) -> f64) -> TimeSeries<i32> {
    let years: Vec<i32> = (2000..2010).collect();
    let values = years.iter().map(|&y| f(y)).collect();
    TimeSeries::from_values(years, values).expect("Failed to build series")
}
