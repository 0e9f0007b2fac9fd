//! Annual global-mean series

use super::spatial::{SpatialCollapse, Weighting};
use super::temporal::average_across_days_of_year;
use crate::errors::Result;
use crate::fields::{GriddedField, TimeSeries};

/// Collapse a field across the days of each year, then across space
///
/// Returns a series with one GMST-weighted value per calendar year.
///
/// # Errors
///
/// Propagates errors from the year averaging step.
pub fn collapse_to_global_time_series(field: &GriddedField) -> Result<TimeSeries<i32>> {
    let annual = average_across_days_of_year(field)?;
    annual.collapse_across_space(Weighting::Gmst)
}
