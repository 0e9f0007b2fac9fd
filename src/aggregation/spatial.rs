//! Latitude-weighted reductions over the horizontal grid
//!
//! With [`Weighting::Gmst`] each cell is weighted by `cos(lat · π/180)`, the
//! usual approximation of cell area on a sphere for global mean surface
//! temperature. Weights of missing cells are zero, so they drop out of both
//! the numerator and the denominator:
//!
//! ```text
//! mean = Σ value·w / Σ w     over valid cells
//! ```

use crate::errors::{GridError, Result};
use crate::fields::{AnnualField, GriddedField, SpatialField, SpatialGrid, TimeSeries};
use crate::masked::MaskedArray;
use chrono::NaiveDateTime;
use ndarray::{Array2, ArrayView2, Axis, Ix1, Ix3, Zip};
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;

/// Spatial weighting scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Weighting {
    /// Cosine-of-latitude weights
    #[default]
    Gmst,
}

impl FromStr for Weighting {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GMST" => Ok(Weighting::Gmst),
            other => Err(GridError::UnsupportedWeighting(other.to_string())),
        }
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weighting::Gmst => write!(f, "GMST"),
        }
    }
}

/// Weight field for `grid`: latitude weights broadcast over longitude, zeroed
/// wherever `valid` is false
pub fn masked_weights(grid: &SpatialGrid, valid: ArrayView2<bool>) -> Array2<f64> {
    let lat_weights = grid.lat_weights();
    Zip::indexed(valid).map_collect(|(_, lat), &m| if m { lat_weights[lat] } else { 0.0 })
}

fn weighted_mean(
    values: ArrayView2<f64>,
    valid: ArrayView2<bool>,
    grid: &SpatialGrid,
) -> Option<f64> {
    let weights = masked_weights(grid, valid);
    let numerator = Zip::from(values)
        .and(&weights)
        .and(valid)
        .fold(0.0_f64, |acc, &v, &w, &m| if m { acc + v * w } else { acc });
    let denominator = weights.sum();

    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

fn collapse_planes(data: &MaskedArray<Ix3>, grid: &SpatialGrid) -> MaskedArray<Ix1> {
    let values = data.values();
    let valid = data.validity();

    let means: Vec<Option<f64>> = (0..data.shape()[0])
        .into_par_iter()
        .map(|i| {
            weighted_mean(
                values.index_axis(Axis(0), i),
                valid.index_axis(Axis(0), i),
                grid,
            )
        })
        .collect();

    MaskedArray::from_values(means.into_iter().map(|m| m.unwrap_or(f64::NAN)).collect())
}

/// Fields that can be collapsed over their longitude and latitude axes
pub trait SpatialCollapse {
    type Output;

    fn collapse_across_space(&self, weighting: Weighting) -> Self::Output;
}

/// A single map collapses to a scalar; NaN when no cell is valid
impl SpatialCollapse for SpatialField {
    type Output = f64;

    fn collapse_across_space(&self, weighting: Weighting) -> f64 {
        match weighting {
            Weighting::Gmst => weighted_mean(
                self.data().values().view(),
                self.data().validity().view(),
                self.grid(),
            )
            .unwrap_or(f64::NAN),
        }
    }
}

impl SpatialCollapse for AnnualField {
    type Output = Result<TimeSeries<i32>>;

    fn collapse_across_space(&self, weighting: Weighting) -> Self::Output {
        let data = match weighting {
            Weighting::Gmst => collapse_planes(self.data(), self.grid()),
        };
        let mut series = TimeSeries::new(self.years().to_vec(), data)?;
        series.name = self.name.clone();
        series.units = self.units.clone();
        Ok(series)
    }
}

impl SpatialCollapse for GriddedField {
    type Output = Result<TimeSeries<NaiveDateTime>>;

    fn collapse_across_space(&self, weighting: Weighting) -> Self::Output {
        let data = match weighting {
            Weighting::Gmst => collapse_planes(self.data(), self.grid()),
        };
        let mut series = TimeSeries::new(self.time().to_vec(), data)?;
        series.name = self.name.clone();
        series.units = self.units.clone();
        Ok(series)
    }
}

/// Weighted mean over longitude and latitude
///
/// The weighting scheme is chosen by value; parse it from a string with
/// `"GMST".parse::<Weighting>()`, which rejects every unknown scheme.
pub fn collapse_across_space<F: SpatialCollapse>(field: &F, weighting: Weighting) -> F::Output {
    field.collapse_across_space(weighting)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn weights_are_zero_where_values_are_missing() {
        let grid = SpatialGrid::new(vec![0.0, 10.0], vec![0.0, 60.0]);
        let valid = array![[true, false], [true, true]];
        let w = masked_weights(&grid, valid.view());
        assert_eq!(w[[0, 0]], 1.0);
        assert_eq!(w[[0, 1]], 0.0);
        assert!((w[[1, 1]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn weighting_parses_only_gmst() {
        assert_eq!("GMST".parse::<Weighting>().unwrap(), Weighting::Gmst);
        assert_eq!(Weighting::Gmst.to_string(), "GMST");
        assert!("gmst".parse::<Weighting>().is_err());
    }
}
