//! Per-cell quantiles of the time series

use crate::errors::{GridError, Result};
use crate::fields::{GridCell, GriddedField};
use log::debug;
use rayon::prelude::*;

/// Quantiles of one cell's time series
#[derive(Debug, Clone, PartialEq)]
pub struct CellQuantiles {
    pub cell: GridCell,
    /// `(level, value)` pairs in the order the levels were requested
    pub quantiles: Vec<(f64, f64)>,
}

impl CellQuantiles {
    /// Value at quantile level `q`, if it was requested
    pub fn get(&self, q: f64) -> Option<f64> {
        self.quantiles
            .iter()
            .find(|(level, _)| (level - q).abs() < 1e-12)
            .map(|&(_, value)| value)
    }
}

/// Quantile results keyed by grid cell, in the order the cells were requested
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellQuantileMap {
    entries: Vec<CellQuantiles>,
}

impl CellQuantileMap {
    pub fn get(&self, cell: GridCell) -> Option<&CellQuantiles> {
        self.entries.iter().find(|e| e.cell == cell)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellQuantiles> {
        self.entries.iter()
    }
}

/// Quantiles `levels` of the full time series at each of `cells`
///
/// Cells are matched exactly against the grid's coordinate labels. Missing
/// values are skipped; a cell with no valid value yields NaN for every level.
/// Quantiles interpolate linearly between order statistics.
///
/// # Errors
///
/// Returns [`GridError::CoordinateNotFound`] if a cell is not on the grid and
/// [`GridError::InvalidArgument`] for a level outside `[0, 1]`.
pub fn quantiles_across_time_by_cell(
    field: &GriddedField,
    levels: &[f64],
    cells: &[GridCell],
) -> Result<CellQuantileMap> {
    if let Some(bad) = levels.iter().find(|q| !(0.0..=1.0).contains(*q)) {
        return Err(GridError::InvalidArgument(format!(
            "quantile level {} is outside [0, 1]",
            bad
        )));
    }

    let entries = cells
        .par_iter()
        .map(|&cell| {
            let series = field.cell_series(cell)?;
            let mut sorted: Vec<f64> = series
                .values()
                .iter()
                .zip(series.validity().iter())
                .filter(|&(_, &m)| m)
                .map(|(&v, _)| v)
                .collect();
            sorted.sort_by(f64::total_cmp);
            debug!(
                "Cell ({}, {}) has {} valid timesteps",
                cell.lat,
                cell.lon,
                sorted.len()
            );

            let quantiles = levels
                .iter()
                .map(|&q| (q, quantile_sorted(&sorted, q)))
                .collect();
            Ok(CellQuantiles { cell, quantiles })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CellQuantileMap { entries })
}

/// Linear-interpolation quantile of sorted data, NaN when empty
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    lerp(sorted[lo], sorted[hi], h - lo as f64)
}

/// Interpolate from whichever end is closer, which keeps the result inside `[a, b]`
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let diff = b - a;
    if t >= 0.5 {
        b - diff * (1.0 - t)
    } else {
        a + diff * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_endpoints_and_median() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile_sorted(&data, 0.0), 1.0);
        assert_eq!(quantile_sorted(&data, 1.0), 5.0);
        assert_eq!(quantile_sorted(&data, 0.5), 3.0);
        assert_eq!(quantile_sorted(&data, 0.25), 2.0);
    }

    #[test]
    fn quantile_interpolates_between_order_statistics() {
        assert!((quantile_sorted(&[0.0, 10.0], 0.3) - 3.0).abs() < 1e-12);
        assert!(quantile_sorted(&[], 0.5).is_nan());
    }
}
