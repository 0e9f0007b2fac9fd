//! Annual climate indicators
//!
//! Both indicators work on the time axis in its stored order and return one
//! value per calendar year, stamped at January 1st. A cell-year containing any
//! missing timestep is missing in the result.

use crate::errors::Result;
use crate::fields::GriddedField;
use crate::masked::MaskedArray;
use crate::time::year_start;
use ndarray::{ArrayView1, Axis, Ix2};

/// Precipitation rate below which a timestep counts as dry (kg m-2 s-1, about 43 mm/day)
pub const DEFAULT_DRY_THRESHOLD: f64 = 0.0005;

const RX5DAY_WINDOW: usize = 5;

/// Longest run of consecutive timesteps with value strictly below `threshold`, per year
///
/// Runs are counted within each calendar year.
///
/// # Errors
///
/// Returns an error if a year has no representable January 1st.
pub fn maximum_consecutive_dry_days(field: &GriddedField, threshold: f64) -> Result<GriddedField> {
    annual_indicator(field, "cdd", |values, valid, indices| {
        if indices.iter().any(|&i| !valid[i]) {
            return None;
        }
        let (longest, _) = indices.iter().fold((0_usize, 0_usize), |(longest, run), &i| {
            if values[i] < threshold {
                (longest.max(run + 1), run + 1)
            } else {
                (longest, 0)
            }
        });
        Some(longest as f64)
    })
}

/// Maximum 5-timestep accumulation per year (RX5day)
///
/// Each rolling window is attributed to the year of its last timestep and may
/// reach back into the previous year. Windows reaching a missing value in the
/// previous year are skipped. A year with no complete window is missing.
///
/// # Errors
///
/// Returns an error if a year has no representable January 1st.
pub fn max_5day_accumulation(field: &GriddedField) -> Result<GriddedField> {
    annual_indicator(field, "rx5day", |values, valid, indices| {
        if indices.iter().any(|&i| !valid[i]) {
            return None;
        }
        indices
            .iter()
            .filter(|&&end| end + 1 >= RX5DAY_WINDOW)
            .filter_map(|&end| {
                let window = end + 1 - RX5DAY_WINDOW..=end;
                if window.clone().all(|j| valid[j]) {
                    Some(window.map(|j| values[j]).sum::<f64>())
                } else {
                    None
                }
            })
            .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s))))
    })
}

/// Evaluate `indicator` on every cell lane once per year
///
/// The closure sees the full lane and the time indices belonging to the year.
fn annual_indicator<F>(field: &GriddedField, suffix: &str, indicator: F) -> Result<GriddedField>
where
    F: Fn(ArrayView1<f64>, ArrayView1<bool>, &[usize]) -> Option<f64> + Sync + Send,
{
    let groups = field.year_groups();

    let planes: Vec<MaskedArray<Ix2>> = groups
        .iter()
        .map(|(_, indices)| {
            field
                .data()
                .reduce_lanes(Axis(0), |values, valid| indicator(values, valid, indices))
        })
        .collect();
    let time = groups
        .iter()
        .map(|(year, _)| year_start(*year))
        .collect::<Result<Vec<_>>>()?;

    let data = MaskedArray::stack_planes(&planes, field.grid().shape())?;
    let mut result = GriddedField::new(data, time, field.grid().clone())?;
    result.name = Some(match &field.name {
        Some(name) => format!("{}_{}", name, suffix),
        None => suffix.to_string(),
    });
    Ok(result)
}
