//! Reductions along the time axis

use crate::errors::Result;
use crate::fields::{AnnualField, GriddedField, SpatialField};
use crate::masked::MaskedArray;
use crate::time::{year_start, TimeSlice};
use log::{debug, warn};
use ndarray::Axis;

/// Replace the time axis with a year axis holding each year's mean
///
/// One row per distinct calendar year in the input, ascending. Missing
/// values are skipped; a cell with no valid value in a year is missing.
///
/// # Errors
///
/// Returns an error only if the reduced planes cannot be reassembled, which
/// indicates an inconsistent input field.
pub fn average_across_days_of_year(field: &GriddedField) -> Result<AnnualField> {
    let groups = field.year_groups();
    debug!("Averaging {} timesteps into {} years", field.time().len(), groups.len());

    let planes: Vec<MaskedArray<_>> = groups
        .iter()
        .map(|(_, indices)| field.data().select_axis(Axis(0), indices).mean_axis(Axis(0)))
        .collect();
    let years = groups.iter().map(|(year, _)| *year).collect();

    let data = MaskedArray::stack_planes(&planes, field.grid().shape())?;
    let mut annual = AnnualField::new(data, years, field.grid().clone())?;
    annual.name = field.name.clone();
    annual.units = field.units.clone();
    Ok(annual)
}

/// Count, per year and cell, the timesteps whose value is strictly above `threshold`
///
/// The result keeps a time axis, one timestamp per year at January 1st, so it
/// can be fed to anything expecting a time-indexed field. Missing values are
/// never counted.
///
/// # Errors
///
/// Returns an error if a year has no representable January 1st or the counts
/// cannot be reassembled.
pub fn count_above_threshold_by_year(field: &GriddedField, threshold: f64) -> Result<GriddedField> {
    let groups = field.year_groups();

    let planes: Vec<MaskedArray<_>> = groups
        .iter()
        .map(|(_, indices)| {
            field
                .data()
                .select_axis(Axis(0), indices)
                .count_axis(Axis(0), |v| v > threshold)
        })
        .collect();
    let time = groups
        .iter()
        .map(|(year, _)| year_start(*year))
        .collect::<Result<Vec<_>>>()?;

    let data = MaskedArray::stack_planes(&planes, field.grid().shape())?;
    let mut counts = GriddedField::new(data, time, field.grid().clone())?;
    counts.name = field.name.clone();
    Ok(counts)
}

/// Mean over the inclusive range `slice`, with the time axis dropped
///
/// A range matching no timestamp yields a field with every cell missing.
///
/// # Errors
///
/// Returns an error only for an inconsistent input field.
pub fn collapse_time_range(field: &GriddedField, slice: &TimeSlice) -> Result<SpatialField> {
    let indices: Vec<usize> = field
        .time()
        .iter()
        .enumerate()
        .filter(|(_, t)| slice.contains(t))
        .map(|(i, _)| i)
        .collect();

    if indices.is_empty() {
        warn!("Time slice {} matches no timestamps; result is all missing", slice);
    } else {
        debug!("Time slice {} selects {} timesteps", slice, indices.len());
    }

    let data = field.data().select_axis(Axis(0), &indices).mean_axis(Axis(0));
    let mut collapsed = SpatialField::new(data, field.grid().clone())?;
    collapsed.name = field.name.clone();
    collapsed.units = field.units.clone();
    Ok(collapsed)
}

/// Time-slice means keyed by the slice they cover, in insertion order
#[derive(Debug, Clone, Default)]
pub struct TimeSliceMap {
    entries: Vec<(TimeSlice, SpatialField)>,
}

impl TimeSliceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the field for `slice`
    pub fn insert(&mut self, slice: TimeSlice, field: SpatialField) {
        match self.entries.iter_mut().find(|(s, _)| *s == slice) {
            Some(entry) => entry.1 = field,
            None => self.entries.push((slice, field)),
        }
    }

    pub fn get(&self, slice: &TimeSlice) -> Option<&SpatialField> {
        self.entries.iter().find(|(s, _)| s == slice).map(|(_, f)| f)
    }

    /// Look up by the `"<start>_<end>"` key, e.g. `"2020_2040"`
    pub fn get_by_key(&self, key: &str) -> Option<&SpatialField> {
        self.entries
            .iter()
            .find(|(s, _)| s.key() == key)
            .map(|(_, f)| f)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get_by_key(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TimeSlice, &SpatialField)> {
        self.entries.iter().map(|(s, f)| (s, f))
    }

    /// Fields labelled by their slice key, ready for map rendering
    pub fn into_named(self) -> Vec<(String, SpatialField)> {
        self.entries
            .into_iter()
            .map(|(s, f)| (s.key(), f))
            .collect()
    }
}

/// Apply [`collapse_time_range`] once per slice
///
/// Pass [`TimeSlice::default_slices`] for the 2020-2100 twenty-year periods.
///
/// # Errors
///
/// Returns an error only for an inconsistent input field.
pub fn collapse_multiple_time_ranges(
    field: &GriddedField,
    slices: &[TimeSlice],
) -> Result<TimeSliceMap> {
    let mut results = TimeSliceMap::new();
    for slice in slices {
        results.insert(*slice, collapse_time_range(field, slice)?);
    }
    Ok(results)
}
