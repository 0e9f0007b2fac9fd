//! Labeled gridded fields
//!
//! Fields pair a [`MaskedArray`] with coordinate labels. Axis order is fixed:
//! a leading time or year axis (when present), then longitude, then latitude.

use crate::errors::{GridError, Result};
use crate::masked::MaskedArray;
use crate::time::fractional_year;
use chrono::{Datelike, NaiveDateTime};
use ndarray::{Array1, Array2, Array3, Axis, Ix1, Ix2, Ix3};
use std::collections::BTreeMap;

/// Tolerance, in degrees, for exact coordinate lookups
pub const COORDINATE_TOLERANCE: f64 = 1e-9;

/// A `(lat, lon)` coordinate pair naming one grid cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub lat: f64,
    pub lon: f64,
}

impl GridCell {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<(f64, f64)> for GridCell {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

/// Longitude and latitude labels of a regular horizontal grid, in degrees
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialGrid {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
}

impl SpatialGrid {
    pub fn new(lon: Vec<f64>, lat: Vec<f64>) -> Self {
        Self { lon, lat }
    }

    /// `(n_lon, n_lat)`
    pub fn shape(&self) -> (usize, usize) {
        (self.lon.len(), self.lat.len())
    }

    /// `cos(lat · π/180)` for every latitude label
    pub fn lat_weights(&self) -> Array1<f64> {
        self.lat.iter().map(|lat| lat.to_radians().cos()).collect()
    }

    /// Index of the longitude label equal to `lon`
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CoordinateNotFound`] if no label matches.
    pub fn lon_index(&self, lon: f64) -> Result<usize> {
        locate("lon", &self.lon, lon)
    }

    /// Index of the latitude label equal to `lat`
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CoordinateNotFound`] if no label matches.
    pub fn lat_index(&self, lat: f64) -> Result<usize> {
        locate("lat", &self.lat, lat)
    }

    fn check_plane(&self, found: &[usize]) -> Result<()> {
        let (n_lon, n_lat) = self.shape();
        if found != &[n_lon, n_lat][..] {
            return Err(GridError::ShapeMismatch {
                expected: vec![n_lon, n_lat],
                found: found.to_vec(),
            });
        }
        Ok(())
    }
}

fn locate(axis: &'static str, labels: &[f64], value: f64) -> Result<usize> {
    labels
        .iter()
        .position(|&label| (label - value).abs() <= COORDINATE_TOLERANCE)
        .ok_or(GridError::CoordinateNotFound { axis, value })
}

/// A `(time, lon, lat)` field
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedField {
    time: Vec<NaiveDateTime>,
    grid: SpatialGrid,
    data: MaskedArray<Ix3>,
    pub name: Option<String>,
    pub units: Option<String>,
}

impl GriddedField {
    /// # Errors
    ///
    /// Returns [`GridError::ShapeMismatch`] if the data shape disagrees with
    /// the coordinate labels.
    pub fn new(
        data: MaskedArray<Ix3>,
        time: Vec<NaiveDateTime>,
        grid: SpatialGrid,
    ) -> Result<Self> {
        grid.check_plane(&data.shape()[1..])?;
        check_leading(data.shape(), time.len())?;
        Ok(Self {
            time,
            grid,
            data,
            name: None,
            units: None,
        })
    }

    /// Build a field from raw values; NaN marks missing cells
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ShapeMismatch`] if the data shape disagrees with
    /// the coordinate labels.
    pub fn from_values(
        values: Array3<f64>,
        time: Vec<NaiveDateTime>,
        lon: Vec<f64>,
        lat: Vec<f64>,
    ) -> Result<Self> {
        Self::new(MaskedArray::from_values(values), time, SpatialGrid::new(lon, lat))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn time(&self) -> &[NaiveDateTime] {
        &self.time
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn data(&self) -> &MaskedArray<Ix3> {
        &self.data
    }

    /// Time indices grouped by calendar year, years ascending
    pub fn year_groups(&self) -> Vec<(i32, Vec<usize>)> {
        let mut groups: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for (i, t) in self.time.iter().enumerate() {
            groups.entry(t.year()).or_default().push(i);
        }
        groups.into_iter().collect()
    }

    /// Time series of one grid cell
    ///
    /// # Errors
    ///
    /// Returns [`GridError::CoordinateNotFound`] if `cell` is not on the grid.
    pub fn cell_series(&self, cell: GridCell) -> Result<MaskedArray<Ix1>> {
        let lon = self.grid.lon_index(cell.lon)?;
        let lat = self.grid.lat_index(cell.lat)?;
        Ok(self.data.index_axis(Axis(1), lon).index_axis(Axis(1), lat))
    }
}

/// A `(year, lon, lat)` field
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualField {
    years: Vec<i32>,
    grid: SpatialGrid,
    data: MaskedArray<Ix3>,
    pub name: Option<String>,
    pub units: Option<String>,
}

impl AnnualField {
    /// # Errors
    ///
    /// Returns [`GridError::ShapeMismatch`] if the data shape disagrees with
    /// the coordinate labels.
    pub fn new(data: MaskedArray<Ix3>, years: Vec<i32>, grid: SpatialGrid) -> Result<Self> {
        grid.check_plane(&data.shape()[1..])?;
        check_leading(data.shape(), years.len())?;
        Ok(Self {
            years,
            grid,
            data,
            name: None,
            units: None,
        })
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn data(&self) -> &MaskedArray<Ix3> {
        &self.data
    }
}

/// A `(lon, lat)` field with no time axis
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialField {
    grid: SpatialGrid,
    data: MaskedArray<Ix2>,
    pub name: Option<String>,
    pub units: Option<String>,
}

impl SpatialField {
    /// # Errors
    ///
    /// Returns [`GridError::ShapeMismatch`] if the data shape disagrees with
    /// the coordinate labels.
    pub fn new(data: MaskedArray<Ix2>, grid: SpatialGrid) -> Result<Self> {
        grid.check_plane(data.shape())?;
        Ok(Self {
            grid,
            data,
            name: None,
            units: None,
        })
    }

    /// Build a field from raw values; NaN marks missing cells
    ///
    /// # Errors
    ///
    /// Returns [`GridError::ShapeMismatch`] if the data shape disagrees with
    /// the coordinate labels.
    pub fn from_values(values: Array2<f64>, lon: Vec<f64>, lat: Vec<f64>) -> Result<Self> {
        Self::new(MaskedArray::from_values(values), SpatialGrid::new(lon, lat))
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn data(&self) -> &MaskedArray<Ix2> {
        &self.data
    }
}

/// Position of a series label on a plot's x axis
pub trait SeriesLabel {
    fn position(&self) -> f64;
}

impl SeriesLabel for i32 {
    fn position(&self) -> f64 {
        f64::from(*self)
    }
}

impl SeriesLabel for NaiveDateTime {
    fn position(&self) -> f64 {
        fractional_year(self)
    }
}

/// A 1-D series indexed by labels `L` (years or timestamps)
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries<L> {
    index: Vec<L>,
    data: MaskedArray<Ix1>,
    pub name: Option<String>,
    pub units: Option<String>,
}

impl<L> TimeSeries<L> {
    /// # Errors
    ///
    /// Returns [`GridError::ShapeMismatch`] if `index` and `data` differ in length.
    pub fn new(index: Vec<L>, data: MaskedArray<Ix1>) -> Result<Self> {
        check_leading(data.shape(), index.len())?;
        Ok(Self {
            index,
            data,
            name: None,
            units: None,
        })
    }

    /// # Errors
    ///
    /// Returns [`GridError::ShapeMismatch`] if `index` and `values` differ in length.
    pub fn from_values(index: Vec<L>, values: Vec<f64>) -> Result<Self> {
        Self::new(index, MaskedArray::from_values(Array1::from(values)))
    }

    pub fn index(&self) -> &[L] {
        &self.index
    }

    pub fn data(&self) -> &MaskedArray<Ix1> {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Value at position `i`, `None` when missing
    pub fn get(&self, i: usize) -> Option<f64> {
        self.data.get(i)
    }

    /// `(label, value)` pairs, missing values as `None`
    pub fn points(&self) -> impl Iterator<Item = (&L, Option<f64>)> + '_ {
        self.index
            .iter()
            .enumerate()
            .map(move |(i, label)| (label, self.data.get(i)))
    }
}

impl<L: PartialEq> TimeSeries<L> {
    /// Value labelled `label`, `None` when absent or missing
    pub fn value_at(&self, label: &L) -> Option<f64> {
        let i = self.index.iter().position(|l| l == label)?;
        self.data.get(i)
    }
}

fn check_leading(shape: &[usize], labels: usize) -> Result<()> {
    if shape.first().copied() != Some(labels) {
        let mut expected = shape.to_vec();
        if let Some(first) = expected.first_mut() {
            *first = labels;
        }
        return Err(GridError::ShapeMismatch {
            expected,
            found: shape.to_vec(),
        });
    }
    Ok(())
}
