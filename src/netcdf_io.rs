//! NetCDF I/O: loading gridded fields and writing reduced results
//!
//! Input variables must have `time`, longitude (`lon`/`longitude`) and latitude
//! (`lat`/`latitude`) dimensions in any order, each with a coordinate variable
//! of the same name. Results are written with coordinate variables, units,
//! `_FillValue` and a `history` attribute.

use crate::aggregation::TimeSliceMap;
use crate::errors::{GridError, Result};
use crate::fields::{GriddedField, SpatialField, SpatialGrid, TimeSeries};
use crate::masked::MaskedArray;
use crate::time::decode_cf_time;
use chrono::{NaiveDateTime, Utc};
use log::{debug, info};
use ndarray::{ArrayD, Ix3, IxDyn};
use netcdf::{create, AttributeValue, File, FileMut, Variable};
use std::{fs, path::Path};

const TIME_NAMES: &[&str] = &["time"];
const LON_NAMES: &[&str] = &["lon", "longitude"];
const LAT_NAMES: &[&str] = &["lat", "latitude"];

/// Fill value written for missing cells
pub const OUTPUT_FILL_VALUE: f64 = 1.0e20;

const OUTPUT_TIME_UNITS: &str = "days since 1970-01-01 00:00:00";

/// Load `var_name` as a `(time, lon, lat)` field
///
/// Cells equal to `_FillValue` or `missing_value`, and non-finite cells, are
/// marked missing. The time axis is decoded from its CF `units` and
/// `calendar` attributes.
///
/// # Errors
///
/// Returns an error if the variable, one of its dimensions or a coordinate
/// variable is missing, if the time axis cannot be decoded, or on NetCDF
/// read failures.
pub fn read_gridded_field(file: &File, var_name: &str) -> Result<GriddedField> {
    let var = file
        .variable(var_name)
        .ok_or_else(|| GridError::VariableNotFound {
            var: var_name.to_string(),
        })?;

    let dim_names: Vec<String> = var
        .dimensions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

    if dim_names.len() != 3 {
        return Err(GridError::InvalidArgument(format!(
            "variable '{}' has dimensions ({}), expected time, lon and lat",
            var_name,
            dim_names.join(", ")
        )));
    }

    let time_axis = find_axis(var_name, &dim_names, TIME_NAMES)?;
    let lon_axis = find_axis(var_name, &dim_names, LON_NAMES)?;
    let lat_axis = find_axis(var_name, &dim_names, LAT_NAMES)?;

    let time_var = coordinate(file, &dim_names[time_axis])?;
    let offsets = time_var.get_values::<f64, _>(..)?;
    let units = string_attribute(&time_var, "units")
        .ok_or_else(|| GridError::InvalidTimeUnits(String::new()))?;
    let calendar = string_attribute(&time_var, "calendar");
    let time = decode_cf_time(&offsets, &units, calendar.as_deref())?;

    let lon = coordinate(file, &dim_names[lon_axis])?.get_values::<f64, _>(..)?;
    let lat = coordinate(file, &dim_names[lat_axis])?.get_values::<f64, _>(..)?;

    debug!("Loading '{}' with shape {:?} ({})", var_name, shape, dim_names.join(", "));
    let raw = ArrayD::from_shape_vec(shape, var.get_values::<f64, _>(..)?)?;
    let values = raw
        .permuted_axes(IxDyn(&[time_axis, lon_axis, lat_axis]))
        .into_dimensionality::<Ix3>()?
        .as_standard_layout()
        .into_owned();

    let data = match fill_value(&var) {
        Some(fill) => MaskedArray::from_fill_value(values, fill),
        None => MaskedArray::from_values(values),
    };
    info!(
        "Loaded '{}': {} timesteps, {} x {} grid, {} valid cells",
        var_name,
        time.len(),
        lon.len(),
        lat.len(),
        data.valid_count()
    );

    let mut field = GriddedField::new(data, time, SpatialGrid::new(lon, lat))?;
    field.name = Some(var_name.to_string());
    field.units = string_attribute(&var, "units");
    Ok(field)
}

fn find_axis(var_name: &str, dim_names: &[String], aliases: &[&str]) -> Result<usize> {
    dim_names
        .iter()
        .position(|d| aliases.contains(&d.as_str()))
        .ok_or_else(|| GridError::DimensionNotFound {
            var: var_name.to_string(),
            dim: aliases[0].to_string(),
        })
}

fn coordinate<'f>(file: &'f File, name: &str) -> Result<Variable<'f>> {
    file.variable(name).ok_or_else(|| GridError::VariableNotFound {
        var: name.to_string(),
    })
}

fn string_attribute(var: &Variable, name: &str) -> Option<String> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// `_FillValue`, falling back to `missing_value`
fn fill_value(var: &Variable) -> Option<f64> {
    ["_FillValue", "missing_value"].iter().find_map(|name| {
        match var.attribute(name)?.value().ok()? {
            AttributeValue::Double(v) => Some(v),
            AttributeValue::Float(v) => Some(f64::from(v)),
            AttributeValue::Int(v) => Some(f64::from(v)),
            AttributeValue::Short(v) => Some(f64::from(v)),
            _ => None,
        }
    })
}

/// Writes reduced fields and series to a new NetCDF file, replacing any existing one
pub struct NetCDFWriter<'a> {
    output_path: &'a Path,
}

impl<'a> NetCDFWriter<'a> {
    pub fn new(output_path: &'a Path) -> Self {
        Self { output_path }
    }

    fn create(&self) -> Result<FileMut> {
        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }
        Ok(create(self.output_path)?)
    }

    /// Write one `(lon, lat)` variable
    pub fn write_spatial_field(&self, var_name: &str, field: &SpatialField) -> Result<()> {
        let mut file = self.create()?;
        add_grid(&mut file, field.grid())?;
        put_masked(&mut file, var_name, &["lon", "lat"], field.data(), field.units.as_deref())?;
        finish(&mut file)?;
        info!("Wrote '{}' to {}", var_name, self.output_path.display());
        Ok(())
    }

    /// Write every time-slice mean as `<prefix>_<start>_<end>` on a shared grid
    pub fn write_time_slices(&self, prefix: &str, slices: &TimeSliceMap) -> Result<()> {
        let mut file = self.create()?;
        if let Some((_, first)) = slices.iter().next() {
            add_grid(&mut file, first.grid())?;
        }
        for (slice, field) in slices.iter() {
            let name = format!("{}_{}", prefix, slice.key());
            put_masked(&mut file, &name, &["lon", "lat"], field.data(), field.units.as_deref())?;
        }
        finish(&mut file)?;
        info!("Wrote {} time slices to {}", slices.len(), self.output_path.display());
        Ok(())
    }

    /// Write a `(time, lon, lat)` variable with a CF-encoded time axis
    pub fn write_gridded_field(&self, var_name: &str, field: &GriddedField) -> Result<()> {
        let mut file = self.create()?;
        file.add_dimension("time", field.time().len())?;
        add_grid(&mut file, field.grid())?;

        let epoch = crate::time::year_start(1970)?;
        let offsets: Vec<f64> = field
            .time()
            .iter()
            .map(|t: &NaiveDateTime| (*t - epoch).num_seconds() as f64 / 86_400.0)
            .collect();
        {
            let mut time_var = file.add_variable::<f64>("time", &["time"])?;
            time_var.put_attribute("units", OUTPUT_TIME_UNITS)?;
            time_var.put_attribute("calendar", "proleptic_gregorian")?;
            time_var.put_values(&offsets, ..)?;
        }

        put_masked(
            &mut file,
            var_name,
            &["time", "lon", "lat"],
            field.data(),
            field.units.as_deref(),
        )?;
        finish(&mut file)?;
        info!("Wrote '{}' to {}", var_name, self.output_path.display());
        Ok(())
    }

    /// Write a year-indexed series
    pub fn write_annual_series(&self, var_name: &str, series: &TimeSeries<i32>) -> Result<()> {
        let mut file = self.create()?;
        file.add_dimension("year", series.len())?;
        {
            let mut year_var = file.add_variable::<i32>("year", &["year"])?;
            year_var.put_values(series.index(), ..)?;
        }
        put_masked(&mut file, var_name, &["year"], series.data(), series.units.as_deref())?;
        finish(&mut file)?;
        info!("Wrote '{}' to {}", var_name, self.output_path.display());
        Ok(())
    }
}

fn add_grid(file: &mut FileMut, grid: &SpatialGrid) -> Result<()> {
    file.add_dimension("lon", grid.lon.len())?;
    file.add_dimension("lat", grid.lat.len())?;
    {
        let mut lon = file.add_variable::<f64>("lon", &["lon"])?;
        lon.put_attribute("units", "degrees_east")?;
        lon.put_values(&grid.lon, ..)?;
    }
    {
        let mut lat = file.add_variable::<f64>("lat", &["lat"])?;
        lat.put_attribute("units", "degrees_north")?;
        lat.put_values(&grid.lat, ..)?;
    }
    Ok(())
}

fn put_masked<D: ndarray::Dimension>(
    file: &mut FileMut,
    var_name: &str,
    dims: &[&str],
    data: &MaskedArray<D>,
    units: Option<&str>,
) -> Result<()> {
    let mut var = file.add_variable::<f64>(var_name, dims)?;
    var.put_attribute("_FillValue", OUTPUT_FILL_VALUE)?;
    if let Some(units) = units {
        var.put_attribute("units", units)?;
    }

    let flat: Vec<f64> = data
        .values()
        .iter()
        .zip(data.validity().iter())
        .map(|(&v, &m)| if m { v } else { OUTPUT_FILL_VALUE })
        .collect();
    var.put_values(&flat, ..)?;
    Ok(())
}

fn finish(file: &mut FileMut) -> Result<()> {
    file.add_attribute(
        "history",
        format!("Created by grid_collapse on {}", Utc::now().to_rfc3339()),
    )?;
    Ok(())
}
