mod common;

use chrono::NaiveDate;
use common::{annual_series, spatio_temporal_field};
use grid_collapse::prelude::*;
use ndarray::Array3;
use netcdf::{create, open};
use tempfile::tempdir;

#[test]
fn test_gridded_field_round_trip_keeps_values_and_mask() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("field.nc");

    let mut values = Array3::from_shape_fn((4, 3, 2), |(t, i, j)| (t * 100 + i * 10 + j) as f64);
    values[[1, 2, 0]] = f64::NAN;
    let field = spatio_temporal_field(values, vec![0.0, 120.0, 240.0], vec![-30.0, 30.0]);

    NetCDFWriter::new(&file_path)
        .write_gridded_field("tas", &field)
        .expect("Failed to write field");

    let file = open(&file_path).expect("Failed to open NetCDF file");
    let loaded = read_gridded_field(&file, "tas").expect("Failed to read field");

    assert_eq!(loaded.time(), field.time());
    assert_eq!(loaded.grid(), field.grid());
    assert_eq!(loaded.units.as_deref(), Some("K"));
    assert_eq!(loaded.data().validity(), field.data().validity());
    assert_eq!(loaded.data().get((1, 2, 0)), None);
    assert_eq!(loaded.data().get((3, 1, 1)), Some(311.0));
}

#[test]
fn test_read_permutes_lat_lon_and_decodes_noleap_time() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("noleap.nc");

    // (time, lat, lon) layout on disk, value = lat index * 10 + lon index
    let data: Vec<f64> = vec![
        0.0, 1.0, 2.0, // t0 lat0
        10.0, 11.0, -999.0, // t0 lat1
        0.0, 1.0, 2.0, // t1 lat0
        10.0, 11.0, 12.0, // t1 lat1
    ];
    {
        let mut file = create(&file_path).expect("Failed to create NetCDF file");
        file.add_dimension("time", 2).expect("Failed to add dimension time");
        file.add_dimension("latitude", 2).expect("Failed to add dimension latitude");
        file.add_dimension("longitude", 3).expect("Failed to add dimension longitude");

        let mut time = file
            .add_variable::<f64>("time", &["time"])
            .expect("Failed to add time");
        time.put_attribute("units", "days since 2000-02-28")
            .expect("Failed to set units");
        time.put_attribute("calendar", "noleap")
            .expect("Failed to set calendar");
        time.put_values(&[0.0, 1.0], ..).expect("Failed to write time");

        let mut lat = file
            .add_variable::<f64>("latitude", &["latitude"])
            .expect("Failed to add latitude");
        lat.put_values(&[-45.0, 45.0], ..).expect("Failed to write latitude");

        let mut lon = file
            .add_variable::<f64>("longitude", &["longitude"])
            .expect("Failed to add longitude");
        lon.put_values(&[0.0, 90.0, 180.0], ..).expect("Failed to write longitude");

        let mut var = file
            .add_variable::<f64>("pr", &["time", "latitude", "longitude"])
            .expect("Failed to add variable");
        var.put_attribute("_FillValue", -999.0_f64)
            .expect("Failed to set fill value");
        var.put_values(&data, ..).expect("Failed to write data");
    }

    let file = open(&file_path).expect("Failed to open NetCDF file");
    let field = read_gridded_field(&file, "pr").expect("Failed to read field");

    assert_eq!(field.data().shape(), &[2, 3, 2]);
    assert_eq!(field.grid().lon, vec![0.0, 90.0, 180.0]);
    assert_eq!(field.grid().lat, vec![-45.0, 45.0]);
    // No February 29th in a noleap calendar
    let march_first = NaiveDate::from_ymd_opt(2000, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(field.time()[1], march_first);

    assert_eq!(field.data().get((0, 1, 1)), Some(11.0));
    assert_eq!(field.data().get((0, 2, 0)), Some(2.0));
    assert_eq!(field.data().get((0, 2, 1)), None);
    assert_eq!(field.data().get((1, 2, 1)), Some(12.0));
}

#[test]
fn test_missing_variable_is_reported() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("empty.nc");
    {
        let mut file = create(&file_path).expect("Failed to create NetCDF file");
        file.add_dimension("time", 1).expect("Failed to add dimension");
    }

    let file = open(&file_path).expect("Failed to open NetCDF file");
    let err = read_gridded_field(&file, "tas").expect_err("missing variable must fail");

    assert!(matches!(err, GridError::VariableNotFound { ref var } if var == "tas"));
}

#[test]
fn test_time_slices_are_written_as_separate_variables() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("slices.nc");

    let values = Array3::from_elem((720, 2, 2), 1.0);
    let field = spatio_temporal_field(values, vec![0.0, 180.0], vec![-45.0, 45.0]);
    let slices = [TimeSlice::years(1995, 1995), TimeSlice::years(1996, 1996)];
    let means = collapse_multiple_time_ranges(&field, &slices).expect("Failed to collapse ranges");

    NetCDFWriter::new(&file_path)
        .write_time_slices("tas", &means)
        .expect("Failed to write slices");

    let file = open(&file_path).expect("Failed to open NetCDF file");
    for name in ["tas_1995_1995", "tas_1996_1996"] {
        let var = file.variable(name).expect("slice variable present");
        let values = var.get_values::<f64, _>(..).expect("Failed to read slice");
        assert_eq!(values, vec![1.0; 4]);
    }
}

#[test]
fn test_annual_series_writes_fill_for_missing_years() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("series.nc");

    let series = annual_series(|y| if y == 2003 { f64::NAN } else { f64::from(y) });
    NetCDFWriter::new(&file_path)
        .write_annual_series("tas_global", &series)
        .expect("Failed to write series");

    let file = open(&file_path).expect("Failed to open NetCDF file");
    let years = file
        .variable("year")
        .expect("year coordinate present")
        .get_values::<i32, _>(..)
        .expect("Failed to read years");
    assert_eq!(years, (2000..2010).collect::<Vec<_>>());

    let values = file
        .variable("tas_global")
        .expect("series present")
        .get_values::<f64, _>(..)
        .expect("Failed to read series");
    assert_eq!(values[3], grid_collapse::OUTPUT_FILL_VALUE);
    assert_eq!(values[0], 2000.0);
}

#[test]
fn test_spatial_field_is_written_on_its_grid() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("map.nc");

    let mut field = common::spatial_field();
    field.units = Some("K".to_string());
    NetCDFWriter::new(&file_path)
        .write_spatial_field("tas_mean", &field)
        .expect("Failed to write map");

    let file = open(&file_path).expect("Failed to open NetCDF file");
    let lon = file
        .variable("lon")
        .expect("lon present")
        .get_values::<f64, _>(..)
        .expect("Failed to read lon");
    assert_eq!(lon, vec![-120.0, 0.0, 120.0]);

    let var = file.variable("tas_mean").expect("map present");
    let dims: Vec<String> = var.dimensions().iter().map(|d| d.name().to_string()).collect();
    assert_eq!(dims, vec!["lon", "lat"]);
    let values = var.get_values::<f64, _>(..).expect("Failed to read map");
    assert_eq!(values.len(), 6);
    assert!((values[5] - 5.0 / 6.0).abs() < 1e-12);
}
