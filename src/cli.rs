//! Command-line interface options for gridcollapse

use clap::Parser;
use grid_collapse::{GridCell, TimeSlice};
use std::path::PathBuf;

/// Summaries of gridded climate-model output stored in NetCDF files
#[derive(Parser, Debug)]
#[command(
    version,
    name = "gridcollapse",
    about = "Spatial means, time-slice means, annual aggregates and quantiles of climate fields"
)]
pub struct Args {
    /// Path to the NetCDF file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Variable with time, lon and lat dimensions
    #[arg(long)]
    pub var: String,

    /// Print the annual, GMST-weighted global mean series
    #[arg(long)]
    pub global_series: bool,

    /// Print the mean of each year, averaged over the grid
    #[arg(long)]
    pub annual_mean: bool,

    /// Count, per year, the timesteps above this threshold
    #[arg(long)]
    pub count_above: Option<f64>,

    /// Longest annual run of timesteps below this threshold
    #[arg(long)]
    pub dry_days: Option<f64>,

    /// Maximum 5-timestep accumulation per year
    #[arg(long)]
    pub rx5day: bool,

    /// Time slices to average over, formatted as <start>:<end>[,<start>:<end>...].
    /// Without values: 2020:2040,2040:2060,2060:2080,2080:2100
    #[arg(long, value_parser = parse_slice_arg, value_delimiter = ',', num_args = 0..)]
    pub slices: Option<Vec<TimeSlice>>,

    /// Quantile levels, formatted as q1,q2,...
    #[arg(long, value_delimiter = ',', requires = "cells")]
    pub quantiles: Option<Vec<f64>>,

    /// Grid cells for --quantiles, formatted as lat:lon[;lat:lon...]
    #[arg(long, value_parser = parse_cell_arg, value_delimiter = ';')]
    pub cells: Option<Vec<GridCell>>,

    /// Spatial weighting scheme
    #[arg(long, default_value = "GMST")]
    pub weighting: String,

    /// Render the time-slice means as maps into this SVG file
    #[arg(long, requires = "slices")]
    pub plot_maps: Option<PathBuf>,

    /// Coastline and border polylines for --plot-maps, as JSON
    /// ({"coastlines": [[[lon, lat], ...]], "borders": [...]}); maps have no overlay without it
    #[arg(long, requires = "plot_maps")]
    pub overlay: Option<PathBuf>,

    /// Colour range for --plot-maps, formatted as <low>:<high>
    #[arg(long, value_parser = parse_range_arg)]
    pub color_range: Option<(f64, f64)>,

    /// Render the global series as a line chart into this SVG file
    #[arg(long, requires = "global_series")]
    pub plot_series: Option<PathBuf>,

    /// Units label for plots; defaults to the variable's units attribute
    #[arg(long)]
    pub units: Option<String>,

    /// Path to save results as NetCDF. If not set, prints to terminal.
    #[arg(long)]
    pub output_netcdf: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long)]
    pub threads: Option<usize>,
}

fn parse_slice_arg(s: &str) -> Result<TimeSlice, String> {
    s.parse::<TimeSlice>()
        .map_err(|e| format!("{}; expected '<start>:<end>'", e))
}

fn parse_cell_arg(s: &str) -> Result<GridCell, String> {
    parse_pair(s)
        .map(|(lat, lon)| GridCell::new(lat, lon))
        .ok_or_else(|| format!("Invalid cell '{}': expected '<lat>:<lon>'", s))
}

fn parse_range_arg(s: &str) -> Result<(f64, f64), String> {
    parse_pair(s).ok_or_else(|| "Invalid format: Expected '<low>:<high>'.".to_string())
}

fn parse_pair(s: &str) -> Option<(f64, f64)> {
    let (a, b) = s.split_once(':')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}
