//! Entry point for the gridcollapse application.
//! Handles CLI parsing, field loading, and dispatches the requested summaries.

use clap::Parser;
use grid_collapse::prelude::*;
use grid_collapse::{
    get_parallel_info, max_5day_accumulation, maximum_consecutive_dry_days, plot_colored_maps,
    plot_colored_timeseries, LineStyle, MapOverlay, SeriesColor, StyledSeries,
};
use log::{debug, info};
use netcdf::open;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

mod cli;

use cli::Args;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    ParallelConfig::new(args.threads).setup_global_pool()?;
    let parallel = get_parallel_info();
    debug!(
        "Using {} threads on {} available cores",
        parallel.current_threads, parallel.available_cores
    );

    if !args.json {
        println!(
            r#"
------------------------------------------------------------------
                     gridcollapse
        Summaries of gridded climate-model output
------------------------------------------------------------------
"#
        );
    }

    let weighting: Weighting = args.weighting.parse()?;

    // Open NetCDF file
    let file = open(&args.file)?;
    info!("Opened NetCDF file: {}", args.file.display());
    let field = read_gridded_field(&file, &args.var)?;

    let units = args
        .units
        .clone()
        .or_else(|| field.units.clone())
        .unwrap_or_default();
    let outputs = Outputs::new(args.output_netcdf.as_deref(), requested_operations(&args));
    let mut report = Map::new();

    if args.global_series {
        let series = collapse_to_global_time_series(&field)?;
        report.insert("global_series".into(), annual_json(&series));
        if let Some(path) = outputs.path("global") {
            NetCDFWriter::new(&path)
                .write_annual_series(&format!("{}_global", args.var), &series)?;
            println!("✅ Saved global series to {}", path.display());
        } else if !args.json {
            println!("Global mean (GMST):");
            print_annual(&series);
        }

        if let Some(svg_path) = &args.plot_series {
            let lines = [StyledSeries {
                name: &args.var,
                data: &series,
                color: SeriesColor(0, 0, 0),
                line_style: LineStyle::Solid,
            }];
            let title = format!("Global mean {}", args.var);
            let svg = plot_colored_timeseries(&lines, &title, &units)?;
            fs::write(svg_path, svg)?;
            println!("✅ Saved chart to {}", svg_path.display());
        }
    }

    if args.annual_mean {
        let annual = average_across_days_of_year(&field)?;
        let series = collapse_across_space(&annual, weighting)?;
        report.insert("annual_mean".into(), annual_json(&series));
        if let Some(path) = outputs.path("annual_mean") {
            NetCDFWriter::new(&path)
                .write_annual_series(&format!("{}_annual", args.var), &series)?;
            println!("✅ Saved annual means to {}", path.display());
        } else if !args.json {
            println!("Annual mean:");
            print_annual(&series);
        }
    }

    if let Some(threshold) = args.count_above {
        let counts = count_above_threshold_by_year(&field, threshold)?;
        write_or_print_gridded(
            &outputs,
            "count",
            &format!("{}_count", args.var),
            &counts,
            weighting,
            &mut report,
            args.json,
        )?;
    }

    if let Some(threshold) = args.dry_days {
        let cdd = maximum_consecutive_dry_days(&field, threshold)?;
        write_or_print_gridded(
            &outputs,
            "cdd",
            &format!("{}_cdd", args.var),
            &cdd,
            weighting,
            &mut report,
            args.json,
        )?;
    }

    if args.rx5day {
        let rx5 = max_5day_accumulation(&field)?;
        write_or_print_gridded(
            &outputs,
            "rx5day",
            &format!("{}_rx5day", args.var),
            &rx5,
            weighting,
            &mut report,
            args.json,
        )?;
    }

    if let Some(slices) = &args.slices {
        let slices = if slices.is_empty() {
            TimeSlice::default_slices()
        } else {
            slices.clone()
        };
        let means = collapse_multiple_time_ranges(&field, &slices)?;

        let summary: Map<String, Value> = means
            .iter()
            .map(|(slice, mean)| {
                let global = collapse_across_space(mean, weighting);
                (slice.key(), json!(finite(global)))
            })
            .collect();
        report.insert("slices".into(), Value::Object(summary));

        if let Some(path) = outputs.path("slices") {
            NetCDFWriter::new(&path).write_time_slices(&args.var, &means)?;
            println!("✅ Saved {} time slices to {}", means.len(), path.display());
        } else if !args.json {
            for (slice, mean) in means.iter() {
                println!(
                    "  {}: global mean {:.4}, {} valid cells",
                    slice.key(),
                    collapse_across_space(mean, weighting),
                    mean.data().valid_count()
                );
            }
        }

        if let Some(svg_path) = &args.plot_maps {
            let color_range = match args.color_range {
                Some(range) => range,
                None => shared_range(&means).unwrap_or((0.0, 1.0)),
            };
            let overlay = match &args.overlay {
                Some(path) => MapOverlay::from_json(&fs::read_to_string(path)?)?,
                None => MapOverlay::default(),
            };
            let svg =
                plot_colored_maps(&means.into_named(), &args.var, &units, color_range, &overlay)?;
            fs::write(svg_path, svg)?;
            println!("✅ Saved maps to {}", svg_path.display());
        }
    }

    if let (Some(levels), Some(cells)) = (&args.quantiles, &args.cells) {
        let quantiles = quantiles_across_time_by_cell(&field, levels, cells)?;
        let cells_json: Vec<Value> = quantiles
            .iter()
            .map(|q| {
                json!({
                    "lat": q.cell.lat,
                    "lon": q.cell.lon,
                    "quantiles": q
                        .quantiles
                        .iter()
                        .map(|&(level, value)| json!({"q": level, "value": finite(value)}))
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        report.insert("quantiles".into(), Value::Array(cells_json));

        if !args.json {
            for q in quantiles.iter() {
                println!("Quantiles at lat {}, lon {}:", q.cell.lat, q.cell.lon);
                for (level, value) in &q.quantiles {
                    println!("  q{:<6} {:.4}", level, value);
                }
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&Value::Object(report))?);
    }

    Ok(())
}

fn requested_operations(args: &Args) -> usize {
    [
        args.global_series,
        args.annual_mean,
        args.count_above.is_some(),
        args.dry_days.is_some(),
        args.rx5day,
        args.slices.is_some(),
    ]
    .iter()
    .filter(|&&requested| requested)
    .count()
}

/// NetCDF destinations; with several operations each gets a suffixed file
struct Outputs<'a> {
    base: Option<&'a Path>,
    suffixed: bool,
}

impl<'a> Outputs<'a> {
    fn new(base: Option<&'a Path>, operations: usize) -> Self {
        Self {
            base,
            suffixed: operations > 1,
        }
    }

    fn path(&self, operation: &str) -> Option<PathBuf> {
        let base = self.base?;
        if !self.suffixed {
            return Some(base.to_path_buf());
        }
        let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
        Some(base.with_file_name(format!("{}_{}.nc", stem, operation)))
    }
}

fn write_or_print_gridded(
    outputs: &Outputs,
    operation: &str,
    var_name: &str,
    field: &GriddedField,
    weighting: Weighting,
    report: &mut Map<String, Value>,
    quiet: bool,
) -> Result<()> {
    let series = collapse_across_space(field, weighting)?;
    let by_year: Map<String, Value> = series
        .points()
        .map(|(t, v)| (t.format("%Y").to_string(), json!(v)))
        .collect();
    report.insert(operation.to_string(), Value::Object(by_year));

    if let Some(path) = outputs.path(operation) {
        NetCDFWriter::new(&path).write_gridded_field(var_name, field)?;
        println!("✅ Saved {} to {}", var_name, path.display());
    } else if !quiet {
        println!("{} (global mean per year):", var_name);
        for (t, v) in series.points() {
            println!("  {}: {}", t.format("%Y"), format_value(v));
        }
    }
    Ok(())
}

fn shared_range(means: &TimeSliceMap) -> Option<(f64, f64)> {
    means
        .iter()
        .filter_map(|(_, field)| field.data().valid_range())
        .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
        .filter(|(lo, hi)| lo < hi)
}

fn annual_json(series: &TimeSeries<i32>) -> Value {
    let by_year: Map<String, Value> = series
        .points()
        .map(|(year, v)| (year.to_string(), json!(v)))
        .collect();
    Value::Object(by_year)
}

fn print_annual(series: &TimeSeries<i32>) {
    for (year, value) in series.points() {
        println!("  {}: {}", year, format_value(value));
    }
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "missing".to_string(), |v| format!("{:.4}", v))
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}
