//! Rendering of maps and time-series line charts as SVG documents
//!
//! Both renderers return the finished SVG as a `String`; write it wherever the
//! caller wants it. Text is laid out with estimated glyph metrics, so no system
//! fonts are needed.

use crate::errors::{GridError, Result};
use crate::fields::{SeriesLabel, SpatialField, TimeSeries};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

const PANEL_WIDTH: u32 = 480;
const PANEL_HEIGHT: u32 = 360;
const COLORBAR_HEIGHT: u32 = 90;
const COLORBAR_STEPS: usize = 128;
const CHART_SIZE: (u32, u32) = (960, 600);

/// Cividis colour ramp, evenly spaced stops from low to high
const CIVIDIS: [(u8, u8, u8); 9] = [
    (0x00, 0x20, 0x4D),
    (0x00, 0x30, 0x6F),
    (0x3B, 0x49, 0x6C),
    (0x57, 0x5D, 0x6D),
    (0x70, 0x71, 0x73),
    (0x8A, 0x87, 0x79),
    (0xA6, 0x9D, 0x75),
    (0xC4, 0xB5, 0x6C),
    (0xFF, 0xEA, 0x46),
];

fn render_error<E: fmt::Display>(e: E) -> GridError {
    GridError::RenderError(e.to_string())
}

/// Colour of `t` (clamped to `[0, 1]`) on the cividis ramp
pub fn cividis(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (CIVIDIS.len() - 1) as f64;
    let lo = (scaled.floor() as usize).min(CIVIDIS.len() - 2);
    let frac = scaled - lo as f64;
    let (a, b) = (CIVIDIS[lo], CIVIDIS[lo + 1]);
    let mix = |x: u8, y: u8| (f64::from(x) + (f64::from(y) - f64::from(x)) * frac).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Polylines drawn over every map panel, as `(lon, lat)` vertices
///
/// Coastline and border geometry comes from the caller, e.g. a Natural Earth
/// extract already converted to plain coordinates.
#[derive(Debug, Clone, Default)]
pub struct MapOverlay {
    pub coastlines: Vec<Vec<(f64, f64)>>,
    pub borders: Vec<Vec<(f64, f64)>>,
}

impl MapOverlay {
    /// Parse an overlay from JSON
    ///
    /// The document holds optional `"coastlines"` and `"borders"` arrays of
    /// polylines, each polyline an array of `[lon, lat]` pairs:
    ///
    /// ```json
    /// {"coastlines": [[[-10.0, 50.0], [2.0, 51.0]]], "borders": []}
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidArgument`] for malformed JSON or vertices.
    pub fn from_json(text: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(text)
            .map_err(|e| GridError::InvalidArgument(format!("Invalid overlay JSON: {}", e)))?;
        Ok(Self {
            coastlines: polylines(&doc, "coastlines")?,
            borders: polylines(&doc, "borders")?,
        })
    }
}

fn polylines(doc: &Value, key: &str) -> Result<Vec<Vec<(f64, f64)>>> {
    let invalid = || {
        GridError::InvalidArgument(format!("Overlay {} must be [[[lon, lat], ...], ...]", key))
    };
    let lines = match doc.get(key) {
        Some(lines) => lines,
        None => return Ok(Vec::new()),
    };
    lines
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|line| -> Result<Vec<(f64, f64)>> {
            line.as_array()
                .ok_or_else(invalid)?
                .iter()
                .map(|vertex| match vertex.as_array().map(Vec::as_slice) {
                    Some([lon, lat]) => lon.as_f64().zip(lat.as_f64()).ok_or_else(invalid),
                    _ => Err(invalid()),
                })
                .collect()
        })
        .collect()
}

/// Cell boundaries from cell centres; one-cell axes get a width of one degree
fn cell_edges(centres: &[f64]) -> Vec<f64> {
    match centres {
        [] => Vec::new(),
        [c] => vec![c - 0.5, c + 0.5],
        _ => {
            let n = centres.len();
            let mut edges = Vec::with_capacity(n + 1);
            edges.push(centres[0] - (centres[1] - centres[0]) / 2.0);
            edges.extend(centres.windows(2).map(|w| (w[0] + w[1]) / 2.0));
            edges.push(centres[n - 1] + (centres[n - 1] - centres[n - 2]) / 2.0);
            edges
        }
    }
}

fn extent(edges: &[f64]) -> (f64, f64) {
    edges
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &e| (lo.min(e), hi.max(e)))
}

/// Draw one map per named field in a horizontal row, sharing a colour scale
///
/// Every panel is titled `"<title> <name>"`; a single horizontal colour bar
/// labelled with `units` spans `color_range`. Missing cells are left blank.
///
/// # Errors
///
/// Returns [`GridError::InvalidArgument`] for an empty field list, an empty
/// grid or a colour range whose low end is not below its high end, and
/// [`GridError::RenderError`] if drawing fails.
pub fn plot_colored_maps(
    fields: &[(String, SpatialField)],
    title: &str,
    units: &str,
    color_range: (f64, f64),
    overlay: &MapOverlay,
) -> Result<String> {
    if fields.is_empty() {
        return Err(GridError::InvalidArgument("no fields to plot".to_string()));
    }
    let (vmin, vmax) = color_range;
    if !(vmin < vmax) {
        return Err(GridError::InvalidArgument(format!(
            "colour range ({}, {}) is empty",
            vmin, vmax
        )));
    }

    let size = (PANEL_WIDTH * fields.len() as u32, PANEL_HEIGHT + COLORBAR_HEIGHT);
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        let (maps, colorbar) = root.split_vertically(PANEL_HEIGHT as i32);

        for ((name, field), panel) in fields.iter().zip(maps.split_evenly((1, fields.len()))) {
            draw_map_panel(&panel, &format!("{} {}", title, name), field, color_range, overlay)?;
        }
        draw_colorbar(&colorbar, units, color_range)?;
        root.present().map_err(render_error)?;
    }
    Ok(svg)
}

fn draw_map_panel(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    caption: &str,
    field: &SpatialField,
    (vmin, vmax): (f64, f64),
    overlay: &MapOverlay,
) -> Result<()> {
    let lon_edges = cell_edges(&field.grid().lon);
    let lat_edges = cell_edges(&field.grid().lat);
    if lon_edges.is_empty() || lat_edges.is_empty() {
        return Err(GridError::InvalidArgument(format!("'{}' has an empty grid", caption)));
    }
    let (lon_lo, lon_hi) = extent(&lon_edges);
    let (lat_lo, lat_hi) = extent(&lat_edges);

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(lon_lo..lon_hi, lat_lo..lat_hi)
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(5)
        .y_labels(5)
        .draw()
        .map_err(render_error)?;

    let cells = field.data().fold_valid(Vec::new(), |mut cells, (i, j), v| {
        let (x0, x1) = (lon_edges[i].min(lon_edges[i + 1]), lon_edges[i].max(lon_edges[i + 1]));
        let (y0, y1) = (lat_edges[j].min(lat_edges[j + 1]), lat_edges[j].max(lat_edges[j + 1]));
        let color = cividis((v - vmin) / (vmax - vmin));
        cells.push(Rectangle::new([(x0, y1), (x1, y0)], color.filled()));
        cells
    });
    chart.draw_series(cells).map_err(render_error)?;

    for line in &overlay.coastlines {
        chart
            .draw_series(LineSeries::new(line.iter().copied(), BLACK.stroke_width(1)))
            .map_err(render_error)?;
    }
    for line in &overlay.borders {
        chart
            .draw_series(DashedLineSeries::new(
                line.iter().copied(),
                2,
                3,
                RGBColor(60, 60, 60).stroke_width(1),
            ))
            .map_err(render_error)?;
    }
    Ok(())
}

fn draw_colorbar(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    units: &str,
    (vmin, vmax): (f64, f64),
) -> Result<()> {
    let (width, _) = area.dim_in_pixel();
    let side = (f64::from(width) * 0.2) as i32;
    let mut chart = ChartBuilder::on(area)
        .margin_left(side)
        .margin_right(side)
        .margin_top(10)
        .x_label_area_size(45)
        .build_cartesian_2d(vmin..vmax, 0.0..1.0)
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .disable_y_axis()
        .x_labels(6)
        .x_desc(units)
        .draw()
        .map_err(render_error)?;

    let step = (vmax - vmin) / COLORBAR_STEPS as f64;
    chart
        .draw_series((0..COLORBAR_STEPS).map(|i| {
            let x0 = vmin + step * i as f64;
            let color = cividis((i as f64 + 0.5) / COLORBAR_STEPS as f64);
            Rectangle::new([(x0, 1.0), (x0 + step, 0.0)], color.filled())
        }))
        .map_err(render_error)?;
    Ok(())
}

/// Line dash pattern, parsed from matplotlib codes or names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    /// Drawn as long dashes; the SVG backend has no mixed dash patterns
    DashDot,
}

impl FromStr for LineStyle {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "-" | "solid" => Ok(LineStyle::Solid),
            "--" | "dashed" => Ok(LineStyle::Dashed),
            ":" | "dotted" => Ok(LineStyle::Dotted),
            "-." | "dashdot" => Ok(LineStyle::DashDot),
            other => Err(GridError::UnsupportedStyle {
                kind: "line style",
                value: other.to_string(),
            }),
        }
    }
}

/// Line colour, parsed from a colour name, a one-letter code or `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesColor(pub u8, pub u8, pub u8);

impl SeriesColor {
    fn rgb(self) -> RGBColor {
        RGBColor(self.0, self.1, self.2)
    }
}

impl FromStr for SeriesColor {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let unsupported = || GridError::UnsupportedStyle {
            kind: "colour",
            value: s.to_string(),
        };
        let name = s.trim().to_lowercase();

        if let Some(hex) = name.strip_prefix('#') {
            if hex.len() != 6 {
                return Err(unsupported());
            }
            let channel =
                |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| unsupported());
            return Ok(SeriesColor(channel(0)?, channel(2)?, channel(4)?));
        }

        let rgb = match name.as_str() {
            "black" | "k" => (0, 0, 0),
            "white" | "w" => (255, 255, 255),
            "red" | "r" => (214, 39, 40),
            "green" | "g" => (44, 160, 44),
            "blue" | "b" => (31, 119, 180),
            "orange" => (255, 127, 14),
            "purple" => (148, 103, 189),
            "brown" => (140, 86, 75),
            "pink" => (227, 119, 194),
            "grey" | "gray" => (127, 127, 127),
            "olive" => (188, 189, 34),
            "cyan" | "c" => (23, 190, 207),
            "magenta" | "m" => (255, 0, 255),
            "yellow" | "y" => (255, 215, 0),
            "navy" => (0, 0, 128),
            "teal" => (0, 128, 128),
            _ => return Err(unsupported()),
        };
        Ok(SeriesColor(rgb.0, rgb.1, rgb.2))
    }
}

/// One named line in a time-series chart
#[derive(Debug, Clone, Copy)]
pub struct StyledSeries<'a, L> {
    pub name: &'a str,
    pub data: &'a TimeSeries<L>,
    pub color: SeriesColor,
    pub line_style: LineStyle,
}

/// Consecutive valid points; a missing value ends a run
fn valid_runs<L: SeriesLabel>(series: &TimeSeries<L>) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (label, value) in series.points() {
        match value {
            Some(v) => current.push((label.position(), v)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn padded(range: Option<(f64, f64)>, fraction: f64) -> (f64, f64) {
    match range {
        None => (0.0, 1.0),
        Some((lo, hi)) if lo == hi => (lo - 0.5, hi + 0.5),
        Some((lo, hi)) => {
            let pad = (hi - lo) * fraction;
            (lo - pad, hi + pad)
        }
    }
}

fn merge(a: Option<(f64, f64)>, b: Option<(f64, f64)>) -> Option<(f64, f64)> {
    match (a, b) {
        (Some((a0, a1)), Some((b0, b1))) => Some((a0.min(b0), a1.max(b1))),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Overlay one line per series on a single set of axes
///
/// Adds a legend with the series names, `units` as the y label and `title`
/// as the caption. Missing values break a line.
///
/// # Errors
///
/// Returns [`GridError::RenderError`] if drawing fails.
pub fn plot_colored_timeseries<L: SeriesLabel>(
    series: &[StyledSeries<'_, L>],
    title: &str,
    units: &str,
) -> Result<String> {
    let runs: Vec<Vec<Vec<(f64, f64)>>> = series.iter().map(|s| valid_runs(s.data)).collect();
    let points = || runs.iter().flatten().flatten();
    let x_range = points().fold(None, |acc, &(x, _)| merge(acc, Some((x, x))));
    let y_range = points().fold(None, |acc, &(_, y)| merge(acc, Some((y, y))));
    let (x_lo, x_hi) = padded(x_range, 0.0);
    let (y_lo, y_hi) = padded(y_range, 0.05);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
            .map_err(render_error)?;

        chart
            .configure_mesh()
            .y_desc(units)
            .draw()
            .map_err(render_error)?;

        for (styled, lines) in series.iter().zip(&runs) {
            let style = styled.color.rgb().stroke_width(2);
            for line in lines {
                let path = line.iter().copied();
                match styled.line_style {
                    LineStyle::Solid => chart.draw_series(LineSeries::new(path, style)),
                    LineStyle::Dashed => {
                        chart.draw_series(DashedLineSeries::new(path, 8, 5, style))
                    }
                    LineStyle::Dotted => {
                        chart.draw_series(DashedLineSeries::new(path, 2, 4, style))
                    }
                    LineStyle::DashDot => {
                        chart.draw_series(DashedLineSeries::new(path, 14, 6, style))
                    }
                }
                .map_err(render_error)?;
            }

            // Legend entry, drawn once per series even when it has no valid point
            chart
                .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())
                .map_err(render_error)?
                .label(styled.name)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(render_error)?;
        root.present().map_err(render_error)?;
    }
    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_edges_are_midpoints() {
        assert_eq!(cell_edges(&[0.0, 10.0, 20.0]), vec![-5.0, 5.0, 15.0, 25.0]);
        assert_eq!(cell_edges(&[3.0]), vec![2.5, 3.5]);
        assert!(cell_edges(&[]).is_empty());
    }

    #[test]
    fn cividis_endpoints() {
        assert_eq!(cividis(0.0), RGBColor(0x00, 0x20, 0x4D));
        assert_eq!(cividis(1.0), RGBColor(0xFF, 0xEA, 0x46));
        assert_eq!(cividis(7.0), cividis(1.0));
    }

    #[test]
    fn runs_break_at_missing_values() {
        let series =
            TimeSeries::from_values(vec![2000, 2001, 2002, 2003], vec![1.0, f64::NAN, 3.0, 4.0])
                .unwrap();
        let runs = valid_runs(&series);
        assert_eq!(runs, vec![vec![(2000.0, 1.0)], vec![(2002.0, 3.0), (2003.0, 4.0)]]);
    }

    #[test]
    fn overlay_from_json() {
        let overlay = MapOverlay::from_json(
            r#"{"coastlines": [[[-10.0, 50.0], [2, 51.5]], [[0.0, 0.0], [1.0, 1.0]]]}"#,
        )
        .unwrap();
        assert_eq!(overlay.coastlines.len(), 2);
        assert_eq!(overlay.coastlines[0], vec![(-10.0, 50.0), (2.0, 51.5)]);
        assert!(overlay.borders.is_empty());

        assert!(MapOverlay::from_json("{}").unwrap().coastlines.is_empty());
    }

    #[test]
    fn overlay_rejects_malformed_vertices() {
        for text in [
            "not json",
            r#"{"borders": [[[1.0, 2.0, 3.0]]]}"#,
            r#"{"borders": [[["a", 2.0]]]}"#,
            r#"{"coastlines": {"lon": 1.0}}"#,
        ] {
            assert!(matches!(
                MapOverlay::from_json(text),
                Err(GridError::InvalidArgument(_))
            ));
        }
    }
}
