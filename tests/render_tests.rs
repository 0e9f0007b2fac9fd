mod common;

use common::{annual_series, single_cell_field, spatial_field};
use grid_collapse::prelude::*;
use grid_collapse::{
    plot_colored_maps, plot_colored_timeseries, LineStyle, MapOverlay, SeriesColor, StyledSeries,
};

#[test]
fn test_plot_colored_maps_titles_each_panel() {
    let fields = vec![("A".to_string(), spatial_field()), ("B".to_string(), spatial_field())];

    let overlay = MapOverlay::default();
    let svg = plot_colored_maps(&fields, "sometitle", "someunits", (0.0, 1.0), &overlay)
        .expect("Failed to render maps");

    assert!(svg.contains("<svg"));
    assert!(svg.contains("sometitle A"));
    assert!(svg.contains("sometitle B"));
    assert!(svg.contains("someunits"));
}

#[test]
fn test_plot_colored_maps_draws_overlay() {
    let fields = vec![("A".to_string(), spatial_field())];
    let overlay = MapOverlay {
        coastlines: vec![vec![(-150.0, 0.0), (150.0, 10.0)]],
        borders: vec![vec![(0.0, -60.0), (0.0, 60.0)]],
    };

    let plain = plot_colored_maps(&fields, "t", "u", (0.0, 1.0), &MapOverlay::default())
        .expect("Failed to render maps");
    let with_overlay = plot_colored_maps(&fields, "t", "u", (0.0, 1.0), &overlay)
        .expect("Failed to render maps");

    assert!(with_overlay.len() > plain.len());
}

#[test]
fn test_plot_colored_maps_draws_overlay_loaded_from_json() {
    let fields = vec![("A".to_string(), spatial_field())];
    let json = r#"{
        "coastlines": [[[-150.0, 0.0], [150.0, 10.0]]],
        "borders": [[[0.0, -60.0], [0.0, 60.0]]]
    }"#;
    let overlay = MapOverlay::from_json(json).expect("Failed to parse overlay");

    let plain = plot_colored_maps(&fields, "t", "u", (0.0, 1.0), &MapOverlay::default())
        .expect("Failed to render maps");
    let with_overlay = plot_colored_maps(&fields, "t", "u", (0.0, 1.0), &overlay)
        .expect("Failed to render maps");

    assert_eq!(overlay.coastlines, vec![vec![(-150.0, 0.0), (150.0, 10.0)]]);
    assert_eq!(overlay.borders.len(), 1);
    assert!(with_overlay.len() > plain.len());
}

#[test]
fn test_plot_colored_maps_skips_missing_cells() {
    let mut values = ndarray::Array2::from_elem((3, 2), 0.5);
    let full = SpatialField::from_values(values.clone(), vec![0.0, 1.0, 2.0], vec![0.0, 1.0])
        .expect("Failed to build field");
    values[[1, 1]] = f64::NAN;
    let holed = SpatialField::from_values(values, vec![0.0, 1.0, 2.0], vec![0.0, 1.0])
        .expect("Failed to build field");

    let count_rects = |field: SpatialField| {
        plot_colored_maps(&[("m".to_string(), field)], "t", "u", (0.0, 1.0), &MapOverlay::default())
            .expect("Failed to render maps")
            .matches("<rect")
            .count()
    };

    assert_eq!(count_rects(full), count_rects(holed) + 1);
}

#[test]
fn test_plot_colored_maps_rejects_bad_input() {
    let fields = vec![("A".to_string(), spatial_field())];

    assert!(matches!(
        plot_colored_maps(&[], "t", "u", (0.0, 1.0), &MapOverlay::default()),
        Err(GridError::InvalidArgument(_))
    ));
    assert!(matches!(
        plot_colored_maps(&fields, "t", "u", (1.0, 1.0), &MapOverlay::default()),
        Err(GridError::InvalidArgument(_))
    ));
}

#[test]
fn test_plot_colored_timeseries_with_legend() {
    let a = annual_series(|y| f64::from(y - 2000));
    let b = annual_series(|y| f64::from(2010 - y));
    let lines = [
        StyledSeries {
            name: "warming",
            data: &a,
            color: "blue".parse().expect("known colour"),
            line_style: ":".parse().expect("known style"),
        },
        StyledSeries {
            name: "cooling",
            data: &b,
            color: "black".parse().expect("known colour"),
            line_style: ":".parse().expect("known style"),
        },
    ];

    let svg = plot_colored_timeseries(&lines, "sometitle", "someunits")
        .expect("Failed to render chart");

    assert!(svg.contains("sometitle"));
    assert!(svg.contains("someunits"));
    assert!(svg.contains("warming"));
    assert!(svg.contains("cooling"));
}

#[test]
fn test_plot_colored_timeseries_of_daily_series() {
    let field = single_cell_field(&[1.0, f64::NAN, 3.0, 4.0]);
    let series = collapse_across_space(&field, Weighting::Gmst).expect("Failed to collapse");
    let lines = [StyledSeries {
        name: "daily",
        data: &series,
        color: SeriesColor(200, 0, 0),
        line_style: LineStyle::Dashed,
    }];

    let svg = plot_colored_timeseries(&lines, "daily mean", "K").expect("Failed to render chart");

    assert!(svg.contains("daily mean"));
}

#[test]
fn test_style_parsing() {
    assert_eq!("--".parse::<LineStyle>().unwrap(), LineStyle::Dashed);
    assert_eq!("dashdot".parse::<LineStyle>().unwrap(), LineStyle::DashDot);
    assert_eq!("#ff8000".parse::<SeriesColor>().unwrap(), SeriesColor(255, 128, 0));
    assert_eq!("k".parse::<SeriesColor>().unwrap(), SeriesColor(0, 0, 0));

    let err = "~~".parse::<LineStyle>().expect_err("unknown style must fail");
    assert!(matches!(err, GridError::UnsupportedStyle { kind: "line style", .. }));
    assert!("chartreuse-ish".parse::<SeriesColor>().is_err());
    assert!("#12345".parse::<SeriesColor>().is_err());
}
