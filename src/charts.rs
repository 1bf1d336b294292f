use std::collections::BTreeMap;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use log::{info, warn};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

use crate::constants::{EXCLUDED_EPS, LARGE_D_RANGE, SMALL_D, WSPD_SIZE_REFERENCE};
use crate::error::{AnalyzerError, Result};
use crate::keys::{Epsilon, RunKey};
use crate::table::Table;

const CHART_SIZE: (u32, u32) = (900, 600);
const CAPTION_FONT: (&str, u32) = ("sans-serif", 28);

/// Depth colors for the stacked bar charts, offset by `12 - d` so the same
/// depth keeps its color across the per-`d` charts.
const DEPTH_PALETTE: [RGBColor; 11] = [
    RGBColor(136, 233, 154),
    RGBColor(224, 42, 97),
    RGBColor(31, 165, 98),
    RGBColor(92, 57, 180),
    RGBColor(169, 232, 26),
    RGBColor(39, 108, 182),
    RGBColor(213, 149, 217),
    RGBColor(17, 93, 82),
    RGBColor(251, 120, 16),
    RGBColor(116, 53, 2),
    RGBColor(113, 211, 244),
];

/// Renders the full chart set into `img_dir` (created if absent, existing
/// images overwritten).
pub fn render_all(
    img_dir: &Path,
    wspd_sizes: &Table,
    covering_error: &Table,
    point_pair_hists: &BTreeMap<u32, Table>,
    geom_error: &Table,
    coverage: &BTreeMap<RunKey, Vec<f64>>,
) -> Result<()> {
    fs::create_dir_all(img_dir)?;

    wspd_size_small_d(img_dir, wspd_sizes)?;
    wspd_size_large_d(img_dir, wspd_sizes)?;
    covering_error_chart(img_dir, covering_error, "covering_error.png", None)?;
    covering_error_chart(
        img_dir,
        covering_error,
        "covering_error_8_12.png",
        Some(LARGE_D_RANGE),
    )?;
    for (&d, hist) in point_pair_hists {
        point_pair_hist(img_dir, d, hist)?;
    }
    geom_error_chart(img_dir, geom_error, "geom_error.png", None)?;
    geom_error_chart(img_dir, geom_error, "geom_error_8_12.png", Some(LARGE_D_RANGE))?;
    coverage_chart(img_dir, coverage)?;

    info!("charts written to {}", img_dir.display());
    Ok(())
}

/// WSPD size over ε for the small fixed `d`, log-x.
fn wspd_size_small_d(img_dir: &Path, sizes: &Table) -> Result<()> {
    let points = series_points(sizes, SMALL_D, None);
    if points.is_empty() {
        return Err(AnalyzerError::MissingKey {
            key: format!("d={SMALL_D}"),
            context: "wspd size",
        });
    }
    let (xmin, xmax) = pad_log(extent(points.iter().map(|p| p.0)));
    let (ymin, ymax) = pad_linear(extent(points.iter().map(|p| p.1)));

    let path = img_dir.join(format!("wspd_size_d{SMALL_D}.png"));
    let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("WSPD size", CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d((xmin..xmax).log_scale(), ymin..ymax)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("epsilon")
        .y_desc("|WSPD|")
        .draw()
        .map_err(plot_err)?;

    let style: ShapeStyle = Palette99::pick(0).stroke_width(2);
    chart
        .draw_series(LineSeries::new(points.iter().copied(), style))
        .map_err(plot_err)?
        .label(format!("d={SMALL_D}"))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], style));
    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 3, Palette99::pick(0).filled())))
        .map_err(plot_err)?;

    draw_legend(&mut chart)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

/// WSPD size over ε for the large `d` range, log-y, with the reference line.
fn wspd_size_large_d(img_dir: &Path, sizes: &Table) -> Result<()> {
    let series = row_series(sizes, Some(&LARGE_D_RANGE), Some(EXCLUDED_EPS));
    if series.is_empty() {
        warn!("no wspd runs with d in 8..=12, skipping wspd_size_d8-12.png");
        return Ok(());
    }
    let (xmin, xmax) = pad_linear(extent(series.iter().flat_map(|(_, p)| p.iter().map(|q| q.0))));
    let y_values = series
        .iter()
        .flat_map(|(_, p)| p.iter().map(|q| q.1))
        .chain([WSPD_SIZE_REFERENCE]);
    let (ymin, ymax) = pad_log(extent(y_values));

    let path = img_dir.join("wspd_size_d8-12.png");
    let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("WSPD size", CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(xmin..xmax, (ymin..ymax).log_scale())
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("epsilon")
        .y_desc("|WSPD|")
        .draw()
        .map_err(plot_err)?;

    for (idx, (label, points)) in series.iter().enumerate() {
        let style: ShapeStyle = Palette99::pick(idx).stroke_width(2);
        chart
            .draw_series(LineSeries::new(points.iter().copied(), style))
            .map_err(plot_err)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], style));
    }
    chart
        .draw_series(DashedLineSeries::new(
            [(xmin, WSPD_SIZE_REFERENCE), (xmax, WSPD_SIZE_REFERENCE)],
            8,
            6,
            RGBColor(128, 128, 128).stroke_width(1),
        ))
        .map_err(plot_err)?;

    draw_legend(&mut chart)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

/// Covering error over ε, log-y, one series per `d`, ε = 0.45 left out.
fn covering_error_chart(
    img_dir: &Path,
    table: &Table,
    file_name: &str,
    d_range: Option<RangeInclusive<u32>>,
) -> Result<()> {
    let series = row_series(table, d_range.as_ref(), Some(EXCLUDED_EPS));
    if series.is_empty() {
        warn!("no covering error data, skipping {file_name}");
        return Ok(());
    }
    let (xmin, xmax) = pad_linear(extent(series.iter().flat_map(|(_, p)| p.iter().map(|q| q.0))));
    let (ymin, ymax) = pad_log(extent(series.iter().flat_map(|(_, p)| p.iter().map(|q| q.1))));

    let path = img_dir.join(file_name);
    let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Covering error", CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(xmin..xmax, (ymin..ymax).log_scale())
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("epsilon")
        .y_desc("covering error (%)")
        .draw()
        .map_err(plot_err)?;

    for (idx, (label, points)) in series.iter().enumerate() {
        let style: ShapeStyle = Palette99::pick(idx).stroke_width(2);
        chart
            .draw_series(LineSeries::new(points.iter().copied(), style))
            .map_err(plot_err)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], style));
    }

    draw_legend(&mut chart)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

/// Mean geometric error over ε, linear axes, one series per `d`.
fn geom_error_chart(
    img_dir: &Path,
    table: &Table,
    file_name: &str,
    d_range: Option<RangeInclusive<u32>>,
) -> Result<()> {
    let series = row_series(table, d_range.as_ref(), None);
    if series.is_empty() {
        warn!("no geometric error data, skipping {file_name}");
        return Ok(());
    }
    let (xmin, xmax) = pad_linear(extent(series.iter().flat_map(|(_, p)| p.iter().map(|q| q.0))));
    let (ymin, ymax) = pad_linear(extent(series.iter().flat_map(|(_, p)| p.iter().map(|q| q.1))));

    let path = img_dir.join(file_name);
    let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Geometric error", CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(xmin..xmax, ymin..ymax)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("epsilon")
        .y_desc("geometric error (%)")
        .draw()
        .map_err(plot_err)?;

    for (idx, (label, points)) in series.iter().enumerate() {
        let style: ShapeStyle = Palette99::pick(idx).stroke_width(2);
        chart
            .draw_series(LineSeries::new(points.iter().copied(), style))
            .map_err(plot_err)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], style));
    }

    draw_legend(&mut chart)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

/// Stacked bar chart of point pairs per depth for one `d`, one bar per ε.
fn point_pair_hist(img_dir: &Path, d: u32, hist: &Table) -> Result<()> {
    // ascending ε on the x axis
    let eps: Vec<Epsilon> = hist.cols().iter().rev().copied().collect();
    let depths: Vec<u32> = hist.rows().to_vec();

    let mut ymax = 0f64;
    for &e in &eps {
        let total: f64 = depths.iter().filter_map(|&dep| hist.get(dep, e)).sum();
        ymax = ymax.max(total);
    }
    if ymax == 0.0 {
        warn!("no point pair data for d={d}, skipping its histogram chart");
        return Ok(());
    }

    let path = img_dir.join(format!("point_pair_hist_d={d}.png"));
    let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let labels: Vec<String> = eps.iter().map(|e| e.to_string()).collect();
    let x_fmt = |seg: &SegmentValue<i32>| match seg {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => labels
            .get(*i as usize)
            .cloned()
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    };

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Point pairs per depth for d={d}"), CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d((0i32..eps.len() as i32).into_segmented(), 0f64..ymax * 1.05)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(eps.len())
        .x_label_formatter(&x_fmt)
        .x_desc("epsilon")
        .y_desc("point pairs")
        .draw()
        .map_err(plot_err)?;

    for (di, &depth) in depths.iter().enumerate() {
        let color = depth_color(d, depth);
        let mut boxes = Vec::new();
        for (i, &e) in eps.iter().enumerate() {
            let Some(value) = hist.get(depth, e) else {
                continue;
            };
            let base: f64 = depths[..di].iter().filter_map(|&below| hist.get(below, e)).sum();
            boxes.push(Rectangle::new(
                [
                    (SegmentValue::Exact(i as i32), base),
                    (SegmentValue::Exact(i as i32 + 1), base + value),
                ],
                color.filled(),
            ));
        }
        chart
            .draw_series(boxes)
            .map_err(plot_err)?
            .label(format!("depth {depth}"))
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    draw_legend(&mut chart)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

/// Coverage over hitting-set size, log-log, one series per `(d, ε)`.
fn coverage_chart(img_dir: &Path, curves: &BTreeMap<RunKey, Vec<f64>>) -> Result<()> {
    let longest = curves.values().map(Vec::len).max().unwrap_or(0);
    if longest == 0 {
        warn!("no iteration data, skipping hit_paths_hist.png");
        return Ok(());
    }
    let ymin = curves
        .values()
        .flatten()
        .copied()
        .filter(|&v| v > 0.0)
        .fold(f64::INFINITY, f64::min);
    let ymin = if ymin.is_finite() { (ymin * 0.8).max(1e-6) } else { 1e-3 };

    let path = img_dir.join("hit_paths_hist.png");
    let root = BitMapBackend::new(&path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Hitting set coverage", CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(
            (1f64..longest as f64 * 1.1).log_scale(),
            (ymin..110f64).log_scale(),
        )
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("hitting set size")
        .y_desc("share of path weight hit (%)")
        .draw()
        .map_err(plot_err)?;

    for (idx, (key, curve)) in curves.iter().enumerate() {
        let points: Vec<(f64, f64)> = curve
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v > 0.0)
            .map(|(i, &v)| ((i + 1) as f64, v))
            .collect();
        let style: ShapeStyle = Palette99::pick(idx).stroke_width(2);
        chart
            .draw_series(LineSeries::new(points, style))
            .map_err(plot_err)?
            .label(key.to_string())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], style));
    }

    draw_legend(&mut chart)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

/// `(ε, value)` points of one table row, ascending ε, missing cells dropped.
fn series_points(table: &Table, row: u32, exclude: Option<Epsilon>) -> Vec<(f64, f64)> {
    table
        .cols()
        .iter()
        .rev()
        .filter(|&&col| Some(col) != exclude)
        .filter_map(|&col| table.get(row, col).map(|v| (col.value(), v)))
        .collect()
}

/// One labeled point series per table row, restricted to `d_range`, rows
/// without remaining data dropped.
fn row_series(
    table: &Table,
    d_range: Option<&RangeInclusive<u32>>,
    exclude: Option<Epsilon>,
) -> Vec<(String, Vec<(f64, f64)>)> {
    table
        .rows()
        .iter()
        .copied()
        .filter(|row| d_range.is_none_or(|range| range.contains(row)))
        .map(|row| (format!("d={row}"), series_points(table, row, exclude)))
        .filter(|(_, points)| !points.is_empty())
        .collect()
}

fn depth_color(d: u32, depth: u32) -> RGBColor {
    let len = DEPTH_PALETTE.len() as i64;
    let idx = (12 - i64::from(d) + i64::from(depth)).rem_euclid(len);
    DEPTH_PALETTE[idx as usize]
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn pad_linear((min, max): (f64, f64)) -> (f64, f64) {
    let span = max - min;
    if span > 0.0 {
        (min - span * 0.05, max + span * 0.05)
    } else {
        (min - min.abs().max(1.0) * 0.1, max + max.abs().max(1.0) * 0.1)
    }
}

fn pad_log((min, max): (f64, f64)) -> (f64, f64) {
    let lo = if min > 0.0 { min * 0.8 } else { 1e-6 };
    let hi = if max > 0.0 { max * 1.25 } else { 1.0 };
    (lo, hi)
}

fn draw_legend<'a, DB, CT>(chart: &mut ChartContext<'a, DB, CT>) -> Result<()>
where
    DB: DrawingBackend + 'a,
    CT: CoordTranslate,
{
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()
        .map_err(plot_err)
}

fn plot_err<E: std::fmt::Display>(err: E) -> AnalyzerError {
    AnalyzerError::Plot(err.to_string())
}
