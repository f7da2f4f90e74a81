//! Bar, line, and pie layouts for the `chart` payload kind.

use std::f64::consts::PI;

use super::numeric::{percent_of, ratio, rounded_percent, series_max, series_sum};
use crate::config::LayoutConfig;
use crate::payload::DataPoint;

#[derive(Debug, Clone, PartialEq)]
pub struct BarGeom {
    pub label: String,
    pub value: f64,
    /// Height as a percentage of the track.
    pub height_pct: f64,
    pub height_px: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarLayout {
    pub bars: Vec<BarGeom>,
    pub max: f64,
    pub track_height: f64,
    /// Max is zero: every bar is flat.
    pub degenerate: bool,
}

/// Bar heights are `value / max` of the track; the tallest bar fills it.
pub fn layout_bar(points: &[DataPoint], cfg: &LayoutConfig) -> BarLayout {
    let max = series_max(points.iter().map(|p| p.value));
    let bars = points
        .iter()
        .map(|p| {
            let height_pct = percent_of(p.value.max(0.0), max);
            BarGeom {
                label: p.label.clone(),
                value: p.value,
                height_pct,
                height_px: height_pct / 100.0 * cfg.track_height,
            }
        })
        .collect();
    BarLayout {
        bars,
        max,
        track_height: cfg.track_height,
        degenerate: max <= 0.0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinePoint {
    pub label: String,
    pub value: f64,
    /// Horizontal position as a percentage of the plot width.
    pub x_pct: f64,
    /// Distance from the top of the track, in pixels.
    pub y_px: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    pub points: Vec<LinePoint>,
    pub max: f64,
    pub track_height: f64,
    pub degenerate: bool,
}

/// Points are spread evenly across the width; a lone point is centered.
pub fn layout_line(points: &[DataPoint], cfg: &LayoutConfig) -> LineLayout {
    let max = series_max(points.iter().map(|p| p.value));
    let track = cfg.track_height;
    let last = points.len().saturating_sub(1) as f64;
    let points = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let x_pct = ratio(i as f64, last).map(|r| r * 100.0).unwrap_or(50.0);
            let scaled = ratio(p.value.max(0.0), max).unwrap_or(0.0) * track;
            LinePoint {
                label: p.label.clone(),
                value: p.value,
                x_pct,
                y_px: track - scaled,
            }
        })
        .collect();
    LineLayout {
        points,
        max,
        track_height: track,
        degenerate: max <= 0.0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    /// Degrees, clockwise from the positive x axis.
    pub start_angle: f64,
    pub sweep: f64,
    pub large_arc: bool,
    /// Rounded share, e.g. "25%".
    pub percent_label: String,
}

impl PieSlice {
    pub fn end_angle(&self) -> f64 {
        self.start_angle + self.sweep
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieLayout {
    pub slices: Vec<PieSlice>,
    pub center: (f64, f64),
    pub radius: f64,
    pub total: f64,
    /// Total is zero or not finite: no slices are produced.
    pub degenerate: bool,
}

/// Slices run consecutively from 0°, each spanning `value / total * 360°`.
pub fn layout_pie(points: &[DataPoint], cfg: &LayoutConfig) -> PieLayout {
    let total = series_sum(points.iter().map(|p| p.value.max(0.0)));
    let radius = cfg.pie_radius;
    let center = (radius, radius);

    if !total.is_finite() || total <= 0.0 {
        return PieLayout {
            slices: Vec::new(),
            center,
            radius,
            total,
            degenerate: true,
        };
    }

    let (slices, _) = points.iter().fold(
        (Vec::with_capacity(points.len()), 0.0_f64),
        |(mut acc, start), p| {
            let value = p.value.max(0.0);
            let sweep = ratio(value, total).unwrap_or(0.0) * 360.0;
            acc.push(PieSlice {
                label: p.label.clone(),
                value: p.value,
                start_angle: start,
                sweep,
                large_arc: sweep > 180.0,
                percent_label: format!("{}%", rounded_percent(value, total)),
            });
            (acc, start + sweep)
        },
    );

    PieLayout {
        slices,
        center,
        radius,
        total,
        degenerate: false,
    }
}

/// Point on the circle at `angle` degrees.
pub fn polar(center: (f64, f64), radius: f64, angle: f64) -> (f64, f64) {
    let rad = angle * PI / 180.0;
    (center.0 + radius * rad.cos(), center.1 + radius * rad.sin())
}

/// SVG path for a wedge. A full circle has coincident arc endpoints, which
/// SVG would draw as nothing, so it is split into two half arcs.
pub fn wedge_path(center: (f64, f64), radius: f64, start: f64, sweep: f64) -> String {
    let (cx, cy) = center;
    let (x1, y1) = polar(center, radius, start);
    if sweep >= 360.0 - 1e-9 {
        let (xm, ym) = polar(center, radius, start + 180.0);
        return format!(
            "M {x1:.2} {y1:.2} A {radius:.2} {radius:.2} 0 1 1 {xm:.2} {ym:.2} A {radius:.2} {radius:.2} 0 1 1 {x1:.2} {y1:.2} Z"
        );
    }
    let (x2, y2) = polar(center, radius, start + sweep);
    let large = if sweep > 180.0 { 1 } else { 0 };
    format!(
        "M {cx:.2} {cy:.2} L {x1:.2} {y1:.2} A {radius:.2} {radius:.2} 0 {large} 1 {x2:.2} {y2:.2} Z"
    )
}
