//! Waterfall layout: signed deltas scaled against the largest absolute delta,
//! with fixed-width total rows.

use super::numeric::{ratio, series_max_abs};
use crate::config::LayoutConfig;
use crate::payload::WaterfallStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Total,
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaterfallBar {
    pub label: String,
    pub delta: f64,
    pub running_total: Option<f64>,
    pub polarity: Polarity,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaterfallLayout {
    pub bars: Vec<WaterfallBar>,
    pub max_abs: f64,
    /// Pixels per unit of delta.
    pub scale: f64,
    pub track_width: f64,
    pub degenerate: bool,
}

/// Total rows are recognised by `marker` appearing in the label.
pub fn is_total_row(label: &str, marker: &str) -> bool {
    !marker.is_empty() && label.contains(marker)
}

pub fn layout_waterfall(steps: &[WaterfallStep], cfg: &LayoutConfig) -> WaterfallLayout {
    let marker = cfg.waterfall_total_marker.as_str();
    let track = cfg.waterfall_track_width;
    let max_abs = series_max_abs(
        steps
            .iter()
            .filter(|s| !is_total_row(&s.label, marker))
            .map(|s| s.delta),
    );
    let scale = ratio(track, max_abs).unwrap_or(0.0);

    let bars = steps
        .iter()
        .map(|s| {
            let (polarity, width) = if is_total_row(&s.label, marker) {
                (Polarity::Total, track)
            } else if s.delta < 0.0 {
                (Polarity::Negative, s.delta.abs() * scale)
            } else {
                (Polarity::Positive, s.delta.abs() * scale)
            };
            WaterfallBar {
                label: s.label.clone(),
                delta: s.delta,
                running_total: s.running_total,
                polarity,
                width,
            }
        })
        .collect();

    WaterfallLayout {
        bars,
        max_abs,
        scale,
        track_width: track,
        degenerate: max_abs <= 0.0,
    }
}
