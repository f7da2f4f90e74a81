//! Heatmap layout: one global maximum for the whole matrix.

use super::numeric::{ratio, series_max};
use crate::config::LayoutConfig;
use crate::payload::Heatmap;

/// Alpha of a zero-valued cell, so the grid stays visible.
const MIN_ALPHA: f64 = 0.08;

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapCell {
    pub value: f64,
    /// `value / global_max`, in [0, 1].
    pub intensity: f64,
    pub alpha: f64,
    /// Foreground flips to the light color on dark cells.
    pub light_text: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapLayout {
    pub row_header: String,
    pub columns: Vec<String>,
    pub row_labels: Vec<String>,
    pub cells: Vec<Vec<HeatmapCell>>,
    pub global_max: f64,
    pub degenerate: bool,
}

pub fn intensity_alpha(intensity: f64) -> f64 {
    MIN_ALPHA + (1.0 - MIN_ALPHA) * intensity.clamp(0.0, 1.0)
}

pub fn layout_heatmap(heatmap: &Heatmap, cfg: &LayoutConfig) -> HeatmapLayout {
    let global_max = series_max(heatmap.rows.iter().flat_map(|r| r.values.iter().copied()));
    let threshold = cfg.heatmap_text_threshold * global_max;
    let cells = heatmap
        .rows
        .iter()
        .map(|row| {
            row.values
                .iter()
                .map(|&value| {
                    let intensity = ratio(value, global_max).unwrap_or(0.0).clamp(0.0, 1.0);
                    HeatmapCell {
                        value,
                        intensity,
                        alpha: intensity_alpha(intensity),
                        light_text: global_max > 0.0 && value > threshold,
                    }
                })
                .collect()
        })
        .collect();
    HeatmapLayout {
        row_header: heatmap.row_header.clone(),
        columns: heatmap.columns.clone(),
        row_labels: heatmap.rows.iter().map(|r| r.label.clone()).collect(),
        cells,
        global_max,
        degenerate: global_max <= 0.0,
    }
}
