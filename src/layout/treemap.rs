//! Treemap layout.
//!
//! Each tile is sized from its share of the total budget, with a floor so
//! small items stay visible and clickable. Below the floor the area is no
//! longer proportional to the value. Tiles are flowed left to right into the
//! container and wrap onto a new shelf when the current one is full.

use super::numeric::{percent_of, series_sum};
use crate::config::LayoutConfig;
use crate::payload::TreemapCell;

#[derive(Debug, Clone, PartialEq)]
pub struct TreemapTile {
    pub category: String,
    pub label: String,
    pub budget: f64,
    pub extra: String,
    pub percentage: f64,
    /// Index of the tile's category in first-seen order, for coloring.
    pub category_index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreemapLayout {
    pub tiles: Vec<TreemapTile>,
    pub categories: Vec<String>,
    pub total: f64,
    pub width: f64,
    pub height: f64,
    pub degenerate: bool,
}

/// Rendered size for a share, never below the configured floor.
pub fn tile_extent(percentage: f64, cfg: &LayoutConfig) -> f64 {
    (percentage * cfg.treemap_scale).max(cfg.treemap_min_size)
}

pub fn layout_treemap(cells: &[TreemapCell], cfg: &LayoutConfig) -> TreemapLayout {
    let total = series_sum(cells.iter().map(|c| c.budget));
    let container = cfg.treemap_container_width;
    let gap = cfg.treemap_gap;

    let mut categories: Vec<String> = Vec::new();
    let mut tiles = Vec::with_capacity(cells.len());
    let (mut x, mut y, mut shelf_height) = (0.0_f64, 0.0_f64, 0.0_f64);

    for cell in cells {
        let percentage = percent_of(cell.budget, total);
        let width = tile_extent(percentage, cfg).min(container);
        let height = tile_extent(percentage, cfg);

        if x > 0.0 && x + width > container {
            x = 0.0;
            y += shelf_height + gap;
            shelf_height = 0.0;
        }

        let category_index = match categories.iter().position(|c| *c == cell.category) {
            Some(idx) => idx,
            None => {
                categories.push(cell.category.clone());
                categories.len() - 1
            }
        };

        tiles.push(TreemapTile {
            category: cell.category.clone(),
            label: cell.label.clone(),
            budget: cell.budget,
            extra: cell.extra.clone(),
            percentage,
            category_index,
            x,
            y,
            width,
            height,
        });

        x += width + gap;
        shelf_height = shelf_height.max(height);
    }

    TreemapLayout {
        tiles,
        categories,
        total,
        width: container,
        height: y + shelf_height,
        degenerate: total <= 0.0,
    }
}
