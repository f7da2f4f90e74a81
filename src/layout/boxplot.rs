//! Box-plot layout. Each row is scaled against its own min..max range.

use super::numeric::ratio;
use crate::payload::BoxPlotRow;

#[derive(Debug, Clone, PartialEq)]
pub struct BoxGeom {
    pub category: String,
    pub stats: BoxPlotRow,
    pub box_left_pct: f64,
    pub box_width_pct: f64,
    pub median_pct: f64,
    /// min == max: the box collapses to a zero-width marker at the center.
    pub degenerate: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxPlotLayout {
    pub rows: Vec<BoxGeom>,
}

pub fn layout_box(row: &BoxPlotRow) -> BoxGeom {
    let range = row.max - row.min;
    let pos = |v: f64| ratio(v - row.min, range).map(|r| (r * 100.0).clamp(0.0, 100.0));
    match (pos(row.q1), pos(row.q3), pos(row.median)) {
        (Some(q1), Some(q3), Some(median)) if range > 0.0 => BoxGeom {
            category: row.category.clone(),
            stats: row.clone(),
            box_left_pct: q1,
            box_width_pct: (q3 - q1).max(0.0),
            median_pct: median,
            degenerate: false,
        },
        _ => BoxGeom {
            category: row.category.clone(),
            stats: row.clone(),
            box_left_pct: 50.0,
            box_width_pct: 0.0,
            median_pct: 50.0,
            degenerate: true,
        },
    }
}

pub fn layout_boxplot(rows: &[BoxPlotRow]) -> BoxPlotLayout {
    BoxPlotLayout {
        rows: rows.iter().map(layout_box).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(min: f64, q1: f64, median: f64, q3: f64, max: f64) -> BoxPlotRow {
        BoxPlotRow {
            category: "Eng".to_string(),
            min,
            q1,
            median,
            q3,
            max,
        }
    }

    #[test]
    fn quartiles_map_to_percentages() {
        let geom = layout_box(&row(40.0, 55.0, 65.0, 80.0, 140.0));
        assert_eq!(geom.box_left_pct, 15.0);
        assert_eq!(geom.box_width_pct, 25.0);
        assert_eq!(geom.median_pct, 25.0);
        assert!(!geom.degenerate);
    }

    #[test]
    fn median_stays_within_track() {
        for (min, median, max) in [(0.0, 0.0, 1.0), (0.0, 1.0, 1.0), (-5.0, 2.0, 9.0)] {
            let geom = layout_box(&row(min, min, median, max, max));
            assert!((0.0..=100.0).contains(&geom.median_pct));
        }
    }

    #[test]
    fn zero_range_is_special_cased() {
        let geom = layout_box(&row(70.0, 70.0, 70.0, 70.0, 70.0));
        assert!(geom.degenerate);
        assert_eq!(geom.median_pct, 50.0);
        assert_eq!(geom.box_width_pct, 0.0);
        assert!(geom.box_left_pct.is_finite());
    }
}
