//! Stacked-bar layout. Segment widths are shares of each row's own total.
//! The payload's footer row is never laid out.

use super::numeric::{percent_of, rounded_percent};
use crate::payload::StackedBar;

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub label: String,
    pub value: f64,
    pub width_pct: f64,
    /// Left edge, as the sum of the preceding segment widths.
    pub offset_pct: f64,
    pub percent: u32,
    pub show_label: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackedRowGeom {
    pub label: String,
    pub total: f64,
    pub segments: Vec<Segment>,
    pub degenerate: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackedLayout {
    pub category_header: String,
    pub segment_labels: Vec<String>,
    pub total_label: String,
    pub rows: Vec<StackedRowGeom>,
}

pub fn layout_stacked(bar: &StackedBar) -> StackedLayout {
    let rows = bar
        .rows
        .iter()
        .map(|row| {
            let (segments, _) = row.segments.iter().enumerate().fold(
                (Vec::with_capacity(row.segments.len()), 0.0_f64),
                |(mut acc, offset), (i, &value)| {
                    let width_pct = percent_of(value, row.total);
                    let percent = rounded_percent(value, row.total);
                    acc.push(Segment {
                        label: bar.segment_labels.get(i).cloned().unwrap_or_default(),
                        value,
                        width_pct,
                        offset_pct: offset,
                        percent,
                        show_label: percent > 0,
                    });
                    (acc, offset + width_pct)
                },
            );
            StackedRowGeom {
                label: row.label.clone(),
                total: row.total,
                segments,
                degenerate: row.total <= 0.0,
            }
        })
        .collect();
    StackedLayout {
        category_header: bar.category_header.clone(),
        segment_labels: bar.segment_labels.clone(),
        total_label: bar.total_label.clone(),
        rows,
    }
}
