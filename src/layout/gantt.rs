//! Gantt layout: bar widths relative to the longest task. No date axis.

use super::numeric::{percent_of, series_max};
use crate::config::LayoutConfig;
use crate::payload::GanttTask;

#[derive(Debug, Clone, PartialEq)]
pub struct GanttBar {
    pub id: String,
    pub name: String,
    pub start: String,
    pub duration: f64,
    /// Width as a percentage of the track; the longest task gets `gantt_max_pct`.
    pub width_pct: f64,
    /// Rendered width, never below `gantt_min_width`.
    pub width_px: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GanttLayout {
    pub bars: Vec<GanttBar>,
    pub max_duration: f64,
    pub track_width: f64,
    pub degenerate: bool,
}

pub fn layout_gantt(tasks: &[GanttTask], cfg: &LayoutConfig) -> GanttLayout {
    let max_duration = series_max(tasks.iter().map(|t| t.duration));
    let bars = tasks
        .iter()
        .map(|t| {
            let width_pct = percent_of(t.duration, max_duration) / 100.0 * cfg.gantt_max_pct;
            let width_px = (width_pct / 100.0 * cfg.gantt_track_width).max(cfg.gantt_min_width);
            GanttBar {
                id: t.id.clone(),
                name: t.name.clone(),
                start: t.start.clone(),
                duration: t.duration,
                width_pct,
                width_px,
            }
        })
        .collect();
    GanttLayout {
        bars,
        max_duration,
        track_width: cfg.gantt_track_width,
        degenerate: max_duration <= 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str, duration: f64) -> GanttTask {
        GanttTask {
            id: name.to_lowercase(),
            name: name.to_string(),
            start: "Mon".to_string(),
            duration,
        }
    }

    #[test]
    fn longest_task_gets_max_pct() {
        let cfg = LayoutConfig::default();
        let layout = layout_gantt(&[task("Hiring", 10.0), task("Review", 5.0)], &cfg);
        assert_eq!(layout.bars[0].width_pct, 60.0);
        assert_eq!(layout.bars[1].width_pct, 30.0);
        assert_eq!(layout.bars[0].width_px, 0.6 * cfg.gantt_track_width);
    }

    #[test]
    fn short_tasks_keep_minimum_width() {
        let cfg = LayoutConfig::default();
        let layout = layout_gantt(&[task("Long", 100.0), task("Tiny", 1.0)], &cfg);
        assert_eq!(layout.bars[1].width_px, cfg.gantt_min_width);
    }

    #[test]
    fn zero_durations_fall_back_to_minimum() {
        let cfg = LayoutConfig::default();
        let layout = layout_gantt(&[task("A", 0.0)], &cfg);
        assert!(layout.degenerate);
        assert_eq!(layout.bars[0].width_pct, 0.0);
        assert_eq!(layout.bars[0].width_px, cfg.gantt_min_width);
    }
}
