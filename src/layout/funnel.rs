//! Funnel layout. Stages are taken in the order given; the first stage is the
//! baseline every other stage is measured against.

use super::numeric::{percent_of, rounded_percent};
use crate::payload::FunnelStage;

#[derive(Debug, Clone, PartialEq)]
pub struct FunnelStep {
    pub label: String,
    pub value: f64,
    /// Top edge width as a percentage of the track.
    pub width_pct: f64,
    /// Bottom edge width: the next stage's width, or this one's for the last stage.
    pub bottom_pct: f64,
    /// Share of the previous stage that reached this one; `None` for the first stage.
    pub conversion: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunnelLayout {
    pub steps: Vec<FunnelStep>,
    pub baseline: f64,
    pub degenerate: bool,
}

pub fn layout_funnel(stages: &[FunnelStage]) -> FunnelLayout {
    let baseline = stages.first().map(|s| s.value).unwrap_or(0.0);
    let widths: Vec<f64> = stages
        .iter()
        .map(|s| percent_of(s.value, baseline).min(100.0))
        .collect();

    let steps = stages
        .iter()
        .enumerate()
        .map(|(i, stage)| FunnelStep {
            label: stage.label.clone(),
            value: stage.value,
            width_pct: widths[i],
            bottom_pct: widths.get(i + 1).copied().unwrap_or(widths[i]),
            conversion: i
                .checked_sub(1)
                .map(|prev| rounded_percent(stage.value, stages[prev].value)),
        })
        .collect();

    FunnelLayout {
        steps,
        baseline,
        degenerate: baseline <= 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stages(values: &[(&str, f64)]) -> Vec<FunnelStage> {
        values
            .iter()
            .map(|(l, v)| FunnelStage {
                label: l.to_string(),
                value: *v,
            })
            .collect()
    }

    #[test]
    fn widths_relative_to_first_stage() {
        let layout = layout_funnel(&stages(&[
            ("Applied", 400.0),
            ("Screened", 200.0),
            ("Interviewed", 80.0),
            ("Hired", 20.0),
        ]));
        let widths: Vec<f64> = layout.steps.iter().map(|s| s.width_pct).collect();
        assert_eq!(widths, vec![100.0, 50.0, 20.0, 5.0]);
        assert_eq!(layout.steps[0].bottom_pct, 50.0);
        assert_eq!(layout.steps[3].bottom_pct, 5.0);
        assert_eq!(layout.steps[0].conversion, None);
        assert_eq!(layout.steps[2].conversion, Some(40));
    }

    #[test]
    fn does_not_resort_stages() {
        let layout = layout_funnel(&stages(&[("A", 10.0), ("B", 30.0)]));
        assert_eq!(layout.steps[1].label, "B");
        assert_eq!(layout.steps[1].width_pct, 100.0);
    }

    #[test]
    fn zero_baseline_is_degenerate() {
        let layout = layout_funnel(&stages(&[("A", 0.0), ("B", 0.0)]));
        assert!(layout.degenerate);
        assert!(layout.steps.iter().all(|s| s.width_pct == 0.0));
        assert_eq!(layout.steps[1].conversion, Some(0));
    }
}
