//! Layout engine: pure functions turning typed payloads into geometry.
//!
//! Every function computes the series max (or total, or range) before scaling
//! any item, and routes each division through [`numeric::ratio`], so
//! degenerate series produce zero-size geometry flagged `degenerate` rather
//! than NaN.

pub mod boxplot;
pub mod chart;
pub mod funnel;
pub mod gantt;
pub mod heatmap;
pub mod numeric;
pub mod stacked;
pub mod table;
pub mod treemap;
pub mod waterfall;

use crate::config::LayoutConfig;
use crate::payload::{ChartPayload, ChartType};

pub use boxplot::BoxPlotLayout;
pub use chart::{BarLayout, LineLayout, PieLayout};
pub use funnel::FunnelLayout;
pub use gantt::GanttLayout;
pub use heatmap::HeatmapLayout;
pub use stacked::StackedLayout;
pub use table::TableLayout;
pub use treemap::TreemapLayout;
pub use waterfall::WaterfallLayout;

/// Geometry for one payload, one variant per drawable kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartLayout {
    Table(TableLayout),
    Bar(BarLayout),
    Line(LineLayout),
    Pie(PieLayout),
    Gantt(GanttLayout),
    Waterfall(WaterfallLayout),
    Heatmap(HeatmapLayout),
    Treemap(TreemapLayout),
    Funnel(FunnelLayout),
    BoxPlot(BoxPlotLayout),
    StackedBar(StackedLayout),
}

impl ChartLayout {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Table(_) => "table",
            Self::Bar(_) => "bar",
            Self::Line(_) => "line",
            Self::Pie(_) => "pie",
            Self::Gantt(_) => "gantt",
            Self::Waterfall(_) => "waterfall",
            Self::Heatmap(_) => "heatmap",
            Self::Treemap(_) => "treemap",
            Self::Funnel(_) => "funnel",
            Self::BoxPlot(_) => "boxplot",
            Self::StackedBar(_) => "stackedbar",
        }
    }

    /// True when the series had no usable scale (zero max, total, or range).
    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::Table(_) => false,
            Self::Bar(l) => l.degenerate,
            Self::Line(l) => l.degenerate,
            Self::Pie(l) => l.degenerate,
            Self::Gantt(l) => l.degenerate,
            Self::Waterfall(l) => l.degenerate,
            Self::Heatmap(l) => l.degenerate,
            Self::Treemap(l) => l.degenerate,
            Self::Funnel(l) => l.degenerate,
            Self::BoxPlot(l) => l.rows.iter().any(|r| r.degenerate),
            Self::StackedBar(l) => l.rows.iter().any(|r| r.degenerate),
        }
    }
}

/// Lay out a payload. Text payloads have no geometry.
pub fn layout_payload(payload: &ChartPayload, cfg: &LayoutConfig) -> Option<ChartLayout> {
    let layout = match payload {
        ChartPayload::Text => return None,
        ChartPayload::Table(t) => ChartLayout::Table(table::layout_table(t, cfg)),
        ChartPayload::Chart(c) => match c.chart_type {
            ChartType::Bar => ChartLayout::Bar(chart::layout_bar(&c.data, cfg)),
            ChartType::Line => ChartLayout::Line(chart::layout_line(&c.data, cfg)),
            ChartType::Pie => ChartLayout::Pie(chart::layout_pie(&c.data, cfg)),
        },
        ChartPayload::Gantt(tasks) => ChartLayout::Gantt(gantt::layout_gantt(tasks, cfg)),
        ChartPayload::Waterfall(steps) => {
            ChartLayout::Waterfall(waterfall::layout_waterfall(steps, cfg))
        }
        ChartPayload::Heatmap(h) => ChartLayout::Heatmap(heatmap::layout_heatmap(h, cfg)),
        ChartPayload::Treemap(cells) => ChartLayout::Treemap(treemap::layout_treemap(cells, cfg)),
        ChartPayload::Funnel(stages) => ChartLayout::Funnel(funnel::layout_funnel(stages)),
        ChartPayload::BoxPlot(rows) => ChartLayout::BoxPlot(boxplot::layout_boxplot(rows)),
        ChartPayload::StackedBar(bar) => ChartLayout::StackedBar(stacked::layout_stacked(bar)),
    };
    Some(layout)
}
