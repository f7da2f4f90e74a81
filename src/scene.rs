//! Scene emission: turns a [`ChartLayout`] into a flat list of positioned
//! primitives that every sink (SVG, PNG, terminal canvas) draws the same way.
//!
//! Coordinates are pixels with the origin at the top-left corner and y
//! growing downwards.

use color_eyre::eyre::eyre;
use color_eyre::Result;

use crate::config::{ChartColorConfig, LayoutConfig};
use crate::layout::chart::{BarLayout, LineLayout, PieLayout};
use crate::layout::numeric::{format_signed, format_value, nice_ticks};
use crate::layout::waterfall::Polarity;
use crate::layout::{
    BoxPlotLayout, ChartLayout, FunnelLayout, GanttLayout, HeatmapLayout, StackedLayout,
    TableLayout, TreemapLayout, WaterfallLayout,
};

const MARGIN: f64 = 16.0;
const TITLE_HEIGHT: f64 = 28.0;
const AXIS_WIDTH: f64 = 44.0;
const AXIS_LABEL_HEIGHT: f64 = 20.0;
const TEXT_SIZE: f64 = 12.0;
const SMALL_TEXT_SIZE: f64 = 10.0;
const TITLE_SIZE: f64 = 14.0;
const MAX_TICKS: usize = 5;
const LEGEND_SWATCH: f64 = 12.0;

/// Color with straight (non-premultiplied) alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> Result<Self> {
        let invalid = || eyre!("Invalid hex color: '{}'. Expected #rrggbb or #rrggbbaa", s);
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(invalid());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let a = if hex.len() == 8 {
            byte(6)? as f64 / 255.0
        } else {
            1.0
        };
        Ok(Self {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a,
        })
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// CSS color: `#rrggbb` when opaque, `rgba(...)` otherwise.
    pub fn css(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("rgba({},{},{},{:.3})", self.r, self.g, self.b, self.a)
        }
    }

    /// Composite onto an opaque background, for sinks without alpha.
    pub fn blend_over(&self, bg: Rgba) -> Rgba {
        let mix = |fg: u8, bg: u8| (fg as f64 * self.a + bg as f64 * (1.0 - self.a)).round() as u8;
        Rgba::rgb(mix(self.r, bg.r), mix(self.g, bg.g), mix(self.b, bg.b))
    }
}

/// Parsed `theme.chart` colors.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPalette {
    pub series: Vec<Rgba>,
    pub positive: Rgba,
    pub negative: Rgba,
    pub neutral: Rgba,
    pub heatmap_base: Rgba,
    pub text_light: Rgba,
    pub text_dark: Rgba,
    pub grid: Rgba,
    pub background: Rgba,
    pub label: Rgba,
}

impl ChartPalette {
    pub fn from_config(config: &ChartColorConfig) -> Result<Self> {
        if config.series.is_empty() {
            return Err(eyre!("theme.chart.series must contain at least one color"));
        }
        let parse = |name: &str, value: &str| {
            Rgba::from_hex(value).map_err(|e| eyre!("Invalid chart color '{}': {}", name, e))
        };
        Ok(Self {
            series: config
                .series
                .iter()
                .map(|c| parse("series", c))
                .collect::<Result<_>>()?,
            positive: parse("positive", &config.positive)?,
            negative: parse("negative", &config.negative)?,
            neutral: parse("neutral", &config.neutral)?,
            heatmap_base: parse("heatmap_base", &config.heatmap_base)?,
            text_light: parse("text_light", &config.text_light)?,
            text_dark: parse("text_dark", &config.text_dark)?,
            grid: parse("grid", &config.grid)?,
            background: parse("background", &config.background)?,
            label: parse("label", &config.label)?,
        })
    }

    /// Series color `i`, cycling through the palette.
    pub fn series(&self, i: usize) -> Rgba {
        self.series
            .get(i % self.series.len().max(1))
            .copied()
            .unwrap_or(self.neutral)
    }

    pub fn polarity(&self, polarity: Polarity) -> Rgba {
        match polarity {
            Polarity::Total => self.neutral,
            Polarity::Positive => self.positive,
            Polarity::Negative => self.negative,
        }
    }
}

impl Default for ChartPalette {
    fn default() -> Self {
        Self::from_config(&ChartColorConfig::default()).unwrap_or_else(|_| Self {
            series: vec![Rgba::rgb(59, 130, 246)],
            positive: Rgba::rgb(34, 197, 94),
            negative: Rgba::rgb(239, 68, 68),
            neutral: Rgba::rgb(100, 116, 139),
            heatmap_base: Rgba::rgb(37, 99, 235),
            text_light: Rgba::rgb(255, 255, 255),
            text_dark: Rgba::rgb(31, 41, 55),
            grid: Rgba::rgb(229, 231, 235),
            background: Rgba::rgb(255, 255, 255),
            label: Rgba::rgb(55, 65, 81),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    pub fn svg(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Rgba,
    },
    Polygon {
        points: Vec<(f64, f64)>,
        fill: Rgba,
    },
    Polyline {
        points: Vec<(f64, f64)>,
        stroke: Rgba,
        width: f64,
    },
    /// Pie wedge; a sweep of 360° is a full disc.
    Wedge {
        cx: f64,
        cy: f64,
        radius: f64,
        start: f64,
        sweep: f64,
        fill: Rgba,
    },
    /// `y` is the text baseline.
    Text {
        x: f64,
        y: f64,
        content: String,
        color: Rgba,
        anchor: Anchor,
        size: f64,
    },
}

impl Primitive {
    fn translate(&mut self, dx: f64, dy: f64) {
        match self {
            Primitive::Rect { x, y, .. }
            | Primitive::Text { x, y, .. }
            | Primitive::Wedge { cx: x, cy: y, .. } => {
                *x += dx;
                *y += dy;
            }
            Primitive::Polygon { points, .. } | Primitive::Polyline { points, .. } => {
                for p in points.iter_mut() {
                    p.0 += dx;
                    p.1 += dy;
                }
            }
        }
    }
}

/// A drawable chart: fixed canvas size and primitives in paint order.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub title: Option<String>,
    pub background: Rgba,
    pub items: Vec<Primitive>,
}

impl Scene {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|p| match p {
            Primitive::Text { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }
}

/// Primitive collector for one chart body, sized as it grows.
struct Canvas<'a> {
    palette: &'a ChartPalette,
    items: Vec<Primitive>,
}

impl<'a> Canvas<'a> {
    fn new(palette: &'a ChartPalette) -> Self {
        Self {
            palette,
            items: Vec::new(),
        }
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: Rgba) {
        self.items.push(Primitive::Rect {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
            fill,
        });
    }

    fn text(&mut self, x: f64, y: f64, content: impl Into<String>, anchor: Anchor) {
        let color = self.palette.label;
        self.text_styled(x, y, content, anchor, color, TEXT_SIZE);
    }

    fn text_styled(
        &mut self,
        x: f64,
        y: f64,
        content: impl Into<String>,
        anchor: Anchor,
        color: Rgba,
        size: f64,
    ) {
        self.items.push(Primitive::Text {
            x,
            y,
            content: content.into(),
            color,
            anchor,
            size,
        });
    }

    /// Swatch plus caption, returns the x after the entry.
    fn legend_entry(&mut self, x: f64, y: f64, color: Rgba, caption: &str, char_width: f64) -> f64 {
        self.rect(x, y - LEGEND_SWATCH + 2.0, LEGEND_SWATCH, LEGEND_SWATCH, color);
        self.text(x + LEGEND_SWATCH + 4.0, y, caption, Anchor::Start);
        x + LEGEND_SWATCH + 4.0 + caption.chars().count() as f64 * char_width + 12.0
    }

    /// Horizontal gridlines with tick labels for a value axis of height `track`.
    fn value_grid(&mut self, x0: f64, top: f64, width: f64, track: f64, max: f64) {
        if max <= 0.0 {
            self.rect(x0, top + track, width, 1.0, self.palette.grid);
            return;
        }
        for tick in nice_ticks(0.0, max, MAX_TICKS) {
            let y = top + track - tick / max * track;
            self.rect(x0, y, width, 1.0, self.palette.grid);
            let color = self.palette.label;
            self.text_styled(
                x0 - 6.0,
                y + SMALL_TEXT_SIZE / 2.0,
                format_value(tick),
                Anchor::End,
                color,
                SMALL_TEXT_SIZE,
            );
        }
    }
}

/// Build the scene for a layout. The title, when given, is drawn above the body.
pub fn build_scene(
    layout: &ChartLayout,
    palette: &ChartPalette,
    cfg: &LayoutConfig,
    title: Option<&str>,
) -> Scene {
    let mut canvas = Canvas::new(palette);
    let (width, height) = match layout {
        ChartLayout::Table(l) => table_scene(&mut canvas, l),
        ChartLayout::Bar(l) => bar_scene(&mut canvas, l, cfg),
        ChartLayout::Line(l) => line_scene(&mut canvas, l, cfg),
        ChartLayout::Pie(l) => pie_scene(&mut canvas, l, cfg),
        ChartLayout::Gantt(l) => gantt_scene(&mut canvas, l, cfg),
        ChartLayout::Waterfall(l) => waterfall_scene(&mut canvas, l, cfg),
        ChartLayout::Heatmap(l) => heatmap_scene(&mut canvas, l, cfg),
        ChartLayout::Treemap(l) => treemap_scene(&mut canvas, l, cfg),
        ChartLayout::Funnel(l) => funnel_scene(&mut canvas, l, cfg),
        ChartLayout::BoxPlot(l) => boxplot_scene(&mut canvas, l, cfg),
        ChartLayout::StackedBar(l) => stacked_scene(&mut canvas, l, cfg),
    };

    let mut items = canvas.items;
    let title = title.filter(|t| !t.trim().is_empty()).map(str::to_string);
    let offset = if title.is_some() { TITLE_HEIGHT } else { 0.0 };
    if offset > 0.0 {
        for item in items.iter_mut() {
            item.translate(0.0, offset);
        }
    }
    if let Some(t) = &title {
        items.insert(
            0,
            Primitive::Text {
                x: MARGIN,
                y: MARGIN + TITLE_SIZE / 2.0,
                content: t.clone(),
                color: palette.text_dark,
                anchor: Anchor::Start,
                size: TITLE_SIZE,
            },
        );
    }

    Scene {
        width: width.ceil(),
        height: (height + offset).ceil(),
        title,
        background: palette.background,
        items,
    }
}

fn table_scene(c: &mut Canvas, l: &TableLayout) -> (f64, f64) {
    let rh = l.row_height;
    let baseline = |row: usize| MARGIN + row as f64 * rh + rh * 0.65;
    c.rect(MARGIN, MARGIN, l.width, rh, c.palette.grid);
    for col in &l.columns {
        let color = c.palette.text_dark;
        c.text_styled(
            MARGIN + col.x + 12.0,
            baseline(0),
            col.header.clone(),
            Anchor::Start,
            color,
            TEXT_SIZE,
        );
    }
    for (r, row) in l.rows.iter().enumerate() {
        let y = MARGIN + (r + 1) as f64 * rh;
        c.rect(MARGIN, y + rh - 1.0, l.width, 1.0, c.palette.grid);
        for (col, cell) in l.columns.iter().zip(row) {
            c.text(MARGIN + col.x + 12.0, baseline(r + 1), cell.clone(), Anchor::Start);
        }
    }
    (l.width + MARGIN * 2.0, l.height + MARGIN * 2.0)
}

fn bar_scene(c: &mut Canvas, l: &BarLayout, cfg: &LayoutConfig) -> (f64, f64) {
    let x0 = MARGIN + AXIS_WIDTH;
    let plot_w = (cfg.chart_width - x0 - MARGIN).max(0.0);
    let top = MARGIN + SMALL_TEXT_SIZE;
    let track = l.track_height;
    c.value_grid(x0, top, plot_w, track, l.max);

    let n = l.bars.len().max(1) as f64;
    let slot = plot_w / n;
    let color = c.palette.series(0);
    for (i, bar) in l.bars.iter().enumerate() {
        let x = x0 + i as f64 * slot + slot * 0.2;
        let w = slot * 0.6;
        c.rect(x, top + track - bar.height_px, w, bar.height_px, color);
        let label_color = c.palette.label;
        c.text_styled(
            x + w / 2.0,
            top + track - bar.height_px - 4.0,
            format_value(bar.value),
            Anchor::Middle,
            label_color,
            SMALL_TEXT_SIZE,
        );
        c.text(x + w / 2.0, top + track + 16.0, bar.label.clone(), Anchor::Middle);
    }
    (cfg.chart_width, top + track + AXIS_LABEL_HEIGHT + MARGIN)
}

fn line_scene(c: &mut Canvas, l: &LineLayout, cfg: &LayoutConfig) -> (f64, f64) {
    let x0 = MARGIN + AXIS_WIDTH;
    let plot_w = (cfg.chart_width - x0 - MARGIN * 2.0).max(0.0);
    let top = MARGIN + SMALL_TEXT_SIZE;
    let track = l.track_height;
    c.value_grid(x0, top, plot_w + MARGIN, track, l.max);

    let color = c.palette.series(0);
    let points: Vec<(f64, f64)> = l
        .points
        .iter()
        .map(|p| (x0 + MARGIN / 2.0 + p.x_pct / 100.0 * plot_w, top + p.y_px))
        .collect();
    if points.len() > 1 {
        c.items.push(Primitive::Polyline {
            points: points.clone(),
            stroke: color,
            width: 2.0,
        });
    }
    for (p, (x, y)) in l.points.iter().zip(points) {
        c.items.push(Primitive::Wedge {
            cx: x,
            cy: y,
            radius: 3.0,
            start: 0.0,
            sweep: 360.0,
            fill: color,
        });
        c.text(x, top + track + 16.0, p.label.clone(), Anchor::Middle);
    }
    (cfg.chart_width, top + track + AXIS_LABEL_HEIGHT + MARGIN)
}

fn pie_scene(c: &mut Canvas, l: &PieLayout, cfg: &LayoutConfig) -> (f64, f64) {
    let cx = MARGIN + l.center.0;
    let cy = MARGIN + l.center.1;
    if l.slices.is_empty() {
        let fill = c.palette.grid;
        c.items.push(Primitive::Wedge {
            cx,
            cy,
            radius: l.radius,
            start: 0.0,
            sweep: 360.0,
            fill,
        });
        c.text(cx, cy + TEXT_SIZE / 3.0, "No data", Anchor::Middle);
    }
    for (i, slice) in l.slices.iter().enumerate() {
        if slice.sweep <= 0.0 {
            continue;
        }
        let fill = c.palette.series(i);
        c.items.push(Primitive::Wedge {
            cx,
            cy,
            radius: l.radius,
            start: slice.start_angle,
            sweep: slice.sweep,
            fill,
        });
    }

    let legend_x = MARGIN + l.radius * 2.0 + 24.0;
    let mut legend_width: f64 = 0.0;
    for (i, slice) in l.slices.iter().enumerate() {
        let y = MARGIN + 14.0 + i as f64 * 20.0;
        let caption = format!("{} {}", slice.label, slice.percent_label);
        let end = c.legend_entry(legend_x, y, c.palette.series(i), &caption, cfg.char_width);
        legend_width = legend_width.max(end - legend_x);
    }
    let legend_height = l.slices.len() as f64 * 20.0;
    (
        legend_x + legend_width + MARGIN,
        (l.radius * 2.0).max(legend_height) + MARGIN * 2.0,
    )
}

fn gantt_scene(c: &mut Canvas, l: &GanttLayout, cfg: &LayoutConfig) -> (f64, f64) {
    let rh = cfg.row_height;
    let x0 = MARGIN + cfg.label_width;
    for (i, bar) in l.bars.iter().enumerate() {
        let y = MARGIN + i as f64 * rh;
        c.text(MARGIN, y + rh * 0.65, bar.name.clone(), Anchor::Start);
        c.rect(x0, y + rh * 0.2, bar.width_px, rh * 0.6, c.palette.series(i));
        c.text_styled(
            x0 + bar.width_px + 6.0,
            y + rh * 0.65,
            format!("{} ({})", bar.start, format_value(bar.duration)),
            Anchor::Start,
            c.palette.label,
            SMALL_TEXT_SIZE,
        );
    }
    (
        x0 + l.track_width + MARGIN,
        l.bars.len() as f64 * rh + MARGIN * 2.0,
    )
}

fn waterfall_scene(c: &mut Canvas, l: &WaterfallLayout, cfg: &LayoutConfig) -> (f64, f64) {
    let rh = cfg.row_height;
    let x0 = MARGIN + cfg.label_width;
    let totals_x = x0 + l.track_width + 72.0;
    for (i, bar) in l.bars.iter().enumerate() {
        let y = MARGIN + i as f64 * rh;
        c.text(MARGIN, y + rh * 0.65, bar.label.clone(), Anchor::Start);
        c.rect(x0, y + rh * 0.2, bar.width, rh * 0.6, c.palette.polarity(bar.polarity));
        let amount = match bar.polarity {
            Polarity::Total => format_value(bar.running_total.unwrap_or(bar.delta)),
            _ => format_signed(bar.delta),
        };
        c.text(x0 + bar.width + 6.0, y + rh * 0.65, amount, Anchor::Start);
        if let (Some(total), false) = (bar.running_total, bar.polarity == Polarity::Total) {
            c.text_styled(
                totals_x,
                y + rh * 0.65,
                format_value(total),
                Anchor::End,
                c.palette.neutral,
                SMALL_TEXT_SIZE,
            );
        }
    }
    (totals_x + MARGIN, l.bars.len() as f64 * rh + MARGIN * 2.0)
}

fn heatmap_scene(c: &mut Canvas, l: &HeatmapLayout, cfg: &LayoutConfig) -> (f64, f64) {
    let rh = cfg.row_height;
    let cw = cfg.heatmap_cell_width;
    let x0 = MARGIN + cfg.label_width;
    let y0 = MARGIN + rh;
    c.text(MARGIN, MARGIN + rh * 0.65, l.row_header.clone(), Anchor::Start);
    for (j, col) in l.columns.iter().enumerate() {
        c.text(x0 + j as f64 * cw + cw / 2.0, MARGIN + rh * 0.65, col.clone(), Anchor::Middle);
    }
    for (i, (label, row)) in l.row_labels.iter().zip(&l.cells).enumerate() {
        let y = y0 + i as f64 * rh;
        c.text(MARGIN, y + rh * 0.65, label.clone(), Anchor::Start);
        for (j, cell) in row.iter().enumerate() {
            let x = x0 + j as f64 * cw;
            c.rect(x + 1.0, y + 1.0, cw - 2.0, rh - 2.0, c.palette.heatmap_base.with_alpha(cell.alpha));
            let color = if cell.light_text {
                c.palette.text_light
            } else {
                c.palette.text_dark
            };
            c.text_styled(x + cw / 2.0, y + rh * 0.65, format_value(cell.value), Anchor::Middle, color, SMALL_TEXT_SIZE);
        }
    }
    let ncols = l.cells.iter().map(Vec::len).max().unwrap_or(0).max(l.columns.len());
    (
        x0 + ncols as f64 * cw + MARGIN,
        y0 + l.row_labels.len() as f64 * rh + MARGIN,
    )
}

fn treemap_scene(c: &mut Canvas, l: &TreemapLayout, cfg: &LayoutConfig) -> (f64, f64) {
    for tile in &l.tiles {
        let (x, y) = (MARGIN + tile.x, MARGIN + tile.y);
        c.rect(x, y, tile.width, tile.height, c.palette.series(tile.category_index));
        let fits = |text: &str| text.chars().count() as f64 * cfg.char_width <= tile.width - 6.0;
        let light = c.palette.text_light;
        if fits(&tile.label) && tile.height >= TEXT_SIZE + 6.0 {
            c.text_styled(x + 4.0, y + TEXT_SIZE + 2.0, tile.label.clone(), Anchor::Start, light, TEXT_SIZE);
        }
        let pct = format!("{:.0}%", tile.percentage);
        if fits(&pct) && tile.height >= TEXT_SIZE * 2.0 + 8.0 {
            c.text_styled(x + 4.0, y + TEXT_SIZE * 2.0 + 4.0, pct, Anchor::Start, light, SMALL_TEXT_SIZE);
        }
    }
    let legend_y = MARGIN + l.height + 20.0;
    let mut x = MARGIN;
    for (i, category) in l.categories.iter().enumerate() {
        x = c.legend_entry(x, legend_y, c.palette.series(i), category, cfg.char_width);
    }
    (
        (l.width + MARGIN * 2.0).max(x + MARGIN),
        legend_y + MARGIN,
    )
}

fn funnel_scene(c: &mut Canvas, l: &FunnelLayout, cfg: &LayoutConfig) -> (f64, f64) {
    let step_h = cfg.row_height * 1.5;
    let x0 = MARGIN + cfg.label_width;
    let track = (cfg.chart_width - cfg.label_width - MARGIN * 2.0).max(0.0);
    let mid = x0 + track / 2.0;
    for (i, step) in l.steps.iter().enumerate() {
        let y = MARGIN + i as f64 * step_h;
        let top = step.width_pct / 100.0 * track / 2.0;
        let bottom = step.bottom_pct / 100.0 * track / 2.0;
        c.items.push(Primitive::Polygon {
            points: vec![
                (mid - top, y),
                (mid + top, y),
                (mid + bottom, y + step_h - 2.0),
                (mid - bottom, y + step_h - 2.0),
            ],
            fill: c.palette.series(i),
        });
        c.text(MARGIN, y + step_h * 0.6, step.label.clone(), Anchor::Start);
        let caption = match step.conversion {
            Some(pct) => format!("{} ({}%)", format_value(step.value), pct),
            None => format_value(step.value),
        };
        let color = c.palette.text_dark;
        c.text_styled(mid, y + step_h * 0.6, caption, Anchor::Middle, color, SMALL_TEXT_SIZE);
    }
    (cfg.chart_width, l.steps.len() as f64 * step_h + MARGIN * 2.0)
}

fn boxplot_scene(c: &mut Canvas, l: &BoxPlotLayout, cfg: &LayoutConfig) -> (f64, f64) {
    let rh = cfg.row_height * 1.25;
    let x0 = MARGIN + cfg.label_width + AXIS_WIDTH;
    let track = (cfg.chart_width - x0 - AXIS_WIDTH - MARGIN).max(0.0);
    let at = |pct: f64| x0 + pct / 100.0 * track;
    for (i, geom) in l.rows.iter().enumerate() {
        let y = MARGIN + i as f64 * rh;
        let mid = y + rh / 2.0;
        c.text(MARGIN, mid + 4.0, geom.category.clone(), Anchor::Start);
        c.text_styled(x0 - 6.0, mid + 4.0, format_value(geom.stats.min), Anchor::End, c.palette.label, SMALL_TEXT_SIZE);
        c.text_styled(at(100.0) + 6.0, mid + 4.0, format_value(geom.stats.max), Anchor::Start, c.palette.label, SMALL_TEXT_SIZE);
        c.rect(x0, mid - 0.5, track, 1.0, c.palette.neutral);
        c.rect(x0, y + rh * 0.25, 1.0, rh * 0.5, c.palette.neutral);
        c.rect(at(100.0) - 1.0, y + rh * 0.25, 1.0, rh * 0.5, c.palette.neutral);
        c.rect(
            at(geom.box_left_pct),
            y + rh * 0.15,
            geom.box_width_pct / 100.0 * track,
            rh * 0.7,
            c.palette.series(i).with_alpha(0.7),
        );
        c.rect(at(geom.median_pct) - 1.0, y + rh * 0.1, 2.0, rh * 0.8, c.palette.text_dark);
    }
    (cfg.chart_width, l.rows.len() as f64 * rh + MARGIN * 2.0)
}

fn stacked_scene(c: &mut Canvas, l: &StackedLayout, cfg: &LayoutConfig) -> (f64, f64) {
    let rh = cfg.row_height;
    let x0 = MARGIN + cfg.label_width;
    let track = (cfg.chart_width - cfg.label_width - MARGIN * 2.0 - 56.0).max(0.0);

    let mut x = MARGIN;
    for (i, label) in l.segment_labels.iter().enumerate() {
        x = c.legend_entry(x, MARGIN + 12.0, c.palette.series(i), label, cfg.char_width);
    }
    let y0 = MARGIN + rh;
    c.text(MARGIN, y0 + rh * 0.65, l.category_header.clone(), Anchor::Start);
    c.text(x0 + track + 56.0, y0 + rh * 0.65, l.total_label.clone(), Anchor::End);

    for (i, row) in l.rows.iter().enumerate() {
        let y = y0 + (i + 1) as f64 * rh;
        c.text(MARGIN, y + rh * 0.65, row.label.clone(), Anchor::Start);
        for (j, seg) in row.segments.iter().enumerate() {
            let sx = x0 + seg.offset_pct / 100.0 * track;
            let sw = seg.width_pct / 100.0 * track;
            c.rect(sx, y + rh * 0.15, sw, rh * 0.7, c.palette.series(j));
            if seg.show_label {
                let color = c.palette.text_light;
                c.text_styled(sx + sw / 2.0, y + rh * 0.65, format!("{}%", seg.percent), Anchor::Middle, color, SMALL_TEXT_SIZE);
            }
        }
        c.text(x0 + track + 56.0, y + rh * 0.65, format_value(row.total), Anchor::End);
    }
    (
        cfg.chart_width.max(x + MARGIN),
        y0 + (l.rows.len() + 1) as f64 * rh + MARGIN,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layout_payload;
    use crate::payload::{ChartPayload, ChartType, DataPoint, SeriesChart};

    fn scene_for(payload: &ChartPayload, title: Option<&str>) -> Scene {
        let cfg = LayoutConfig::default();
        let layout = layout_payload(payload, &cfg).unwrap();
        build_scene(&layout, &ChartPalette::default(), &cfg, title)
    }

    fn chart(chart_type: ChartType, values: &[(&str, f64)]) -> ChartPayload {
        ChartPayload::Chart(SeriesChart {
            chart_type,
            data: values.iter().map(|(l, v)| DataPoint::new(*l, *v)).collect(),
        })
    }

    #[test]
    fn hex_colors_parse_with_and_without_alpha() {
        let c = Rgba::from_hex("#3b82f6").unwrap();
        assert_eq!((c.r, c.g, c.b, c.a), (0x3b, 0x82, 0xf6, 1.0));
        assert_eq!(c.css(), "#3b82f6");
        let half = Rgba::from_hex("#00000080").unwrap();
        assert!((half.a - 128.0 / 255.0).abs() < 1e-9);
        assert!(Rgba::from_hex("3b82f6").is_err());
        assert!(Rgba::from_hex("#3b82").is_err());
        assert!(Rgba::from_hex("#zzzzzz").is_err());
    }

    #[test]
    fn blend_over_white() {
        let c = Rgba::rgb(0, 0, 0).with_alpha(0.5);
        let out = c.blend_over(Rgba::rgb(255, 255, 255));
        assert_eq!((out.r, out.g, out.b), (128, 128, 128));
    }

    #[test]
    fn bar_scene_has_one_rect_per_bar_and_labels() {
        let scene = scene_for(&chart(ChartType::Bar, &[("A", 10.0), ("B", 5.0)]), None);
        let texts: Vec<&str> = scene.texts().collect();
        assert!(texts.contains(&"A"));
        assert!(texts.contains(&"B"));
        let heights: Vec<f64> = scene
            .items
            .iter()
            .filter_map(|p| match p {
                Primitive::Rect { height, .. } if *height > 1.0 => Some(*height),
                _ => None,
            })
            .collect();
        assert_eq!(heights, vec![150.0, 75.0]);
    }

    #[test]
    fn title_shifts_body_down() {
        let payload = chart(ChartType::Bar, &[("A", 1.0)]);
        let plain = scene_for(&payload, None);
        let titled = scene_for(&payload, Some("Headcount"));
        assert_eq!(titled.height, plain.height + TITLE_HEIGHT);
        assert_eq!(titled.title.as_deref(), Some("Headcount"));
        assert_eq!(titled.texts().next(), Some("Headcount"));
    }

    #[test]
    fn empty_pie_draws_placeholder_disc() {
        let scene = scene_for(&chart(ChartType::Pie, &[("X", 0.0)]), None);
        assert!(scene.items.iter().any(|p| matches!(
            p,
            Primitive::Wedge { sweep, .. } if *sweep == 360.0
        )));
        assert!(scene.texts().any(|t| t == "No data"));
    }

    #[test]
    fn pie_legend_carries_percentages() {
        let scene = scene_for(&chart(ChartType::Pie, &[("X", 25.0), ("Y", 75.0)]), None);
        let texts: Vec<&str> = scene.texts().collect();
        assert!(texts.contains(&"X 25%"));
        assert!(texts.contains(&"Y 75%"));
    }

    #[test]
    fn scene_dimensions_are_finite_for_degenerate_line() {
        let scene = scene_for(&chart(ChartType::Line, &[("a", 0.0), ("b", 0.0)]), None);
        assert!(scene.width.is_finite() && scene.height.is_finite());
        for item in &scene.items {
            if let Primitive::Polyline { points, .. } = item {
                assert!(points.iter().all(|(x, y)| x.is_finite() && y.is_finite()));
            }
        }
    }
}
