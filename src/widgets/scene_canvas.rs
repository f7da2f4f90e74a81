//! Draws a [`Scene`] on a braille canvas.
//!
//! Scene coordinates grow downwards and canvas coordinates grow upwards, so
//! every y is flipped against the scene height. Filled shapes are sampled
//! once per braille dot.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::{Line as TextLine, Span},
    widgets::canvas::{Canvas, Line, Painter, Shape},
    widgets::Widget,
};

use crate::config::ColorParser;
use crate::scene::{Anchor, Primitive, Rgba, Scene};

/// Braille dots per terminal cell.
const DOTS_X: f64 = 2.0;
const DOTS_Y: f64 = 4.0;

pub struct SceneCanvas<'a> {
    scene: &'a Scene,
    parser: &'a ColorParser,
    /// Overrides every text color; scene label colors assume a light page.
    text_color: Option<Color>,
}

impl<'a> SceneCanvas<'a> {
    pub fn new(scene: &'a Scene, parser: &'a ColorParser) -> Self {
        Self {
            scene,
            parser,
            text_color: None,
        }
    }

    pub fn with_text_color(mut self, color: Color) -> Self {
        self.text_color = Some(color);
        self
    }

    fn color(&self, c: &Rgba) -> Color {
        let opaque = c.blend_over(self.scene.background);
        self.parser.rgb_to_terminal(opaque.r, opaque.g, opaque.b)
    }
}

/// Terminal rows that show a scene at roughly its aspect ratio in `width` columns.
pub fn rows_for(scene: &Scene, width: u16, min: u16, max: u16) -> u16 {
    if scene.width <= 0.0 || width == 0 {
        return min;
    }
    // A cell is about twice as tall as it is wide.
    let rows = scene.height / scene.width * width as f64 / 2.0;
    (rows.round() as u16).clamp(min, max)
}

/// Filled primitive sampled at the canvas dot pitch.
struct Region<'a> {
    primitive: &'a Primitive,
    color: Color,
    step_x: f64,
    step_y: f64,
    height: f64,
}

fn bounds(p: &Primitive) -> Option<(f64, f64, f64, f64)> {
    match p {
        Primitive::Rect {
            x,
            y,
            width,
            height,
            ..
        } => Some((*x, *y, x + width, y + height)),
        Primitive::Polygon { points, .. } => {
            let xs = points.iter().map(|p| p.0);
            let ys = points.iter().map(|p| p.1);
            Some((
                xs.clone().fold(f64::INFINITY, f64::min),
                ys.clone().fold(f64::INFINITY, f64::min),
                xs.fold(f64::NEG_INFINITY, f64::max),
                ys.fold(f64::NEG_INFINITY, f64::max),
            ))
            .filter(|b| b.0.is_finite())
        }
        Primitive::Wedge { cx, cy, radius, .. } => {
            Some((cx - radius, cy - radius, cx + radius, cy + radius))
        }
        Primitive::Polyline { .. } | Primitive::Text { .. } => None,
    }
}

fn contains(p: &Primitive, x: f64, y: f64) -> bool {
    match p {
        Primitive::Rect { .. } => true,
        Primitive::Polygon { points, .. } => {
            // Even-odd rule
            let mut inside = false;
            let n = points.len();
            for i in 0..n {
                let (xi, yi) = points[i];
                let (xj, yj) = points[(i + n - 1) % n];
                if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                    inside = !inside;
                }
            }
            inside
        }
        Primitive::Wedge {
            cx,
            cy,
            radius,
            start,
            sweep,
            ..
        } => {
            let (dx, dy) = (x - cx, y - cy);
            if dx * dx + dy * dy > radius * radius {
                return false;
            }
            if *sweep >= 360.0 {
                return true;
            }
            let angle = dy.atan2(dx).to_degrees();
            (angle - start).rem_euclid(360.0) <= *sweep
        }
        Primitive::Polyline { .. } | Primitive::Text { .. } => false,
    }
}

/// Sample positions across `lo..hi`; spans thinner than a dot get one sample.
fn samples(lo: f64, hi: f64, step: f64) -> Vec<f64> {
    if !(hi > lo) || step <= 0.0 {
        return Vec::new();
    }
    if hi - lo < step {
        return vec![(lo + hi) / 2.0];
    }
    let n = ((hi - lo) / step).floor() as usize;
    (0..n).map(|i| lo + step * (i as f64 + 0.5)).collect()
}

impl Shape for Region<'_> {
    fn draw(&self, painter: &mut Painter) {
        let Some((x0, y0, x1, y1)) = bounds(self.primitive) else {
            return;
        };
        let xs = samples(x0, x1, self.step_x);
        for y in samples(y0, y1, self.step_y) {
            for &x in &xs {
                if contains(self.primitive, x, y) {
                    if let Some((px, py)) = painter.get_point(x, self.height - y) {
                        painter.paint(px, py, self.color);
                    }
                }
            }
        }
    }
}

impl Widget for SceneCanvas<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let scene = self.scene;
        if area.width == 0 || area.height == 0 || scene.width <= 0.0 || scene.height <= 0.0 {
            return;
        }
        let step_x = scene.width / (area.width as f64 * DOTS_X);
        let step_y = scene.height / (area.height as f64 * DOTS_Y);
        let cell_w = scene.width / area.width as f64;

        Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([0.0, scene.width])
            .y_bounds([0.0, scene.height])
            .paint(|ctx| {
                for item in &scene.items {
                    match item {
                        Primitive::Rect { fill, .. }
                        | Primitive::Polygon { fill, .. }
                        | Primitive::Wedge { fill, .. } => ctx.draw(&Region {
                            primitive: item,
                            color: self.color(fill),
                            step_x,
                            step_y,
                            height: scene.height,
                        }),
                        Primitive::Polyline { points, stroke, .. } => {
                            let color = self.color(stroke);
                            for pair in points.windows(2) {
                                ctx.draw(&Line::new(
                                    pair[0].0,
                                    scene.height - pair[0].1,
                                    pair[1].0,
                                    scene.height - pair[1].1,
                                    color,
                                ));
                            }
                        }
                        Primitive::Text { .. } => {}
                    }
                }
                ctx.layer();
                for item in &scene.items {
                    if let Primitive::Text {
                        x,
                        y,
                        content,
                        color,
                        anchor,
                        ..
                    } = item
                    {
                        let width = content.chars().count() as f64 * cell_w;
                        let left = match anchor {
                            Anchor::Start => *x,
                            Anchor::Middle => x - width / 2.0,
                            Anchor::End => x - width,
                        };
                        let fg = self.text_color.unwrap_or_else(|| self.color(color));
                        ctx.print(
                            left.max(0.0),
                            scene.height - y,
                            TextLine::from(Span::styled(content.clone(), Style::default().fg(fg))),
                        );
                    }
                }
            })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::layout_payload;
    use crate::payload::{ChartPayload, ChartType, DataPoint, SeriesChart};
    use crate::scene::{build_scene, ChartPalette};

    #[test]
    fn samples_cover_thin_spans() {
        assert_eq!(samples(0.0, 0.5, 2.0), vec![0.25]);
        assert!(samples(3.0, 3.0, 1.0).is_empty());
        assert_eq!(samples(0.0, 4.0, 1.0).len(), 4);
    }

    #[test]
    fn wedge_containment_follows_sweep() {
        let quarter = Primitive::Wedge {
            cx: 0.0,
            cy: 0.0,
            radius: 10.0,
            start: 0.0,
            sweep: 90.0,
            fill: Rgba::rgb(0, 0, 0),
        };
        // y grows downwards, so positive y is inside the first quarter
        assert!(contains(&quarter, 3.0, 3.0));
        assert!(!contains(&quarter, -3.0, 3.0));
        assert!(!contains(&quarter, 9.0, 9.0));
    }

    #[test]
    fn polygon_containment() {
        let tri = Primitive::Polygon {
            points: vec![(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)],
            fill: Rgba::rgb(0, 0, 0),
        };
        assert!(contains(&tri, 2.0, 2.0));
        assert!(!contains(&tri, 8.0, 8.0));
    }

    #[test]
    fn renders_labels_into_buffer() {
        let cfg = LayoutConfig::default();
        let payload = ChartPayload::Chart(SeriesChart {
            chart_type: ChartType::Bar,
            data: vec![DataPoint::new("Eng", 10.0), DataPoint::new("HR", 5.0)],
        });
        let layout = layout_payload(&payload, &cfg).unwrap();
        let scene = build_scene(&layout, &ChartPalette::default(), &cfg, None);
        let parser = ColorParser::new();
        let area = Rect::new(0, 0, 80, 16);
        let mut buf = Buffer::empty(area);
        SceneCanvas::new(&scene, &parser).render(area, &mut buf);
        let text: String = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|(x, y)| buf[(x, y)].symbol().to_string())
            .collect();
        assert!(text.contains("Eng"));
    }

    #[test]
    fn rows_follow_aspect_ratio() {
        let scene = Scene {
            width: 400.0,
            height: 200.0,
            title: None,
            background: Rgba::rgb(255, 255, 255),
            items: Vec::new(),
        };
        assert_eq!(rows_for(&scene, 80, 4, 30), 20);
        assert_eq!(rows_for(&scene, 200, 4, 30), 30);
    }
}
