//! Scene export to SVG (plain text, no deps) and PNG (plotters bitmap).

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cli::ExportFormat;
use crate::layout::chart::{polar, wedge_path};
use crate::scene::{Anchor, Primitive, Rgba, Scene};

/// Segments per full turn when a wedge is approximated by a polygon.
const ARC_SEGMENTS: f64 = 96.0;

/// Escape text for use in SVG character data and attribute values.
fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn fill_attrs(color: &Rgba) -> String {
    if color.a >= 1.0 {
        format!("fill=\"{}\"", color.css())
    } else {
        format!(
            "fill=\"{}\" fill-opacity=\"{:.3}\"",
            color.with_alpha(1.0).css(),
            color.a
        )
    }
}

fn points_attr(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{x:.2},{y:.2}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a scene as a standalone SVG document.
pub fn render_svg(scene: &Scene) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"sans-serif\">",
        w = scene.width,
        h = scene.height
    );
    if let Some(title) = &scene.title {
        let _ = writeln!(out, "  <title>{}</title>", escape_xml(title));
    }
    let _ = writeln!(
        out,
        "  <rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" {}/>",
        scene.width,
        scene.height,
        fill_attrs(&scene.background)
    );

    for item in &scene.items {
        let _ = match item {
            Primitive::Rect {
                x,
                y,
                width,
                height,
                fill,
            } => writeln!(
                out,
                "  <rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" {}/>",
                fill_attrs(fill)
            ),
            Primitive::Polygon { points, fill } => writeln!(
                out,
                "  <polygon points=\"{}\" {}/>",
                points_attr(points),
                fill_attrs(fill)
            ),
            Primitive::Polyline {
                points,
                stroke,
                width,
            } => writeln!(
                out,
                "  <polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{width}\"/>",
                points_attr(points),
                stroke.css()
            ),
            Primitive::Wedge {
                cx,
                cy,
                radius,
                start,
                sweep,
                fill,
            } => writeln!(
                out,
                "  <path d=\"{}\" {}/>",
                wedge_path((*cx, *cy), *radius, *start, *sweep),
                fill_attrs(fill)
            ),
            Primitive::Text {
                x,
                y,
                content,
                color,
                anchor,
                size,
            } => writeln!(
                out,
                "  <text x=\"{x:.2}\" y=\"{y:.2}\" font-size=\"{size}\" text-anchor=\"{}\" {}>{}</text>",
                anchor.svg(),
                fill_attrs(color),
                escape_xml(content)
            ),
        };
    }
    out.push_str("</svg>\n");
    out
}

/// Write scene to SVG.
pub fn write_svg(path: &Path, scene: &Scene) -> Result<()> {
    let mut f = File::create(path)?;
    f.write_all(render_svg(scene).as_bytes())?;
    f.sync_all()?;
    Ok(())
}

/// Polygon outline of a wedge; a full sweep yields the whole circle.
fn wedge_polygon(cx: f64, cy: f64, radius: f64, start: f64, sweep: f64) -> Vec<(f64, f64)> {
    let steps = ((sweep.abs() / 360.0) * ARC_SEGMENTS).ceil().max(1.0) as usize;
    let arc = (0..=steps).map(|i| polar((cx, cy), radius, start + sweep * i as f64 / steps as f64));
    if sweep >= 360.0 - 1e-9 {
        arc.collect()
    } else {
        std::iter::once((cx, cy)).chain(arc).collect()
    }
}

/// Write scene to PNG using plotters bitmap backend. `scale` multiplies the pixel size.
pub fn write_png(path: &Path, scene: &Scene, scale: f64) -> Result<()> {
    use plotters::prelude::*;
    use plotters::style::text_anchor::{HPos, Pos, VPos};

    if scene.width <= 0.0 || scene.height <= 0.0 {
        return Err(eyre!("Nothing to export: the chart has no area"));
    }
    let scale = if scale > 0.0 { scale } else { 1.0 };
    let px = |v: f64| (v * scale).round() as i32;
    let pt = |&(x, y): &(f64, f64)| (px(x), px(y));
    let color = |c: &Rgba| RGBAColor(c.r, c.g, c.b, c.a);

    let size = (
        (scene.width * scale).ceil() as u32,
        (scene.height * scale).ceil() as u32,
    );
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&RGBColor(
        scene.background.r,
        scene.background.g,
        scene.background.b,
    ))?;

    for item in &scene.items {
        match item {
            Primitive::Rect {
                x,
                y,
                width,
                height,
                fill,
            } => {
                root.draw(&Rectangle::new(
                    [(px(*x), px(*y)), (px(x + width), px(y + height))],
                    color(fill).filled(),
                ))?;
            }
            Primitive::Polygon { points, fill } => {
                root.draw(&Polygon::new(
                    points.iter().map(pt).collect::<Vec<_>>(),
                    color(fill).filled(),
                ))?;
            }
            Primitive::Polyline {
                points,
                stroke,
                width,
            } => {
                root.draw(&PathElement::new(
                    points.iter().map(pt).collect::<Vec<_>>(),
                    color(stroke).stroke_width((width * scale).round().max(1.0) as u32),
                ))?;
            }
            Primitive::Wedge {
                cx,
                cy,
                radius,
                start,
                sweep,
                fill,
            } => {
                let outline = wedge_polygon(*cx, *cy, *radius, *start, *sweep);
                root.draw(&Polygon::new(
                    outline.iter().map(pt).collect::<Vec<_>>(),
                    color(fill).filled(),
                ))?;
            }
            Primitive::Text {
                x,
                y,
                content,
                color: c,
                anchor,
                size,
            } => {
                let hpos = match anchor {
                    Anchor::Start => HPos::Left,
                    Anchor::Middle => HPos::Center,
                    Anchor::End => HPos::Right,
                };
                let style = ("sans-serif", size * scale)
                    .into_font()
                    .color(&color(c))
                    .pos(Pos::new(hpos, VPos::Bottom));
                root.draw(&Text::new(content.clone(), (px(*x), px(*y)), style))?;
            }
        }
    }

    root.present()?;
    Ok(())
}

/// Resolve the format for `path`: an explicit choice wins, then the extension.
pub fn resolve_format(path: &Path, explicit: Option<ExportFormat>) -> Result<ExportFormat> {
    explicit
        .or_else(|| ExportFormat::from_path(path))
        .ok_or_else(|| {
            eyre!(
                "Cannot tell the export format of {}. Use a .svg or .png extension or pass --format",
                path.display()
            )
        })
}

/// Write `scene` to `path` in `format`.
pub fn export_scene(path: &Path, scene: &Scene, format: ExportFormat, scale: f64) -> Result<()> {
    tracing::info!(path = %path.display(), ?format, "exporting chart");
    match format {
        ExportFormat::Svg => write_svg(path, scene),
        ExportFormat::Png => write_png(path, scene, scale),
    }
    .wrap_err_with(|| format!("Failed to export chart to {}", path.display()))
}

/// File name for an exported chart: the title slugified, or `chart`, plus the extension.
pub fn export_file_name(title: Option<&str>, format: ExportFormat) -> String {
    let slug = title
        .map(|t| {
            t.chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() {
                        c.to_ascii_lowercase()
                    } else {
                        '-'
                    }
                })
                .collect::<String>()
                .split('-')
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join("-")
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "chart".to_string());
    format!("{}.{}", slug, format.extension())
}

/// First path in `dir` named after `title` that does not exist yet.
pub fn unique_export_path(dir: &Path, title: Option<&str>, format: ExportFormat) -> PathBuf {
    let name = export_file_name(title, format);
    let candidate = dir.join(&name);
    if !candidate.exists() {
        return candidate;
    }
    let stem = name
        .strip_suffix(&format!(".{}", format.extension()))
        .unwrap_or(&name)
        .to_string();
    (2..)
        .map(|n| dir.join(format!("{}-{}.{}", stem, n, format.extension())))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::layout_payload;
    use crate::payload::{ChartPayload, ChartType, DataPoint, SeriesChart};
    use crate::scene::{build_scene, ChartPalette};

    fn pie_scene() -> Scene {
        let cfg = LayoutConfig::default();
        let payload = ChartPayload::Chart(SeriesChart {
            chart_type: ChartType::Pie,
            data: vec![DataPoint::new("R&D", 25.0), DataPoint::new("Sales", 75.0)],
        });
        let layout = layout_payload(&payload, &cfg).unwrap();
        build_scene(&layout, &ChartPalette::default(), &cfg, Some("Budget <2025>"))
    }

    /// SVG output carries the document header, escaped text, and one path per slice.
    #[test]
    fn svg_contains_desired_elements() {
        let svg = render_svg(&pie_scene());
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("<title>Budget &lt;2025&gt;</title>"));
        assert!(svg.contains("R&amp;D 25%"));
        assert_eq!(svg.matches("<path d=\"M").count(), 2);
        assert!(svg.contains(" A 80.00 80.00 0 1 1 "), "large arc flag on the 270° slice");
    }

    #[test]
    fn write_svg_creates_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("chart.svg");
        export_scene(&path, &pie_scene(), ExportFormat::Svg, 1.0).expect("export");
        let content = std::fs::read_to_string(&path).expect("read");
        assert!(content.contains("<svg"));
    }

    #[test]
    fn format_resolution_prefers_explicit_choice() {
        let path = Path::new("out.svg");
        assert_eq!(resolve_format(path, None).unwrap(), ExportFormat::Svg);
        assert_eq!(
            resolve_format(path, Some(ExportFormat::Png)).unwrap(),
            ExportFormat::Png
        );
        assert!(resolve_format(Path::new("out.txt"), None).is_err());
    }

    #[test]
    fn wedge_polygon_closes_full_circle() {
        let pts = wedge_polygon(0.0, 0.0, 10.0, 0.0, 360.0);
        let (first, last) = (pts[0], pts[pts.len() - 1]);
        assert!((first.0 - last.0).abs() < 1e-9 && (first.1 - last.1).abs() < 1e-9);
        let partial = wedge_polygon(5.0, 5.0, 10.0, 0.0, 90.0);
        assert_eq!(partial[0], (5.0, 5.0));
    }

    #[test]
    fn export_paths_are_slugged_and_unique() {
        assert_eq!(
            export_file_name(Some("Headcount by Dept!"), ExportFormat::Png),
            "headcount-by-dept.png"
        );
        assert_eq!(export_file_name(None, ExportFormat::Svg), "chart.svg");

        let dir = tempfile::tempdir().expect("temp dir");
        let first = unique_export_path(dir.path(), Some("Pay"), ExportFormat::Svg);
        std::fs::write(&first, "x").expect("write");
        let second = unique_export_path(dir.path(), Some("Pay"), ExportFormat::Svg);
        assert_eq!(second.file_name().unwrap(), "pay-2.svg");
    }
}
