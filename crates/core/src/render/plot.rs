//! Bitmap backend built on plotters.
//!
//! Shapes (edges, nodes, color bar) are always drawn; text (title, labels,
//! statistics panel, color bar ticks) is drawn only when a font is available
//! and a text failure never discards the image.
//!
//! The image is written to a temporary file next to the output and moved into
//! place after the backend has presented it, so a failed render leaves no
//! partial artifact behind.

use std::path::Path;

use anyhow::Context;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};

use super::colors::{self, Normalize};
use super::fonts;
use super::{GraphSummary, VisualParameters};
use crate::config::RenderConfig;
use crate::layout::Point;

type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

/// Draw the graph and write it to `output`
pub fn draw(
    config: &RenderConfig,
    visuals: &VisualParameters,
    positions: &[Point],
    summary: &GraphSummary,
    output: &Path,
) -> anyhow::Result<()> {
    let scene = Scene::new(config, visuals, positions, summary);

    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let ext = output.extension().and_then(|e| e.to_str()).unwrap_or("png");
    let temp = tempfile::Builder::new()
        .prefix(".depviz-")
        .suffix(&format!(".{ext}"))
        .tempfile_in(dir)
        .with_context(|| format!("creating temporary image in {}", dir.display()))?
        .into_temp_path();

    {
        let root = BitMapBackend::new(&*temp, scene.canvas).into_drawing_area();
        paint(&root, &scene).map_err(|e| anyhow::anyhow!("drawing graph: {e}"))?;

        if fonts::ensure_registered(&config.font_paths) {
            if let Err(err) = annotate(&root, &scene) {
                tracing::warn!(error = %err, "text rendering failed, image saved without text");
            }
        }

        root.present()
            .map_err(|e| anyhow::anyhow!("encoding image: {e}"))?;
    }

    // Temp files are created owner-only; the artifact is an ordinary file
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp, std::fs::Permissions::from_mode(0o644))
            .with_context(|| format!("setting permissions on {}", temp.display()))?;
    }

    temp.persist(output)
        .map_err(|e| e.error)
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

/// Pixel-space geometry derived from the visual parameters
struct Scene<'a> {
    config: &'a RenderConfig,
    visuals: &'a VisualParameters,
    summary: &'a GraphSummary,
    canvas: (u32, u32),
    /// Pixels per point
    ppp: f64,
    centers: Vec<(i32, i32)>,
    radii: Vec<f64>,
    norm: Normalize,
    title_band: i32,
    colorbar: [(i32, i32); 2],
}

impl<'a> Scene<'a> {
    fn new(
        config: &'a RenderConfig,
        visuals: &'a VisualParameters,
        positions: &[Point],
        summary: &'a GraphSummary,
    ) -> Self {
        let canvas = config.canvas_pixels();
        let (w, h) = (canvas.0 as f64, canvas.1 as f64);
        let ppp = config.px_per_point();
        let pt = |points: f64| points * ppp;

        // Marker size is an area in points²; its square root is the diameter
        let radii: Vec<f64> = visuals.nodes.iter().map(|n| pt(n.size.sqrt() / 2.0)).collect();
        let max_radius = radii.iter().copied().fold(0.0_f64, f64::max);

        let title_band = pt(36.0);
        let margin = pt(18.0);
        let cb_right = w - pt(60.0);
        let cb_left = cb_right - pt(14.0);
        let plot_h = h - title_band - margin;
        let cb_top = title_band + plot_h * 0.1;
        let cb_bottom = title_band + plot_h * 0.9;

        let pad = max_radius + pt(4.0);
        let left = margin + pad;
        let top = title_band + pad;
        let span_x = (cb_left - pt(60.0) - pad - left).max(1.0);
        let span_y = (h - margin - pad - top).max(1.0);

        let centers = (0..visuals.nodes.len())
            .map(|i| {
                let p = positions.get(i).copied().unwrap_or_default();
                let x = left + (p.x + 1.0) / 2.0 * span_x;
                let y = top + (1.0 - (p.y + 1.0) / 2.0) * span_y;
                (x.round() as i32, y.round() as i32)
            })
            .collect();

        Self {
            config,
            visuals,
            summary,
            canvas,
            ppp,
            centers,
            radii,
            norm: Normalize::fit(visuals.nodes.iter().map(|n| n.intensity)),
            title_band: title_band as i32,
            colorbar: [
                (cb_left as i32, cb_top as i32),
                (cb_right as i32, cb_bottom as i32),
            ],
        }
    }

    fn px(&self, points: f64) -> u32 {
        (points * self.ppp).round().max(1.0) as u32
    }

    fn font(&self, points: f64, style: FontStyle) -> TextStyle<'static> {
        TextStyle::from(FontDesc::new(FontFamily::Name(fonts::FAMILY), points * self.ppp, style))
            .color(&BLACK)
    }
}

fn paint<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, scene: &Scene<'_>) -> DrawResult<DB> {
    root.fill(&WHITE)?;
    draw_edges(root, scene)?;
    draw_nodes(root, scene)?;
    draw_colorbar(root, scene)
}

fn draw_edges<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, scene: &Scene<'_>) -> DrawResult<DB> {
    let color = colors::EDGE_GRAY.mix(0.6);
    let head_len = 8.0 * scene.ppp;

    for edge in &scene.visuals.edges {
        let stroke = color.stroke_width(scene.px(edge.width));
        let (sx, sy) = scene.centers[edge.source];
        let (tx, ty) = scene.centers[edge.target];
        let (rs, rt) = (scene.radii[edge.source], scene.radii[edge.target]);

        if edge.source == edge.target {
            let loop_r = (rt * 0.6).max(1.0);
            root.draw(&Circle::new((tx, ty - (rt + loop_r * 0.5) as i32), loop_r as u32, stroke))?;
            continue;
        }

        let (dx, dy) = ((tx - sx) as f64, (ty - sy) as f64);
        let dist = (dx * dx + dy * dy).sqrt();
        // Overlapping markers leave no room for an arrowhead
        if dist <= rs + rt + head_len {
            if dist > 0.0 {
                root.draw(&PathElement::new(vec![(sx, sy), (tx, ty)], stroke))?;
            }
            continue;
        }
        let (ux, uy) = (dx / dist, dy / dist);
        let at = |d: f64| ((sx as f64 + ux * d).round() as i32, (sy as f64 + uy * d).round() as i32);

        let tip = dist - rt;
        let base = tip - head_len;
        root.draw(&PathElement::new(vec![at(rs), at(base)], stroke))?;

        let half = 3.0 * scene.ppp + edge.width * scene.ppp / 2.0;
        let (bx, by) = (sx as f64 + ux * base, sy as f64 + uy * base);
        let wing = |sign: f64| ((bx - uy * half * sign).round() as i32, (by + ux * half * sign).round() as i32);
        root.draw(&Polygon::new(vec![at(tip), wing(1.0), wing(-1.0)], color.filled()))?;
    }
    Ok(())
}

fn draw_nodes<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, scene: &Scene<'_>) -> DrawResult<DB> {
    let outline = BLACK.stroke_width(scene.px(1.0));
    for (i, node) in scene.visuals.nodes.iter().enumerate() {
        let center = scene.centers[i];
        let radius = scene.radii[i].round().max(1.0) as u32;
        let fill = colors::reds(scene.norm.apply(node.intensity)).mix(0.8);
        root.draw(&Circle::new(center, radius, fill.filled()))?;
        root.draw(&Circle::new(center, radius, outline))?;
    }
    Ok(())
}

fn draw_colorbar<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, scene: &Scene<'_>) -> DrawResult<DB> {
    let [(left, top), (right, bottom)] = scene.colorbar;
    let height = (bottom - top).max(1) as f64;
    for y in top..bottom {
        let t = 1.0 - (y - top) as f64 / height;
        root.draw(&Rectangle::new([(left, y), (right, y + 1)], colors::reds(t).filled()))?;
    }
    root.draw(&Rectangle::new([(left, top), (right, bottom)], BLACK.stroke_width(scene.px(0.8))))
}

fn annotate<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, scene: &Scene<'_>) -> DrawResult<DB> {
    let centered = Pos::new(HPos::Center, VPos::Center);

    let title = scene.font(16.0, FontStyle::Bold).pos(centered);
    root.draw_text(
        &scene.config.title,
        &title,
        (scene.canvas.0 as i32 / 2, scene.title_band / 2),
    )?;

    let label = scene.font(8.0, FontStyle::Bold).pos(centered);
    for (node, &center) in scene.visuals.nodes.iter().zip(&scene.centers) {
        root.draw_text(&node.label, &label, center)?;
    }

    draw_summary_panel(root, scene)?;

    let [(left, top), (right, bottom)] = scene.colorbar;
    let tick = scene.font(8.0, FontStyle::Normal).pos(Pos::new(HPos::Left, VPos::Center));
    let gap = scene.px(4.0) as i32;
    for (value, y) in [
        (scene.norm.max, top),
        ((scene.norm.min + scene.norm.max) / 2.0, (top + bottom) / 2),
        (scene.norm.min, bottom),
    ] {
        root.draw_text(&format!("{value:.2}"), &tick, (right + gap, y))?;
    }

    let caption = scene
        .font(10.0, FontStyle::Normal)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    root.draw_text("Node Importance", &caption, ((left + right) / 2, top - gap))
}

fn draw_summary_panel<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    scene: &Scene<'_>,
) -> DrawResult<DB> {
    let lines = scene.summary.lines();
    let font_px = 10.0 * scene.ppp;
    let line_h = (font_px * 1.3).round() as i32;
    let pad = scene.px(6.0) as i32;
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as f64;

    let x0 = scene.px(18.0) as i32;
    let y0 = scene.title_band;
    let x1 = x0 + (longest * font_px * 0.6).round() as i32 + 2 * pad;
    let y1 = y0 + line_h * lines.len() as i32 + 2 * pad;

    root.draw(&Rectangle::new([(x0, y0), (x1, y1)], colors::PANEL_WHEAT.mix(0.8).filled()))?;
    root.draw(&Rectangle::new([(x0, y0), (x1, y1)], BLACK.stroke_width(scene.px(0.8))))?;

    let style = scene.font(10.0, FontStyle::Normal).pos(Pos::new(HPos::Left, VPos::Top));
    for (i, line) in lines.iter().enumerate() {
        root.draw_text(line, &style, (x0 + pad, y0 + pad + line_h * i as i32))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RankingConfig;
    use crate::graph::DependencyGraph;
    use crate::importance::ImportanceScorer;
    use crate::layout::{LayoutEngine, SpringLayout};
    use crate::render::RenderProjector;
    use tempfile::TempDir;

    fn small_config() -> RenderConfig {
        RenderConfig {
            dpi: 40,
            ..RenderConfig::default()
        }
    }

    fn sample_scene_inputs(config: &RenderConfig) -> (VisualParameters, Vec<Point>, GraphSummary) {
        let graph = DependencyGraph::sample();
        let scores = ImportanceScorer::new(&RankingConfig::default()).score(&graph);
        let visuals = RenderProjector::new(config).project(&graph, &scores);
        let positions = SpringLayout.layout(&graph, visuals.profile);
        (visuals, positions, GraphSummary::of(&graph))
    }

    #[test]
    fn test_draw_writes_png() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("graph.png");
        let config = small_config();
        let (visuals, positions, summary) = sample_scene_inputs(&config);

        draw(&config, &visuals, &positions, &summary, &output).unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
        // Only the artifact remains; the temporary file was moved into place
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_written_image_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("graph.png");
        let config = small_config();
        let (visuals, positions, summary) = sample_scene_inputs(&config);

        draw(&config, &visuals, &positions, &summary, &output).unwrap();

        let mode = std::fs::metadata(&output).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_overlapping_nodes_still_draw_edges() {
        let config = small_config();
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("b", "c");
        let scores = ImportanceScorer::new(&RankingConfig::default()).score(&graph);
        let visuals = RenderProjector::new(&config).project(&graph, &scores);
        // a and b sit close enough for their markers to overlap
        let positions = vec![Point::new(0.0, 0.0), Point::new(0.01, 0.0), Point::new(1.0, 1.0)];
        let summary = GraphSummary::of(&graph);
        let scene = Scene::new(&config, &visuals, &positions, &summary);

        let (w, h) = scene.canvas;
        let mut pixels = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut pixels, (w, h)).into_drawing_area();
            root.fill(&WHITE).unwrap();
            draw_edges(&root, &scene).unwrap();
            root.present().unwrap();
        }

        let (ax, ay) = scene.centers[0];
        let (bx, by) = scene.centers[1];
        let dist = f64::from((bx - ax).pow(2) + (by - ay).pow(2)).sqrt();
        assert!(dist <= scene.radii[0] + scene.radii[1]);

        let (mx, my) = ((ax + bx) / 2, (ay + by) / 2);
        let offset = ((my as u32 * w + mx as u32) * 3) as usize;
        assert_ne!(pixels[offset..offset + 3], [255, 255, 255]);
    }

    #[test]
    fn test_failed_write_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("missing").join("graph.png");
        let config = small_config();
        let (visuals, positions, summary) = sample_scene_inputs(&config);

        assert!(draw(&config, &visuals, &positions, &summary, &output).is_err());
        assert!(!output.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_scene_keeps_nodes_on_canvas() {
        let config = small_config();
        let (visuals, positions, summary) = sample_scene_inputs(&config);
        let scene = Scene::new(&config, &visuals, &positions, &summary);
        let (w, h) = scene.canvas;

        for &(x, y) in &scene.centers {
            assert!(x >= 0 && x < w as i32);
            assert!(y >= scene.title_band && y < h as i32);
        }
    }
}
