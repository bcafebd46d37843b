//! Force-directed node placement
//!
//! [`SpringLayout`] is a Fruchterman–Reingold simulation: every pair of nodes
//! repels with force `k² / d`, every edge attracts with force `d² / k`, and
//! each step is capped by a temperature that cools linearly to zero. Initial
//! placement is a golden-angle spiral, so the same graph always produces the
//! same layout.
//!
//! Results are centered on the origin and scaled into `[-1, 1]²`.

use crate::config::LayoutProfile;
use crate::graph::DependencyGraph;

/// A 2-D position
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Computes one position per node, indexed by `NodeIndex::index()`
pub trait LayoutEngine {
    fn layout(&self, graph: &DependencyGraph, profile: LayoutProfile) -> Vec<Point>;
}

/// Distances below this are clamped to avoid infinite repulsion
const MIN_DISTANCE: f64 = 0.01;
/// Stop early once the mean step falls below this
const STEP_THRESHOLD: f64 = 1e-4;

#[derive(Debug, Clone, Copy, Default)]
pub struct SpringLayout;

impl LayoutEngine for SpringLayout {
    fn layout(&self, graph: &DependencyGraph, profile: LayoutProfile) -> Vec<Point> {
        let n = graph.node_count();
        match n {
            0 => return Vec::new(),
            1 => return vec![Point::default()],
            _ => {}
        }

        // Attraction ignores direction; self-loops exert no force
        let springs: Vec<(usize, usize)> = graph
            .edge_endpoints()
            .map(|(s, t)| (s.index(), t.index()))
            .filter(|(s, t)| s != t)
            .collect();

        let mut pos = spiral(n);
        let k = profile.spring_constant;
        let mut temperature = extent(&pos) * 0.1;
        let cooling = temperature / (profile.iterations as f64 + 1.0);

        for _ in 0..profile.iterations {
            let mut step_norm = 0.0;
            let mut displacement = vec![Point::default(); n];

            for i in 0..n {
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let dx = pos[i].x - pos[j].x;
                    let dy = pos[i].y - pos[j].y;
                    let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                    let force = k * k / (distance * distance);
                    displacement[i].x += dx * force;
                    displacement[i].y += dy * force;
                }
            }

            for &(s, t) in &springs {
                let dx = pos[s].x - pos[t].x;
                let dy = pos[s].y - pos[t].y;
                let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                let force = distance / k;
                displacement[s].x -= dx * force;
                displacement[s].y -= dy * force;
                displacement[t].x += dx * force;
                displacement[t].y += dy * force;
            }

            for (p, d) in pos.iter_mut().zip(&displacement) {
                let length = (d.x * d.x + d.y * d.y).sqrt();
                let length = if length < MIN_DISTANCE { 0.1 } else { length };
                let sx = d.x * temperature / length;
                let sy = d.y * temperature / length;
                p.x += sx;
                p.y += sy;
                step_norm += sx * sx + sy * sy;
            }

            temperature -= cooling;
            if step_norm.sqrt() / (n as f64) < STEP_THRESHOLD {
                break;
            }
        }

        rescale(pos)
    }
}

/// Golden-angle spiral inside the unit square
fn spiral(n: usize) -> Vec<Point> {
    let golden = std::f64::consts::PI * (3.0 - 5f64.sqrt());
    (0..n)
        .map(|i| {
            let r = ((i as f64 + 0.5) / n as f64).sqrt() * 0.5;
            let theta = i as f64 * golden;
            Point::new(0.5 + r * theta.cos(), 0.5 + r * theta.sin())
        })
        .collect()
}

fn extent(pos: &[Point]) -> f64 {
    let (mut min_x, mut max_x, mut min_y, mut max_y) =
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
    for p in pos {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    (max_x - min_x).max(max_y - min_y)
}

/// Center on the origin and scale the largest coordinate to 1
fn rescale(mut pos: Vec<Point>) -> Vec<Point> {
    let n = pos.len() as f64;
    let cx = pos.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = pos.iter().map(|p| p.y).sum::<f64>() / n;
    for p in pos.iter_mut() {
        p.x -= cx;
        p.y -= cy;
    }
    let lim = pos
        .iter()
        .map(|p| p.x.abs().max(p.y.abs()))
        .fold(0.0_f64, f64::max);
    if lim > 0.0 {
        for p in pos.iter_mut() {
            p.x /= lim;
            p.y /= lim;
        }
    }
    pos
}
