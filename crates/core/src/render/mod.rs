//! Render projection
//!
//! Maps a scored graph onto visual parameters (marker size, color intensity,
//! edge width, label, layout profile) and hands them to the raster backend in
//! [`plot`]. Everything in this module is pure; only [`RenderProjector::render`]
//! touches the filesystem.
//!
//! Units follow the usual plotting conventions: node sizes are marker areas
//! in points², edge widths are line widths in points. The backend converts
//! both to pixels using the configured DPI.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{LayoutProfile, RenderConfig};
use crate::graph::DependencyGraph;
use crate::importance::ImportanceScores;
use crate::layout::LayoutEngine;

pub mod colors;
pub mod fonts;
pub mod plot;

/// Default artifact name when no output path is given
pub const DEFAULT_OUTPUT: &str = "dependency_graph.png";

/// Layout configuration class chosen from the graph size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutDensity {
    /// Small graph: tighter spacing, more iterations
    Dense,
    /// Large graph: looser spacing, fewer iterations
    Sparse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeVisual {
    pub id: String,
    pub label: String,
    /// Marker area in points²
    pub size: f64,
    /// Input to the sequential color scale
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeVisual {
    /// Node positions in [`VisualParameters::nodes`]
    pub source: usize,
    pub target: usize,
    /// Line width in points
    pub width: f64,
}

/// Everything the backend needs to draw one graph
#[derive(Debug, Clone, PartialEq)]
pub struct VisualParameters {
    pub density: LayoutDensity,
    pub profile: LayoutProfile,
    /// Indexed by `NodeIndex::index()`
    pub nodes: Vec<NodeVisual>,
    pub edges: Vec<EdgeVisual>,
}

/// Descriptive statistics shown next to the graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
    /// `m / (n (n - 1))`; 0 for graphs with fewer than two nodes
    pub density: f64,
    /// Undefined for an empty graph
    pub mean_in_degree: Option<f64>,
}

impl GraphSummary {
    pub fn of(graph: &DependencyGraph) -> Self {
        let n = graph.node_count();
        let m = graph.edge_count();
        let density = if n > 1 {
            m as f64 / (n as f64 * (n - 1) as f64)
        } else {
            0.0
        };
        // Every edge contributes exactly one in-degree
        let total_in: usize = graph.node_indices().map(|i| graph.in_degree(i)).sum();
        let mean_in_degree = (n > 0).then(|| total_in as f64 / n as f64);

        Self {
            nodes: n,
            edges: m,
            density,
            mean_in_degree,
        }
    }

    /// Panel text, one statistic per line
    pub fn lines(&self) -> Vec<String> {
        let mean = match self.mean_in_degree {
            Some(mean) => format!("{mean:.1}"),
            None => "n/a".to_string(),
        };
        vec![
            "Graph Statistics:".to_string(),
            format!("Nodes: {}", self.nodes),
            format!("Edges: {}", self.edges),
            format!("Density: {:.3}", self.density),
            format!("Avg In-Degree: {mean}"),
        ]
    }
}

impl fmt::Display for GraphSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}

/// Turns scores into visual parameters and drives the backend
pub struct RenderProjector<'a> {
    config: &'a RenderConfig,
}

impl<'a> RenderProjector<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    pub fn layout_density(&self, node_count: usize) -> LayoutDensity {
        if node_count > self.config.large_graph_threshold {
            LayoutDensity::Sparse
        } else {
            LayoutDensity::Dense
        }
    }

    pub fn layout_profile(&self, density: LayoutDensity) -> LayoutProfile {
        match density {
            LayoutDensity::Dense => self.config.dense_layout,
            LayoutDensity::Sparse => self.config.sparse_layout,
        }
    }

    /// `max(floor, score * scale)`
    pub fn node_size(&self, score: f64) -> f64 {
        (score * self.config.node_size_scale).max(self.config.min_node_size)
    }

    /// Width of an edge from the importance of the node it points into
    pub fn edge_width(&self, target_score: f64) -> f64 {
        target_score * self.config.edge_width_scale + self.config.edge_width_base
    }

    /// Display label: basename for path-like ids, truncated when long
    pub fn label(&self, id: &str) -> String {
        // Both separators count on every platform
        let name = id
            .rsplit(['/', '\\'])
            .find(|s| !s.is_empty())
            .unwrap_or(id)
            .to_string();

        if name.chars().count() > self.config.label_max_chars {
            let kept: String = name.chars().take(self.config.label_keep_chars).collect();
            format!("{kept}{}", self.config.label_ellipsis)
        } else {
            name
        }
    }

    pub fn project(&self, graph: &DependencyGraph, scores: &ImportanceScores) -> VisualParameters {
        let density = self.layout_density(graph.node_count());

        let nodes = graph
            .node_indices()
            .filter_map(|idx| graph.node_id(idx))
            .map(|id| {
                let score = scores.get(id);
                NodeVisual {
                    id: id.to_string(),
                    label: self.label(id),
                    size: self.node_size(score),
                    intensity: score,
                }
            })
            .collect();

        let edges = graph
            .edge_endpoints()
            .map(|(source, target)| {
                let target_score = graph.node_id(target).map(|id| scores.get(id)).unwrap_or(0.0);
                EdgeVisual {
                    source: source.index(),
                    target: target.index(),
                    width: self.edge_width(target_score),
                }
            })
            .collect();

        VisualParameters {
            density,
            profile: self.layout_profile(density),
            nodes,
            edges,
        }
    }

    /// Project, lay out, and draw the graph to `output`
    pub fn render<L: LayoutEngine>(
        &self,
        graph: &DependencyGraph,
        scores: &ImportanceScores,
        engine: &L,
        output: &Path,
    ) -> anyhow::Result<PathBuf> {
        let visuals = self.project(graph, scores);
        let positions = engine.layout(graph, visuals.profile);
        let summary = GraphSummary::of(graph);
        tracing::debug!(density = ?visuals.density, nodes = visuals.nodes.len(), "laid out graph");

        plot::draw(self.config, &visuals, &positions, &summary, output)?;
        tracing::info!(path = %output.display(), "dependency graph saved");
        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RankingConfig;
    use crate::extract::DependencyEdge;
    use crate::importance::ImportanceScorer;

    fn projector_config() -> RenderConfig {
        RenderConfig::default()
    }

    #[test]
    fn test_node_size_floor_and_ceiling() {
        let config = projector_config();
        let projector = RenderProjector::new(&config);

        assert_eq!(projector.node_size(0.0), 300.0);
        assert_eq!(projector.node_size(0.1), 300.0);
        assert_eq!(projector.node_size(0.5), 1000.0);
        assert_eq!(projector.node_size(1.0), 2000.0);
    }

    #[test]
    fn test_edge_width_uses_target_score() {
        let config = projector_config();
        let projector = RenderProjector::new(&config);

        assert_eq!(projector.edge_width(0.0), 0.5);
        assert_eq!(projector.edge_width(1.0), 3.5);
    }

    #[test]
    fn test_label_truncation() {
        let config = projector_config();
        let projector = RenderProjector::new(&config);

        assert_eq!(projector.label("a_very_long_module_name.py"), "a_very_lon..");
        assert_eq!(projector.label("short.py"), "short.py");
        // Exactly 12 characters stays intact
        assert_eq!(projector.label("twelve_chars"), "twelve_chars");
    }

    #[test]
    fn test_label_uses_basename_for_paths() {
        let config = projector_config();
        let projector = RenderProjector::new(&config);

        assert_eq!(projector.label("src/core/graph.rs"), "graph.rs");
        assert_eq!(projector.label("src/core/a_very_long_module_name.py"), "a_very_lon..");
        assert_eq!(projector.label("pkg/"), "pkg");
        assert_eq!(projector.label("src\\pkg\\db.py"), "db.py");
        assert_eq!(projector.label("src/mixed\\name.rs"), "name.rs");
    }

    #[test]
    fn test_layout_density_threshold() {
        let config = projector_config();
        let projector = RenderProjector::new(&config);

        assert_eq!(projector.layout_density(50), LayoutDensity::Dense);
        assert_eq!(projector.layout_density(51), LayoutDensity::Sparse);
        assert_eq!(projector.layout_profile(LayoutDensity::Sparse).iterations, 20);
        assert_eq!(projector.layout_profile(LayoutDensity::Dense).iterations, 50);
    }

    #[test]
    fn test_project_keeps_identity_and_maps_edges() {
        let edges = vec![DependencyEdge::new("lib/a_very_long_module_name.py", "b")];
        let (graph, _) = DependencyGraph::build(&edges);
        let scores = ImportanceScorer::new(&RankingConfig::default()).score(&graph);
        let config = projector_config();
        let visuals = RenderProjector::new(&config).project(&graph, &scores);

        assert_eq!(visuals.nodes[0].id, "lib/a_very_long_module_name.py");
        assert_eq!(visuals.nodes[0].label, "a_very_lon..");
        assert_eq!(visuals.nodes[1].intensity, scores.get("b"));
        assert_eq!(visuals.edges.len(), 1);
        assert_eq!(visuals.edges[0].target, 1);
        assert_eq!(visuals.edges[0].width, scores.get("b") * 3.0 + 0.5);
    }

    #[test]
    fn test_summary_of_sample_graph() {
        let summary = GraphSummary::of(&DependencyGraph::sample());

        assert_eq!(summary.nodes, 9);
        assert_eq!(summary.edges, 10);
        assert!((summary.density - 10.0 / 72.0).abs() < 1e-12);
        assert!((summary.mean_in_degree.unwrap() - 10.0 / 9.0).abs() < 1e-12);
        assert_eq!(summary.lines()[3], "Density: 0.139");
    }

    #[test]
    fn test_summary_of_empty_graph_is_guarded() {
        let summary = GraphSummary::of(&DependencyGraph::new());

        assert_eq!(summary.density, 0.0);
        assert_eq!(summary.mean_in_degree, None);
        assert_eq!(summary.lines()[4], "Avg In-Degree: n/a");
    }
}
