//! Run configuration
//!
//! Every tunable constant of the pipeline lives in [`VizConfig`]. The config is
//! built once (defaults, optionally overlaid by a JSON file) and passed by
//! reference into the scorer and the projector.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Top-level configuration for a single visualization run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub ranking: RankingConfig,
    pub render: RenderConfig,
    pub discovery: DiscoveryConfig,
}

impl VizConfig {
    /// Load a config from a JSON file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// PageRank power-iteration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub damping: f64,
    pub max_iterations: usize,
    /// Per-node tolerance; the convergence check uses `node_count * tolerance`
    pub tolerance: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

/// Spring layout settings for one graph-size class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutProfile {
    /// Optimal distance between nodes (spring constant `k`)
    pub spring_constant: f64,
    pub iterations: usize,
}

impl LayoutProfile {
    /// Small graphs: tighter spacing, more iterations
    pub const DENSE: LayoutProfile = LayoutProfile {
        spring_constant: 2.0,
        iterations: 50,
    };

    /// Large graphs: looser spacing, fewer iterations
    pub const SPARSE: LayoutProfile = LayoutProfile {
        spring_constant: 3.0,
        iterations: 20,
    };
}

/// A layout profile as written in a config file; absent fields are inherited
#[derive(Deserialize)]
struct ProfileOverride {
    spring_constant: Option<f64>,
    iterations: Option<usize>,
}

impl ProfileOverride {
    fn over(self, base: LayoutProfile) -> LayoutProfile {
        LayoutProfile {
            spring_constant: self.spring_constant.unwrap_or(base.spring_constant),
            iterations: self.iterations.unwrap_or(base.iterations),
        }
    }
}

fn dense_profile<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LayoutProfile, D::Error> {
    ProfileOverride::deserialize(deserializer).map(|o| o.over(LayoutProfile::DENSE))
}

fn sparse_profile<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LayoutProfile, D::Error> {
    ProfileOverride::deserialize(deserializer).map(|o| o.over(LayoutProfile::SPARSE))
}

/// Visual mapping constants and canvas settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Floor for node marker size (points squared)
    pub min_node_size: f64,
    pub node_size_scale: f64,
    pub edge_width_scale: f64,
    pub edge_width_base: f64,
    /// Labels longer than this are truncated
    pub label_max_chars: usize,
    /// Characters kept when truncating
    pub label_keep_chars: usize,
    pub label_ellipsis: String,
    /// Graphs with more nodes than this use the sparse layout profile
    pub large_graph_threshold: usize,
    #[serde(deserialize_with = "dense_profile")]
    pub dense_layout: LayoutProfile,
    #[serde(deserialize_with = "sparse_profile")]
    pub sparse_layout: LayoutProfile,
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
    pub title: String,
    /// TrueType fonts tried in order for label and panel text
    pub font_paths: Vec<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            min_node_size: 300.0,
            node_size_scale: 2000.0,
            edge_width_scale: 3.0,
            edge_width_base: 0.5,
            label_max_chars: 12,
            label_keep_chars: 10,
            label_ellipsis: "..".to_string(),
            large_graph_threshold: 50,
            dense_layout: LayoutProfile::DENSE,
            sparse_layout: LayoutProfile::SPARSE,
            width_in: 16.0,
            height_in: 12.0,
            dpi: 300,
            title: "Dependency Graph Visualization".to_string(),
            font_paths: [
                "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
                "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
                "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
                "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
                "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
                "C:\\Windows\\Fonts\\arialbd.ttf",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
        }
    }
}

impl RenderConfig {
    /// Canvas size in pixels
    pub fn canvas_pixels(&self) -> (u32, u32) {
        let dpi = f64::from(self.dpi);
        (
            (self.width_in * dpi).round().max(1.0) as u32,
            (self.height_in * dpi).round().max(1.0) as u32,
        )
    }

    /// Pixels per typographic point
    pub fn px_per_point(&self) -> f64 {
        f64::from(self.dpi) / 72.0
    }
}

/// Where to look for an analysis export when none is given explicitly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Conventional locations, probed in order
    pub candidates: Vec<PathBuf>,
    /// Glob patterns used by a directory scan
    pub scan_patterns: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            candidates: [
                "complete_viz/dependencies_visualization.json",
                "complete_viz/topology_visualization.json",
                "dependencies_visualization.json",
                "topology_visualization.json",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
            scan_patterns: vec!["**/*_visualization.json".to_string()],
        }
    }
}
