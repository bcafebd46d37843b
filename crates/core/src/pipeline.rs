//! End-to-end run: document → edges → graph → scores → image

use std::path::{Path, PathBuf};

use crate::config::VizConfig;
use crate::discovery;
use crate::document::AnalysisDocument;
use crate::extract::extract_dependencies;
use crate::graph::{DependencyGraph, GraphOrigin};
use crate::importance::{ImportanceScorer, ScoreSource};
use crate::layout::SpringLayout;
use crate::render::{GraphSummary, LayoutDensity, RenderProjector};

/// How many of the highest-scoring nodes a report lists
const TOP_NODES: usize = 5;

/// Outcome of one run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub edges_found: usize,
    pub origin: GraphOrigin,
    pub summary: GraphSummary,
    pub layout: LayoutDensity,
    pub score_source: ScoreSource,
    /// Highest-scoring nodes, best first
    pub top_nodes: Vec<(String, f64)>,
    pub artifact: PathBuf,
}

/// Where the input came from and what it contained
#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub path: Option<PathBuf>,
    pub document: AnalysisDocument,
}

/// Resolve and load the input document
///
/// An explicit path is used as is. Otherwise the conventional locations under
/// `root` (and the optional scan directory) are searched. Missing or unreadable
/// input yields an empty document.
pub fn load_input(
    explicit: Option<&Path>,
    root: &Path,
    scan_dir: Option<&Path>,
    config: &VizConfig,
) -> LoadedInput {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => discovery::locate_input(
            root,
            &config.discovery.candidates,
            scan_dir.map(|dir| (dir, config.discovery.scan_patterns.as_slice())),
        ),
    };

    match path {
        Some(path) => LoadedInput {
            document: AnalysisDocument::load_or_empty(&path),
            path: Some(path),
        },
        None => {
            tracing::warn!("no analysis data found, continuing with sample data");
            LoadedInput {
                path: None,
                document: AnalysisDocument::empty(),
            }
        }
    }
}

/// Run the whole pipeline on a document and write the image to `output`
pub fn run(
    document: &AnalysisDocument,
    config: &VizConfig,
    output: &Path,
) -> anyhow::Result<PipelineReport> {
    let edges = extract_dependencies(document);
    let (graph, origin) = DependencyGraph::build(&edges);

    let scores = ImportanceScorer::new(&config.ranking).score(&graph);
    let projector = RenderProjector::new(&config.render);
    let artifact = projector.render(&graph, &scores, &SpringLayout, output)?;

    let top_nodes = scores
        .ranked()
        .into_iter()
        .take(TOP_NODES)
        .map(|(id, score)| (id.to_string(), score))
        .collect();

    Ok(PipelineReport {
        edges_found: edges.len(),
        origin,
        summary: GraphSummary::of(&graph),
        layout: projector.layout_density(graph.node_count()),
        score_source: scores.source().clone(),
        top_nodes,
        artifact,
    })
}
