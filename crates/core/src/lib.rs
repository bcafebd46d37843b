//! depgraph-viz core library
//!
//! Turns an analysis export into a ranked dependency graph image:
//! extraction → graph construction → importance scoring → render projection.

pub mod config;
pub mod discovery;
pub mod document;
pub mod extract;
pub mod graph;
pub mod importance;
pub mod layout;
pub mod pipeline;
pub mod render;

// Re-export commonly used types
pub use config::VizConfig;
pub use document::AnalysisDocument;
pub use extract::{extract_dependencies, DependencyEdge};
pub use graph::{DependencyGraph, GraphOrigin};
pub use importance::{ImportanceScorer, ImportanceScores, RankError, ScoreSource};
pub use pipeline::{PipelineReport, run};
pub use render::{GraphSummary, RenderProjector, VisualParameters};
