//! Node importance scoring
//!
//! The composite score blends three structural signals:
//!
//! ```text
//! score = 0.4 * pagerank + 0.3 * in_degree / max_in + 0.3 * out_degree / max_out
//! ```
//!
//! PageRank is computed by power iteration and may fail (empty graph, no
//! convergence). Any failure abandons the blend entirely and every node is
//! scored by plain degree centrality instead.

use std::collections::HashMap;

use thiserror::Error;

use crate::config::RankingConfig;
use crate::graph::DependencyGraph;

/// Weights of the three importance signals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub pagerank: f64,
    pub in_degree: f64,
    pub out_degree: f64,
}

impl ScoreWeights {
    /// The fixed blend; sums to 1.0
    pub const BLEND: ScoreWeights = ScoreWeights {
        pagerank: 0.4,
        in_degree: 0.3,
        out_degree: 0.3,
    };

    pub fn combine(&self, pagerank: f64, in_degree: f64, out_degree: f64) -> f64 {
        self.pagerank * pagerank + self.in_degree * in_degree + self.out_degree * out_degree
    }

    pub fn total(&self) -> f64 {
        self.pagerank + self.in_degree + self.out_degree
    }
}

/// Why rank propagation produced no usable result
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RankError {
    #[error("graph has no nodes")]
    EmptyGraph,
    #[error("power iteration did not converge within {iterations} iterations (error {error:.3e})")]
    NotConverged { iterations: usize, error: f64 },
    #[error("rank computation produced a non-finite value")]
    NonFinite,
    #[error("invalid damping factor {0}")]
    InvalidDamping(f64),
}

/// A rank-propagation algorithm over a dependency graph
///
/// Returns one rank per node, indexed by `NodeIndex::index()`.
pub trait RankAlgorithm {
    fn rank(&self, graph: &DependencyGraph) -> Result<Vec<f64>, RankError>;
}

/// Standard PageRank with uniform teleport and dangling-node redistribution
#[derive(Debug, Clone)]
pub struct PageRank {
    config: RankingConfig,
}

impl PageRank {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }
}

impl Default for PageRank {
    fn default() -> Self {
        Self::new(RankingConfig::default())
    }
}

impl RankAlgorithm for PageRank {
    fn rank(&self, graph: &DependencyGraph) -> Result<Vec<f64>, RankError> {
        let alpha = self.config.damping;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(RankError::InvalidDamping(alpha));
        }

        let n = graph.node_count();
        if n == 0 {
            return Err(RankError::EmptyGraph);
        }

        let uniform = 1.0 / n as f64;
        let out_degree: Vec<usize> = graph.node_indices().map(|i| graph.out_degree(i)).collect();
        let threshold = n as f64 * self.config.tolerance;

        let mut ranks = vec![uniform; n];
        let mut error = f64::INFINITY;

        for _ in 0..self.config.max_iterations {
            // Mass held by nodes with no outgoing edges is spread uniformly
            let dangling: f64 = out_degree
                .iter()
                .zip(&ranks)
                .filter(|(d, _)| **d == 0)
                .map(|(_, &r)| r)
                .sum();

            let base = (1.0 - alpha) * uniform + alpha * dangling * uniform;
            let mut next = vec![base; n];
            for (source, target) in graph.edge_endpoints() {
                let s = source.index();
                next[target.index()] += alpha * ranks[s] / out_degree[s] as f64;
            }

            error = next.iter().zip(&ranks).map(|(a, b)| (a - b).abs()).sum();
            ranks = next;

            if !error.is_finite() {
                return Err(RankError::NonFinite);
            }
            if error < threshold {
                return Ok(ranks);
            }
        }

        Err(RankError::NotConverged {
            iterations: self.config.max_iterations,
            error,
        })
    }
}

/// Which computation produced a set of scores
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreSource {
    /// PageRank + normalized degree blend
    Blended,
    /// Degree centrality after rank propagation failed
    DegreeCentrality { reason: RankError },
}

/// Importance per node identity
#[derive(Debug, Clone)]
pub struct ImportanceScores {
    scores: HashMap<String, f64>,
    source: ScoreSource,
}

impl ImportanceScores {
    /// Score of a node; unknown nodes score 0
    pub fn get(&self, id: &str) -> f64 {
        self.scores.get(id).copied().unwrap_or(0.0)
    }

    pub fn source(&self) -> &ScoreSource {
        &self.source
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ScoreSource::DegreeCentrality { .. })
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Node identities ordered by descending score, ties by identity
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

/// Scores graphs with a rank algorithm, falling back to degree centrality
pub struct ImportanceScorer<R = PageRank> {
    ranker: R,
}

impl ImportanceScorer<PageRank> {
    pub fn new(config: &RankingConfig) -> Self {
        Self {
            ranker: PageRank::new(config.clone()),
        }
    }
}

impl<R: RankAlgorithm> ImportanceScorer<R> {
    /// Use a custom rank algorithm
    pub fn with_ranker(ranker: R) -> Self {
        Self { ranker }
    }

    /// Score every node of the graph; never fails
    pub fn score(&self, graph: &DependencyGraph) -> ImportanceScores {
        match blended_scores(graph, &self.ranker) {
            Ok(scores) => ImportanceScores {
                scores,
                source: ScoreSource::Blended,
            },
            Err(reason) => {
                tracing::warn!(%reason, "rank propagation failed, using degree centrality");
                ImportanceScores {
                    scores: degree_centrality(graph),
                    source: ScoreSource::DegreeCentrality { reason },
                }
            }
        }
    }
}

fn blended_scores<R: RankAlgorithm>(
    graph: &DependencyGraph,
    ranker: &R,
) -> Result<HashMap<String, f64>, RankError> {
    let ranks = ranker.rank(graph)?;

    let in_degree: Vec<usize> = graph.node_indices().map(|i| graph.in_degree(i)).collect();
    let out_degree: Vec<usize> = graph.node_indices().map(|i| graph.out_degree(i)).collect();
    let max_in = in_degree.iter().copied().max().unwrap_or(0).max(1) as f64;
    let max_out = out_degree.iter().copied().max().unwrap_or(0).max(1) as f64;

    let weights = ScoreWeights::BLEND;
    graph
        .node_indices()
        .map(|idx| {
            let i = idx.index();
            let rank = ranks.get(i).copied().ok_or(RankError::NonFinite)?;
            let score = weights.combine(
                rank,
                in_degree[i] as f64 / max_in,
                out_degree[i] as f64 / max_out,
            );
            let id = graph.node_id(idx).unwrap_or_default().to_string();
            Ok((id, score))
        })
        .collect()
}

/// `(in + out) / (n - 1)` per node; every node scores 1.0 when `n <= 1`
pub fn degree_centrality(graph: &DependencyGraph) -> HashMap<String, f64> {
    let n = graph.node_count();
    let scale = if n > 1 { 1.0 / (n - 1) as f64 } else { 1.0 };

    graph
        .node_indices()
        .map(|idx| {
            let degree = if n > 1 {
                (graph.in_degree(idx) + graph.out_degree(idx)) as f64
            } else {
                1.0
            };
            let id = graph.node_id(idx).unwrap_or_default().to_string();
            (id, degree * scale)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::DependencyEdge;

    struct FailingRanker;

    impl RankAlgorithm for FailingRanker {
        fn rank(&self, _graph: &DependencyGraph) -> Result<Vec<f64>, RankError> {
            Err(RankError::NotConverged {
                iterations: 0,
                error: 1.0,
            })
        }
    }

    fn graph(pairs: &[(&str, &str)]) -> DependencyGraph {
        let edges: Vec<_> = pairs.iter().map(|(s, t)| DependencyEdge::new(*s, *t)).collect();
        DependencyGraph::build(&edges).0
    }

    #[test]
    fn test_weights_sum_to_one() {
        let w = ScoreWeights::BLEND;
        assert!((w.total() - 1.0).abs() < 1e-12);
        assert!(w.combine(1.0, 1.0, 1.0) <= 1.0 + 1e-12);
    }

    #[test]
    fn test_pagerank_sums_to_one() {
        let g = DependencyGraph::sample();
        let ranks = PageRank::default().rank(&g).unwrap();

        assert_eq!(ranks.len(), g.node_count());
        assert!((ranks.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        assert!(ranks.iter().all(|&r| r > 0.0));
    }

    #[test]
    fn test_pagerank_favors_depended_upon_node() {
        let g = graph(&[("a", "hub"), ("b", "hub"), ("c", "hub")]);
        let ranks = PageRank::default().rank(&g).unwrap();
        let hub = g.find_node_by_id("hub").unwrap().index();
        let a = g.find_node_by_id("a").unwrap().index();

        assert!(ranks[hub] > ranks[a]);
    }

    #[test]
    fn test_pagerank_empty_graph_is_error() {
        let result = PageRank::default().rank(&DependencyGraph::new());
        assert_eq!(result, Err(RankError::EmptyGraph));
    }

    #[test]
    fn test_pagerank_reports_non_convergence() {
        let ranker = PageRank::new(RankingConfig {
            max_iterations: 1,
            tolerance: 0.0,
            ..RankingConfig::default()
        });
        let result = ranker.rank(&DependencyGraph::sample());
        assert!(matches!(result, Err(RankError::NotConverged { iterations: 1, .. })));
    }

    #[test]
    fn test_pagerank_rejects_bad_damping() {
        let ranker = PageRank::new(RankingConfig {
            damping: 1.5,
            ..RankingConfig::default()
        });
        assert_eq!(ranker.rank(&DependencyGraph::sample()), Err(RankError::InvalidDamping(1.5)));
    }

    #[test]
    fn test_blended_scores_cover_every_node() {
        let g = DependencyGraph::sample();
        let scores = ImportanceScorer::new(&RankingConfig::default()).score(&g);

        assert_eq!(scores.source(), &ScoreSource::Blended);
        assert_eq!(scores.len(), g.node_count());
        for (_, score) in scores.iter() {
            assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn test_blend_matches_formula() {
        // a -> b: ranks are known in closed form for two nodes
        let g = graph(&[("a", "b")]);
        let ranks = PageRank::default().rank(&g).unwrap();
        let scores = ImportanceScorer::new(&RankingConfig::default()).score(&g);
        let a = g.find_node_by_id("a").unwrap().index();
        let b = g.find_node_by_id("b").unwrap().index();

        assert!((scores.get("a") - (0.4 * ranks[a] + 0.3)).abs() < 1e-12);
        assert!((scores.get("b") - (0.4 * ranks[b] + 0.3)).abs() < 1e-12);
    }

    #[test]
    fn test_forced_failure_yields_degree_centrality() {
        let g = graph(&[("A", "B"), ("A", "C")]);
        let scores = ImportanceScorer::with_ranker(FailingRanker).score(&g);

        assert!(scores.is_fallback());
        let expected = degree_centrality(&g);
        for (id, score) in scores.iter() {
            assert_eq!(score, expected[id]);
        }
        assert_eq!(scores.get("A"), 1.0);
        assert_eq!(scores.get("B"), 0.5);
        assert!(scores.get("A") > scores.get("B"));
        assert!(scores.get("A") > scores.get("C"));
    }

    #[test]
    fn test_empty_graph_falls_back_without_panicking() {
        let scores = ImportanceScorer::new(&RankingConfig::default()).score(&DependencyGraph::new());
        assert!(scores.is_empty());
        assert!(matches!(
            scores.source(),
            ScoreSource::DegreeCentrality { reason: RankError::EmptyGraph }
        ));
    }

    #[test]
    fn test_degree_centrality_single_node() {
        let g = graph(&[("solo", "solo")]);
        assert_eq!(degree_centrality(&g)["solo"], 1.0);
    }

    #[test]
    fn test_ranked_orders_by_score() {
        let g = graph(&[("A", "B"), ("A", "C")]);
        let scores = ImportanceScorer::with_ranker(FailingRanker).score(&g);
        let ranked = scores.ranked();

        assert_eq!(ranked[0].0, "A");
        assert_eq!(ranked[1].0, "B");
        assert_eq!(ranked[2].0, "C");
    }
}
