//! Graph reduction passes.
//!
//! Every pass is idempotent and keeps the no-dangling-edge invariant: nodes
//! are only ever removed together with their incident edges.

use crate::config::ReductionConfig;
use crate::graph::Graph;
use crate::manager::GraphManager;
use rayon::prelude::*;
use tracing::{debug, info};

impl Graph {
    /// Removes every edge whose two endpoints carry the same label.
    pub fn remove_self_loops(&mut self) -> usize {
        self.remove_edges_where(|edge| edge.key().is_self_loop())
    }

    /// Removes the node whose label is the rendering of this graph's own
    /// timestamp, e.g. `"1863"` in the graph of 1863.
    pub fn remove_timestamp_self_mention(&mut self) -> bool {
        let label = self.timestamp().to_string();
        !label.is_empty() && self.remove_node(&label).is_some()
    }

    /// Removes every node weighing strictly less than `min`.
    pub fn require_minimum_weight(&mut self, min: f64) -> usize {
        self.remove_nodes_where(|node| node.weight() < min)
    }

    /// Keeps the `n` highest-weighted nodes. Nodes tied with the n-th
    /// highest weight are all kept, so more than `n` may survive.
    ///
    /// `n == 0` leaves the graph untouched.
    pub fn reduce_to_top_n(&mut self, n: usize) -> usize {
        let len = self.node_count();
        if n == 0 || len <= n {
            return 0;
        }

        let mut weights: Vec<f64> = self.nodes().map(|node| node.weight()).collect();
        weights.sort_unstable_by(f64::total_cmp);
        let threshold = weights[len - n];
        self.require_minimum_weight(threshold)
    }

    /// Applies the enabled passes in their fixed order.
    pub fn reduce(&mut self, config: &ReductionConfig) -> ReductionReport {
        let mut report = ReductionReport::default();
        if config.remove_self_loops {
            report.self_loops = self.remove_self_loops();
        }
        if config.remove_timestamp_self_mentions && self.remove_timestamp_self_mention() {
            report.self_mentions = 1;
        }
        if let Some(n) = config.top_n {
            report.pruned_nodes = self.reduce_to_top_n(n);
        }
        report
    }
}

/// What a reduction removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReductionReport {
    pub self_loops: usize,
    pub self_mentions: usize,
    pub pruned_nodes: usize,
}

impl std::ops::Add for ReductionReport {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            self_loops: self.self_loops + other.self_loops,
            self_mentions: self.self_mentions + other.self_mentions,
            pruned_nodes: self.pruned_nodes + other.pruned_nodes,
        }
    }
}

impl GraphManager {
    /// Removes self-loops from every graph in parallel.
    pub fn remove_self_loops(&mut self) -> usize {
        self.graph_map_mut()
            .par_iter_mut()
            .map(|(_, graph)| graph.remove_self_loops())
            .sum()
    }

    /// Removes each graph's timestamp self-mention in parallel.
    pub fn remove_timestamp_self_mentions(&mut self) -> usize {
        self.graph_map_mut()
            .par_iter_mut()
            .map(|(_, graph)| graph.remove_timestamp_self_mention())
            .filter(|removed| *removed)
            .count()
    }

    /// Reduces every graph to its top `n` nodes in parallel.
    pub fn reduce_to_top_n(&mut self, n: usize) -> usize {
        self.graph_map_mut()
            .par_iter_mut()
            .map(|(_, graph)| graph.reduce_to_top_n(n))
            .sum()
    }

    /// Runs the configured passes on every graph, graph-by-graph in parallel.
    pub fn apply_reduction(&mut self, config: &ReductionConfig) -> ReductionReport {
        let report = self
            .graph_map_mut()
            .par_iter_mut()
            .map(|(_, graph)| {
                let report = graph.reduce(config);
                debug!(timestamp = %graph.timestamp(), ?report, "reduced graph");
                report
            })
            .reduce(ReductionReport::default, |a, b| a + b);

        info!(
            self_loops = report.self_loops,
            self_mentions = report.self_mentions,
            pruned_nodes = report.pruned_nodes,
            "reduction complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::IdAllocator;
    use timecentric_core::{Document, Timestamp};

    /// A year-1863 graph over `labels`, every pair connected once.
    fn clique(labels: &[&str]) -> (Graph, Document) {
        let mut doc = Document::new(1u64);
        let s = doc.push_sentence(0, 50).unwrap();
        for label in labels {
            s.push_word(*label, "");
        }
        let ids = IdAllocator::new();
        let mut graph = Graph::new(Timestamp::year(1863));
        let words = doc.sentences()[0].words();
        for i in 0..words.len() {
            for j in i + 1..words.len() {
                graph.add_edge(&words[i], &words[j], &ids);
            }
        }
        (graph, doc)
    }

    fn set_weights(graph: &mut Graph, weights: &[(&str, f64)]) {
        for (label, weight) in weights {
            graph.find_mut(label).unwrap().set_weight(*weight);
        }
    }

    #[test]
    fn test_remove_self_loops() {
        let (mut graph, _doc) = clique(&["war", "war", "peace"]);
        assert!(graph.edge("war", "war").is_some());

        assert_eq!(graph.remove_self_loops(), 1);
        assert!(graph.edges().all(|e| e.source() != e.target()));
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.remove_self_loops(), 0);
    }

    #[test]
    fn test_timestamp_self_mention_removed() {
        let (mut graph, _doc) = clique(&["1863", "gettysburg", "battle"]);
        assert!(graph.remove_timestamp_self_mention());
        assert!(graph.find("1863").is_none());
        assert_eq!(graph.edge_count(), 1);
        assert!(!graph.has_dangling_edges());
        assert!(!graph.remove_timestamp_self_mention());
    }

    #[test]
    fn test_top_n_keeps_highest() {
        let (mut graph, _doc) = clique(&["a", "b", "c", "d", "e"]);
        set_weights(&mut graph, &[("a", 5.0), ("b", 4.0), ("c", 3.0), ("d", 2.0), ("e", 1.0)]);

        assert_eq!(graph.reduce_to_top_n(2), 3);
        let mut labels: Vec<&str> = graph.nodes().map(|n| n.label()).collect();
        labels.sort();
        assert_eq!(labels, vec!["a", "b"]);
        assert_eq!(graph.edge_count(), 1);
        assert!(!graph.has_dangling_edges());
    }

    #[test]
    fn test_top_n_keeps_ties() {
        let (mut graph, _doc) = clique(&["a", "b", "c", "d"]);
        set_weights(&mut graph, &[("a", 3.0), ("b", 2.0), ("c", 2.0), ("d", 1.0)]);

        graph.reduce_to_top_n(2);
        assert_eq!(graph.node_count(), 3);
        assert!(graph.find("d").is_none());
    }

    #[test]
    fn test_top_n_larger_than_graph_is_noop() {
        let (mut graph, _doc) = clique(&["a", "b", "c"]);
        assert_eq!(graph.reduce_to_top_n(3), 0);
        assert_eq!(graph.reduce_to_top_n(10), 0);
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_top_zero_keeps_every_node() {
        let (mut graph, _doc) = clique(&["a", "b", "c"]);
        set_weights(&mut graph, &[("a", 3.0), ("b", 1.0), ("c", 2.0)]);
        assert_eq!(graph.reduce_to_top_n(0), 0);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_negative_weights_are_ordered() {
        let (mut graph, _doc) = clique(&["a", "b", "c"]);
        set_weights(&mut graph, &[("a", -0.5), ("b", 0.0), ("c", -1.2)]);
        graph.reduce_to_top_n(1);
        assert_eq!(graph.nodes().map(|n| n.label()).collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_reduce_follows_config() {
        let (mut graph, _doc) = clique(&["1863", "war", "war", "army"]);
        let config = ReductionConfig {
            remove_self_loops: true,
            remove_timestamp_self_mentions: true,
            top_n: None,
        };
        let report = graph.reduce(&config);
        assert_eq!(
            report,
            ReductionReport {
                self_loops: 1,
                self_mentions: 1,
                pruned_nodes: 0
            }
        );
        assert_eq!(graph.node_count(), 2);

        let again = graph.reduce(&config);
        assert_eq!(again, ReductionReport::default());
    }
}
