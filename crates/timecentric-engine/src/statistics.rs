//! Summary statistics of a graph index.
//!
//! # Example
//!
//! ```ignore
//! use timecentric_engine::statistics::IndexStatistics;
//!
//! let stats = IndexStatistics::from_manager(&manager);
//! println!("{}", stats.summary());
//! ```

use crate::export::GraphsExport;
use crate::manager::GraphManager;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use timecentric_core::{Granularity, Timestamp};

/// Statistics about a graph index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStatistics {
    /// Number of graphs per granularity
    pub graph_counts: BTreeMap<Granularity, usize>,
    /// Total nodes over all graphs
    pub node_count: usize,
    /// Total edges over all graphs
    pub edge_count: usize,
    /// Total evidence records over all edges
    pub evidence_count: usize,
    /// Distinct labels over all graphs
    pub distinct_labels: usize,
    /// Earliest timestamp with a graph
    pub first: Option<Timestamp>,
    /// Latest timestamp with a graph
    pub last: Option<Timestamp>,
    /// Largest graph by node count
    pub largest: Option<(Timestamp, usize)>,
}

impl IndexStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects statistics from a live index.
    pub fn from_manager(manager: &GraphManager) -> Self {
        let mut builder = StatisticsBuilder::new();
        for graph in manager.graphs() {
            builder = builder.add_graph(
                graph.timestamp(),
                graph.nodes().map(|node| node.label()),
                graph.edge_count(),
                graph.edges().map(|edge| edge.value()).sum(),
            );
        }
        builder.build()
    }

    /// Collects statistics from an exported index.
    pub fn from_export(export: &GraphsExport) -> Self {
        let mut builder = StatisticsBuilder::new();
        for (timestamp, graph) in export.iter() {
            builder = builder.add_graph(
                *timestamp,
                graph.nodes.iter().map(|node| node.label.as_str()),
                graph.edges.len(),
                graph.edges.iter().map(|edge| edge.value).sum(),
            );
        }
        builder.build()
    }

    /// Total number of graphs.
    pub fn graph_count(&self) -> usize {
        self.graph_counts.values().sum()
    }

    pub fn graphs_of(&self, granularity: Granularity) -> usize {
        self.graph_counts.get(&granularity).copied().unwrap_or(0)
    }

    /// Mean node count per graph.
    pub fn avg_nodes(&self) -> f64 {
        match self.graph_count() {
            0 => 0.0,
            n => self.node_count as f64 / n as f64,
        }
    }

    /// Returns a summary string for display.
    pub fn summary(&self) -> String {
        let span = match (self.first, self.last) {
            (Some(first), Some(last)) => format!("{} .. {}", first, last),
            _ => "-".to_string(),
        };
        format!(
            "Graphs: {} (D {}, M {}, Y {}), Nodes: {}, Edges: {}, Evidence: {}, Labels: {}, Avg Nodes: {:.2}, Span: {}",
            self.graph_count(),
            self.graphs_of(Granularity::Day),
            self.graphs_of(Granularity::Month),
            self.graphs_of(Granularity::Year),
            self.node_count,
            self.edge_count,
            self.evidence_count,
            self.distinct_labels,
            self.avg_nodes(),
            span
        )
    }
}

/// Accumulates statistics graph by graph.
#[derive(Debug, Default)]
pub struct StatisticsBuilder {
    stats: IndexStatistics,
    labels: HashSet<String>,
}

impl StatisticsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one graph given its labels, edge count and evidence total.
    pub fn add_graph<'a, L>(mut self, timestamp: Timestamp, labels: L, edges: usize, evidence: usize) -> Self
    where
        L: IntoIterator<Item = &'a str>,
    {
        let mut nodes = 0;
        for label in labels {
            nodes += 1;
            if !self.labels.contains(label) {
                self.labels.insert(label.to_string());
            }
        }

        let stats = &mut self.stats;
        *stats.graph_counts.entry(timestamp.granularity()).or_insert(0) += 1;
        stats.node_count += nodes;
        stats.edge_count += edges;
        stats.evidence_count += evidence;
        stats.first = Some(stats.first.map_or(timestamp, |first| first.min(timestamp)));
        stats.last = Some(stats.last.map_or(timestamp, |last| last.max(timestamp)));
        if stats.largest.is_none_or(|(_, size)| nodes > size) {
            stats.largest = Some((timestamp, nodes));
        }
        self
    }

    pub fn build(mut self) -> IndexStatistics {
        self.stats.distinct_labels = self.labels.len();
        self.stats
    }
}
