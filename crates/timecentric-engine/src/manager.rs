//! Graph index and assembler.
//!
//! The [`GraphManager`] owns one [`Graph`] per distinct timestamp across the
//! day, month and year granularities, and the run's [`IdAllocator`].
//! Observations made at a day are rolled up into the enclosing month and
//! year graphs; month observations roll up into their year.

use crate::cooccurrence::{self, Cooccurrences, WordPair};
use crate::config::ExtractionConfig;
use crate::graph::{Graph, IdAllocator};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use timecentric_core::{Document, Granularity, Timestamp};
use tracing::debug;

/// Mapping from timestamp to graph over all granularities.
#[derive(Debug, Default)]
pub struct GraphManager {
    graphs: BTreeMap<Timestamp, Graph>,
    ids: IdAllocator,
}

impl GraphManager {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// The graph of exactly `timestamp`, if one was created.
    pub fn get(&self, timestamp: &Timestamp) -> Option<&Graph> {
        self.graphs.get(timestamp)
    }

    pub fn get_mut(&mut self, timestamp: &Timestamp) -> Option<&mut Graph> {
        self.graphs.get_mut(timestamp)
    }

    /// All graphs in chronological order.
    pub fn graphs(&self) -> impl Iterator<Item = &Graph> {
        self.graphs.values()
    }

    pub(crate) fn graph_map_mut(&mut self) -> &mut BTreeMap<Timestamp, Graph> {
        &mut self.graphs
    }

    /// Graphs of one granularity in chronological order.
    pub fn graphs_of(&self, granularity: Granularity) -> impl Iterator<Item = &Graph> {
        self.graphs.values().filter(move |g| g.granularity() == granularity)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = &Timestamp> {
        self.graphs.keys()
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    // =========================================================================
    // Incremental assembly
    // =========================================================================

    /// Adds pairs observed at `timestamp` to its graph and every enclosing
    /// graph. Observations at a timestamp without a year are ignored.
    pub fn add_observations<'a, I>(&mut self, timestamp: Timestamp, pairs: I)
    where
        I: IntoIterator<Item = WordPair<'a>>,
    {
        let buckets = timestamp.rollup_buckets();
        if buckets.is_empty() {
            return;
        }

        let Self { graphs, ids } = self;
        for (a, b) in pairs {
            for bucket in &buckets {
                graphs
                    .entry(*bucket)
                    .or_insert_with(|| Graph::new(*bucket))
                    .add_edge(a, b, ids);
            }
        }
    }

    /// Adds every observation of an extraction result.
    pub fn add_cooccurrences(&mut self, cooccurrences: &Cooccurrences<'_>) {
        for (timestamp, pairs) in cooccurrences {
            self.add_observations(*timestamp, pairs.iter().copied());
        }
    }

    /// Streams one document's windows straight into the index without
    /// materializing its co-occurrence lists.
    pub fn add_document(&mut self, document: &Document, config: &ExtractionConfig) {
        cooccurrence::for_each_window(document, config, |timestamp, pairs| {
            self.add_observations(timestamp, pairs);
        });
    }

    // =========================================================================
    // Parallel assembly
    // =========================================================================

    /// Adds every observation of an extraction result, building each target
    /// graph on exactly one rayon task.
    ///
    /// Observations are first regrouped by roll-up bucket; graphs that
    /// already exist are taken out of the index, extended and put back.
    pub fn assemble_parallel(&mut self, cooccurrences: &Cooccurrences<'_>) {
        let mut by_bucket: HashMap<Timestamp, Vec<&[WordPair<'_>]>> = HashMap::new();
        for (timestamp, pairs) in cooccurrences {
            for bucket in timestamp.rollup_buckets() {
                by_bucket.entry(bucket).or_default().push(pairs.as_slice());
            }
        }

        let jobs: Vec<(Graph, Vec<&[WordPair<'_>]>)> = by_bucket
            .into_iter()
            .map(|(bucket, batches)| {
                let graph = self.graphs.remove(&bucket).unwrap_or_else(|| Graph::new(bucket));
                (graph, batches)
            })
            .collect();

        let ids = &self.ids;
        let built: Vec<Graph> = jobs
            .into_par_iter()
            .map(|(mut graph, batches)| {
                for (a, b) in batches.into_iter().flatten() {
                    graph.add_edge(a, b, ids);
                }
                debug!(
                    timestamp = %graph.timestamp(),
                    nodes = graph.node_count(),
                    edges = graph.edge_count(),
                    "assembled graph"
                );
                graph
            })
            .collect();

        for graph in built {
            self.graphs.insert(graph.timestamp(), graph);
        }
    }
}
