//! End-to-end run: extract, assemble, weight, reduce.

use crate::config::{ExtractionConfig, ReductionConfig, TimecentricConfig};
use crate::cooccurrence;
use crate::manager::GraphManager;
use crate::reduce::ReductionReport;
use crate::weighting::WeightingStrategy;
use crate::Result;
use std::time::{Duration, Instant};
use timecentric_core::DocumentCollection;
use tracing::info;

/// The stages of one run, configured once.
#[derive(Debug, Clone)]
pub struct Pipeline {
    extraction: ExtractionConfig,
    strategy: WeightingStrategy,
    reduction: ReductionConfig,
}

/// Counts and timings of a finished run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub documents: usize,
    pub pairs: usize,
    pub graphs: usize,
    pub reduction: ReductionReport,
    pub extraction_time: Duration,
    pub assembly_time: Duration,
    pub weighting_time: Duration,
    pub reduction_time: Duration,
}

impl Pipeline {
    pub fn new(extraction: ExtractionConfig, strategy: WeightingStrategy, reduction: ReductionConfig) -> Self {
        Self {
            extraction,
            strategy,
            reduction,
        }
    }

    /// Builds a pipeline from a full configuration, resolving the strategy name.
    pub fn from_config(config: &TimecentricConfig) -> Result<Self> {
        let strategy: WeightingStrategy = config.weighting.strategy.parse()?;
        Ok(Self::new(config.extraction.clone(), strategy, config.reduction.clone()))
    }

    pub fn strategy(&self) -> WeightingStrategy {
        self.strategy
    }

    /// Runs every stage over `collection`.
    pub fn run(&self, collection: &DocumentCollection) -> (GraphManager, RunReport) {
        self.run_with_progress(collection, &|| {})
    }

    /// Runs every stage, calling `progress` once per extracted document.
    pub fn run_with_progress(
        &self,
        collection: &DocumentCollection,
        progress: &(dyn Fn() + Sync),
    ) -> (GraphManager, RunReport) {
        let mut report = RunReport {
            documents: collection.len(),
            ..RunReport::default()
        };

        let start = Instant::now();
        let cooccurrences = cooccurrence::extract_collection_with_progress(collection, &self.extraction, progress);
        report.extraction_time = start.elapsed();
        report.pairs = cooccurrence::pair_count(&cooccurrences);
        info!(
            documents = report.documents,
            timestamps = cooccurrences.len(),
            pairs = report.pairs,
            elapsed_ms = report.extraction_time.as_millis() as u64,
            "extraction complete"
        );

        let start = Instant::now();
        let mut manager = GraphManager::new();
        manager.assemble_parallel(&cooccurrences);
        drop(cooccurrences);
        report.assembly_time = start.elapsed();
        report.graphs = manager.len();
        info!(
            graphs = report.graphs,
            node_ids = manager.ids().allocated(),
            elapsed_ms = report.assembly_time.as_millis() as u64,
            "assembly complete"
        );

        let start = Instant::now();
        manager.weight_nodes(self.strategy);
        report.weighting_time = start.elapsed();

        let start = Instant::now();
        report.reduction = manager.apply_reduction(&self.reduction);
        report.reduction_time = start.elapsed();

        (manager, report)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(
            ExtractionConfig::default(),
            WeightingStrategy::default(),
            ReductionConfig::default(),
        )
    }
}
