//! # Timecentric Engine
//!
//! Builds time-centric co-occurrence graphs from pre-annotated documents.
//!
//! A run goes through four stages:
//! 1. [`cooccurrence`] - pairs of words found in a window of sentences
//!    around every dated mention, grouped by the mention's timestamp
//! 2. [`manager`] - one [`Graph`] per day, month and year, with day
//!    observations rolled up into their month and year
//! 3. [`weighting`] - tf-itf node weights
//! 4. [`reduce`] - self-loop, self-mention and top-N pruning
//!
//! [`pipeline::Pipeline`] chains the stages; [`export`] writes the result in
//! the JSON interchange format, [`document_index`] keeps the source texts
//! that evidence records point to, and [`catalog`] answers read-only queries
//! over an exported index.

pub mod catalog;
pub mod config;
pub mod cooccurrence;
pub mod document_index;
pub mod export;
pub mod graph;
pub mod loader;
pub mod logging;
pub mod manager;
pub mod pipeline;
pub mod reduce;
pub mod statistics;
pub mod weighting;

use thiserror::Error;
use timecentric_core::CoreError;

// Re-exports
pub use catalog::{GraphCatalog, TimelineItem};
pub use config::{ConfigError, TimecentricConfig};
pub use cooccurrence::{Cooccurrences, WindowPairs, WordPair};
pub use document_index::{DocumentEntry, DocumentIndex};
pub use export::{ExportError, GraphRecord, GraphsExport};
pub use graph::{Edge, EdgeKey, Evidence, Graph, IdAllocator, Node};
pub use loader::{LoaderError, load_documents_json};
pub use manager::GraphManager;
pub use pipeline::{Pipeline, RunReport};
pub use reduce::ReductionReport;
pub use statistics::IndexStatistics;
pub use weighting::WeightingStrategy;

/// Errors raised by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A weighting strategy name that is not recognized
    #[error("Unknown weighting strategy: {0:?}")]
    UnknownWeighting(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoaderError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
