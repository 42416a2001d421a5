//! # Timecentric Core
//!
//! Core value types for time-centric co-occurrence graphs.
//!
//! This crate provides the fundamental building blocks:
//! - [`NodeId`] and [`DocId`] - Type-safe identifiers
//! - [`Timestamp`] and [`Granularity`] - Calendar dates of day, month or year precision
//! - [`SentenceSpan`] - Character span of a sentence inside its document
//! - [`DocumentCollection`] - Arena of documents, sentences and word occurrences
//! - [`WordKey`] - Copyable handle identifying one word occurrence in a run

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod document;
pub mod timestamp;

pub use document::{Document, DocumentCollection, Sentence, SentenceRef, WordKey, WordOccurrence};
pub use timestamp::{Granularity, Timestamp};

// =============================================================================
// Identifiers (Newtypes for type safety)
// =============================================================================

/// Identifier of a node in a co-occurrence graph.
///
/// Ids are unique across all graphs of one run, so the same lemma carries a
/// different id in each graph it appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Creates a new NodeId from a u64.
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl From<u64> for NodeId {
    #[inline]
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identifier of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct DocId(pub u64);

impl DocId {
    /// Creates a new DocId from a u64.
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

impl From<u64> for DocId {
    #[inline]
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// =============================================================================
// Sentence spans
// =============================================================================

/// Character span `[start, end]` of a sentence within its document.
///
/// Serialized as a two-element array, which is the shape used by the
/// evidence records of the graph interchange format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "[usize; 2]", try_from = "[usize; 2]")]
pub struct SentenceSpan {
    start: usize,
    end: usize,
}

impl SentenceSpan {
    /// Creates a span, rejecting an end before the start.
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if end < start {
            return Err(CoreError::InvalidSpan { start, end });
        }
        Ok(Self { start, end })
    }

    /// First character offset.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Last character offset (exclusive in tokenizer terms).
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of characters covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for SentenceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

impl From<SentenceSpan> for [usize; 2] {
    fn from(span: SentenceSpan) -> Self {
        [span.start, span.end]
    }
}

impl TryFrom<[usize; 2]> for SentenceSpan {
    type Error = CoreError;

    fn try_from(value: [usize; 2]) -> Result<Self> {
        Self::new(value[0], value[1])
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors raised by structural violations in the core model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A sentence span whose end lies before its start
    #[error("Invalid sentence span: end {end} is before start {start}")]
    InvalidSpan { start: usize, end: usize },

    /// A timestamp string that is not `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// =============================================================================
// Tests
// =============================================================================
