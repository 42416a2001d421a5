//! Co-occurrence graph of one timestamp.
//!
//! A [`Graph`] keeps its nodes keyed by label and its edges keyed by the
//! canonical (label-ordered) pair of endpoint labels. Node identity is the
//! label: resolving a word whose lemma is already present merges the
//! occurrence into the existing node instead of creating a second one.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use timecentric_core::{DocId, Granularity, NodeId, SentenceSpan, Timestamp, WordKey, WordOccurrence};

// =============================================================================
// IdAllocator - run-scoped node ids
// =============================================================================

/// Hands out node ids for one run.
///
/// Ids are unique across every graph built with the same allocator. The
/// counter is atomic so graphs of different buckets can be built on
/// different threads.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh id.
    pub fn allocate(&self) -> NodeId {
        NodeId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of ids handed out so far (when started at zero).
    pub fn allocated(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Node
// =============================================================================

/// One distinct lemma within one graph.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    label: String,
    count: u64,
    weight: f64,
    words: HashSet<WordKey>,
}

impl Node {
    fn new(id: NodeId, word: &WordOccurrence) -> Self {
        let mut words = HashSet::new();
        words.insert(word.key());
        Self {
            id,
            label: word.lemma().to_string(),
            count: 1,
            weight: 1.0,
            words,
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of distinct word occurrences merged into this node.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Current weight. Equals the count until a weighting strategy runs.
    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// The word occurrences that contributed to this node.
    pub fn words(&self) -> &HashSet<WordKey> {
        &self.words
    }

    /// Records an occurrence. Returns false if it was already recorded.
    pub fn record(&mut self, word: WordKey) -> bool {
        if self.words.insert(word) {
            self.count += 1;
            self.weight += 1.0;
            true
        } else {
            false
        }
    }
}

// =============================================================================
// Edge
// =============================================================================

/// Sentence pair that produced a co-occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Evidence {
    pub doc_id: DocId,
    pub sentence1: SentenceSpan,
    pub sentence2: SentenceSpan,
}

/// Canonical key of an undirected edge: the two labels in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    source: String,
    target: String,
}

impl EdgeKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        Self {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    pub fn touches(&self, label: &str) -> bool {
        self.source == label || self.target == label
    }
}

/// Undirected co-occurrence edge with its deduplicated evidence.
#[derive(Debug, Clone)]
pub struct Edge {
    key: EdgeKey,
    evidence: Vec<Evidence>,
    seen: HashSet<Evidence>,
}

impl Edge {
    fn new(key: EdgeKey) -> Self {
        Self {
            key,
            evidence: Vec::new(),
            seen: HashSet::new(),
        }
    }

    #[inline]
    pub fn key(&self) -> &EdgeKey {
        &self.key
    }

    #[inline]
    pub fn source(&self) -> &str {
        self.key.source()
    }

    #[inline]
    pub fn target(&self) -> &str {
        self.key.target()
    }

    /// Evidence records in first-seen order.
    pub fn evidence(&self) -> &[Evidence] {
        &self.evidence
    }

    /// Number of distinct evidence records.
    pub fn value(&self) -> usize {
        self.evidence.len()
    }

    fn add_evidence(&mut self, evidence: Evidence) -> bool {
        if self.seen.insert(evidence) {
            self.evidence.push(evidence);
            true
        } else {
            false
        }
    }
}

// =============================================================================
// Graph
// =============================================================================

/// Co-occurrence graph of exactly one timestamp.
#[derive(Debug, Clone)]
pub struct Graph {
    timestamp: Timestamp,
    nodes: HashMap<String, Node>,
    edges: HashMap<EdgeKey, Edge>,
}

impl Graph {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            nodes: HashMap::new(),
            edges: HashMap::new(),
        }
    }

    #[inline]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    #[inline]
    pub fn granularity(&self) -> Granularity {
        self.timestamp.granularity()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Looks up the node carrying `label`.
    pub fn find(&self, label: &str) -> Option<&Node> {
        self.nodes.get(label)
    }

    pub fn find_mut(&mut self, label: &str) -> Option<&mut Node> {
        self.nodes.get_mut(label)
    }

    /// Looks up the edge between two labels in either order.
    pub fn edge(&self, a: &str, b: &str) -> Option<&Edge> {
        self.edges.get(&EdgeKey::new(a, b))
    }

    /// Records the co-occurrence of two words.
    ///
    /// Both words are resolved to nodes (created or merged), then the
    /// canonical edge between them receives the sentence pair as evidence.
    /// The word with the smaller lemma provides `sentence1`.
    pub fn add_edge(&mut self, a: &WordOccurrence, b: &WordOccurrence, ids: &IdAllocator) {
        self.resolve_node(a, ids);
        self.resolve_node(b, ids);

        let (first, second) = if a.lemma() <= b.lemma() { (a, b) } else { (b, a) };
        let evidence = Evidence {
            doc_id: first.doc_id(),
            sentence1: first.span(),
            sentence2: second.span(),
        };
        self.edges
            .entry(EdgeKey::new(first.lemma(), second.lemma()))
            .or_insert_with_key(|key| Edge::new(key.clone()))
            .add_evidence(evidence);
    }

    /// Merges the word into the node of its lemma, creating the node if absent.
    fn resolve_node(&mut self, word: &WordOccurrence, ids: &IdAllocator) {
        match self.nodes.get_mut(word.lemma()) {
            Some(node) => {
                node.record(word.key());
            }
            None => {
                let node = Node::new(ids.allocate(), word);
                self.nodes.insert(node.label.clone(), node);
            }
        }
    }

    /// Removes a node together with every edge incident to it.
    pub fn remove_node(&mut self, label: &str) -> Option<Node> {
        let node = self.nodes.remove(label)?;
        self.edges.retain(|key, _| !key.touches(label));
        Some(node)
    }

    /// Removes every node for which `doomed` returns true, cascading to edges.
    /// Returns the number of removed nodes.
    pub fn remove_nodes_where<F>(&mut self, mut doomed: F) -> usize
    where
        F: FnMut(&Node) -> bool,
    {
        let before = self.nodes.len();
        self.nodes.retain(|_, node| !doomed(node));
        let removed = before - self.nodes.len();
        if removed > 0 {
            let nodes = &self.nodes;
            self.edges
                .retain(|key, _| nodes.contains_key(key.source()) && nodes.contains_key(key.target()));
        }
        removed
    }

    /// Removes every edge for which `doomed` returns true.
    pub fn remove_edges_where<F>(&mut self, mut doomed: F) -> usize
    where
        F: FnMut(&Edge) -> bool,
    {
        let before = self.edges.len();
        self.edges.retain(|_, edge| !doomed(edge));
        before - self.edges.len()
    }

    /// True if some edge references a node that is not in the graph.
    pub fn has_dangling_edges(&self) -> bool {
        self.edges
            .keys()
            .any(|key| !self.nodes.contains_key(key.source()) || !self.nodes.contains_key(key.target()))
    }
}
