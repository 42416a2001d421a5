//! Read-only queries over an exported graph index.
//!
//! The catalog answers the questions a timeline front-end asks: which dates
//! exist, what the top of a date's graph looks like, which dates mention a
//! set of terms, and which labels match a typed prefix.

use crate::export::{GraphRecord, GraphsExport};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use timecentric_core::{Granularity, Timestamp};

/// One entry of a vis.js-style timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineItem {
    pub id: usize,
    pub content: String,
    pub start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub group: Granularity,
    pub title: String,
}

impl TimelineItem {
    fn new(id: usize, timestamp: &Timestamp) -> Self {
        let rendered = timestamp.to_string();
        let (content, start, end, kind) = match timestamp.granularity() {
            Granularity::Day => (
                // drop the year, the timeline groups already show it
                format!("{}  ", &rendered[rendered.len() - 5..]),
                rendered.clone(),
                None,
                Some("point".to_string()),
            ),
            Granularity::Month => {
                let last_day = last_day_of_month(timestamp.month_value().unwrap_or(1));
                (
                    rendered.clone(),
                    format!("{}-01", rendered),
                    Some(format!("{}-{:02}", rendered, last_day)),
                    None,
                )
            }
            Granularity::Year | Granularity::None => (
                rendered.clone(),
                format!("{}-01-01", rendered),
                Some(format!("{}-12-31", rendered)),
                None,
            ),
        };

        Self {
            id,
            content,
            start,
            end,
            kind,
            group: timestamp.granularity(),
            title: rendered,
        }
    }
}

/// Last day shown for a month span. February always ends on the 28th.
fn last_day_of_month(month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        2 => 28,
        _ => 30,
    }
}

/// Query layer built once from an export.
#[derive(Debug, Clone)]
pub struct GraphCatalog {
    export: GraphsExport,
    /// Lowercased label to the timestamps whose graph contains it
    label_index: HashMap<String, BTreeSet<Timestamp>>,
    /// Labels with their summed value, heaviest first
    suggestions: Vec<(String, f64)>,
}

impl GraphCatalog {
    pub fn new(export: GraphsExport) -> Self {
        let mut label_index: HashMap<String, BTreeSet<Timestamp>> = HashMap::new();
        let mut totals: HashMap<&str, f64> = HashMap::new();

        for (timestamp, graph) in export.iter() {
            for node in &graph.nodes {
                label_index
                    .entry(node.label.to_lowercase())
                    .or_default()
                    .insert(*timestamp);
                *totals.entry(node.label.as_str()).or_insert(0.0) += node.value;
            }
        }

        let mut suggestions: Vec<(String, f64)> = totals
            .into_iter()
            .map(|(label, value)| (label.to_string(), value))
            .collect();
        suggestions.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            export,
            label_index,
            suggestions,
        }
    }

    /// Number of graphs served.
    pub fn len(&self) -> usize {
        self.export.len()
    }

    pub fn is_empty(&self) -> bool {
        self.export.is_empty()
    }

    /// One timeline item per graph, in chronological order.
    pub fn timeline(&self) -> Vec<TimelineItem> {
        self.export
            .iter()
            .enumerate()
            .map(|(id, (timestamp, _))| TimelineItem::new(id, timestamp))
            .collect()
    }

    /// The `limit` heaviest nodes of a graph and the edges among them,
    /// without self-loops. Unknown timestamps yield an empty graph.
    pub fn graph(&self, timestamp: &Timestamp, limit: usize) -> GraphRecord {
        let Some(record) = self.export.get(timestamp) else {
            return GraphRecord::default();
        };

        let mut nodes = record.nodes.clone();
        nodes.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.id.cmp(&b.id)));
        nodes.truncate(limit);

        let kept: HashSet<_> = nodes.iter().map(|node| node.id).collect();
        let edges = record
            .edges
            .iter()
            .filter(|edge| edge.from != edge.to && kept.contains(&edge.from) && kept.contains(&edge.to))
            .cloned()
            .collect();

        GraphRecord { nodes, edges }
    }

    /// Timestamps whose graph contains every term, compared lowercased.
    pub fn query_graph_nodes<S: AsRef<str>>(&self, terms: &[S]) -> BTreeSet<Timestamp> {
        let mut terms = terms.iter().map(|term| term.as_ref().to_lowercase());
        let Some(first) = terms.next() else {
            return BTreeSet::new();
        };

        let mut result = self.label_index.get(&first).cloned().unwrap_or_default();
        for term in terms {
            if result.is_empty() {
                break;
            }
            match self.label_index.get(&term) {
                Some(found) => result.retain(|ts| found.contains(ts)),
                None => result.clear(),
            }
        }
        result
    }

    /// Up to `limit` labels containing `phrase` (case-insensitive), heaviest
    /// first by value summed over all graphs.
    pub fn suggest(&self, phrase: &str, limit: usize) -> Vec<String> {
        let phrase = phrase.to_lowercase();
        self.suggestions
            .iter()
            .filter(|(label, _)| label.to_lowercase().contains(&phrase))
            .take(limit)
            .map(|(label, _)| label.clone())
            .collect()
    }
}

impl From<GraphsExport> for GraphCatalog {
    fn from(export: GraphsExport) -> Self {
        Self::new(export)
    }
}
