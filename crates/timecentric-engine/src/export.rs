//! JSON interchange format for finished graph indexes.
//!
//! ```json
//! {"1863-07-01": {
//!     "nodes": [{"id": 3, "label": "army", "value": 1.38}],
//!     "edges": [{"from": 3, "to": 4, "value": 2,
//!                "sent_functionality": [{"doc_id": 1, "sentence1": [0, 21], "sentence2": [0, 21]}]}]}}
//! ```
//!
//! Keys are ordered chronologically, nodes by id and edges by `(from, to)`.

use crate::graph::{Evidence, Graph};
use crate::manager::GraphManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;
use timecentric_core::{NodeId, Timestamp};

/// Errors from reading or writing interchange files.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub label: String,
    /// Final weight
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from: NodeId,
    pub to: NodeId,
    /// Number of distinct evidence records
    pub value: usize,
    pub sent_functionality: Vec<Evidence>,
}

/// One graph in interchange form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl GraphRecord {
    pub fn from_graph(graph: &Graph) -> Self {
        let mut nodes: Vec<NodeRecord> = graph
            .nodes()
            .map(|node| NodeRecord {
                id: node.id(),
                label: node.label().to_string(),
                value: node.weight(),
            })
            .collect();
        nodes.sort_by_key(|node| node.id);

        let mut edges: Vec<EdgeRecord> = graph
            .edges()
            .filter_map(|edge| {
                let from = graph.find(edge.source())?.id();
                let to = graph.find(edge.target())?.id();
                Some(EdgeRecord {
                    from,
                    to,
                    value: edge.value(),
                    sent_functionality: edge.evidence().to_vec(),
                })
            })
            .collect();
        edges.sort_by_key(|edge| (edge.from, edge.to));

        Self { nodes, edges }
    }
}

/// A whole graph index in interchange form, keyed by timestamp string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphsExport {
    graphs: BTreeMap<Timestamp, GraphRecord>,
}

impl GraphsExport {
    pub fn from_manager(manager: &GraphManager) -> Self {
        let graphs = manager
            .graphs()
            .map(|graph| (graph.timestamp(), GraphRecord::from_graph(graph)))
            .collect();
        Self { graphs }
    }

    pub fn get(&self, timestamp: &Timestamp) -> Option<&GraphRecord> {
        self.graphs.get(timestamp)
    }

    /// Graphs in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (&Timestamp, &GraphRecord)> {
        self.graphs.iter()
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn insert(&mut self, timestamp: Timestamp, record: GraphRecord) {
        self.graphs.insert(timestamp, record);
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn to_writer_pretty<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Writes the export to `path`, replacing any existing file.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P, pretty: bool) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        if pretty {
            self.to_writer_pretty(&mut writer)?;
        } else {
            self.to_writer(&mut writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }
}

impl FromIterator<(Timestamp, GraphRecord)> for GraphsExport {
    fn from_iter<I: IntoIterator<Item = (Timestamp, GraphRecord)>>(iter: I) -> Self {
        Self {
            graphs: iter.into_iter().collect(),
        }
    }
}
