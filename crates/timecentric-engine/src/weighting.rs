//! Term weighting over the graph index.
//!
//! A node's weight becomes `count * itf(label)` where
//! `itf(label) = ln(N / (1 + df(label)))`, `N` being the number of graphs
//! considered and `df` the number of those graphs with a node of that label.
//!
//! No length normalization is applied: the normalization factor is fixed at
//! one, so a label present in every graph gets a negative itf.

use crate::EngineError;
use crate::graph::Graph;
use crate::manager::GraphManager;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use timecentric_core::Granularity;
use tracing::info;

/// How itf tables are scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WeightingStrategy {
    /// One itf table per granularity, over the graphs of that granularity
    #[default]
    TfItfPerGranularity,
    /// One itf table over all graphs
    TfItf,
}

impl WeightingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightingStrategy::TfItfPerGranularity => "tf_itf_per_granularity",
            WeightingStrategy::TfItf => "tf_itf",
        }
    }
}

impl fmt::Display for WeightingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeightingStrategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tf_itf_per_granularity" => Ok(WeightingStrategy::TfItfPerGranularity),
            "tf_itf" => Ok(WeightingStrategy::TfItf),
            other => Err(EngineError::UnknownWeighting(other.to_string())),
        }
    }
}

/// Inverse timestamp frequency per label.
pub type ItfTable = HashMap<String, f64>;

/// Computes the itf table over `graphs`.
pub fn itf_table<'a, I>(graphs: I) -> ItfTable
where
    I: IntoIterator<Item = &'a Graph>,
{
    let mut df: HashMap<&str, usize> = HashMap::new();
    let mut n = 0usize;
    for graph in graphs {
        n += 1;
        for node in graph.nodes() {
            *df.entry(node.label()).or_insert(0) += 1;
        }
    }

    df.into_iter()
        .map(|(label, df)| (label.to_string(), itf(n, df)))
        .collect()
}

/// `ln(n / (1 + df))`.
#[inline]
pub fn itf(n: usize, df: usize) -> f64 {
    (n as f64 / (1.0 + df as f64)).ln()
}

impl GraphManager {
    /// Recomputes every node weight with `strategy`.
    ///
    /// All itf tables are complete before the first weight is written.
    pub fn weight_nodes(&mut self, strategy: WeightingStrategy) {
        match strategy {
            WeightingStrategy::TfItf => {
                let table = itf_table(self.graphs());
                self.apply_itf(|_| Some(&table));
            }
            WeightingStrategy::TfItfPerGranularity => {
                let tables: HashMap<Granularity, ItfTable> = Granularity::DATED
                    .into_iter()
                    .map(|granularity| (granularity, itf_table(self.graphs_of(granularity))))
                    .collect();
                self.apply_itf(|granularity| tables.get(&granularity));
            }
        }
        info!(strategy = %strategy, graphs = self.len(), "weighted nodes");
    }

    fn apply_itf<'t, F>(&mut self, table_for: F)
    where
        F: Fn(Granularity) -> Option<&'t ItfTable> + Sync,
    {
        self.graph_map_mut().par_iter_mut().for_each(|(_, graph)| {
            let Some(table) = table_for(graph.granularity()) else {
                return;
            };
            for node in graph.nodes_mut() {
                let itf = table.get(node.label()).copied().unwrap_or(0.0);
                node.set_weight(node.count() as f64 * itf);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use timecentric_core::{Document, Timestamp};

    fn mention_doc(id: u64, words: &[&str], timestamp: Timestamp) -> Document {
        let mut doc = Document::new(id);
        let s = doc.push_sentence(0, 40).unwrap();
        for word in words {
            s.push_word(*word, "");
        }
        s.push_mention(timestamp.to_string(), "", timestamp);
        doc
    }

    fn build(docs: &[Document]) -> GraphManager {
        let config = ExtractionConfig {
            window_size: 0,
            start_year: None,
            end_year: None,
        };
        let mut manager = GraphManager::new();
        for doc in docs {
            manager.add_document(doc, &config);
        }
        manager
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!("tf_itf".parse::<WeightingStrategy>().unwrap(), WeightingStrategy::TfItf);
        assert_eq!(
            "tf_itf_per_granularity".parse::<WeightingStrategy>().unwrap(),
            WeightingStrategy::TfItfPerGranularity
        );
        assert!(matches!(
            "bm25".parse::<WeightingStrategy>(),
            Err(EngineError::UnknownWeighting(name)) if name == "bm25"
        ));
        assert_eq!(WeightingStrategy::default().to_string(), "tf_itf_per_granularity");
    }

    #[test]
    fn test_itf_formula() {
        assert!((itf(4, 1) - 2.0f64.ln()).abs() < 1e-12);
        assert_eq!(itf(1, 0), 0.0);
        assert!(itf(3, 3) < 0.0);
    }

    #[test]
    fn test_itf_decreases_with_document_frequency() {
        let docs = vec![
            mention_doc(1, &["war", "rare"], Timestamp::year(1861)),
            mention_doc(2, &["war"], Timestamp::year(1862)),
            mention_doc(3, &["war"], Timestamp::year(1863)),
            mention_doc(4, &["peace"], Timestamp::year(1864)),
        ];
        let manager = build(&docs);
        let table = itf_table(manager.graphs());

        assert!(table["war"] <= table["rare"]);
        assert!((table["war"] - (4.0f64 / 4.0).ln()).abs() < 1e-12);
        assert!((table["rare"] - (4.0f64 / 2.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_per_granularity_weights() {
        let docs = vec![
            mention_doc(1, &["army"], Timestamp::day(1863, 7, 1)),
            mention_doc(2, &["army"], Timestamp::day(1863, 7, 2)),
            mention_doc(3, &["navy"], Timestamp::day(1863, 7, 3)),
        ];
        let mut manager = build(&docs);
        manager.weight_nodes(WeightingStrategy::TfItfPerGranularity);

        // day graphs: N = 3, df(army) = 2
        let day = manager.get(&Timestamp::day(1863, 7, 1)).unwrap();
        let army = day.find("army").unwrap();
        assert!((army.weight() - (3.0f64 / 3.0).ln()).abs() < 1e-12);

        // one month graph: N = 1, df = 1, count = 2
        let month = manager.get(&Timestamp::month(1863, 7)).unwrap();
        let army = month.find("army").unwrap();
        assert_eq!(army.count(), 2);
        assert!((army.weight() - 2.0 * (0.5f64).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_global_weights_share_one_table() {
        let docs = vec![
            mention_doc(1, &["army"], Timestamp::day(1863, 7, 1)),
            mention_doc(2, &["navy"], Timestamp::year(1864)),
        ];
        let mut manager = build(&docs);
        // graphs: 1863, 1863-07, 1863-07-01, 1864
        assert_eq!(manager.len(), 4);
        manager.weight_nodes(WeightingStrategy::TfItf);

        let expected_army = (4.0f64 / 4.0).ln();
        let expected_navy = (4.0f64 / 2.0).ln();
        for graph in manager.graphs() {
            if let Some(army) = graph.find("army") {
                assert!((army.weight() - army.count() as f64 * expected_army).abs() < 1e-12);
            }
            if let Some(navy) = graph.find("navy") {
                assert!((navy.weight() - expected_navy).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_weighting_leaves_edges_untouched() {
        let docs = vec![mention_doc(1, &["union", "army"], Timestamp::year(1863))];
        let mut manager = build(&docs);
        let before: usize = manager.graphs().map(Graph::edge_count).sum();
        manager.weight_nodes(WeightingStrategy::TfItf);
        let after: usize = manager.graphs().map(Graph::edge_count).sum();
        assert_eq!(before, after);
    }
}
