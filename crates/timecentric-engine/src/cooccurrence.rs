//! Time-centric co-occurrence extraction.
//!
//! For every temporal mention of a document, all words in a window of
//! sentences around the mention's sentence co-occur pairwise. The pairs are
//! collected under the mention's exact timestamp.
//!
//! Pairs borrow the words from the [`DocumentCollection`]; nothing is copied
//! until a graph records them.

use crate::config::ExtractionConfig;
use rayon::prelude::*;
use std::collections::HashMap;
use timecentric_core::{Document, DocumentCollection, Sentence, Timestamp, WordOccurrence};

/// An unordered pair of co-occurring words.
pub type WordPair<'a> = (&'a WordOccurrence, &'a WordOccurrence);

/// Co-occurrence pairs grouped by the timestamp of the mention they surround.
pub type Cooccurrences<'a> = HashMap<Timestamp, Vec<WordPair<'a>>>;

// =============================================================================
// WindowPairs - lazy pair generator over one window
// =============================================================================

/// Every unordered pair of distinct positions in a window of sentences.
///
/// Pairs are generated on demand, so only the window's words are held in
/// memory, never its combinations.
#[derive(Debug, Clone)]
pub struct WindowPairs<'a> {
    words: Vec<&'a WordOccurrence>,
    i: usize,
    j: usize,
}

impl<'a> WindowPairs<'a> {
    /// Concatenates the words of `sentences` in order.
    pub fn new(sentences: &'a [Sentence]) -> Self {
        let words = sentences.iter().flat_map(|s| s.words().iter()).collect();
        Self { words, i: 0, j: 1 }
    }

    /// Number of words in the window.
    pub fn window_len(&self) -> usize {
        self.words.len()
    }

    fn remaining(&self) -> usize {
        let n = self.words.len();
        if self.i >= n {
            return 0;
        }
        // pairs left in row i, then all pairs among the words after i
        let rest_of_row = n.saturating_sub(self.j);
        let after = n - self.i - 1;
        rest_of_row + after * after.saturating_sub(1) / 2
    }
}

impl<'a> Iterator for WindowPairs<'a> {
    type Item = WordPair<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.words.len();
        while self.i < n {
            if self.j < n {
                let pair = (self.words[self.i], self.words[self.j]);
                self.j += 1;
                return Some(pair);
            }
            self.i += 1;
            self.j = self.i + 1;
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WindowPairs<'_> {}

// =============================================================================
// Extraction
// =============================================================================

/// Calls `sink` once per accepted temporal mention with the mention's
/// timestamp and the pairs of its window.
///
/// Mentions without a year, or with a year outside the configured range,
/// are skipped.
pub fn for_each_window<'a, F>(document: &'a Document, config: &ExtractionConfig, mut sink: F)
where
    F: FnMut(Timestamp, WindowPairs<'a>),
{
    let sentences = document.sentences();
    let Some(last) = sentences.len().checked_sub(1) else {
        return;
    };

    for (index, sentence) in sentences.iter().enumerate() {
        if !sentence.has_mentions() {
            continue;
        }
        let start = index.saturating_sub(config.window_size);
        let end = index.saturating_add(config.window_size).min(last);

        for mention in sentence.mentions() {
            let Some(timestamp) = mention.timestamp() else {
                continue;
            };
            if !config.accepts(timestamp) {
                continue;
            }
            sink(*timestamp, WindowPairs::new(&sentences[start..=end]));
        }
    }
}

/// Extracts the co-occurrences of a single document.
pub fn extract_document<'a>(document: &'a Document, config: &ExtractionConfig) -> Cooccurrences<'a> {
    let mut result = Cooccurrences::new();
    for_each_window(document, config, |timestamp, pairs| {
        result.entry(timestamp).or_default().extend(pairs);
    });
    result
}

/// Unifies extraction results by concatenating pair lists per timestamp.
pub fn merge_cooccurrences<'a, I>(parts: I) -> Cooccurrences<'a>
where
    I: IntoIterator<Item = Cooccurrences<'a>>,
{
    parts.into_iter().fold(Cooccurrences::new(), merge_into)
}

fn merge_into<'a>(mut acc: Cooccurrences<'a>, part: Cooccurrences<'a>) -> Cooccurrences<'a> {
    for (timestamp, pairs) in part {
        acc.entry(timestamp).or_default().extend(pairs);
    }
    acc
}

/// Extracts co-occurrences from every document in parallel, one task per
/// document, and merges the results.
pub fn extract_collection<'a>(collection: &'a DocumentCollection, config: &ExtractionConfig) -> Cooccurrences<'a> {
    extract_collection_with_progress(collection, config, &|| {})
}

/// Like [`extract_collection`], invoking `progress` after each document.
pub fn extract_collection_with_progress<'a>(
    collection: &'a DocumentCollection,
    config: &ExtractionConfig,
    progress: &(dyn Fn() + Sync),
) -> Cooccurrences<'a> {
    collection
        .documents()
        .par_iter()
        .map(|document| {
            let part = extract_document(document, config);
            progress();
            part
        })
        .reduce(Cooccurrences::new, merge_into)
}

/// Total number of pairs over all timestamps.
pub fn pair_count(cooccurrences: &Cooccurrences<'_>) -> usize {
    cooccurrences.values().map(Vec::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config(window_size: usize) -> ExtractionConfig {
        ExtractionConfig {
            window_size,
            start_year: None,
            end_year: None,
        }
    }

    /// S0 "the war began", S1 mentions 1863-07-01, S2 "soldiers retreated",
    /// S3 "peace returned".
    fn four_sentence_document() -> Document {
        let mut doc = Document::new(1u64);
        let s0 = doc.push_sentence(0, 13).unwrap();
        s0.push_word("war", "");
        s0.push_word("begin", "");
        let s1 = doc.push_sentence(14, 40).unwrap();
        s1.push_word("battle", "");
        s1.push_mention("1863-07-01", "", Timestamp::day(1863, 7, 1));
        let s2 = doc.push_sentence(41, 60).unwrap();
        s2.push_word("soldier", "");
        s2.push_word("retreat", "");
        let s3 = doc.push_sentence(61, 80).unwrap();
        s3.push_word("peace", "");
        s3.push_word("return", "");
        doc
    }

    fn label_pairs(pairs: &[WordPair<'_>]) -> HashSet<(String, String)> {
        pairs
            .iter()
            .map(|(a, b)| (a.lemma().to_string(), b.lemma().to_string()))
            .collect()
    }

    #[test]
    fn test_window_pairs_enumerates_combinations() {
        let doc = four_sentence_document();
        let pairs = WindowPairs::new(&doc.sentences()[0..3]);
        assert_eq!(pairs.window_len(), 6);
        assert_eq!(pairs.len(), 15);
        let collected: Vec<_> = pairs.collect();
        assert_eq!(collected.len(), 15);
        // positions are distinct in every pair
        assert!(collected.iter().all(|(a, b)| a.key() != b.key()));
    }

    #[test]
    fn test_window_pairs_size_hint_tracks_progress() {
        let doc = four_sentence_document();
        let mut pairs = WindowPairs::new(&doc.sentences()[0..2]);
        assert_eq!(pairs.len(), 6);
        pairs.next();
        pairs.next();
        pairs.next();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs.by_ref().count(), 3);
        assert_eq!(pairs.len(), 0);
    }

    #[test]
    fn test_window_one_combines_neighbouring_sentences() {
        let doc = four_sentence_document();
        let result = extract_document(&doc, &config(1));

        assert_eq!(result.len(), 1);
        let pairs = &result[&Timestamp::day(1863, 7, 1)];
        let labels = label_pairs(pairs);
        assert!(labels.contains(&("war".to_string(), "soldier".to_string())));
        assert!(labels.contains(&("battle".to_string(), "1863-07-01".to_string())));
        assert!(pairs
            .iter()
            .all(|(a, b)| a.lemma() != "peace" && b.lemma() != "peace" && a.lemma() != "return" && b.lemma() != "return"));
        assert_eq!(pairs.len(), 15);
    }

    #[test]
    fn test_window_zero_stays_in_sentence() {
        let doc = four_sentence_document();
        let result = extract_document(&doc, &config(0));
        let pairs = &result[&Timestamp::day(1863, 7, 1)];
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0.lemma(), "battle");
        assert_eq!(pairs[0].1.lemma(), "1863-07-01");
    }

    #[test]
    fn test_window_is_clamped_at_document_edges() {
        let doc = four_sentence_document();
        let result = extract_document(&doc, &config(10));
        // all 8 words of the document
        assert_eq!(result[&Timestamp::day(1863, 7, 1)].len(), 28);
    }

    #[test]
    fn test_year_range_filters_mentions() {
        let doc = four_sentence_document();

        let in_range = ExtractionConfig {
            window_size: 1,
            start_year: Some(1861),
            end_year: Some(1863),
        };
        assert_eq!(extract_document(&doc, &in_range).len(), 1);

        let too_late = ExtractionConfig {
            window_size: 1,
            start_year: Some(1864),
            end_year: None,
        };
        assert!(extract_document(&doc, &too_late).is_empty());

        let too_early = ExtractionConfig {
            window_size: 1,
            start_year: None,
            end_year: Some(1862),
        };
        assert!(extract_document(&doc, &too_early).is_empty());
    }

    #[test]
    fn test_mentions_without_year_are_skipped() {
        let mut doc = Document::new(1u64);
        let s0 = doc.push_sentence(0, 20).unwrap();
        s0.push_word("yesterday", "");
        s0.push_mention("yesterday", "", Timestamp::none());
        assert!(extract_document(&doc, &config(2)).is_empty());
    }

    #[test]
    fn test_each_mention_contributes_under_its_own_timestamp() {
        let mut doc = Document::new(1u64);
        let s0 = doc.push_sentence(0, 40).unwrap();
        s0.push_mention("1863-07-01", "", Timestamp::day(1863, 7, 1));
        s0.push_word("battle", "");
        s0.push_mention("1863-07-03", "", Timestamp::day(1863, 7, 3));

        let result = extract_document(&doc, &config(0));
        assert_eq!(result.len(), 2);
        assert_eq!(result[&Timestamp::day(1863, 7, 1)].len(), 3);
        assert_eq!(result[&Timestamp::day(1863, 7, 3)].len(), 3);
    }

    #[test]
    fn test_merge_concatenates_per_timestamp() {
        let doc_a = four_sentence_document();
        let mut doc_b = Document::new(2u64);
        let s = doc_b.push_sentence(0, 10).unwrap();
        s.push_word("union", "");
        s.push_mention("1863-07-01", "", Timestamp::day(1863, 7, 1));
        let s = doc_b.push_sentence(11, 20).unwrap();
        s.push_word("lee", "PER");
        s.push_mention("1864", "", Timestamp::year(1864));

        let a = extract_document(&doc_a, &config(0));
        let b = extract_document(&doc_b, &config(0));
        let merged = merge_cooccurrences(vec![a, b]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[&Timestamp::day(1863, 7, 1)].len(), 2);
        assert_eq!(merged[&Timestamp::year(1864)].len(), 1);
        assert_eq!(pair_count(&merged), 3);
    }

    #[test]
    fn test_parallel_extraction_matches_sequential() {
        let collection: DocumentCollection = (1..=8u64)
            .map(|id| {
                let mut doc = Document::new(id);
                let s = doc.push_sentence(0, 10).unwrap();
                s.push_word("word", "");
                s.push_word(format!("doc{}", id), "");
                s.push_mention("1863", "", Timestamp::year(1863));
                doc
            })
            .collect();

        let processed = AtomicUsize::new(0);
        let parallel = extract_collection_with_progress(&collection, &config(0), &|| {
            processed.fetch_add(1, Ordering::Relaxed);
        });
        let sequential = merge_cooccurrences(collection.iter().map(|doc| extract_document(doc, &config(0))));

        assert_eq!(processed.load(Ordering::Relaxed), 8);
        assert_eq!(pair_count(&parallel), pair_count(&sequential));
        assert_eq!(pair_count(&parallel), 24);
        let keys = |c: &Cooccurrences<'_>| {
            c.values()
                .flatten()
                .map(|(a, b)| (a.key(), b.key()))
                .collect::<HashSet<_>>()
        };
        assert_eq!(keys(&parallel), keys(&sequential));
    }
}
