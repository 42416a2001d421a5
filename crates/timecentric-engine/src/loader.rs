//! Loading of pre-annotated document collections.
//!
//! ## Document JSON Format
//!
//! ```json
//! [{"id": 1, "text": "...", "ref_date": "1863-07-04", "ref_id": 7,
//!   "title": "Battle", "article_title": "Gettysburg", "url": "https://...",
//!   "sentences": [
//!     {"start": 0, "end": 21,
//!      "words": [{"lemma": "war", "ent_type": ""},
//!                {"lemma": "July 1, 1863", "timex": "1863-07-01"}]}]}]
//! ```
//!
//! - `id` is optional; documents without one are numbered from 1 by position
//! - `ref_id` defaults to the document id
//! - `title`, `article_title` and `url` are optional and only carried into
//!   the indexed documents file
//! - a word with a `timex` field is a temporal mention; the field holds a
//!   TIMEX3 value or a whole TIMEX3 tag
//!
//! Temporal mentions are renamed to the rendering of their date so that all
//! mentions of one date share a node label. Mentions without a date keep
//! their lemma.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;
use timecentric_core::{CoreError, DocId, Document, DocumentCollection, Timestamp};
use tracing::{debug, warn};

/// Errors that can occur while loading documents
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid span in document {doc}, sentence {sentence}: {source}")]
    InvalidSpan {
        doc: u64,
        sentence: usize,
        source: CoreError,
    },

    #[error("Duplicate document id: {0}")]
    DuplicateDocument(u64),
}

/// Result type for loading operations
pub type Result<T> = std::result::Result<T, LoaderError>;

#[derive(Debug, Deserialize)]
struct RawDocument {
    id: Option<u64>,
    text: Option<String>,
    title: Option<String>,
    article_title: Option<String>,
    url: Option<String>,
    ref_date: Option<String>,
    ref_id: Option<u64>,
    #[serde(default)]
    sentences: Vec<RawSentence>,
}

#[derive(Debug, Deserialize)]
struct RawSentence {
    start: usize,
    end: usize,
    #[serde(default)]
    words: Vec<RawWord>,
}

#[derive(Debug, Deserialize)]
struct RawWord {
    lemma: String,
    #[serde(default)]
    ent_type: String,
    timex: Option<String>,
}

/// Loads a document collection from a JSON file.
pub fn load_documents_json<P: AsRef<Path>>(path: P) -> Result<DocumentCollection> {
    let file = File::open(path.as_ref())?;
    debug!(path = %path.as_ref().display(), "loading documents");
    from_reader(BufReader::new(file))
}

/// Parses a document collection from a JSON string.
pub fn parse_documents_json(json: &str) -> Result<DocumentCollection> {
    let raw: Vec<RawDocument> = serde_json::from_str(json)?;
    build_collection(raw)
}

/// Parses a document collection from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<DocumentCollection> {
    let raw: Vec<RawDocument> = serde_json::from_reader(reader)?;
    build_collection(raw)
}

fn build_collection(raw: Vec<RawDocument>) -> Result<DocumentCollection> {
    let mut seen = HashSet::new();
    let mut collection = DocumentCollection::new();

    for (position, raw_doc) in raw.into_iter().enumerate() {
        let id = raw_doc.id.unwrap_or(position as u64 + 1);
        if !seen.insert(id) {
            return Err(LoaderError::DuplicateDocument(id));
        }
        collection.push(build_document(id, raw_doc)?);
    }

    debug!(documents = collection.len(), "documents loaded");
    Ok(collection)
}

fn build_document(id: u64, raw: RawDocument) -> Result<Document> {
    let mut doc = Document::new(DocId::new(id)).with_ref_id(raw.ref_id.unwrap_or(id));
    if let Some(text) = raw.text {
        doc = doc.with_text(text);
    }
    if let Some(title) = raw.title {
        doc = doc.with_title(title);
    }
    if let Some(article_title) = raw.article_title {
        doc = doc.with_article_title(article_title);
    }
    if let Some(url) = raw.url {
        doc = doc.with_url(url);
    }
    if let Some(ref_date) = raw.ref_date {
        doc = doc.with_ref_date(ref_date);
    }

    for (index, raw_sentence) in raw.sentences.into_iter().enumerate() {
        let sentence = doc
            .push_sentence(raw_sentence.start, raw_sentence.end)
            .map_err(|source| LoaderError::InvalidSpan {
                doc: id,
                sentence: index,
                source,
            })?;

        for word in raw_sentence.words {
            match word.timex {
                Some(timex) => {
                    let timestamp = Timestamp::from_timex(&timex);
                    if timestamp.year_value().is_none() {
                        warn!(doc = id, sentence = index, timex = %timex, "temporal mention without a year");
                    }
                    sentence.push_mention(word.lemma, word.ent_type, timestamp);
                }
                None => {
                    sentence.push_word(word.lemma, word.ent_type);
                }
            }
        }
    }

    doc.normalize_timestamp_lemmas();
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"text": "The war began. On July 1, 1863 the battle started.",
         "ref_date": "1863-07-04",
         "sentences": [
            {"start": 0, "end": 14, "words": [{"lemma": "war"}, {"lemma": "begin"}]},
            {"start": 15, "end": 50, "words": [
                {"lemma": "July 1, 1863", "timex": "1863-07-01"},
                {"lemma": "battle", "ent_type": ""},
                {"lemma": "start"}]}
         ]},
        {"id": 9, "ref_id": 77, "title": "Summer", "article_title": "Meade",
         "url": "https://en.wikipedia.org/wiki/George_Meade", "sentences": [
            {"start": 0, "end": 20, "words": [
                {"lemma": "Meade", "ent_type": "PER"},
                {"lemma": "summer", "timex": "<TIMEX3 tid=\"t1\" type=\"DATE\" value=\"1863-SU\">summer</TIMEX3>"},
                {"lemma": "now", "timex": "PRESENT_REF"}]}
         ]}
    ]"#;

    #[test]
    fn test_parse_documents() {
        let collection = parse_documents_json(SAMPLE).unwrap();
        assert_eq!(collection.len(), 2);

        let first = collection.get(DocId(1)).unwrap();
        assert_eq!(first.ref_id(), 1);
        assert_eq!(first.ref_date(), Some("1863-07-04"));
        assert_eq!(first.sentences().len(), 2);

        let mention = &first.sentences()[1].words()[0];
        assert!(mention.is_timestamp());
        assert_eq!(mention.lemma(), "1863-07-01");
        assert_eq!(mention.timestamp(), Some(&Timestamp::day(1863, 7, 1)));
        assert_eq!(first.sentences()[1].words()[1].ent_type(), "");
    }

    #[test]
    fn test_explicit_ids_and_timex_tags() {
        let collection = parse_documents_json(SAMPLE).unwrap();
        let second = collection.get(DocId(9)).unwrap();
        assert_eq!(second.ref_id(), 77);
        assert_eq!(second.title(), Some("Summer"));
        assert_eq!(second.article_title(), Some("Meade"));
        assert_eq!(second.url(), Some("https://en.wikipedia.org/wiki/George_Meade"));
        assert_eq!(collection.get(DocId(1)).unwrap().url(), None);

        let words = second.sentences()[0].words();
        assert_eq!(words[0].ent_type(), "PER");
        assert_eq!(words[1].timestamp(), Some(&Timestamp::year(1863)));
        assert_eq!(words[1].lemma(), "1863");
        // unresolved mention keeps its lemma
        assert_eq!(words[2].timestamp(), Some(&Timestamp::none()));
        assert_eq!(words[2].lemma(), "now");
    }

    #[test]
    fn test_reversed_span_is_rejected() {
        let json = r#"[{"sentences": [{"start": 10, "end": 2, "words": []}]}]"#;
        let err = parse_documents_json(json).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::InvalidSpan { doc: 1, sentence: 0, source: CoreError::InvalidSpan { start: 10, end: 2 } }
        ));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let json = r#"[{"id": 2, "sentences": []}, {"sentences": []}]"#;
        assert!(matches!(
            parse_documents_json(json),
            Err(LoaderError::DuplicateDocument(2))
        ));
    }

    #[test]
    fn test_missing_lemma_is_a_json_error() {
        let json = r#"[{"sentences": [{"start": 0, "end": 2, "words": [{"ent_type": "PER"}]}]}]"#;
        assert!(matches!(parse_documents_json(json), Err(LoaderError::Json(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let collection = load_documents_json(&path).unwrap();
        assert_eq!(collection.len(), 2);

        assert!(matches!(
            load_documents_json(dir.path().join("missing.json")),
            Err(LoaderError::Io(_))
        ));
    }
}
