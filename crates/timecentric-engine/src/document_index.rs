//! Indexed documents written beside the graphs, so that the `doc_id` of an
//! evidence record can be resolved to its text, title and source link.
//!
//! ```json
//! {"1": {"id": 1, "text": "...", "title": "Battle", "article_title": "Gettysburg",
//!        "url": "https://...", "ref_id": 1}}
//! ```

use crate::export::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use timecentric_core::{DocId, Document, DocumentCollection};

/// Section title shown when a section has the same title as its article.
pub const SUMMARY_SECTION: &str = "Summary";

/// Metadata and text of one loaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub id: DocId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_date: Option<String>,
    pub ref_id: u64,
}

impl DocumentEntry {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id(),
            text: doc.text().map(str::to_string),
            title: doc.title().map(str::to_string),
            article_title: doc.article_title().map(str::to_string),
            url: doc.url().map(str::to_string),
            ref_date: doc.ref_date().map(str::to_string),
            ref_id: doc.ref_id(),
        }
    }

    /// `"<article> - <section>"`, with the section shown as
    /// [`SUMMARY_SECTION`] when it repeats the article title. Falls back to
    /// whichever of the two is present.
    pub fn display_title(&self) -> Option<String> {
        match (self.article_title.as_deref(), self.title.as_deref()) {
            (Some(article), Some(section)) if article == section => {
                Some(format!("{} - {}", article, SUMMARY_SECTION))
            }
            (Some(article), Some(section)) => Some(format!("{} - {}", article, section)),
            (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
            (None, None) => None,
        }
    }
}

/// Every loaded document keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentIndex {
    documents: BTreeMap<DocId, DocumentEntry>,
}

impl DocumentIndex {
    pub fn from_collection(collection: &DocumentCollection) -> Self {
        collection.documents().iter().map(DocumentEntry::from_document).collect()
    }

    pub fn get(&self, id: DocId) -> Option<&DocumentEntry> {
        self.documents.get(&id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P, pretty: bool) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        if pretty {
            serde_json::to_writer_pretty(&mut writer, self)?;
        } else {
            serde_json::to_writer(&mut writer, self)?;
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

impl FromIterator<DocumentEntry> for DocumentIndex {
    fn from_iter<I: IntoIterator<Item = DocumentEntry>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().map(|entry| (entry.id, entry)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(article_title: Option<&str>, title: Option<&str>) -> DocumentEntry {
        DocumentEntry {
            id: DocId(1),
            text: None,
            title: title.map(str::to_string),
            article_title: article_title.map(str::to_string),
            url: None,
            ref_date: None,
            ref_id: 1,
        }
    }

    #[test]
    fn test_display_title() {
        assert_eq!(
            entry(Some("Gettysburg"), Some("Second day")).display_title().as_deref(),
            Some("Gettysburg - Second day")
        );
        assert_eq!(
            entry(Some("Gettysburg"), Some("Gettysburg")).display_title().as_deref(),
            Some("Gettysburg - Summary")
        );
        assert_eq!(entry(None, Some("Second day")).display_title().as_deref(), Some("Second day"));
        assert_eq!(entry(None, None).display_title(), None);
    }

    #[test]
    fn test_from_collection_and_read_back() {
        let mut collection = DocumentCollection::new();
        collection.push(
            Document::new(DocId(1))
                .with_text("Lee retreated.")
                .with_url("https://en.wikipedia.org/wiki/Robert_E._Lee"),
        );
        collection.push(Document::new(DocId(4)).with_ref_id(40));

        let index = DocumentIndex::from_collection(&collection);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(DocId(1)).unwrap().text.as_deref(), Some("Lee retreated."));
        assert_eq!(index.get(DocId(4)).unwrap().ref_id, 40);
        assert!(index.get(DocId(2)).is_none());

        let json = serde_json::to_value(&index).unwrap();
        assert_eq!(json["1"]["url"], "https://en.wikipedia.org/wiki/Robert_E._Lee");
        assert!(json["4"].get("text").is_none());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("indexed_documents.json");
        index.write_to_path(&path, true).unwrap();
        assert_eq!(DocumentIndex::read_from_path(&path).unwrap(), index);
    }
}
