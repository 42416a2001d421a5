//! Arena document model.
//!
//! A [`DocumentCollection`] owns its documents, a [`Document`] owns its
//! sentences and a [`Sentence`] owns its words. Words refer back to their
//! sentence through a copyable [`SentenceRef`] instead of a pointer, and are
//! identified across a whole run by their [`WordKey`].

use crate::{DocId, Result, SentenceSpan, Timestamp};
use serde::{Deserialize, Serialize};

/// Run-unique identity of one word occurrence: document, sentence index and
/// position inside the sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WordKey {
    pub doc: DocId,
    pub sentence: u32,
    pub position: u32,
}

/// Non-owning reference from a word to the sentence that contains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SentenceRef {
    pub doc: DocId,
    pub index: u32,
    pub span: SentenceSpan,
}

/// One lemma occurring in a sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct WordOccurrence {
    lemma: String,
    ent_type: String,
    timestamp: Option<Timestamp>,
    sentence: SentenceRef,
    position: u32,
}

impl WordOccurrence {
    #[inline]
    pub fn lemma(&self) -> &str {
        &self.lemma
    }

    /// Named-entity type assigned by the tagger, empty when none.
    #[inline]
    pub fn ent_type(&self) -> &str {
        &self.ent_type
    }

    /// True if this word is itself a temporal mention.
    #[inline]
    pub fn is_timestamp(&self) -> bool {
        self.timestamp.is_some()
    }

    /// The date carried by a temporal mention.
    #[inline]
    pub fn timestamp(&self) -> Option<&Timestamp> {
        self.timestamp.as_ref()
    }

    #[inline]
    pub fn sentence(&self) -> &SentenceRef {
        &self.sentence
    }

    #[inline]
    pub fn doc_id(&self) -> DocId {
        self.sentence.doc
    }

    #[inline]
    pub fn span(&self) -> SentenceSpan {
        self.sentence.span
    }

    pub fn key(&self) -> WordKey {
        WordKey {
            doc: self.sentence.doc,
            sentence: self.sentence.index,
            position: self.position,
        }
    }

    /// Extends the lemma with another token, used when a mention spans
    /// several tokens.
    pub fn append_lemma(&mut self, lemma: &str) {
        self.lemma.push(' ');
        self.lemma.push_str(lemma);
    }

    /// Replaces the lemma of a temporal mention by the rendering of its date,
    /// so that every mention of the same date shares one label.
    ///
    /// Mentions without a resolvable date keep their lemma.
    pub fn normalize_timestamp_lemma(&mut self) {
        if let Some(ts) = self.timestamp {
            let rendered = ts.to_string();
            if !rendered.is_empty() {
                self.lemma = rendered;
            }
        }
    }
}

/// A bag-of-words sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    reference: SentenceRef,
    words: Vec<WordOccurrence>,
    /// Positions of the temporal mentions in `words`
    mentions: Vec<usize>,
}

impl Sentence {
    #[inline]
    pub fn span(&self) -> SentenceSpan {
        self.reference.span
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.reference.index as usize
    }

    #[inline]
    pub fn words(&self) -> &[WordOccurrence] {
        &self.words
    }

    pub fn words_mut(&mut self) -> &mut [WordOccurrence] {
        &mut self.words
    }

    /// The temporal mentions of this sentence, in word order.
    pub fn mentions(&self) -> impl Iterator<Item = &WordOccurrence> {
        self.mentions.iter().map(|&pos| &self.words[pos])
    }

    pub fn has_mentions(&self) -> bool {
        !self.mentions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Appends a regular word.
    pub fn push_word(&mut self, lemma: impl Into<String>, ent_type: impl Into<String>) -> &mut WordOccurrence {
        self.push(lemma.into(), ent_type.into(), None)
    }

    /// Appends a word that is a temporal mention of `timestamp`.
    pub fn push_mention(
        &mut self,
        lemma: impl Into<String>,
        ent_type: impl Into<String>,
        timestamp: Timestamp,
    ) -> &mut WordOccurrence {
        self.mentions.push(self.words.len());
        self.push(lemma.into(), ent_type.into(), Some(timestamp))
    }

    /// The most recently appended word, e.g. to extend a multi-token mention.
    pub fn last_word_mut(&mut self) -> Option<&mut WordOccurrence> {
        self.words.last_mut()
    }

    fn push(&mut self, lemma: String, ent_type: String, timestamp: Option<Timestamp>) -> &mut WordOccurrence {
        let position = self.words.len() as u32;
        self.words.push(WordOccurrence {
            lemma,
            ent_type,
            timestamp,
            sentence: self.reference,
            position,
        });
        let last = self.words.len() - 1;
        &mut self.words[last]
    }
}

/// A document: metadata plus its ordered sentences.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: DocId,
    text: Option<String>,
    title: Option<String>,
    article_title: Option<String>,
    url: Option<String>,
    ref_date: Option<String>,
    ref_id: u64,
    sentences: Vec<Sentence>,
}

impl Document {
    pub fn new(id: impl Into<DocId>) -> Self {
        let id = id.into();
        Self {
            id,
            text: None,
            title: None,
            article_title: None,
            url: None,
            ref_date: None,
            ref_id: id.as_u64(),
            sentences: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Section title, e.g. the heading the text was cut from.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Title of the article the section belongs to.
    pub fn with_article_title(mut self, article_title: impl Into<String>) -> Self {
        self.article_title = Some(article_title.into());
        self
    }

    /// Link to the external source of the text.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Reference date handed to the temporal tagger for relative expressions.
    pub fn with_ref_date(mut self, ref_date: impl Into<String>) -> Self {
        self.ref_date = Some(ref_date.into());
        self
    }

    /// External identifier; defaults to the document id.
    pub fn with_ref_id(mut self, ref_id: u64) -> Self {
        self.ref_id = ref_id;
        self
    }

    #[inline]
    pub fn id(&self) -> DocId {
        self.id
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn article_title(&self) -> Option<&str> {
        self.article_title.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn ref_date(&self) -> Option<&str> {
        self.ref_date.as_deref()
    }

    pub fn ref_id(&self) -> u64 {
        self.ref_id
    }

    #[inline]
    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    /// Appends an empty sentence covering `[start, end]`.
    ///
    /// Fails if the span ends before it starts.
    pub fn push_sentence(&mut self, start: usize, end: usize) -> Result<&mut Sentence> {
        let span = SentenceSpan::new(start, end)?;
        let index = self.sentences.len() as u32;
        self.sentences.push(Sentence {
            reference: SentenceRef { doc: self.id, index, span },
            words: Vec::new(),
            mentions: Vec::new(),
        });
        let last = self.sentences.len() - 1;
        Ok(&mut self.sentences[last])
    }

    /// Normalizes the lemma of every temporal mention to its date rendering.
    pub fn normalize_timestamp_lemmas(&mut self) {
        for sentence in &mut self.sentences {
            for word in sentence.words_mut() {
                word.normalize_timestamp_lemma();
            }
        }
    }

    /// Total number of words over all sentences.
    pub fn word_count(&self) -> usize {
        self.sentences.iter().map(Sentence::len).sum()
    }
}

/// Ordered collection of documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentCollection {
    documents: Vec<Document>,
}

impl DocumentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.id() == id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }
}

impl From<Vec<Document>> for DocumentCollection {
    fn from(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

impl FromIterator<Document> for DocumentCollection {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a DocumentCollection {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}
