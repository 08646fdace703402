//! TF-IDF index over an immutable document collection.
//!
//! All corpus statistics (document frequency, idf, per-document vectors) are
//! fixed at build time. A query is scored against every document by cosine
//! similarity, so `search` is a pure function of the index and its arguments.

use crate::tokenizer::Tokens;
use crate::weights::{cosine, term_frequency, TermWeights};
use pantry_core::Document;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_SNIPPET_CHARS: usize = 240;
pub const ELLIPSIS: &str = "...";

/// One ranked document as handed to the search tool.
///
/// Only `id`, `title`, `snippet` and `total_time` are part of the serialized
/// payload; `url` and `score` are kept for callers that display results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub total_time: String,
    #[serde(skip_serializing)]
    pub url: Option<String>,
    #[serde(skip_serializing)]
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct RetrievalIndex {
    documents: Vec<Document>,
    vocabulary: BTreeSet<String>,
    document_frequency: BTreeMap<String, usize>,
    idf: BTreeMap<String, f64>,
    doc_vectors: Vec<TermWeights>,
    snippet_chars: usize,
}

/// Smoothed inverse document frequency; strictly positive for any `df <= n_docs`.
pub fn smoothed_idf(n_docs: usize, df: usize) -> f64 {
    ((n_docs as f64 + 1.0) / (df as f64 + 0.5)).ln() + 1.0
}

impl RetrievalIndex {
    pub fn build(documents: Vec<Document>) -> Self {
        let term_frequencies: Vec<TermWeights> = documents
            .iter()
            .map(|doc| term_frequency(Tokens::new(&doc.indexed_text())))
            .collect();

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for tf in &term_frequencies {
            for term in tf.keys() {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let n_docs = documents.len();
        let idf: BTreeMap<String, f64> = document_frequency
            .iter()
            .map(|(term, &df)| (term.clone(), smoothed_idf(n_docs, df)))
            .collect();
        let vocabulary: BTreeSet<String> = document_frequency.keys().cloned().collect();

        let doc_vectors = term_frequencies
            .into_iter()
            .map(|tf| apply_idf(tf, &idf))
            .collect();

        tracing::info!(
            "Built retrieval index: {} documents, {} terms",
            n_docs,
            vocabulary.len()
        );

        Self {
            documents,
            vocabulary,
            document_frequency,
            idf,
            doc_vectors,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }

    pub fn with_snippet_chars(mut self, snippet_chars: usize) -> Self {
        self.snippet_chars = snippet_chars;
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn vocabulary(&self) -> &BTreeSet<String> {
        &self.vocabulary
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.document_frequency.get(term).copied().unwrap_or(0)
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    pub fn idf_table(&self) -> &BTreeMap<String, f64> {
        &self.idf
    }

    pub fn document_vectors(&self) -> &[TermWeights] {
        &self.doc_vectors
    }

    /// Weight arbitrary text against the fixed idf table. Terms the corpus
    /// never saw are dropped.
    pub fn vectorize(&self, text: &str) -> TermWeights {
        apply_idf(term_frequency(Tokens::new(text)), &self.idf)
    }

    /// Cosine score of `query` against every document, in corpus order.
    pub fn scores(&self, query: &str) -> Vec<f64> {
        let q = self.vectorize(query);
        self.doc_vectors.iter().map(|d| cosine(&q, d)).collect()
    }

    /// Top `k` documents by descending score. Equal scores keep corpus order;
    /// `k == 0` yields nothing and a `k` past the corpus size yields everything.
    pub fn search(&self, query: &str, k: usize) -> Vec<SearchHit> {
        if k == 0 {
            return Vec::new();
        }
        let mut ranked: Vec<(usize, f64)> = self.scores(query).into_iter().enumerate().collect();
        // sort_by is stable, which is what keeps ties in insertion order
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked
            .into_iter()
            .take(k)
            .map(|(idx, score)| self.hit(idx, score))
            .collect()
    }

    fn hit(&self, idx: usize, score: f64) -> SearchHit {
        let doc = &self.documents[idx];
        SearchHit {
            id: doc.id.clone(),
            title: doc.title.clone(),
            snippet: snippet(&doc.body, self.snippet_chars),
            total_time: doc.total_time_or_unknown().to_string(),
            url: doc.url.clone().filter(|u| !u.is_empty()),
            score,
        }
    }
}

fn apply_idf(tf: TermWeights, idf: &BTreeMap<String, f64>) -> TermWeights {
    tf.into_iter()
        .filter_map(|(term, freq)| idf.get(&term).map(|w| (term, freq * w)))
        .collect()
}

/// First `max_chars` characters of `text`, with an ellipsis if anything was cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ELLIPSIS),
        None => text.to_string(),
    }
}
