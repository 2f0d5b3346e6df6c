//! TF-IDF Vectorizer - unigrams + bigrams, capped vocabulary
//!
//! Tokens: lowercase runs of 2+ word characters. Vocabulary keeps the most
//! frequent terms (ties broken alphabetically), then indexes them
//! alphabetically. IDF is smoothed: ln((1 + n) / (1 + df)) + 1.
//! Rows are L2-normalised. Out-of-vocabulary terms contribute nothing.

use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\w\w+\b").expect("token pattern is a valid regex")
});

/// Lowercased tokens of a document
pub fn tokenize(doc: &str) -> Vec<String> {
    let lowered = doc.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Unigrams followed by space-joined n-grams up to `max_n`
pub fn ngrams(tokens: &[String], max_n: usize) -> Vec<String> {
    let mut terms = tokens.to_vec();
    for n in 2..=max_n {
        if tokens.len() < n {
            break;
        }
        terms.extend(tokens.windows(n).map(|w| w.join(" ")));
    }
    terms
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// Term → column index (alphabetical order)
    pub vocabulary: BTreeMap<String, usize>,
    /// IDF weight per column
    pub idf: Vec<f64>,
    pub max_features: usize,
    pub max_ngram: usize,
    pub documents: usize,
}

impl TfidfVectorizer {
    /// Fit on a corpus. None when the corpus yields no terms at all.
    pub fn fit(docs: &[String], max_features: usize) -> Option<Self> {
        let max_ngram = 2;
        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in docs {
            let terms = ngrams(&tokenize(doc), max_ngram);
            let mut seen = HashSet::new();
            for term in terms {
                if seen.insert(term.clone()) {
                    *doc_freq.entry(term.clone()).or_default() += 1;
                }
                *term_counts.entry(term).or_default() += 1;
            }
        }

        if term_counts.is_empty() {
            return None;
        }

        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_features);

        let mut kept: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        kept.sort();

        let n = docs.len() as f64;
        let idf = kept
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let vocabulary = kept.into_iter().enumerate().map(|(i, t)| (t, i)).collect();

        Some(Self {
            vocabulary,
            idf,
            max_features,
            max_ngram,
            documents: docs.len(),
        })
    }

    pub fn width(&self) -> usize {
        self.vocabulary.len()
    }

    /// Sparse (column, weight) pairs for one document, sorted by column
    pub fn transform_sparse(&self, doc: &str) -> Vec<(usize, f64)> {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in ngrams(&tokenize(doc), self.max_ngram) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_default() += 1.0;
            }
        }

        let mut weighted: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();

        let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in weighted.iter_mut() {
                *w /= norm;
            }
        }
        weighted
    }

    /// Write the dense vector into `out` (length `width()`, pre-zeroed)
    pub fn transform_into(&self, doc: &str, out: &mut [f64]) {
        for (idx, weight) in self.transform_sparse(doc) {
            out[idx] = weight;
        }
    }
}
