//! Keyword index over passages.
//!
//! Inverted index with BM25-lite scoring. Deterministic: ties are broken by
//! insertion order.

use std::collections::HashMap;

/// Words too common to carry relevance
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from", "how",
    "i", "in", "is", "it", "me", "my", "of", "on", "or", "our", "so", "that", "the", "this", "to",
    "we", "what", "when", "which", "who", "will", "with", "you", "your",
];

const K1: f32 = 1.2;
const B: f32 = 0.75;

/// Lowercased alphanumeric tokens, stopwords and single characters removed
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| s.chars().count() >= 2 && !STOPWORDS.contains(s))
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Default)]
struct Posting {
    /// (passage position, term frequency)
    entries: Vec<(usize, u32)>,
}

/// Inverted index keyed by passage position
#[derive(Debug, Clone, Default)]
pub struct PassageIndex {
    passages: Vec<String>,
    postings: HashMap<String, Posting>,
    lengths: Vec<u32>,
    total_length: u64,
}

impl PassageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_passages<I, S>(passages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::new();
        for passage in passages {
            index.add(passage);
        }
        index
    }

    /// Index a passage; returns its position
    pub fn add(&mut self, passage: impl Into<String>) -> usize {
        let passage = passage.into();
        let position = self.passages.len();
        let tokens = tokenize(&passage);

        self.lengths.push(tokens.len() as u32);
        self.total_length += tokens.len() as u64;

        let mut term_counts: HashMap<String, u32> = HashMap::new();
        for token in tokens {
            *term_counts.entry(token).or_insert(0) += 1;
        }
        for (token, freq) in term_counts {
            self.postings
                .entry(token)
                .or_default()
                .entries
                .push((position, freq));
        }

        self.passages.push(passage);
        position
    }

    pub fn passage(&self, position: usize) -> Option<&str> {
        self.passages.get(position).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    fn avg_length(&self) -> f32 {
        if self.passages.is_empty() {
            0.0
        } else {
            self.total_length as f32 / self.passages.len() as f32
        }
    }

    /// Score passages against `query`, best first, at most `limit`.
    ///
    /// Passages sharing no token with the query are not returned.
    pub fn search(&self, query: &str, limit: usize) -> Vec<(usize, f32)> {
        let mut query_tokens = tokenize(query);
        query_tokens.sort();
        query_tokens.dedup();
        if query_tokens.is_empty() || limit == 0 {
            return vec![];
        }

        let doc_count = self.passages.len() as f32;
        let avg_length = self.avg_length().max(1.0);
        let mut scores: HashMap<usize, f32> = HashMap::new();

        for token in &query_tokens {
            let Some(posting) = self.postings.get(token) else {
                continue;
            };

            // IDF: ln((N - n + 0.5) / (n + 0.5) + 1)
            let n = posting.entries.len() as f32;
            let idf = ((doc_count - n + 0.5) / (n + 0.5) + 1.0).ln();

            for &(position, tf) in &posting.entries {
                let length = self.lengths[position] as f32;
                let norm = 1.0 - B + B * (length / avg_length);
                let tf_score = (tf as f32 * (K1 + 1.0)) / (tf as f32 + K1 * norm);
                *scores.entry(position).or_insert(0.0) += idf * tf_score;
            }
        }

        let mut results: Vec<(usize, f32)> = scores.into_iter().collect();
        results.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        results.truncate(limit);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("What is your Return-Policy for 30 days? A");
        assert_eq!(tokens, vec!["return", "policy", "30", "days"]);
    }

    #[test]
    fn test_search_ranks_relevant_first() {
        let index = PassageIndex::from_passages([
            "Shipping takes 3-5 business days.",
            "Returns are accepted within 30 days. Return shipping is free.",
            "Support is available Monday through Friday.",
        ]);

        let results = index.search("return shipping", 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 1);
        assert_eq!(results[1].0, 0);
    }

    #[test]
    fn test_search_limit_and_no_match() {
        let index = PassageIndex::from_passages(["alpha beta", "alpha gamma", "alpha delta"]);
        assert_eq!(index.search("alpha", 2).len(), 2);
        assert!(index.search("omega", 5).is_empty());
        assert!(index.search("the is a", 5).is_empty());
        assert!(index.search("alpha", 0).is_empty());
    }

    #[test]
    fn test_ties_follow_insertion_order() {
        let index = PassageIndex::from_passages(["refund policy", "refund policy"]);
        let results = index.search("refund", 5);
        assert_eq!(results[0].0, 0);
        assert_eq!(results[1].0, 1);
    }

    #[test]
    fn test_empty_index() {
        let index = PassageIndex::new();
        assert!(index.is_empty());
        assert!(index.search("anything", 3).is_empty());
        assert_eq!(index.passage(0), None);
    }
}
