//! Retrieval collaborators.
//!
//! [`Retriever`] returns passages for a question, most relevant first. The
//! number of passages is bounded by the retriever's own `top_k`.

use super::index::PassageIndex;
use crate::error::SiftError;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default number of passages per search
pub const DEFAULT_TOP_K: usize = 4;

/// Similarity-search collaborator
pub trait Retriever: Send + Sync {
    fn search(&self, question: &str) -> Result<Vec<String>, SiftError>;
}

/// Store policy passages used when no corpus file is configured
pub fn default_passages() -> Vec<String> {
    [
        "Shipping Policy: Standard domestic shipping takes 3-5 business days. International shipping takes 10-15 business days. Free shipping is applicable on all orders exceeding $50. Once shipped, customers receive a tracking link via email.",
        "General Return Policy: We offer a 30-day return policy for most items. Products must be unused, in their original packaging, and with all tags attached. Perishable goods and personalized items are not eligible for return.",
        "Electronics Specific Policy: All electronic gadgets, including laptops and smartphones, have a limited 15-day return window. Any hardware defects reported after 15 days must be handled through the manufacturer's warranty services.",
        "Refund Process: Once a return is received and inspected, we notify the customer of the approval or rejection of the refund. Approved refunds are credited to the original payment method within 7-10 working days.",
        "Customer Support Availability: Our support team is available Monday through Friday, from 9 AM to 6 PM IST. We are closed on national holidays. For assistance, reach out via email at support@ai-store.com.",
        "Data Privacy & Security: We prioritize user data security. We use 256-bit SSL encryption to protect your personal information during checkout. Payment transactions are processed through a secure gateway provider.",
        "Cancellation Policy: Orders can be cancelled within 2 hours of placement for a full refund. After 2 hours, the order enters the processing stage and cannot be cancelled. In such cases, customers must wait for delivery and then initiate a return.",
        "Warranty Information: Most products come with a 1-year limited manufacturer warranty. This covers functional defects but does not cover physical damage, liquid spills, or unauthorized repairs.",
        "Priority Support: For urgent issues or order escalations, please contact our 24/7 priority support at emergency@store.com with your Order ID in the subject line.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Read passages from a text file: one passage per blank-line-separated paragraph
pub fn load_passages(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus {}", path.display()))?;

    let mut passages = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in contents.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                passages.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        passages.push(current.join(" "));
    }

    Ok(passages)
}

// ============================================================================
// Keyword retriever
// ============================================================================

/// In-memory BM25-lite retriever
pub struct KeywordRetriever {
    index: PassageIndex,
    top_k: usize,
}

impl KeywordRetriever {
    pub fn new(passages: Vec<String>, top_k: usize) -> Self {
        tracing::debug!(passages = passages.len(), top_k, "Indexed knowledge passages");
        Self {
            index: PassageIndex::from_passages(passages),
            top_k,
        }
    }

    pub fn with_default_passages() -> Self {
        Self::new(default_passages(), DEFAULT_TOP_K)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl Retriever for KeywordRetriever {
    /// Ranked lexical hits. A question sharing no token with the corpus still
    /// gets up to `top_k` passages in corpus order, so the answering prompt
    /// always has context unless the index itself is empty.
    fn search(&self, question: &str) -> Result<Vec<String>, SiftError> {
        let hits = self.index.search(question, self.top_k);
        tracing::debug!(hits = hits.len(), "Keyword search");

        let positions: Vec<usize> = if hits.is_empty() {
            (0..self.index.len().min(self.top_k)).collect()
        } else {
            hits.into_iter().map(|(position, _)| position).collect()
        };

        Ok(positions
            .into_iter()
            .filter_map(|position| self.index.passage(position).map(str::to_string))
            .collect())
    }
}

// ============================================================================
// Static retriever
// ============================================================================

/// Fake retriever for testing: fixed passages, counted searches
pub struct StaticRetriever {
    passages: Result<Vec<String>, String>,
    calls: AtomicUsize,
}

impl StaticRetriever {
    pub fn new(passages: &[&str]) -> Self {
        Self {
            passages: Ok(passages.iter().map(|p| p.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(&[])
    }

    /// Every search fails with `message`
    pub fn unavailable(message: &str) -> Self {
        Self {
            passages: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Retriever for StaticRetriever {
    fn search(&self, _question: &str) -> Result<Vec<String>, SiftError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.passages.clone().map_err(SiftError::Retrieval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_corpus_return_policy() {
        let retriever = KeywordRetriever::with_default_passages();
        assert_eq!(retriever.len(), 9);

        let passages = retriever.search("What is your return policy?").unwrap();
        assert!(!passages.is_empty());
        assert!(passages.len() <= DEFAULT_TOP_K);
        assert!(passages[0].starts_with("General Return Policy"));
    }

    #[test]
    fn test_top_k_bound() {
        let retriever = KeywordRetriever::new(default_passages(), 2);
        let passages = retriever.search("order support refund return policy").unwrap();
        assert_eq!(passages.len(), 2);
    }

    #[test]
    fn test_no_lexical_hit_falls_back_to_top_k() {
        let retriever = KeywordRetriever::with_default_passages();

        let passages = retriever.search("How long until my package arrives?").unwrap();
        assert_eq!(passages.len(), DEFAULT_TOP_K);
        assert!(passages[0].starts_with("Shipping Policy"));

        let passages = retriever.search("Can I send back headphones I bought?").unwrap();
        assert_eq!(passages.len(), DEFAULT_TOP_K);
    }

    #[test]
    fn test_fallback_bounded_by_corpus_size() {
        let retriever = KeywordRetriever::new(vec!["Only passage.".to_string()], 4);
        assert_eq!(retriever.search("zzz").unwrap(), vec!["Only passage."]);
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let retriever = KeywordRetriever::new(Vec::new(), DEFAULT_TOP_K);
        assert!(retriever.is_empty());
        assert!(retriever.search("return policy").unwrap().is_empty());
    }

    #[test]
    fn test_load_passages_from_paragraphs() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "First passage line one.\nline two.\n\n\nSecond passage.\n").unwrap();

        let passages = load_passages(file.path()).unwrap();
        assert_eq!(
            passages,
            vec!["First passage line one. line two.", "Second passage."]
        );
    }

    #[test]
    fn test_load_passages_missing_file() {
        assert!(load_passages(Path::new("/nonexistent/sift/corpus.txt")).is_err());
    }

    #[test]
    fn test_static_retriever() {
        let retriever = StaticRetriever::new(&["a", "b"]);
        assert_eq!(retriever.search("q").unwrap(), vec!["a", "b"]);
        assert_eq!(retriever.call_count(), 1);

        let failing = StaticRetriever::unavailable("index offline");
        assert!(matches!(failing.search("q"), Err(SiftError::Retrieval(_))));
    }
}
