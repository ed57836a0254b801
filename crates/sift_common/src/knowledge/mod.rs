//! Knowledge base for the retrieval path: passage index and retrievers.

pub mod index;
pub mod retriever;

pub use index::{tokenize, PassageIndex};
pub use retriever::{default_passages, load_passages, KeywordRetriever, Retriever, StaticRetriever};
