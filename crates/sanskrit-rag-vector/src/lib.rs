//! sanskrit-rag-vector
//!
//! In-memory exact vector search over the embedded corpus and the
//! `Retriever` that turns a question into a context string.

pub mod index;
pub mod retriever;

pub use index::FlatIndex;
pub use retriever::Retriever;
