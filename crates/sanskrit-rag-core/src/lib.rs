#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! sanskrit-rag-core
//!
//! Shared configuration, error taxonomy, traits and domain types for the
//! retrieval and generation crates, plus the corpus loader and splitters.

pub mod config;
pub mod error;
pub mod splitter;
pub mod traits;
pub mod types;
