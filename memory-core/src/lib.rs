//! `memory_core`: the Hebbian memory engine's domain logic.
//!
//! This crate owns every data structure, scoring rule, and pipeline that
//! does not depend on a concrete storage or embedding backend. Those
//! live behind the [`store::Store`] and [`embeddings::EmbeddingClient`]
//! traits; `memory-store` and `memory-cli` wire concrete implementations
//! in.

pub mod activation;
pub mod config;
pub mod cooccurrence;
pub mod embeddings;
pub mod error;
pub mod hashing;
pub mod host;
pub mod ingestion;
pub mod retrieval;
pub mod store;
pub mod supervision;
#[cfg(test)]
pub mod test_support;
pub mod types;
pub mod vector;

pub use error::{Error, Result};
pub use types::{Memory, PatternType, Status};
