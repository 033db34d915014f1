//! Single-document ingestion pipeline for a vector index.
//!
//! ```text
//! PDF file ──► pdf::read_pages ──► Vec<Page>
//!
//! Vec<Page> ──► chunker::chunk_pages ──► Vec<Chunk>
//!                       │
//!                       └─► classify::classify (topic / task / role_min)
//!
//! Vec<Chunk> ──► embeddings::embed_all ──► Vec<EmbeddedChunk>
//!
//! Vec<EmbeddedChunk> ──► stores::persist_all ──► vector index records
//! ```
//!
//! The [`pipeline`] module sequences the stages (clearing the index first)
//! and reports a [`pipeline::RunSummary`]; [`config`] supplies run-level
//! knobs from the environment. Each run is a full, exclusive rebuild of the
//! target index; concurrent runs against the same index are not supported.

pub mod chunker;
pub mod classify;
pub mod config;
pub mod embeddings;
pub mod pdf;
pub mod pipeline;
pub mod stores;
pub mod types;

pub use types::{IngestError, Result};
