//! Vector index boundary: record schema, backend trait, write discipline.
//!
//! [`VectorIndex`] abstracts the index so the pipeline can run against the
//! production REST backend or the in-memory one without changing shape:
//!
//! ```text
//!                  ┌──────────────────┐
//!                  │   VectorIndex    │
//!                  │ delete_all/upsert│
//!                  └────────┬─────────┘
//!                           │
//!                ┌──────────┴──────────┐
//!                ▼                     ▼
//!         ┌──────────────┐     ┌──────────────┐
//!         │ PineconeIndex│     │ MemoryIndex  │
//!         │  (REST)      │     │ (tests/local)│
//!         └──────────────┘     └──────────────┘
//! ```
//!
//! [`persist_all`] applies the batching discipline: fixed-size batches, a
//! short pause between them, batch failures fatal with no local retry.

pub mod memory;
pub mod pinecone;

pub use memory::MemoryIndex;
pub use pinecone::PineconeIndex;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classify::{Task, Topic};
use crate::embeddings::EmbeddedChunk;
use crate::types::Result;

/// The persisted unit: id, vector, and retrieval metadata.
///
/// Serializes to the index's upsert wire shape. Records with the same id
/// overwrite each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// Metadata schema fixed by this pipeline. The index itself treats metadata
/// as an untyped key-value map; the schema only has meaning to the retrieval
/// layer downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub text: String,
    pub page: u32,
    pub topic: Topic,
    pub task: Task,
    pub role_min: u8,
    /// Run-level tag: the source document's file name.
    pub source: String,
    /// Run-level tag for the record class, e.g. `documentation`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl IndexRecord {
    /// Builds the persisted record for an embedded chunk, stamping the
    /// run-level `source` and `type` tags.
    pub fn from_embedded(embedded: EmbeddedChunk, source: &str, kind: &str) -> Self {
        let EmbeddedChunk { chunk, embedding } = embedded;
        Self {
            id: chunk.id,
            values: embedding,
            metadata: RecordMetadata {
                text: chunk.text,
                page: chunk.page,
                topic: chunk.classification.topic,
                task: chunk.classification.task,
                role_min: chunk.classification.role_min,
                source: source.to_string(),
                kind: kind.to_string(),
            },
        }
    }
}

/// A vector index that can be wiped and rewritten.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Deletes every record in the index. An index that does not exist yet
    /// counts as success: it is already empty.
    async fn delete_all(&self) -> Result<()>;

    /// Writes one batch of records; records overwrite by id.
    async fn upsert(&self, records: &[IndexRecord]) -> Result<()>;
}

/// Batch policy for [`persist_all`].
#[derive(Debug, Clone)]
pub struct UpsertOptions {
    pub batch_size: usize,
    /// Pause between batches; preventive rate limiting.
    pub pause: Duration,
}

impl Default for UpsertOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            pause: Duration::from_millis(100),
        }
    }
}

/// Writes all records in order, in batches of `options.batch_size`.
///
/// A batch failure aborts the run; batches already written stay written.
pub async fn persist_all(
    index: &dyn VectorIndex,
    records: &[IndexRecord],
    options: &UpsertOptions,
) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }

    let total_batches = records.len().div_ceil(options.batch_size);
    let mut written = 0usize;
    for (batch_index, batch) in records.chunks(options.batch_size).enumerate() {
        index.upsert(batch).await?;
        written += batch.len();
        info!(
            batch = batch_index + 1,
            total_batches,
            written,
            total = records.len(),
            "upserted batch"
        );
        if batch_index + 1 < total_batches {
            tokio::time::sleep(options.pause).await;
        }
    }
    Ok(())
}
