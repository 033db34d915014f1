//! In-memory index backend for tests and local experimentation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{IndexRecord, VectorIndex};
use crate::types::Result;

/// A [`VectorIndex`] that keeps records in a map keyed by id.
///
/// Honors the same contract as the REST backend: `delete_all` empties the
/// index, `upsert` overwrites records with matching ids.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    records: Mutex<HashMap<String, IndexRecord>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    pub async fn get(&self, id: &str) -> Option<IndexRecord> {
        self.records.lock().await.get(id).cloned()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn delete_all(&self) -> Result<()> {
        self.records.lock().await.clear();
        Ok(())
    }

    async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        let mut guard = self.records.lock().await;
        for record in records {
            guard.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }
}
