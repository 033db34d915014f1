//! End-to-end pipeline tests with mock embeddings and an in-memory index.
//!
//! These exercise the full clear → read → chunk → embed → persist sequence
//! deterministically, with no network access, suitable for CI.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use embedsmith::chunker::ChunkerConfig;
use embedsmith::embeddings::{EmbedOptions, MockEmbeddings};
use embedsmith::pdf::Page;
use embedsmith::pipeline::{self, PipelineOptions};
use embedsmith::stores::{IndexRecord, MemoryIndex, UpsertOptions, VectorIndex};
use embedsmith::types::{IngestError, Result};

const DIMENSIONS: usize = 16;

fn fast_options(source: &str) -> PipelineOptions {
    PipelineOptions {
        chunker: ChunkerConfig::default(),
        embed: EmbedOptions {
            batch_size: 100,
            pause: Duration::ZERO,
        },
        upsert: UpsertOptions {
            batch_size: 100,
            pause: Duration::ZERO,
        },
        source_tag: source.to_string(),
        type_tag: "documentation".to_string(),
        propagation_wait: Duration::ZERO,
    }
}

/// 150 characters of plain prose with no classifier keywords.
fn neutral_page_text() -> String {
    let text = "The long quiet afternoon passed slowly while the gray cat slept beside \
                the window and sunlight moved across the floor of the small reading room today."
        .to_string();
    assert_eq!(text.chars().count(), 150);
    text
}

#[tokio::test]
async fn single_neutral_page_produces_one_general_record() {
    let provider = MockEmbeddings::new(DIMENSIONS);
    let index = MemoryIndex::new();
    let pages = vec![Page::new(1, neutral_page_text())];

    let summary = pipeline::run(
        || Ok(pages),
        &provider,
        &index,
        &fast_options("manual.pdf"),
    )
    .await
    .unwrap();

    assert_eq!(summary.pages, 1);
    assert_eq!(summary.chunks, 1);
    assert_eq!(summary.vectors_written, 1);
    assert_eq!(summary.topics.get("general"), Some(&1));
    assert_eq!(summary.tasks.get("reference"), Some(&1));
    assert_eq!(summary.roles.get(&1), Some(&1));

    assert_eq!(index.len().await, 1);
    let record = index.get("chunk-0").await.expect("record present");
    assert_eq!(record.values.len(), DIMENSIONS);
    assert_eq!(record.metadata.page, 1);
    assert_eq!(record.metadata.topic.to_string(), "general");
    assert_eq!(record.metadata.task.to_string(), "reference");
    assert_eq!(record.metadata.role_min, 1);
    assert_eq!(record.metadata.source, "manual.pdf");
    assert_eq!(record.metadata.kind, "documentation");
}

#[tokio::test]
async fn chunk_embedding_and_record_counts_line_up() {
    let provider = MockEmbeddings::new(DIMENSIONS);
    let index = MemoryIndex::new();

    let long_text: String = (0..80)
        .map(|i| format!("Plain sentence number {i} filling space on the page."))
        .collect::<Vec<_>>()
        .join(" ");
    let pages = vec![Page::new(1, long_text.clone()), Page::new(2, long_text)];

    let summary = pipeline::run(|| Ok(pages), &provider, &index, &fast_options("m.pdf"))
        .await
        .unwrap();

    assert!(summary.chunks > 2);
    assert_eq!(summary.vectors_written, summary.chunks);
    assert_eq!(index.len().await, summary.chunks);
    // Ids run chunk-0..chunk-{n-1} with no gaps.
    for i in 0..summary.chunks {
        assert!(index.get(&format!("chunk-{i}")).await.is_some());
    }
}

#[tokio::test]
async fn rerun_replaces_prior_index_contents() {
    let provider = MockEmbeddings::new(DIMENSIONS);
    let index = MemoryIndex::new();

    // Seed the index with a record from an earlier document.
    let stale = {
        let pages = vec![Page::new(9, neutral_page_text())];
        let summary = pipeline::run(|| Ok(pages), &provider, &index, &fast_options("old.pdf"))
            .await
            .unwrap();
        assert_eq!(summary.vectors_written, 1);
        index.get("chunk-0").await.unwrap()
    };
    assert_eq!(stale.metadata.source, "old.pdf");

    let pages = vec![Page::new(1, neutral_page_text())];
    pipeline::run(|| Ok(pages), &provider, &index, &fast_options("new.pdf"))
        .await
        .unwrap();

    assert_eq!(index.len().await, 1);
    let fresh = index.get("chunk-0").await.unwrap();
    assert_eq!(fresh.metadata.source, "new.pdf");
    assert_eq!(fresh.metadata.page, 1);
}

#[tokio::test]
async fn empty_document_is_a_valid_run() {
    let provider = MockEmbeddings::new(DIMENSIONS);
    let index = MemoryIndex::new();

    let summary = pipeline::run(|| Ok(Vec::new()), &provider, &index, &fast_options("e.pdf"))
        .await
        .unwrap();

    assert_eq!(summary.pages, 0);
    assert_eq!(summary.chunks, 0);
    assert_eq!(summary.vectors_written, 0);
    assert!(index.is_empty().await);
}

#[tokio::test]
async fn read_failure_aborts_the_run() {
    let provider = MockEmbeddings::new(DIMENSIONS);
    let index = MemoryIndex::new();

    let result = pipeline::run(
        || Err(IngestError::Read("unreadable document".to_string())),
        &provider,
        &index,
        &fast_options("m.pdf"),
    )
    .await;

    assert!(matches!(result, Err(IngestError::Read(_))));
    assert!(index.is_empty().await);
}

/// Index whose clear always fails but whose writes succeed.
struct StubbornIndex {
    inner: MemoryIndex,
    clears_attempted: AtomicUsize,
}

#[async_trait]
impl VectorIndex for StubbornIndex {
    async fn delete_all(&self) -> Result<()> {
        self.clears_attempted.fetch_add(1, Ordering::SeqCst);
        Err(IngestError::Index("deletion timed out".to_string()))
    }

    async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        self.inner.upsert(records).await
    }
}

#[tokio::test]
async fn clear_failure_is_swallowed_and_the_run_proceeds() {
    let provider = MockEmbeddings::new(DIMENSIONS);
    let index = StubbornIndex {
        inner: MemoryIndex::new(),
        clears_attempted: AtomicUsize::new(0),
    };
    let pages = vec![Page::new(1, neutral_page_text())];

    let summary = pipeline::run(|| Ok(pages), &provider, &index, &fast_options("m.pdf"))
        .await
        .expect("clear failure must not abort the run");

    assert_eq!(index.clears_attempted.load(Ordering::SeqCst), 1);
    assert_eq!(summary.vectors_written, 1);
    assert_eq!(index.inner.len().await, 1);
}

/// Index whose writes always fail.
struct RejectingIndex;

#[async_trait]
impl VectorIndex for RejectingIndex {
    async fn delete_all(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, _records: &[IndexRecord]) -> Result<()> {
        Err(IngestError::Index("write rejected".to_string()))
    }
}

#[tokio::test]
async fn upsert_failure_aborts_the_run() {
    let provider = MockEmbeddings::new(DIMENSIONS);
    let pages = vec![Page::new(1, neutral_page_text())];

    let result = pipeline::run(
        || Ok(pages),
        &provider,
        &RejectingIndex,
        &fast_options("m.pdf"),
    )
    .await;

    assert!(matches!(result, Err(IngestError::Index(_))));
}

#[tokio::test]
async fn provider_can_be_shared_behind_an_arc() {
    // The pipeline only needs trait objects; make sure the common Arc wiring
    // compiles and behaves.
    let provider: Arc<MockEmbeddings> = Arc::new(MockEmbeddings::new(DIMENSIONS));
    let index = MemoryIndex::new();
    let pages = vec![Page::new(1, neutral_page_text())];

    let summary = pipeline::run(
        || Ok(pages),
        provider.as_ref(),
        &index,
        &fast_options("m.pdf"),
    )
    .await
    .unwrap();
    assert_eq!(summary.vectors_written, 1);
}
