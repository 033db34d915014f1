//! Sequences the ingestion stages and reports run statistics.
//!
//! Stage order is fixed: clear the index, read the document, chunk, embed,
//! persist. Every stage consumes its predecessor's complete output; nothing
//! runs concurrently. The clear step is the only stage allowed to fail
//! without aborting the run.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tracing::{info, warn};

use crate::chunker::{self, Chunk, ChunkerConfig};
use crate::embeddings::{self, EmbedOptions, EmbeddingProvider};
use crate::pdf::Page;
use crate::stores::{self, IndexRecord, UpsertOptions, VectorIndex};
use crate::types::Result;

/// Run-level knobs for the pipeline driver.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub chunker: ChunkerConfig,
    pub embed: EmbedOptions,
    pub upsert: UpsertOptions,
    /// Constant `source` metadata tag, usually the document file name.
    pub source_tag: String,
    /// Constant `type` metadata tag.
    pub type_tag: String,
    /// Wait after a successful clear so deletion can propagate through the
    /// eventually-consistent store before writing.
    pub propagation_wait: Duration,
}

impl PipelineOptions {
    pub fn for_source(source_tag: impl Into<String>) -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            embed: EmbedOptions::default(),
            upsert: UpsertOptions::default(),
            source_tag: source_tag.into(),
            type_tag: "documentation".to_string(),
            propagation_wait: Duration::from_secs(3),
        }
    }
}

/// Aggregate statistics for a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub pages: usize,
    pub chunks: usize,
    pub vectors_written: usize,
    pub topics: BTreeMap<String, usize>,
    pub tasks: BTreeMap<String, usize>,
    pub roles: BTreeMap<u8, usize>,
}

impl RunSummary {
    fn tally(pages: usize, chunks: &[Chunk]) -> Self {
        let mut summary = Self {
            pages,
            chunks: chunks.len(),
            ..Self::default()
        };
        for chunk in chunks {
            *summary
                .topics
                .entry(chunk.classification.topic.to_string())
                .or_insert(0) += 1;
            *summary
                .tasks
                .entry(chunk.classification.task.to_string())
                .or_insert(0) += 1;
            *summary.roles.entry(chunk.classification.role_min).or_insert(0) += 1;
        }
        summary
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ingestion complete")?;
        writeln!(f, "  pages processed : {}", self.pages)?;
        writeln!(f, "  chunks created  : {}", self.chunks)?;
        writeln!(f, "  vectors written : {}", self.vectors_written)?;
        writeln!(f, "  topics          : {}", join_counts_by_count(&self.topics))?;
        writeln!(f, "  tasks           : {}", join_counts(&self.tasks))?;
        write!(f, "  role minimums   : {}", join_counts(&self.roles))
    }
}

fn join_counts<K: fmt::Display>(counts: &BTreeMap<K, usize>) -> String {
    if counts.is_empty() {
        return "-".to_string();
    }
    counts
        .iter()
        .map(|(key, count)| format!("{key}={count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Like [`join_counts`], but most frequent first; ties stay alphabetical.
fn join_counts_by_count<K: fmt::Display>(counts: &BTreeMap<K, usize>) -> String {
    if counts.is_empty() {
        return "-".to_string();
    }
    let mut entries: Vec<(&K, &usize)> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1));
    entries
        .iter()
        .map(|(key, count)| format!("{key}={count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Runs the full pipeline: clear → read → chunk → embed → persist.
///
/// `read_pages` is invoked after the clear step, matching the stage order of
/// the run; a read failure therefore leaves an already-cleared index behind.
/// A clear failure is logged and swallowed: upsert overwrites by id, so
/// stale leftovers from a partial clear are tolerated. Every other failure
/// aborts the run; batches persisted before an upsert failure stay written.
pub async fn run<F>(
    read_pages: F,
    provider: &dyn EmbeddingProvider,
    index: &dyn VectorIndex,
    options: &PipelineOptions,
) -> Result<RunSummary>
where
    F: FnOnce() -> Result<Vec<Page>>,
{
    match index.delete_all().await {
        Ok(()) => {
            info!("cleared vector index");
            if !options.propagation_wait.is_zero() {
                tokio::time::sleep(options.propagation_wait).await;
            }
        }
        Err(err) => {
            warn!(error = %err, "failed to clear vector index; continuing, upsert overwrites by id");
        }
    }

    let pages = read_pages()?;

    let chunks = chunker::chunk_pages(&pages, &options.chunker);
    let mut summary = RunSummary::tally(pages.len(), &chunks);
    info!(
        pages = pages.len(),
        chunks = chunks.len(),
        topics = %join_counts_by_count(&summary.topics),
        "chunked document"
    );

    let embedded = embeddings::embed_all(provider, &chunks, &options.embed).await?;

    let records: Vec<IndexRecord> = embedded
        .into_iter()
        .map(|chunk| IndexRecord::from_embedded(chunk, &options.source_tag, &options.type_tag))
        .collect();

    stores::persist_all(index, &records, &options.upsert).await?;
    summary.vectors_written = records.len();

    info!(vectors = summary.vectors_written, "run finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_display_lists_distributions() {
        let chunks = vec![Chunk {
            id: "chunk-0".to_string(),
            text: "x".to_string(),
            classification: crate::classify::Classification::default(),
            page: 1,
        }];
        let mut summary = RunSummary::tally(1, &chunks);
        summary.vectors_written = 1;
        let rendered = summary.to_string();
        assert!(rendered.contains("chunks created  : 1"));
        assert!(rendered.contains("general=1"));
        assert!(rendered.contains("reference=1"));
        assert!(rendered.contains("1=1"));
    }

    #[test]
    fn empty_summary_renders_placeholders() {
        let summary = RunSummary::tally(0, &[]);
        assert!(summary.to_string().contains("topics          : -"));
    }

    #[test]
    fn topics_report_most_frequent_first() {
        use crate::classify::{Classification, Task, Topic};

        let chunk = |id: usize, topic: Topic, role_min: u8| Chunk {
            id: format!("chunk-{id}"),
            text: "x".to_string(),
            classification: Classification {
                topic,
                task: Task::Navigation,
                role_min,
            },
            page: 1,
        };
        let chunks = vec![
            chunk(0, Topic::Attendance, 1),
            chunk(1, Topic::Reports, 5),
            chunk(2, Topic::Reports, 5),
        ];

        let rendered = RunSummary::tally(1, &chunks).to_string();
        // Alphabetically attendance comes first; by count, reports must.
        assert!(rendered.contains("topics          : reports=2, attendance=1"));
        // Role floors stay ordered by tier.
        assert!(rendered.contains("role minimums   : 1=1, 5=2"));
    }
}
