//! Embedding generation over an OpenAI-style embeddings endpoint.
//!
//! [`EmbeddingProvider`] is the seam between the pipeline and the embedding
//! service; [`OpenAiEmbeddings`] is the production implementation and
//! [`MockEmbeddings`] a deterministic stand-in for tests and offline runs.
//! [`embed_all`] drives the batch loop: one request per batch, a short pause
//! between batches to stay under rate limits, and no local retry; a failed
//! batch aborts the run.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chunker::Chunk;
use crate::types::{IngestError, Result};

/// A chunk paired with its embedding vector.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// Batch embedding source.
///
/// Implementations must return one vector per input, index-aligned with the
/// input slice, each of [`dimensions`](Self::dimensions) length.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Dimensionality of the vectors this provider produces.
    fn dimensions(&self) -> usize;
}

/// Client for OpenAI-compatible `/embeddings` endpoints.
#[derive(Debug)]
pub struct OpenAiEmbeddings {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbeddings {
    /// Builds a client for `{base_url}/embeddings` with bearer auth.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(IngestError::Config("missing embedding API key".into()));
        }
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| IngestError::Config("embedding API key is not a valid header value".into()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.into(),
            dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.dimensions,
        };
        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(IngestError::Embedding(format!(
                "embeddings request failed ({status}): {body}"
            )));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| IngestError::Embedding(format!("unparseable embedding response: {err}")))?;

        // The service tags entries with their request position; order by it
        // so pairing stays positional even if the wire order differs.
        parsed.data.sort_by_key(|entry| entry.index);
        if parsed.data.len() != texts.len() {
            return Err(IngestError::Embedding(format!(
                "service returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }
        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Deserialize)]
struct EmbeddingEntry {
    index: usize,
    embedding: Vec<f32>,
}

/// Deterministic embedding provider for tests and offline runs.
///
/// Vectors are derived from a hash of the input text: identical text always
/// yields an identical vector, different text almost surely a different one.
#[derive(Debug, Clone)]
pub struct MockEmbeddings {
    dimensions: usize,
}

impl MockEmbeddings {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddings {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| hash_to_vec(text, self.dimensions))
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn hash_to_vec(text: &str, dimensions: usize) -> Vec<f32> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let seed = hasher.finish();
    (0..dimensions)
        .map(|i| {
            let bits = seed.rotate_left((i % 64) as u32) ^ ((i as u64) << 7);
            (bits as f32) / (u64::MAX as f32)
        })
        .collect()
}

/// Batch policy for [`embed_all`].
#[derive(Debug, Clone)]
pub struct EmbedOptions {
    pub batch_size: usize,
    /// Pause between batches (not after the last); preventive rate limiting,
    /// not a correctness requirement.
    pub pause: Duration,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            pause: Duration::from_millis(200),
        }
    }
}

/// Embeds every chunk, preserving order and cardinality.
///
/// Chunks are grouped into batches of `options.batch_size`; each batch is one
/// request, and returned vectors are paired with their chunks positionally.
/// A batch failure aborts the run with no partial output.
pub async fn embed_all(
    provider: &dyn EmbeddingProvider,
    chunks: &[Chunk],
    options: &EmbedOptions,
) -> Result<Vec<EmbeddedChunk>> {
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    let total_batches = chunks.len().div_ceil(options.batch_size);
    let mut embedded = Vec::with_capacity(chunks.len());

    for (batch_index, batch) in chunks.chunks(options.batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = provider.embed_batch(&texts).await?;
        if vectors.len() != batch.len() {
            return Err(IngestError::Embedding(format!(
                "provider returned {} vectors for a batch of {}",
                vectors.len(),
                batch.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != provider.dimensions()) {
            return Err(IngestError::Embedding(format!(
                "expected {}-dimensional vectors, got {}",
                provider.dimensions(),
                bad.len()
            )));
        }

        for (chunk, embedding) in batch.iter().cloned().zip(vectors) {
            embedded.push(EmbeddedChunk { chunk, embedding });
        }
        info!(
            batch = batch_index + 1,
            total_batches,
            embedded = embedded.len(),
            "embedded batch"
        );

        if batch_index + 1 < total_batches {
            tokio::time::sleep(options.pause).await;
        }
    }

    Ok(embedded)
}
