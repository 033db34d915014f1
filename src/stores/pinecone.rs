//! Pinecone-style REST backend for the vector index boundary.
//!
//! The client talks to an index's data plane directly: the host URL stands in
//! for the index name, and every request carries the `Api-Key` header.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;

use super::{IndexRecord, VectorIndex};
use crate::types::{IngestError, Result};

#[derive(Debug)]
pub struct PineconeIndex {
    client: Client,
    host: String,
}

impl PineconeIndex {
    /// Builds a client for the index behind `host` (an `http(s)` URL).
    pub fn new(api_key: &str, host: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(IngestError::Config("missing index API key".into()));
        }
        if !host.starts_with("http://") && !host.starts_with("https://") {
            return Err(IngestError::Config(format!(
                "index host must be an http(s) URL, got '{host}'"
            )));
        }
        let mut headers = HeaderMap::new();
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(api_key.trim())
                .map_err(|_| IngestError::Config("index API key is not a valid header value".into()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
        })
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}{path}", self.host);
        Ok(self.client.post(url).json(body).send().await?)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn delete_all(&self) -> Result<()> {
        let response = self
            .post("/vectors/delete", &DeleteRequest { delete_all: true })
            .await?;
        let status = response.status();
        // A 404 means the index (or namespace) holds nothing to delete.
        if status == StatusCode::NOT_FOUND {
            debug!("index not found during clear; already empty");
            return Ok(());
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(IngestError::Index(format!(
                "clear failed ({status}): {body}"
            )));
        }
        Ok(())
    }

    async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        let response = self
            .post("/vectors/upsert", &UpsertRequest { vectors: records })
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(IngestError::Index(format!(
                "upsert of {} records failed ({status}): {body}",
                records.len()
            )));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct DeleteRequest {
    #[serde(rename = "deleteAll")]
    delete_all: bool,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [IndexRecord],
}
