//! Environment-driven run configuration.
//!
//! Credentials and the index address have no defaults: their absence is a
//! configuration error raised before any stage runs. Everything else falls
//! back to the documented defaults.

use std::env;
use std::path::PathBuf;

use crate::types::{IngestError, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 800;
pub const DEFAULT_CHUNK_OVERLAP: usize = 150;
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 512;
pub const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 100;
pub const DEFAULT_UPSERT_BATCH_SIZE: usize = 100;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_PDF_PATH: &str = "NextGen-User Manual.pdf";

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub pdf_path: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub embedding_batch_size: usize,
    pub pinecone_api_key: String,
    /// Data-plane URL of the target index; stands in for the index name.
    pub pinecone_index_host: String,
    pub upsert_batch_size: usize,
}

impl RunConfig {
    /// Loads configuration from the environment (and a `.env` file if one is
    /// present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            pdf_path: env::var("MANUAL_PDF_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_PDF_PATH)),
            chunk_size: parse_var("CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            chunk_overlap: parse_var("CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
            openai_api_key: require("OPENAI_API_KEY")?,
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_dimensions: parse_var("EMBEDDING_DIMENSIONS", DEFAULT_EMBEDDING_DIMENSIONS)?,
            embedding_batch_size: parse_var("EMBEDDING_BATCH_SIZE", DEFAULT_EMBEDDING_BATCH_SIZE)?,
            pinecone_api_key: require("PINECONE_API_KEY")?,
            pinecone_index_host: require("PINECONE_INDEX_HOST")?,
            upsert_batch_size: parse_var("UPSERT_BATCH_SIZE", DEFAULT_UPSERT_BATCH_SIZE)?,
        })
    }
}

fn require(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| IngestError::Config(format!("missing required environment variable {name}")))
}

fn parse_var(name: &str, default: usize) -> Result<usize> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or_else(|| {
                IngestError::Config(format!("{name} must be a positive integer, got '{raw}'"))
            }),
        Err(_) => Ok(default),
    }
}
