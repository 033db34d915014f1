use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use embedsmith::chunker::ChunkerConfig;
use embedsmith::config::RunConfig;
use embedsmith::embeddings::{EmbedOptions, OpenAiEmbeddings};
use embedsmith::pdf;
use embedsmith::pipeline::{self, PipelineOptions, RunSummary};
use embedsmith::stores::{PineconeIndex, UpsertOptions};
use embedsmith::types::Result;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match ingest().await {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "ingestion failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn ingest() -> Result<RunSummary> {
    let config = RunConfig::from_env()?;

    // A path argument overrides the configured document.
    let pdf_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.pdf_path.clone());

    let provider = OpenAiEmbeddings::new(
        &config.openai_api_key,
        &config.openai_base_url,
        &config.embedding_model,
        config.embedding_dimensions,
    )?;
    let index = PineconeIndex::new(&config.pinecone_api_key, &config.pinecone_index_host)?;

    let source_tag = pdf_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document")
        .to_string();

    let options = PipelineOptions {
        chunker: ChunkerConfig {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        },
        embed: EmbedOptions {
            batch_size: config.embedding_batch_size,
            ..EmbedOptions::default()
        },
        upsert: UpsertOptions {
            batch_size: config.upsert_batch_size,
            ..UpsertOptions::default()
        },
        ..PipelineOptions::for_source(source_tag)
    };

    pipeline::run(|| pdf::read_pages(&pdf_path), &provider, &index, &options).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
