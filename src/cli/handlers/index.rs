//! Document indexing handlers

use std::path::PathBuf;

use crate::cli::output::print_index_stats;
use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::embeddings::GeminiEmbeddingClient;
use crate::ingest::index_files;
use crate::ingest::TextSplitter;
use crate::vector_store::PineconeClient;
use crate::AppConfig;
use crate::Result;

pub async fn handle_index(
    config: &AppConfig,
    paths: Vec<PathBuf>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    source: Option<String>,
) -> Result<()> {
    let mut ingest = config.ingest.clone();
    if let Some(size) = chunk_size {
        ingest.chunk_size = size;
    }
    if let Some(overlap) = chunk_overlap {
        ingest.chunk_overlap = overlap;
    }

    config.validate()?;
    let splitter = TextSplitter::from_config(&ingest)?;
    let embedder = GeminiEmbeddingClient::from_config(config)?;
    let store = PineconeClient::from_config(config)?;

    print_info(&format!(
        "📚 Indexing {} file(s) into '{}' ({} chars per chunk, {} overlap)",
        paths.len(),
        config.vector_store.index_name,
        splitter.chunk_size(),
        splitter.chunk_overlap()
    ));

    let stats = index_files(
        &embedder,
        &store,
        &splitter,
        paths.as_slice(),
        source.as_deref(),
        ingest.batch_size,
    )
    .await?;

    print_success("Indexing complete");
    print_index_stats(&stats);
    Ok(())
}
