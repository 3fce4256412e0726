//! Embed document chunks and write them to the vector store

use std::path::Path;

use serde_json::json;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;
use tracing::info;

use super::TextSplitter;
use crate::embeddings::Embedder;
use crate::errors::DsaCoachError;
use crate::errors::Result;
use crate::vector_store::VectorRecord;
use crate::vector_store::VectorStore;

/// Statistics from an indexing run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub chunks: usize,
    pub upserted: usize,
}

impl IndexStats {
    fn merge(&mut self, other: Self) {
        self.chunks += other.chunks;
        self.upserted += other.upserted;
    }
}

fn chunk_metadata(text: &str, source: &str, chunk: usize) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("text".to_string(), json!(text));
    metadata.insert("source".to_string(), json!(source));
    metadata.insert("chunk".to_string(), json!(chunk));
    metadata
}

/// Split `text`, embed the chunks in batches and upsert them.
///
/// Record ids are `<source>#<chunk index>`, so re-indexing the same source
/// overwrites its earlier chunks.
///
/// # Errors
/// - Embedding errors (API failures, dimension mismatch)
/// - Vector store upsert errors
pub async fn index_document(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    splitter: &TextSplitter,
    text: &str,
    source: &str,
    batch_size: usize,
) -> Result<IndexStats> {
    let chunks = splitter.split_text(text);
    let batch_size = batch_size.max(1);
    let batches = chunks.len().div_ceil(batch_size);
    info!("Indexing {} chunks from {} in {} batches", chunks.len(), source, batches);

    let mut stats = IndexStats {
        chunks: chunks.len(),
        upserted: 0,
    };

    for (batch_idx, batch) in chunks.chunks(batch_size).enumerate() {
        debug!("Processing batch {}/{} ({} chunks)", batch_idx + 1, batches, batch.len());

        let vectors = embedder.embed_documents(batch).await?;
        let offset = batch_idx * batch_size;

        let records: Vec<VectorRecord> = batch
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (text, values))| VectorRecord {
                id: format!("{}#{}", source, offset + i),
                values,
                metadata: chunk_metadata(text, source, offset + i),
            })
            .collect();

        stats.upserted += store.upsert(&records).await?;
    }

    info!(
        "Indexed {}: {} chunks, {} vectors upserted",
        source, stats.chunks, stats.upserted
    );
    Ok(stats)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Index every plain-text file in `paths`, using the file name as source unless one is given
///
/// # Errors
/// - File read errors
/// - See [`index_document`]
pub async fn index_files(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    splitter: &TextSplitter,
    paths: &[impl AsRef<Path>],
    source: Option<&str>,
    batch_size: usize,
) -> Result<IndexStats> {
    if source.is_some() && paths.len() > 1 {
        return Err(DsaCoachError::InvalidRequest(
            "An explicit source can only label a single file".to_string(),
        ));
    }

    let mut total = IndexStats::default();

    for path in paths {
        let path = path.as_ref();
        if is_pdf(path) {
            return Err(DsaCoachError::InvalidRequest(format!(
                "{} is a PDF; extract its text to a .txt or .md file first",
                path.display()
            )));
        }

        let text = tokio::fs::read_to_string(path).await?;
        if text.trim().is_empty() {
            return Err(DsaCoachError::InvalidRequest(format!(
                "{} contains no text",
                path.display()
            )));
        }

        let name = match source {
            Some(source) => source.to_string(),
            None => path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
        };

        total.merge(index_document(embedder, store, splitter, &text, &name, batch_size).await?);
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::vector_store::VectorMatch;

    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32])
        }

        async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        batches: Mutex<Vec<Vec<VectorRecord>>>,
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        async fn query(&self, _: &[f32], _: usize, _: bool) -> Result<Vec<VectorMatch>> {
            Ok(Vec::new())
        }

        async fn upsert(&self, records: &[VectorRecord]) -> Result<usize> {
            self.batches.lock().unwrap().push(records.to_vec());
            Ok(records.len())
        }
    }

    #[tokio::test]
    async fn test_index_document_batches_and_metadata() {
        let store = RecordingStore::default();
        let splitter = TextSplitter::new(10, 0).unwrap();
        let text = "one\n\ntwo\n\nthree\n\nfour\n\nfive";

        let stats = index_document(&LengthEmbedder, &store, &splitter, text, "dsa.txt", 2)
            .await
            .unwrap();

        assert_eq!(stats, IndexStats { chunks: 3, upserted: 3 });

        let batches = store.batches.lock().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 2);

        let last = &batches[1][0];
        assert_eq!(last.id, "dsa.txt#2");
        assert_eq!(last.metadata["text"], "four\n\nfive");
        assert_eq!(last.metadata["source"], "dsa.txt");
        assert_eq!(last.metadata["chunk"], 2);
    }

    #[tokio::test]
    async fn test_index_files_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stacks.md");
        std::fs::write(&path, "A stack is a LIFO structure.").unwrap();

        let store = RecordingStore::default();
        let stats = index_files(
            &LengthEmbedder,
            &store,
            &TextSplitter::default(),
            &[&path],
            None,
            50,
        )
        .await
        .unwrap();

        assert_eq!(stats.upserted, 1);
        let batches = store.batches.lock().unwrap();
        assert_eq!(batches[0][0].id, "stacks.md#0");
    }

    #[tokio::test]
    async fn test_empty_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "  \n").unwrap();

        let result = index_files(
            &LengthEmbedder,
            &RecordingStore::default(),
            &TextSplitter::default(),
            &[&path],
            None,
            50,
        )
        .await;
        assert!(matches!(result, Err(DsaCoachError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_pdf_is_rejected_before_any_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        let pdf = dir.path().join("Dsa.PDF");
        std::fs::write(&notes, "A queue is FIFO.").unwrap();
        std::fs::write(&pdf, b"%PDF-1.7\n").unwrap();
        let store = RecordingStore::default();

        let result = index_files(
            &LengthEmbedder,
            &store,
            &TextSplitter::default(),
            &[&pdf, &notes],
            None,
            50,
        )
        .await;

        let Err(DsaCoachError::InvalidRequest(message)) = result else {
            panic!("expected a PDF rejection, got {result:?}");
        };
        assert!(message.contains("Dsa.PDF"));
        assert!(store.batches.lock().unwrap().is_empty());
    }
}
