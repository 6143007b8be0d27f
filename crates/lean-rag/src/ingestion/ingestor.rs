//! Folder ingestion into the vector index

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ChunkingConfig, IdStrategy, IngestionConfig};
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::{ChunkPayload, IndexPoint};

use super::chunker::TextChunker;

/// Per-run ingestion switches
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Drop the collection before ingesting
    pub recreate: bool,
}

/// What an ingestion run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Files read
    pub files: usize,
    /// Points upserted
    pub chunks: usize,
    /// Upsert requests sent
    pub batches: usize,
}

/// Point id derived from the payload: first 8 bytes of SHA-256 over
/// `doc_id \0 page \0 text`, big-endian
pub fn content_hash_id(payload: &ChunkPayload) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(payload.doc_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(payload.page.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(payload.text.as_bytes());
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    tracing::trace!("{}#{} -> {}", payload.doc_id, payload.page, hex::encode(prefix));
    u64::from_be_bytes(prefix)
}

/// Chunks, embeds and upserts a folder of text files
pub struct Ingestor {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    chunker: TextChunker,
    batch_size: usize,
    id_strategy: IdStrategy,
}

impl Ingestor {
    /// Create an ingestor over injected providers
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        chunking: &ChunkingConfig,
        ingestion: &IngestionConfig,
    ) -> Result<Self> {
        if ingestion.batch_size == 0 {
            return Err(Error::config("batch_size must be greater than 0"));
        }
        Ok(Self {
            embedder,
            store,
            chunker: TextChunker::from_config(chunking)?,
            batch_size: ingestion.batch_size,
            id_strategy: ingestion.id_strategy,
        })
    }

    /// Make sure the collection exists with the embedder's dimension and cosine distance
    ///
    /// An existing collection with another shape is a configuration error; it
    /// is never migrated.
    pub async fn ensure_collection(&self, recreate: bool) -> Result<usize> {
        let dimensions = self.embedder.dimensions().await?;

        if recreate {
            self.store.delete_collection().await?;
        }

        match self.store.collection_info().await? {
            None => self.store.create_collection(dimensions).await?,
            Some(info) if info.matches(dimensions) => {
                tracing::debug!("Collection exists with {} dimensions", info.vector_size);
            }
            Some(info) => {
                return Err(Error::config(format!(
                    "existing collection has {} dimensions ({} distance) but the embedding model \
                     produces {} (Cosine); re-run with --recreate or change the collection name",
                    info.vector_size, info.distance, dimensions
                )));
            }
        }

        Ok(dimensions)
    }

    /// Files directly inside `folder`, sorted; subdirectories are skipped
    pub async fn list_files(folder: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(folder).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn point_id(&self, counter: u64, payload: &ChunkPayload) -> u64 {
        match self.id_strategy {
            IdStrategy::Sequential => counter,
            IdStrategy::ContentHash => content_hash_id(payload),
        }
    }

    async fn flush(&self, batch: &mut Vec<IndexPoint>, report: &mut IngestReport) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.store.upsert(batch).await?;
        report.chunks += batch.len();
        report.batches += 1;
        tracing::debug!("Upserted batch {} ({} points)", report.batches, batch.len());
        batch.clear();
        Ok(())
    }

    /// Ingest every file directly inside `folder`
    ///
    /// Fails fast: the first embedding or index error aborts the run. Points
    /// already flushed stay in the index.
    pub async fn ingest(&self, folder: &Path, options: IngestOptions) -> Result<IngestReport> {
        let dimensions = self.ensure_collection(options.recreate).await?;
        tracing::info!(
            "Ingesting {} into {} ({} dims, ids: {:?})",
            folder.display(),
            self.store.name(),
            dimensions,
            self.id_strategy
        );

        let mut report = IngestReport::default();
        let mut batch = Vec::with_capacity(self.batch_size);
        let mut counter = 0u64;

        for path in Self::list_files(folder).await? {
            let raw = tokio::fs::read(&path).await?;
            let text = String::from_utf8_lossy(&raw);
            let doc_id = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            let windows: Vec<String> = self.chunker.chunks(&text).collect();
            let vectors = self.embedder.embed_batch(&windows).await?;
            if vectors.len() != windows.len() {
                return Err(Error::embedding(format!(
                    "expected {} embeddings for {}, got {}",
                    windows.len(),
                    doc_id,
                    vectors.len()
                )));
            }

            let pages = windows.len();
            for (page, (window, vector)) in windows.into_iter().zip(vectors).enumerate() {
                let payload = ChunkPayload::new(doc_id.clone(), page as u32, window);
                batch.push(IndexPoint {
                    id: self.point_id(counter, &payload),
                    vector,
                    payload,
                });
                counter += 1;

                if batch.len() >= self.batch_size {
                    self.flush(&mut batch, &mut report).await?;
                }
            }

            report.files += 1;
            tracing::info!("{}: {} chunks", doc_id, pages);
        }

        self.flush(&mut batch, &mut report).await?;
        tracing::info!(
            "Ingest complete: {} files, {} chunks, {} batches",
            report.files,
            report.chunks,
            report.batches
        );
        Ok(report)
    }
}
