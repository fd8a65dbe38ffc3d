//! Retrieval engine.
//!
//! Wires chunker, embedding client, store, retriever and context assembler
//! into the public operation surface. One engine instance is constructed at
//! startup and passed by reference into every handler; there is no global
//! state. Mutation goes through a single writer lock while queries rank an
//! immutable snapshot taken under the read lock, so an in-flight ingest can
//! never be observed half-applied.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::chunker::split_text;
use crate::config::RagConfig;
use crate::context::build_context;
use crate::embedding::{EmbeddingClient, OllamaEmbedder};
use crate::errors::RagError;
use crate::retriever::rank_chunks;
use crate::store::{Chunk, ChunkStore, StoreStats};

/// Result of an ingest call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub added: usize,
}

/// Result of a query: the assembled context and its length in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub context: String,
    pub context_length: usize,
}

impl QueryOutcome {
    fn empty() -> Self {
        Self {
            context: String::new(),
            context_length: 0,
        }
    }
}

pub struct RagEngine {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingClient>,
    store: RwLock<ChunkStore>,
}

impl RagEngine {
    /// Opens an engine backed by the Ollama embedding endpoint named in the
    /// configuration. Loads the persisted store eagerly.
    pub fn open(config: RagConfig) -> Result<Self, RagError> {
        config.validate()?;
        let embedder = Arc::new(OllamaEmbedder::new(
            &config.embed_host,
            &config.embed_model,
            Duration::from_secs(config.embed_timeout_secs),
        )?);
        Self::with_embedder(config, embedder)
    }

    /// Opens an engine with a caller-supplied embedding client.
    pub fn with_embedder(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingClient>,
    ) -> Result<Self, RagError> {
        config.validate()?;
        let store = ChunkStore::open(config.store_path.clone(), embedder.model())?;
        tracing::info!(
            store_path = %config.store_path.display(),
            chunks = store.len(),
            embed_model = store.embed_model(),
            "retrieval engine ready"
        );
        Ok(Self {
            config,
            embedder,
            store: RwLock::new(store),
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Chunks `text`, embeds every chunk, and appends the batch to the
    /// store. All-or-nothing: any embedding failure aborts the call before
    /// the store is touched, in memory or on disk.
    pub async fn ingest_text(&self, text: &str, source: &str) -> Result<IngestReport, RagError> {
        if text.trim().is_empty() {
            return Err(RagError::validation("text must not be blank"));
        }
        if source.trim().is_empty() {
            return Err(RagError::validation("source must not be blank"));
        }

        let windows = split_text(text, self.config.chunk_size, self.config.chunk_overlap);
        if windows.is_empty() {
            return Ok(IngestReport { added: 0 });
        }

        // Bounded fan-out; `buffered` keeps results in input order so chunk
        // ordering stays deterministic.
        let embeddings: Vec<Vec<f32>> = stream::iter(
            windows
                .iter()
                .map(|window| self.embedder.embed(window)),
        )
        .buffered(self.config.embed_concurrency)
        .try_collect()
        .await?;

        let mut store = self.store.write().await;
        check_dimensions(store.dimension(), &embeddings)?;

        let batch: Vec<Chunk> = windows
            .into_iter()
            .zip(embeddings)
            .map(|(window, embedding)| Chunk::new(window, source.to_string(), embedding))
            .collect();
        let added = store.append(batch)?;

        tracing::info!(source, added, total = store.len(), "ingested text");
        Ok(IngestReport { added })
    }

    /// Ingests an already-decoded document. Extraction of binary formats is
    /// the caller's job; this is the same contract as [`Self::ingest_text`]
    /// under the name the document path uses.
    pub async fn ingest_document(
        &self,
        text: &str,
        source: &str,
    ) -> Result<IngestReport, RagError> {
        self.ingest_text(text, source).await
    }

    /// Retrieves the `top_k` most similar chunks (optionally restricted to
    /// `sources`) and assembles them into a context of at most `max_chars`
    /// characters.
    ///
    /// An empty store short-circuits before any embedding call. A failing
    /// query-time embedding degrades to an empty outcome instead of an
    /// error so the conversational turn can proceed without context.
    pub async fn query(
        &self,
        query: &str,
        sources: Option<&[String]>,
        top_k: usize,
        max_chars: usize,
    ) -> Result<QueryOutcome, RagError> {
        if query.trim().is_empty() {
            return Err(RagError::validation("query must not be blank"));
        }
        if !self.config.enabled {
            return Ok(QueryOutcome::empty());
        }

        let snapshot = self.store.read().await.snapshot();
        if snapshot.is_empty() {
            return Ok(QueryOutcome::empty());
        }

        let query_vec = match self.embedder.embed(query).await {
            Ok(vec) => vec,
            Err(err) => {
                tracing::warn!(error = %err, "query embedding failed, answering without context");
                return Ok(QueryOutcome::empty());
            }
        };

        let ranked = rank_chunks(&snapshot, &query_vec, top_k, sources);
        let context = build_context(&ranked, max_chars);
        Ok(QueryOutcome {
            context_length: context.chars().count(),
            context,
        })
    }

    /// Query with the configured `top_k` and context budget, returning the
    /// context capped to `preview_chars` while reporting the full length.
    pub async fn preview(
        &self,
        query: &str,
        sources: Option<&[String]>,
        preview_chars: usize,
    ) -> Result<QueryOutcome, RagError> {
        let outcome = self
            .query(
                query,
                sources,
                self.config.top_k,
                self.config.max_context_chars,
            )
            .await?;
        Ok(QueryOutcome {
            context: outcome.context.chars().take(preview_chars).collect(),
            context_length: outcome.context_length,
        })
    }

    pub async fn stats(&self) -> StoreStats {
        self.store.read().await.stats()
    }

    /// Removes every chunk of `source`; returns whether the source existed.
    pub async fn clear_source(&self, source: &str) -> Result<bool, RagError> {
        let mut store = self.store.write().await;
        let existed = store.clear_source(source)?;
        tracing::info!(source, existed, remaining = store.len(), "cleared source");
        Ok(existed)
    }

    /// Re-persists the current store; call on shutdown.
    pub async fn flush(&self) -> Result<(), RagError> {
        self.store.read().await.flush()
    }
}

/// Every vector of a batch must match the store's dimensionality (fixed by
/// the first chunk ever stored) and each other's.
fn check_dimensions(store_dim: Option<usize>, embeddings: &[Vec<f32>]) -> Result<(), RagError> {
    let mut expected = store_dim;
    for embedding in embeddings {
        match expected {
            Some(dim) if embedding.len() != dim => {
                return Err(RagError::Validation(format!(
                    "embedding dimensionality {} does not match store dimensionality {}",
                    embedding.len(),
                    dim
                )));
            }
            None => expected = Some(embedding.len()),
            _ => {}
        }
    }
    Ok(())
}
