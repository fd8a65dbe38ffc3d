//! Persisted chunk collection.
//!
//! The store keeps every embedded chunk in memory behind an `Arc` snapshot
//! and owns a single on-disk JSON document. Mutations are copy-on-write:
//! a new chunk vector is built, persisted, and only then swapped in, so
//! readers holding a snapshot never observe a half-applied batch and a
//! failed write leaves both memory and disk untouched.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::RagError;

/// A bounded span of source text with its embedding and provenance.
/// Created once during ingest, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub source: String,
    pub embedding: Vec<f32>,
}

impl Chunk {
    pub fn new(text: String, source: String, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text,
            source,
            embedding,
        }
    }
}

/// Store counters reported to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_chunks: usize,
    pub sources: BTreeMap<String, usize>,
    pub embed_model: String,
}

#[derive(Deserialize)]
struct PersistedIndex {
    embed_model: String,
    chunks: Vec<Chunk>,
}

#[derive(Serialize)]
struct PersistedIndexRef<'a> {
    embed_model: &'a str,
    chunks: &'a [Chunk],
}

pub struct ChunkStore {
    path: PathBuf,
    embed_model: String,
    chunks: Arc<Vec<Chunk>>,
}

impl ChunkStore {
    /// Opens the store at `path`, loading the persisted document if one
    /// exists. A missing document starts empty; a malformed one is logged
    /// and treated as empty rather than failing startup.
    pub fn open(path: PathBuf, embed_model: &str) -> Result<Self, RagError> {
        let mut store = Self {
            path,
            embed_model: embed_model.to_string(),
            chunks: Arc::new(Vec::new()),
        };

        match fs::read_to_string(&store.path) {
            Ok(raw) => match serde_json::from_str::<PersistedIndex>(&raw) {
                Ok(doc) => {
                    if doc.embed_model != store.embed_model && !doc.chunks.is_empty() {
                        tracing::warn!(
                            persisted = %doc.embed_model,
                            configured = %store.embed_model,
                            "persisted store was built with a different embedding model"
                        );
                    }
                    store.embed_model = doc.embed_model;
                    store.chunks = Arc::new(doc.chunks);
                }
                Err(err) => {
                    tracing::warn!(
                        path = %store.path.display(),
                        error = %err,
                        "persisted store is malformed, starting empty"
                    );
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(RagError::StoreIo(err)),
        }

        Ok(store)
    }

    /// Cheap immutable view for readers; unaffected by later mutations.
    pub fn snapshot(&self) -> Arc<Vec<Chunk>> {
        Arc::clone(&self.chunks)
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Embedding dimensionality, fixed by the first chunk ever stored.
    pub fn dimension(&self) -> Option<usize> {
        self.chunks.first().map(|c| c.embedding.len())
    }

    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }

    /// Appends a batch and persists the whole document. The in-memory
    /// collection is swapped only after the write succeeds.
    pub fn append(&mut self, batch: Vec<Chunk>) -> Result<usize, RagError> {
        if batch.is_empty() {
            return Ok(0);
        }
        let added = batch.len();

        let mut next: Vec<Chunk> = self.chunks.as_ref().clone();
        next.extend(batch);
        self.persist(&next)?;
        self.chunks = Arc::new(next);
        Ok(added)
    }

    /// Removes every chunk of `source` and re-persists the reduced store.
    /// Returns whether the source existed.
    pub fn clear_source(&mut self, source: &str) -> Result<bool, RagError> {
        if !self.chunks.iter().any(|c| c.source == source) {
            return Ok(false);
        }

        let next: Vec<Chunk> = self
            .chunks
            .iter()
            .filter(|c| c.source != source)
            .cloned()
            .collect();
        self.persist(&next)?;
        self.chunks = Arc::new(next);
        Ok(true)
    }

    pub fn stats(&self) -> StoreStats {
        let mut sources: BTreeMap<String, usize> = BTreeMap::new();
        for chunk in self.chunks.iter() {
            *sources.entry(chunk.source.clone()).or_insert(0) += 1;
        }
        StoreStats {
            total_chunks: self.chunks.len(),
            sources,
            embed_model: self.embed_model.clone(),
        }
    }

    /// Idempotent re-persist of the current state; shutdown hook.
    pub fn flush(&self) -> Result<(), RagError> {
        self.persist(&self.chunks)
    }

    /// Writes the whole document via temp-file-then-rename so a crash
    /// mid-write can never leave a truncated document behind.
    fn persist(&self, chunks: &[Chunk]) -> Result<(), RagError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let doc = PersistedIndexRef {
            embed_model: &self.embed_model,
            chunks,
        };
        let raw = serde_json::to_string(&doc)?;

        let tmp = tmp_path(&self.path);
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
