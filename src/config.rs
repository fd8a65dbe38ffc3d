//! Engine configuration.
//!
//! Defaults match the deployment the engine was extracted from; every field
//! can be overridden from the environment via [`RagConfig::from_env`].

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::RagError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Base URL of the embedding server (trailing slash tolerated).
    pub embed_host: String,
    /// Embedding model identifier sent with every request.
    pub embed_model: String,
    /// Path of the persisted chunk document.
    pub store_path: PathBuf,
    /// Maximum chunk window size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive windows, must be < `chunk_size`.
    pub chunk_overlap: usize,
    /// Default number of chunks to retrieve per query.
    pub top_k: usize,
    /// Default context budget in characters.
    pub max_context_chars: usize,
    /// Per-request timeout for embedding calls.
    pub embed_timeout_secs: u64,
    /// Maximum in-flight embedding requests during one ingest.
    pub embed_concurrency: usize,
    /// When false, queries answer with an empty context without ranking.
    pub enabled: bool,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embed_host: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            store_path: PathBuf::from("rag_store.json"),
            chunk_size: 800,
            chunk_overlap: 200,
            top_k: 4,
            max_context_chars: 2000,
            embed_timeout_secs: 120,
            embed_concurrency: 4,
            enabled: true,
        }
    }
}

impl RagConfig {
    /// Builds a configuration from the process environment, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            embed_host: env_string("OLLAMA_HOST").unwrap_or(defaults.embed_host),
            embed_model: env_string("OLLAMA_EMBED_MODEL").unwrap_or(defaults.embed_model),
            store_path: env_string("RAG_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            chunk_size: env_parse("RAG_CHUNK_SIZE").unwrap_or(defaults.chunk_size),
            chunk_overlap: env_parse("RAG_CHUNK_OVERLAP").unwrap_or(defaults.chunk_overlap),
            top_k: env_parse("RAG_TOP_K").unwrap_or(defaults.top_k),
            max_context_chars: env_parse("RAG_MAX_CHARS").unwrap_or(defaults.max_context_chars),
            embed_timeout_secs: env_parse("RAG_EMBED_TIMEOUT_SECS")
                .unwrap_or(defaults.embed_timeout_secs),
            embed_concurrency: env_parse("RAG_EMBED_CONCURRENCY")
                .unwrap_or(defaults.embed_concurrency),
            enabled: env_string("RAG_ENABLED")
                .map(|v| is_truthy(&v))
                .unwrap_or(defaults.enabled),
        }
    }

    /// Rejects configurations the engine cannot run with. Called once at
    /// engine construction; in particular `chunk_overlap >= chunk_size`
    /// would stall the chunker cursor.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.embed_host.trim().is_empty() {
            return Err(RagError::validation("embed_host must not be blank"));
        }
        if self.embed_model.trim().is_empty() {
            return Err(RagError::validation("embed_model must not be blank"));
        }
        if self.chunk_size == 0 {
            return Err(RagError::validation("chunk_size must be positive"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Validation(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.embed_concurrency == 0 {
            return Err(RagError::validation("embed_concurrency must be positive"));
        }
        Ok(())
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
