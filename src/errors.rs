use thiserror::Error;

/// Failure taxonomy for the retrieval engine.
///
/// `Parse` covers (de)serialization of the persisted chunk document; note
/// that a malformed document encountered during `ChunkStore::open` is
/// downgraded to a warning and an empty store rather than surfaced.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("embedding service error: {0}")]
    EmbeddingService(String),
    #[error("store io error: {0}")]
    StoreIo(#[from] std::io::Error),
    #[error("persisted store malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RagError {
    pub fn validation<M: std::fmt::Display>(msg: M) -> Self {
        RagError::Validation(msg.to_string())
    }

    pub fn embedding<E: std::fmt::Display>(err: E) -> Self {
        RagError::EmbeddingService(err.to_string())
    }
}
