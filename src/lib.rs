//! Embedding-based retrieval engine.
//!
//! Chunks ingested text into overlapping windows, embeds them through a
//! remote model, ranks stored chunks against query embeddings by cosine
//! similarity, and assembles the winners into a character-budgeted context
//! block. The chunk index persists as a single JSON document.
//!
//! Transport, document-format extraction, and the generation call itself
//! are the caller's concern; this crate exposes [`RagEngine`] and the
//! leaf components it is built from.

pub mod chunker;
pub mod config;
pub mod context;
pub mod embedding;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod retriever;
pub mod store;

pub use config::RagConfig;
pub use embedding::{EmbeddingClient, OllamaEmbedder};
pub use engine::{IngestReport, QueryOutcome, RagEngine};
pub use errors::RagError;
pub use retriever::ScoredChunk;
pub use store::{Chunk, ChunkStore, StoreStats};
