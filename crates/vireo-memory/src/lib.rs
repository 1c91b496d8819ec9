//! SQLite-backed collaborator implementations: workflow, document, and chat
//! history storage plus an embedding-backed vector index.

pub mod embeddings;
pub mod index;
pub mod store;

pub use embeddings::{cosine_similarity, EmbeddingProvider, HttpEmbeddingProvider};
pub use index::{chunk_text, EmbeddingIndex};
pub use store::SqliteStore;
