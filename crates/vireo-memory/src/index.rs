use std::path::Path;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use rusqlite::{params, Connection};
use tracing::debug;

use vireo_core::error::{Result, VireoError};
use vireo_core::traits::VectorIndex;
use vireo_core::types::ScoredChunk;

use crate::embeddings::{cosine_similarity, EmbeddingProvider};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS chunks (
        document_id TEXT NOT NULL,
        chunk_index INTEGER NOT NULL,
        text TEXT NOT NULL,
        metadata TEXT NOT NULL DEFAULT '{}',
        embedding BLOB NOT NULL,
        PRIMARY KEY (document_id, chunk_index)
    );
";

/// Vector index over document chunks, embeddings stored as little-endian
/// f32 blobs in SQLite and scored with cosine similarity at query time.
pub struct EmbeddingIndex {
    conn: Mutex<Connection>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingIndex {
    pub fn open(path: &Path, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                VireoError::Database(format!("Failed to create index directory: {e}"))
            })?;
        }

        let conn =
            Connection::open(path).map_err(|e| VireoError::Database(e.to_string()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| VireoError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| VireoError::Database(e.to_string()))?;

        debug!(path = %path.display(), "embedding index opened");
        Ok(Self {
            conn: Mutex::new(conn),
            provider,
        })
    }

    pub fn in_memory(provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| VireoError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| VireoError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
            provider,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VireoError::Database(e.to_string()))
    }
}

fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

fn decode_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect()
}

impl VectorIndex for EmbeddingIndex {
    fn search_similar(
        &self,
        query: &str,
        k: usize,
        document_id: &str,
    ) -> BoxFuture<'_, Result<Vec<ScoredChunk>>> {
        let query = query.to_string();
        let document_id = document_id.to_string();
        Box::pin(async move {
            // embed before taking the connection lock
            let embedded = self.provider.embed(&[query]).await?;
            let query_vector = embedded
                .into_iter()
                .next()
                .ok_or_else(|| VireoError::Upstream("Empty embedding response".into()))?;

            let conn = self.lock()?;
            let mut stmt = conn
                .prepare(
                    "SELECT chunk_index, text, embedding FROM chunks
                     WHERE document_id = ?1
                     ORDER BY chunk_index",
                )
                .map_err(|e| VireoError::Database(e.to_string()))?;

            let rows = stmt
                .query_map(params![document_id], |row| {
                    let chunk_index: i64 = row.get(0)?;
                    let text: String = row.get(1)?;
                    let blob: Vec<u8> = row.get(2)?;
                    Ok((chunk_index, text, blob))
                })
                .map_err(|e| VireoError::Database(e.to_string()))?;

            let mut scored = Vec::new();
            for row in rows {
                let (chunk_index, text, blob) =
                    row.map_err(|e| VireoError::Database(e.to_string()))?;
                let score = cosine_similarity(&query_vector, &decode_embedding(&blob));
                scored.push(ScoredChunk {
                    text,
                    score,
                    chunk_index: chunk_index as usize,
                });
            }

            scored.sort_by(|a, b| b.score.total_cmp(&a.score));
            scored.truncate(k);
            Ok(scored)
        })
    }

    fn upsert(
        &self,
        document_id: &str,
        chunks: &[String],
        metadata: &serde_json::Value,
    ) -> BoxFuture<'_, Result<usize>> {
        let document_id = document_id.to_string();
        let chunks = chunks.to_vec();
        let metadata = metadata.to_string();
        Box::pin(async move {
            if chunks.is_empty() {
                return Ok(0);
            }

            let vectors = self.provider.embed(&chunks).await?;
            if vectors.len() != chunks.len() {
                return Err(VireoError::Upstream(format!(
                    "Embedding count mismatch: sent {} texts, got {} vectors",
                    chunks.len(),
                    vectors.len()
                )));
            }

            let conn = self.lock()?;
            conn.execute(
                "DELETE FROM chunks WHERE document_id = ?1",
                params![document_id],
            )
            .map_err(|e| VireoError::Database(e.to_string()))?;

            for (i, (text, vector)) in chunks.iter().zip(vectors.iter()).enumerate() {
                conn.execute(
                    "INSERT INTO chunks (document_id, chunk_index, text, metadata, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![document_id, i as i64, text, metadata, encode_embedding(vector)],
                )
                .map_err(|e| VireoError::Database(e.to_string()))?;
            }

            debug!(document_id = %document_id, chunks = chunks.len(), "index updated");
            Ok(chunks.len())
        })
    }

    fn delete_by_document(&self, document_id: &str) -> BoxFuture<'_, Result<()>> {
        let document_id = document_id.to_string();
        Box::pin(async move {
            let conn = self.lock()?;
            conn.execute(
                "DELETE FROM chunks WHERE document_id = ?1",
                params![document_id],
            )
            .map_err(|e| VireoError::Database(e.to_string()))?;
            Ok(())
        })
    }
}

/// Split text into chunks of at most `max_chars`, packing whole paragraphs
/// together where they fit. Oversized paragraphs are split hard.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        if paragraph.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let mut rest = paragraph;
            while rest.len() > max_chars {
                let mut cut = max_chars;
                while cut > 0 && !rest.is_char_boundary(cut) {
                    cut -= 1;
                }
                if cut == 0 {
                    // limit smaller than one character; take that character whole
                    cut = rest
                        .chars()
                        .next()
                        .map(char::len_utf8)
                        .unwrap_or(rest.len());
                }
                chunks.push(rest[..cut].to_string());
                rest = &rest[cut..];
            }
            if !rest.is_empty() {
                current = rest.to_string();
            }
            continue;
        }

        if current.is_empty() {
            current = paragraph.to_string();
        } else if current.len() + 2 + paragraph.len() <= max_chars {
            current.push_str("\n\n");
            current.push_str(paragraph);
        } else {
            chunks.push(std::mem::take(&mut current));
            current = paragraph.to_string();
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
