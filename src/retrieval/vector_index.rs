// ABOUTME: In-memory passage index ranked by cosine distance to the embedded query
// ABOUTME: Filters by document allow-list and similarity floor, caps results, stable on ties
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::embeddings::{cosine_similarity, Embedder};
use super::{Passage, RetrievalQuery, Retriever};
use crate::errors::{AppError, AppResult};
use crate::models::Document;

/// Maximum characters per chunk when splitting a whole document
const CHUNK_SIZE: usize = 1000;

struct IndexedPassage {
    document_id: String,
    name: String,
    text: String,
    embedding: Vec<f32>,
}

/// Passage store with brute-force cosine ranking
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    passages: RwLock<Vec<IndexedPassage>>,
}

impl VectorIndex {
    /// Create an empty index over `embedder`
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            passages: RwLock::new(Vec::new()),
        }
    }

    /// Add pre-chunked passages of one document, in order
    ///
    /// # Errors
    ///
    /// Returns the embedder's error, or an internal error if it returns the
    /// wrong number of vectors.
    pub async fn add_passages(
        &self,
        document_id: &str,
        name: &str,
        texts: Vec<String>,
    ) -> AppResult<usize> {
        if texts.is_empty() {
            return Ok(0);
        }
        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(AppError::internal(format!(
                "Embedder returned {} vectors for {} passages",
                embeddings.len(),
                texts.len()
            )));
        }

        let count = texts.len();
        let mut passages = self.passages.write().await;
        passages.extend(texts.into_iter().zip(embeddings).map(|(text, embedding)| {
            IndexedPassage {
                document_id: document_id.to_owned(),
                name: name.to_owned(),
                text,
                embedding,
            }
        }));
        debug!(document_id, count, "Indexed passages");
        Ok(count)
    }

    /// Split a stored document into paragraph chunks and index them
    ///
    /// # Errors
    ///
    /// Returns the embedder's error.
    pub async fn add_document(&self, document: &Document) -> AppResult<usize> {
        let chunks = chunk_paragraphs(&document.text, CHUNK_SIZE);
        self.add_passages(&document.document_id, &document.name, chunks)
            .await
    }

    /// Drop every passage of a document; returns how many were removed
    pub async fn remove_document(&self, document_id: &str) -> usize {
        let mut passages = self.passages.write().await;
        let before = passages.len();
        passages.retain(|p| p.document_id != document_id);
        before - passages.len()
    }

    /// Number of indexed passages
    pub async fn len(&self) -> usize {
        self.passages.read().await.len()
    }

    /// Whether the index holds no passages
    pub async fn is_empty(&self) -> bool {
        self.passages.read().await.is_empty()
    }
}

#[async_trait]
impl Retriever for VectorIndex {
    async fn retrieve(&self, query: &RetrievalQuery) -> AppResult<Vec<Passage>> {
        let query_vector = self
            .embedder
            .embed(std::slice::from_ref(&query.text))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::internal("Embedder returned no vector for the query"))?;

        let allow_list = query
            .document_ids
            .as_ref()
            .filter(|ids| !ids.is_empty());

        let passages = self.passages.read().await;
        let mut ranked: Vec<Passage> = passages
            .iter()
            .filter(|p| allow_list.is_none_or(|ids| ids.contains(&p.document_id)))
            .map(|p| Passage {
                document_id: p.document_id.clone(),
                name: p.name.clone(),
                text: p.text.clone(),
                similarity: cosine_similarity(&query_vector, &p.embedding),
            })
            .filter(|p| p.similarity >= query.similarity_threshold)
            .collect();
        drop(passages);

        // sort_by is stable, so equal distances keep storage order
        ranked.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        ranked.truncate(query.top_n);

        info!(
            passages = ranked.len(),
            threshold = query.similarity_threshold,
            top_n = query.top_n,
            "Retrieved relevant passages"
        );
        Ok(ranked)
    }
}

/// Greedy paragraph packing into chunks shorter than `chunk_size` characters
#[must_use]
pub fn chunk_paragraphs(text: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    for paragraph in text.split('\n') {
        if !chunk.is_empty() && chunk.len() + paragraph.len() >= chunk_size {
            chunks.push(std::mem::take(&mut chunk));
        }
        chunk.push_str(paragraph);
        chunk.push('\n');
    }
    chunks.push(chunk);
    chunks
        .into_iter()
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_paragraphs_packs_greedily() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(chunk_paragraphs(text, 11), vec!["aaaa\nbbbb", "cccc"]);
        assert_eq!(chunk_paragraphs(text, 1000), vec!["aaaa\nbbbb\ncccc"]);
        assert!(chunk_paragraphs("\n\n", 10).is_empty());
    }
}
