// ABOUTME: Query-time retrieval contract: ranked passages filtered by document and similarity floor
// ABOUTME: Also formats passages into the text block folded into a turn's user message
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! # Retrieval
//!
//! The prompt assembler only depends on the [`Retriever`] trait. The
//! in-memory [`VectorIndex`] is the bundled implementation; ingestion (PDF
//! parsing, chunking pipelines) happens elsewhere and feeds it through
//! [`VectorIndex::add_passages`].

/// Text embedding backends
pub mod embeddings;
/// In-memory cosine-distance index
pub mod vector_index;

pub use embeddings::{Embedder, HashingEmbedder, OpenAiCompatibleEmbedder};
pub use vector_index::VectorIndex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;

/// One retrieval request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalQuery {
    /// Text to embed and match
    pub text: String,
    /// Restrict results to these documents; `None` or empty searches everything
    pub document_ids: Option<Vec<String>>,
    /// Minimum similarity a passage must reach
    pub similarity_threshold: f32,
    /// Maximum number of passages returned
    pub top_n: usize,
}

/// A ranked passage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Source document
    pub document_id: String,
    /// Source document name
    pub name: String,
    /// Passage text
    pub text: String,
    /// Cosine similarity to the query (`1 - distance`)
    pub similarity: f32,
}

/// Retrieval collaborator
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Passages ordered best first, at most `top_n`, none below the floor
    async fn retrieve(&self, query: &RetrievalQuery) -> AppResult<Vec<Passage>>;
}

/// Render passages as the block appended to a user message
#[must_use]
pub fn format_passages(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| format!("Document: {}\nPotentially Relevant Text Excerpt: {}", p.name, p.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
