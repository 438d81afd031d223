// ABOUTME: Text embedding backends for retrieval: deterministic feature hashing and OpenAI-compatible API
// ABOUTME: Both return L2-normalized vectors so cosine similarity reduces to a dot product
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::LlmConfig;
use crate::constants::llm::CONNECT_TIMEOUT_SECS;
use crate::constants::retrieval::HASHING_EMBEDDING_DIM;
use crate::errors::{AppError, AppResult};

/// Turns texts into vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed every text, in input order
    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;
}

/// Scale `vector` to unit length; the zero vector is left as is
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Cosine similarity of two vectors; 0 when either is zero
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

// ============================================================================
// Feature hashing
// ============================================================================

/// Offline embedder: lowercase word tokens hashed into a fixed number of buckets
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(HASHING_EMBEDDING_DIM)
    }
}

impl HashingEmbedder {
    /// Create an embedder with `dimensions` buckets (at least one)
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Embed one text synchronously
    #[must_use]
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            let hash = fnv1a(&token.to_lowercase());
            let bucket = (hash % self.dimensions as u64) as usize;
            // sign bit keeps colliding tokens from only ever adding up
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        normalize(&mut vector);
        vector
    }
}

fn fnv1a(text: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    text.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

// ============================================================================
// OpenAI-compatible embeddings endpoint
// ============================================================================

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Embedder calling `{base_url}/embeddings`
pub struct OpenAiCompatibleEmbedder {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatibleEmbedder {
    /// Create an embedder sharing the LLM endpoint and credentials
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(llm: &LlmConfig, model: impl Into<String>) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(llm.timeout())
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: llm.base_url.trim_end_matches('/').to_owned(),
            api_key: llm.api_key.clone(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl Embedder for OpenAiCompatibleEmbedder {
    #[instrument(skip(self, texts), fields(model = %self.model, count = texts.len()))]
    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            });
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(
                "Embeddings",
                format!(
                    "API error ({status}): {}",
                    body.chars().take(200).collect::<String>()
                ),
            ));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::external_service("Embeddings", format!("Failed to parse response: {e}"))
        })?;
        if parsed.data.len() != texts.len() {
            return Err(AppError::external_service(
                "Embeddings",
                format!(
                    "Expected {} embeddings, received {}",
                    texts.len(),
                    parsed.data.len()
                ),
            ));
        }

        parsed.data.sort_by_key(|d| d.index);
        debug!("Received {} embeddings", parsed.data.len());
        Ok(parsed
            .data
            .into_iter()
            .map(|d| {
                let mut vector = d.embedding;
                normalize(&mut vector);
                vector
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashing_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed_text("The quick brown fox");
        let b = embedder.embed_text("the QUICK brown fox!");

        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_similar_texts_score_higher() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed_text("vacation days policy");
        let close = embedder.embed_text("Our vacation policy grants 25 days");
        let far = embedder.embed_text("Quarterly revenue grew in Europe");

        assert!(cosine_similarity(&query, &close) > cosine_similarity(&query, &far));
    }

    #[test]
    fn test_empty_text_embeds_to_zero_vector() {
        let vector = HashingEmbedder::new(8).embed_text("  ");
        assert!(vector.iter().all(|v| *v == 0.0));
        assert!(cosine_similarity(&vector, &vector).abs() < f32::EPSILON);
    }
}
