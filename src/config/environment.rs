// ABOUTME: Environment-based configuration for the HTTP server, storage, LLM, tools, and retrieval
// ABOUTME: Parses typed settings with defaults and reports malformed values as config errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{llm, retrieval, tools, turn};
use crate::errors::{AppError, AppResult};

/// Default HTTP port
const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default database URL (in-process SQLite)
const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

/// Complete runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Storage backend
    pub database: DatabaseConfig,
    /// Completion endpoint
    pub llm: LlmConfig,
    /// Turn processing behavior
    pub turn: TurnConfig,
    /// Tool execution behavior
    pub tools: ToolConfig,
    /// Retrieval behavior
    pub retrieval: RetrievalConfig,
    /// Reply callback delivery
    pub callback: CallbackConfig,
}

impl RuntimeConfig {
    /// Load the full configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a config error if any variable is present but malformed
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            http_port: env_parse_or("HTTP_PORT", DEFAULT_HTTP_PORT)?,
            database: DatabaseConfig::from_env(),
            llm: LlmConfig::from_env()?,
            turn: TurnConfig::from_env()?,
            tools: ToolConfig::from_env()?,
            retrieval: RetrievalConfig::from_env()?,
            callback: CallbackConfig::from_env(),
        })
    }

    /// One-line summary for startup logs (never includes secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "http_port={}, database={}, llm={} ({}), max_chained_tool_calls={}, persist_rag={}, retrieval_top_n={}, callback={}",
            self.http_port,
            self.database.url,
            self.llm.base_url,
            self.llm.model,
            self.turn.max_chained_tool_calls,
            self.turn.persist_rag_results,
            self.retrieval.top_n,
            self.callback.webhook_url.is_some(),
        )
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `sqlite:<path>`, `sqlite::memory:`, or `memory` for the in-process map store
    pub url: String,
}

impl DatabaseConfig {
    /// Load storage configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            url: env_var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
        }
    }
}

/// OpenAI-compatible completion endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// Completion model
    pub model: String,
    /// Bearer token; empty for local servers
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// Ask the model for a JSON object instead of free text
    pub json_mode: bool,
}

impl LlmConfig {
    /// Load LLM configuration from environment
    ///
    /// # Errors
    ///
    /// Returns a config error for malformed numeric or boolean values
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            base_url: env_var_or("LLM_BASE_URL", llm::DEFAULT_BASE_URL),
            model: env_var_or("LLM_MODEL", llm::DEFAULT_MODEL),
            api_key: env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty()),
            timeout_secs: env_parse_or("LLM_TIMEOUT_SECS", llm::REQUEST_TIMEOUT_SECS)?,
            json_mode: env_bool_or("LLM_JSON_MODE", false)?,
        })
    }

    /// Per-call timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Turn processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Bound on consecutive tool-call rounds
    pub max_chained_tool_calls: usize,
    /// Sentinel model output that suppresses the reply
    pub skip_word: Option<String>,
    /// Fold retrieved passages into the stored user message
    pub persist_rag_results: bool,
    /// Whole-turn deadline in seconds
    pub turn_timeout_secs: u64,
}

impl TurnConfig {
    /// Load turn configuration from environment
    ///
    /// # Errors
    ///
    /// Returns a config error for malformed numeric or boolean values
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            max_chained_tool_calls: env_parse_or(
                "MAX_CHAINED_TOOL_CALLS",
                turn::MAX_CHAINED_TOOL_CALLS,
            )?,
            skip_word: env::var("SKIP_WORD").ok().filter(|w| !w.is_empty()),
            persist_rag_results: env_bool_or("PERSIST_RAG_RESULTS", false)?,
            turn_timeout_secs: env_parse_or("TURN_TIMEOUT_SECS", turn::TURN_TIMEOUT_SECS)?,
        })
    }

    /// Whole-turn deadline
    #[must_use]
    pub const fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_chained_tool_calls: turn::MAX_CHAINED_TOOL_CALLS,
            skip_word: None,
            persist_rag_results: false,
            turn_timeout_secs: turn::TURN_TIMEOUT_SECS,
        }
    }
}

/// Tool execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Per-call timeout for tools in seconds
    pub timeout_secs: u64,
}

impl ToolConfig {
    /// Load tool configuration from environment
    ///
    /// # Errors
    ///
    /// Returns a config error for a malformed timeout
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            timeout_secs: env_parse_or("TOOL_TIMEOUT_SECS", tools::EXTERNAL_TOOL_TIMEOUT_SECS)?,
        })
    }

    /// Per-call timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            timeout_secs: tools::EXTERNAL_TOOL_TIMEOUT_SECS,
        }
    }
}

/// Which embedder backs the vector index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Deterministic feature-hashing embedder, no network
    Hashing,
    /// `/embeddings` on the configured OpenAI-compatible endpoint
    OpenAi,
}

impl FromStr for EmbedderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hashing" => Ok(Self::Hashing),
            "openai" => Ok(Self::OpenAi),
            other => Err(AppError::config(format!(
                "Unknown embedding provider '{other}' (expected 'hashing' or 'openai')"
            ))),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum passages per query
    pub top_n: usize,
    /// Minimum similarity of a returned passage
    pub similarity_threshold: f32,
    /// Embedder backing the index
    pub embedder: EmbedderKind,
    /// Embedding model for the OpenAI-compatible embedder
    pub embedding_model: String,
}

impl RetrievalConfig {
    /// Load retrieval configuration from environment
    ///
    /// # Errors
    ///
    /// Returns a config error for malformed values or a threshold outside `[0, 1]`
    pub fn from_env() -> AppResult<Self> {
        let similarity_threshold = env_parse_or(
            "RAG_SIMILARITY_THRESHOLD",
            retrieval::DEFAULT_SIMILARITY_THRESHOLD,
        )?;
        if !(0.0..=1.0).contains(&similarity_threshold) {
            return Err(AppError::config(format!(
                "RAG_SIMILARITY_THRESHOLD must be between 0 and 1, got {similarity_threshold}"
            )));
        }

        Ok(Self {
            top_n: env_parse_or("RAG_TOP_N", retrieval::DEFAULT_TOP_N)?,
            similarity_threshold,
            embedder: env_var_or("EMBEDDING_PROVIDER", "hashing").parse()?,
            embedding_model: env_var_or("EMBEDDING_MODEL", llm::DEFAULT_EMBEDDING_MODEL),
        })
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_n: retrieval::DEFAULT_TOP_N,
            similarity_threshold: retrieval::DEFAULT_SIMILARITY_THRESHOLD,
            embedder: EmbedderKind::Hashing,
            embedding_model: llm::DEFAULT_EMBEDDING_MODEL.to_owned(),
        }
    }
}

/// Reply callback configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackConfig {
    /// Webhook receiving `{text, context_id}` after each completed turn
    pub webhook_url: Option<String>,
}

impl CallbackConfig {
    /// Load callback configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            webhook_url: env::var("CALLBACK_WEBHOOK_URL")
                .ok()
                .filter(|u| !u.is_empty()),
        }
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_parse_or<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    env::var(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid value for {key}: '{raw}' ({e})")))
    })
}

fn env_bool_or(key: &str, default: bool) -> AppResult<bool> {
    env::var(key).map_or(Ok(default), |raw| {
        match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AppError::config(format!(
                "Invalid boolean for {key}: '{raw}'"
            ))),
        }
    })
}
