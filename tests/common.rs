// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides a scripted LLM provider, storage seeding, and orchestrator wiring helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `magenta_server`

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use magenta_server::{
    config::{
        CallbackConfig, DatabaseConfig, EmbedderKind, LlmConfig, RetrievalConfig, RuntimeConfig,
        ToolConfig, TurnConfig,
    },
    database::{DatabaseProvider, MemoryDatabase},
    errors::{AppError, AppResult},
    llm::{ChatRequest, ChatResponse, LlmCapabilities, LlmGateway, LlmProvider},
    models::{Chat, Prompt, ToolCallRecord},
    retrieval::{HashingEmbedder, Retriever, VectorIndex},
    services::{PromptAssembler, ReplyCallback, TurnOrchestrator, TurnSettings},
    tools::{ToolExecutionEngine, ToolRegistry},
};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

// ============================================================================
// Scripted LLM provider
// ============================================================================

/// Provider answering from a fixed queue and recording every request
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of completions requested
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn display_name(&self) -> &str {
        "Scripted"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::full_featured()
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.ok_or_else(|| AppError::external_service("scripted", "script exhausted"))
    }
}

/// A plain text completion
pub fn text_response(text: &str) -> ChatResponse {
    ChatResponse {
        content: Some(text.to_owned()),
        tool_calls: Vec::new(),
        model: "scripted-model".to_owned(),
        usage: None,
        finish_reason: Some("stop".to_owned()),
    }
}

/// A completion requesting the given `(id, name, arguments)` calls
pub fn tool_call_response(calls: &[(&str, &str, &str)]) -> ChatResponse {
    ChatResponse {
        content: None,
        tool_calls: calls
            .iter()
            .map(|(id, name, arguments)| ToolCallRecord::new(*id, *name, *arguments))
            .collect(),
        model: "scripted-model".to_owned(),
        usage: None,
        finish_reason: Some("tool_calls".to_owned()),
    }
}

// ============================================================================
// Reply callback capture
// ============================================================================

/// Callback that records every delivery
#[derive(Default)]
pub struct RecordingCallback {
    deliveries: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingCallback {
    pub fn deliveries(&self) -> Vec<(String, Option<String>)> {
        self.deliveries.lock().unwrap().clone()
    }

    /// Wait until at least one delivery arrived
    pub async fn wait_for_delivery(&self) -> Vec<(String, Option<String>)> {
        for _ in 0..100 {
            let deliveries = self.deliveries();
            if !deliveries.is_empty() {
                return deliveries;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.deliveries()
    }
}

#[async_trait]
impl ReplyCallback for RecordingCallback {
    async fn deliver(&self, text: &str, context_id: Option<&str>) -> AppResult<()> {
        self.deliveries
            .lock()
            .unwrap()
            .push((text.to_owned(), context_id.map(str::to_owned)));
        Ok(())
    }
}

// ============================================================================
// Storage and wiring
// ============================================================================

/// Standard test database setup
pub fn create_test_database() -> Arc<MemoryDatabase> {
    init_test_logging();
    Arc::new(MemoryDatabase::new())
}

/// Store a prompt and a conversation using it
pub async fn seed_chat(database: &dyn DatabaseProvider, chat_id: &str, prompt: &Prompt) -> Result<()> {
    database.upsert_prompt(prompt).await?;
    database
        .create_chat(&Chat::new(chat_id).with_sysprompt(&prompt.prompt_id))
        .await?;
    Ok(())
}

/// Vector index over the deterministic hashing embedder
pub fn create_test_index() -> Arc<VectorIndex> {
    Arc::new(VectorIndex::new(Arc::new(HashingEmbedder::default())))
}

/// Retrieval settings accepting any passage with positive similarity
pub fn permissive_retrieval() -> RetrievalConfig {
    RetrievalConfig {
        top_n: 3,
        similarity_threshold: 0.0,
        ..RetrievalConfig::default()
    }
}

/// Orchestrator over built-in tools, the given provider, and an optional retriever
pub fn create_test_orchestrator(
    database: Arc<dyn DatabaseProvider>,
    provider: Arc<ScriptedProvider>,
    settings: TurnSettings,
    retriever: Option<Arc<dyn Retriever>>,
) -> Result<TurnOrchestrator> {
    let registry = Arc::new(ToolRegistry::with_builtin_tools()?);
    let assembler = PromptAssembler::new(
        Arc::clone(&database),
        retriever,
        permissive_retrieval(),
        false,
    );
    let gateway = LlmGateway::new(provider, Duration::from_secs(5));
    let engine = ToolExecutionEngine::new(registry, Duration::from_secs(5))?;
    Ok(TurnOrchestrator::new(
        database, assembler, gateway, engine, settings,
    ))
}

/// Runtime configuration for tests: memory storage and the hashing embedder
pub fn test_config() -> RuntimeConfig {
    RuntimeConfig {
        http_port: 0,
        database: DatabaseConfig {
            url: "memory".to_owned(),
        },
        llm: LlmConfig {
            base_url: "http://127.0.0.1:9".to_owned(),
            model: "scripted-model".to_owned(),
            api_key: None,
            timeout_secs: 5,
            json_mode: false,
        },
        turn: TurnConfig::default(),
        tools: ToolConfig::default(),
        retrieval: RetrievalConfig {
            embedder: EmbedderKind::Hashing,
            ..permissive_retrieval()
        },
        callback: CallbackConfig::default(),
    }
}
