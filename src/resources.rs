// ABOUTME: Shared server resources wired once at startup and handed to routes
// ABOUTME: Builds storage, tool registry, retrieval index, LLM gateway, orchestrator, and dispatcher
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! # Server Resources
//!
//! Every long-lived component is created here and injected into its
//! consumers, so the orchestrator never reaches for global state.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{EmbedderKind, RuntimeConfig};
use crate::database::{Database, DatabaseProvider};
use crate::errors::AppResult;
use crate::llm::{LlmGateway, LlmProvider, OpenAiCompatibleConfig, OpenAiCompatibleProvider};
use crate::retrieval::{Embedder, HashingEmbedder, OpenAiCompatibleEmbedder, Retriever, VectorIndex};
use crate::services::{
    ChatService, PromptAssembler, TurnDispatcher, TurnOrchestrator, TurnSettings, WebhookCallback,
};
use crate::tools::{builtin_tools, ToolExecutionEngine, ToolRegistry};

/// Components shared by all request handlers
pub struct ServerResources {
    /// Runtime configuration
    pub config: Arc<RuntimeConfig>,
    /// Storage
    pub database: Arc<dyn DatabaseProvider>,
    /// Validated tools
    pub registry: Arc<ToolRegistry>,
    /// Passage index used for retrieval
    pub vector_index: Arc<VectorIndex>,
    /// Background turn runner
    pub dispatcher: Arc<TurnDispatcher>,
    /// Conversation queries
    pub chats: ChatService,
}

impl ServerResources {
    /// Build everything from configuration, talking to the configured LLM endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be opened, the tool batch fails
    /// validation, or an HTTP client cannot be created.
    pub async fn build(config: RuntimeConfig) -> AppResult<Self> {
        let database = Database::new(&config.database.url).await?;
        info!("Database backend: {}", database.backend_info());
        let provider = OpenAiCompatibleProvider::new(OpenAiCompatibleConfig::from(&config.llm))?;
        Self::with_components(config, Arc::new(database), Arc::new(provider)).await
    }

    /// Build around an existing store and LLM provider
    ///
    /// # Errors
    ///
    /// Returns an error if the tool batch fails validation or an HTTP
    /// client cannot be created.
    pub async fn with_components(
        config: RuntimeConfig,
        database: Arc<dyn DatabaseProvider>,
        provider: Arc<dyn LlmProvider>,
    ) -> AppResult<Self> {
        let registry = Arc::new(load_registry(database.as_ref()).await?);

        let embedder: Arc<dyn Embedder> = match config.retrieval.embedder {
            EmbedderKind::Hashing => Arc::new(HashingEmbedder::default()),
            EmbedderKind::OpenAi => Arc::new(OpenAiCompatibleEmbedder::new(
                &config.llm,
                config.retrieval.embedding_model.clone(),
            )?),
        };
        let vector_index = Arc::new(VectorIndex::new(embedder));
        index_documents(database.as_ref(), &vector_index).await?;

        let retriever: Arc<dyn Retriever> = Arc::clone(&vector_index) as Arc<dyn Retriever>;
        let assembler = PromptAssembler::new(
            Arc::clone(&database),
            Some(retriever),
            config.retrieval.clone(),
            config.turn.persist_rag_results,
        );
        let gateway = LlmGateway::new(provider, config.llm.timeout()).with_model(config.llm.model.clone());
        let engine = ToolExecutionEngine::new(Arc::clone(&registry), config.tools.timeout())?;

        let mut orchestrator = TurnOrchestrator::new(
            Arc::clone(&database),
            assembler,
            gateway,
            engine,
            TurnSettings::from_config(&config.turn, config.llm.json_mode),
        );
        if let Some(url) = &config.callback.webhook_url {
            info!(url = %url, "Reply webhook enabled");
            orchestrator = orchestrator.with_callback(Arc::new(WebhookCallback::new(url.clone())?));
        }

        let dispatcher = Arc::new(TurnDispatcher::new(
            Arc::new(orchestrator),
            config.turn.turn_timeout(),
        ));

        info!("Server resources ready: {}", config.summary());
        Ok(Self {
            config: Arc::new(config),
            chats: ChatService::new(Arc::clone(&database)),
            database,
            registry,
            vector_index,
            dispatcher,
        })
    }
}

/// Built-in tools plus every stored tool, validated as one batch.
///
/// Built-in schemas are written back to storage so they can be listed and
/// referenced by prompts; a stored tool reusing a built-in name is ignored.
async fn load_registry(database: &dyn DatabaseProvider) -> AppResult<ToolRegistry> {
    let (mut schemas, implementations) = builtin_tools();
    let builtin_names: HashSet<String> = schemas.iter().map(|s| s.name().to_owned()).collect();

    for schema in &schemas {
        database.upsert_tool(schema).await?;
    }
    for stored in database.list_tools().await? {
        if builtin_names.contains(stored.name()) {
            debug!(tool = %stored.name(), "Stored tool shadows a built-in, keeping the built-in");
            continue;
        }
        schemas.push(stored);
    }

    ToolRegistry::load(schemas, implementations)
}

/// Index stored documents; an embedding failure is logged and indexing goes on
async fn index_documents(database: &dyn DatabaseProvider, index: &VectorIndex) -> AppResult<()> {
    let documents = database.list_documents().await?;
    for document in &documents {
        if let Err(e) = index.add_document(document).await {
            warn!(document_id = %document.document_id, error = %e, "Failed to index document");
        }
    }
    info!(documents = documents.len(), passages = index.len().await, "Retrieval index built");
    Ok(())
}
