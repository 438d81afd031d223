// ABOUTME: Storage abstraction for conversations, prompts, documents, and tool schemas
// ABOUTME: Defines the DatabaseProvider trait implemented by the memory and SQLite backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! # Database Management
//!
//! Conversations are read and written as whole documents. The only partial
//! update is `append_status`, which each backend performs atomically so that a
//! status recorded at submission time cannot be lost to a concurrent turn.

/// Backend selection from a connection string
pub mod factory;
/// In-process map store
pub mod memory;
/// SQLite store with JSON document columns
pub mod sqlite;

pub use factory::{Database, DatabaseType};
pub use memory::MemoryDatabase;
pub use sqlite::SqliteDatabase;

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::{Chat, Document, Message, Prompt, StatusRecord, ToolSchema};

/// Storage operations required by the runtime
#[async_trait]
pub trait DatabaseProvider: Send + Sync {
    // ================================
    // Conversations
    // ================================

    /// Store a new conversation
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` when the id is taken
    async fn create_chat(&self, chat: &Chat) -> AppResult<()>;

    /// Load a conversation document
    async fn get_chat(&self, chat_id: &str) -> AppResult<Option<Chat>>;

    /// Replace the conversation's message list
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown conversation
    async fn update_messages(&self, chat_id: &str, messages: &[Message]) -> AppResult<()>;

    /// Atomically append one status record
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown conversation
    async fn append_status(&self, chat_id: &str, status: &StatusRecord) -> AppResult<()>;

    /// Delete a conversation; returns whether it existed
    async fn delete_chat(&self, chat_id: &str) -> AppResult<bool>;

    // ================================
    // Prompts
    // ================================

    /// Insert or replace a prompt
    async fn upsert_prompt(&self, prompt: &Prompt) -> AppResult<()>;

    /// Load a prompt
    async fn get_prompt(&self, prompt_id: &str) -> AppResult<Option<Prompt>>;

    // ================================
    // Documents
    // ================================

    /// Insert or replace a document
    async fn upsert_document(&self, document: &Document) -> AppResult<()>;

    /// Load a document
    async fn get_document(&self, document_id: &str) -> AppResult<Option<Document>>;

    /// All stored documents
    async fn list_documents(&self) -> AppResult<Vec<Document>>;

    // ================================
    // Tool schemas
    // ================================

    /// Insert or replace a tool schema
    async fn upsert_tool(&self, tool: &ToolSchema) -> AppResult<()>;

    /// All stored tool schemas
    async fn list_tools(&self) -> AppResult<Vec<ToolSchema>>;
}
