// ABOUTME: Database factory selecting the storage backend from the connection string
// ABOUTME: Wraps the memory and SQLite backends behind one delegating enum
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! Database factory for creating database providers
//!
//! `memory` selects the in-process map store; any `sqlite:` URL selects SQLite.

use async_trait::async_trait;
use tracing::{debug, info};

use super::{DatabaseProvider, MemoryDatabase, SqliteDatabase};
use crate::errors::{AppError, AppResult};
use crate::models::{Chat, Document, Message, Prompt, StatusRecord, ToolSchema};

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    /// In-process maps
    Memory,
    /// SQLite file or in-memory database
    SQLite,
}

/// Database instance wrapper that delegates to the appropriate implementation
pub enum Database {
    /// In-process maps
    Memory(MemoryDatabase),
    /// SQLite
    SQLite(SqliteDatabase),
}

impl Database {
    /// Create a new database instance based on the connection string
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is unsupported or the connection fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        debug!("Detecting database type from URL: {}", database_url);
        let db_type = detect_database_type(database_url)?;
        info!("Detected database type: {:?}", db_type);

        match db_type {
            DatabaseType::Memory => Ok(Self::Memory(MemoryDatabase::new())),
            DatabaseType::SQLite => Ok(Self::SQLite(SqliteDatabase::connect(database_url).await?)),
        }
    }

    /// Get a descriptive string for the current database backend
    #[must_use]
    pub const fn backend_info(&self) -> &'static str {
        match self {
            Self::Memory(_) => "Memory (non-persistent)",
            Self::SQLite(_) => "SQLite",
        }
    }
}

/// Detect database type from connection string
///
/// # Errors
///
/// Returns a config error for unsupported schemes
pub fn detect_database_type(database_url: &str) -> AppResult<DatabaseType> {
    if database_url == "memory" {
        Ok(DatabaseType::Memory)
    } else if database_url.starts_with("sqlite:") {
        Ok(DatabaseType::SQLite)
    } else {
        Err(AppError::config(format!(
            "Unsupported database URL '{database_url}'. Use 'memory' or a 'sqlite:' URL"
        )))
    }
}

#[async_trait]
impl DatabaseProvider for Database {
    async fn create_chat(&self, chat: &Chat) -> AppResult<()> {
        match self {
            Self::Memory(db) => db.create_chat(chat).await,
            Self::SQLite(db) => db.create_chat(chat).await,
        }
    }

    async fn get_chat(&self, chat_id: &str) -> AppResult<Option<Chat>> {
        match self {
            Self::Memory(db) => db.get_chat(chat_id).await,
            Self::SQLite(db) => db.get_chat(chat_id).await,
        }
    }

    async fn update_messages(&self, chat_id: &str, messages: &[Message]) -> AppResult<()> {
        match self {
            Self::Memory(db) => db.update_messages(chat_id, messages).await,
            Self::SQLite(db) => db.update_messages(chat_id, messages).await,
        }
    }

    async fn append_status(&self, chat_id: &str, status: &StatusRecord) -> AppResult<()> {
        match self {
            Self::Memory(db) => db.append_status(chat_id, status).await,
            Self::SQLite(db) => db.append_status(chat_id, status).await,
        }
    }

    async fn delete_chat(&self, chat_id: &str) -> AppResult<bool> {
        match self {
            Self::Memory(db) => db.delete_chat(chat_id).await,
            Self::SQLite(db) => db.delete_chat(chat_id).await,
        }
    }

    async fn upsert_prompt(&self, prompt: &Prompt) -> AppResult<()> {
        match self {
            Self::Memory(db) => db.upsert_prompt(prompt).await,
            Self::SQLite(db) => db.upsert_prompt(prompt).await,
        }
    }

    async fn get_prompt(&self, prompt_id: &str) -> AppResult<Option<Prompt>> {
        match self {
            Self::Memory(db) => db.get_prompt(prompt_id).await,
            Self::SQLite(db) => db.get_prompt(prompt_id).await,
        }
    }

    async fn upsert_document(&self, document: &Document) -> AppResult<()> {
        match self {
            Self::Memory(db) => db.upsert_document(document).await,
            Self::SQLite(db) => db.upsert_document(document).await,
        }
    }

    async fn get_document(&self, document_id: &str) -> AppResult<Option<Document>> {
        match self {
            Self::Memory(db) => db.get_document(document_id).await,
            Self::SQLite(db) => db.get_document(document_id).await,
        }
    }

    async fn list_documents(&self) -> AppResult<Vec<Document>> {
        match self {
            Self::Memory(db) => db.list_documents().await,
            Self::SQLite(db) => db.list_documents().await,
        }
    }

    async fn upsert_tool(&self, tool: &ToolSchema) -> AppResult<()> {
        match self {
            Self::Memory(db) => db.upsert_tool(tool).await,
            Self::SQLite(db) => db.upsert_tool(tool).await,
        }
    }

    async fn list_tools(&self) -> AppResult<Vec<ToolSchema>> {
        match self {
            Self::Memory(db) => db.list_tools().await,
            Self::SQLite(db) => db.list_tools().await,
        }
    }
}
