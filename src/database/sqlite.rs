// ABOUTME: SQLite storage backend using sqlx with JSON document columns
// ABOUTME: Runs idempotent migrations on connect and appends statuses atomically with json_insert
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use super::DatabaseProvider;
use crate::errors::{AppError, AppResult};
use crate::models::{Chat, Document, Message, Prompt, StatusRecord, ToolSchema};

/// SQLite-backed store
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Connect and run migrations
    ///
    /// # Errors
    ///
    /// Returns a database error if the connection or a migration fails
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let in_memory = database_url.contains(":memory:");
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_url = if in_memory || database_url.contains('?') {
            database_url.to_owned()
        } else {
            format!("{database_url}?mode=rwc")
        };

        // Each in-memory connection is its own database; keep exactly one
        let max_connections = if in_memory { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&connection_url)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to {database_url}: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        info!(database_url, "SQLite database ready");
        Ok(db)
    }

    /// Get a reference to the connection pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables if missing
    ///
    /// # Errors
    ///
    /// Returns a database error if a statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        let statements = [
            r"
            CREATE TABLE IF NOT EXISTS chats (
                chat_id TEXT PRIMARY KEY,
                context_id TEXT,
                sysprompt_id TEXT,
                description TEXT,
                messages TEXT NOT NULL DEFAULT '[]',
                statuses TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS prompts (
                prompt_id TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS documents (
                document_id TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS tools (
                tool_id TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;
        }
        debug!("SQLite migrations applied");
        Ok(())
    }

    fn row_to_chat(row: &SqliteRow) -> AppResult<Chat> {
        let messages: String = row.try_get("messages")?;
        let statuses: String = row.try_get("statuses")?;
        Ok(Chat {
            chat_id: row.try_get("chat_id")?,
            context_id: row.try_get("context_id")?,
            sysprompt_id: row.try_get("sysprompt_id")?,
            description: row.try_get("description")?,
            messages: serde_json::from_str(&messages)?,
            statuses: serde_json::from_str(&statuses)?,
        })
    }

    async fn upsert_body<T: Serialize + Sync>(
        &self,
        table: &str,
        key_column: &str,
        key: &str,
        value: &T,
    ) -> AppResult<()> {
        let body = serde_json::to_string(value)?;
        let query = format!(
            "INSERT INTO {table} ({key_column}, body, updated_at) VALUES ($1, $2, $3)
             ON CONFLICT({key_column}) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at"
        );
        sqlx::query(&query)
            .bind(key)
            .bind(body)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to store {table} row '{key}': {e}")))?;
        Ok(())
    }

    async fn get_body<T: DeserializeOwned>(
        &self,
        table: &str,
        key_column: &str,
        key: &str,
    ) -> AppResult<Option<T>> {
        let query = format!("SELECT body FROM {table} WHERE {key_column} = $1");
        let body: Option<String> = sqlx::query_scalar(&query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load {table} row '{key}': {e}")))?;
        body.map(|b| serde_json::from_str(&b).map_err(AppError::from))
            .transpose()
    }

    async fn list_bodies<T: DeserializeOwned>(&self, table: &str, key_column: &str) -> AppResult<Vec<T>> {
        let query = format!("SELECT body FROM {table} ORDER BY {key_column}");
        let bodies: Vec<String> = sqlx::query_scalar(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list {table}: {e}")))?;
        bodies
            .iter()
            .map(|b| serde_json::from_str(b).map_err(AppError::from))
            .collect()
    }
}

#[async_trait]
impl DatabaseProvider for SqliteDatabase {
    async fn create_chat(&self, chat: &Chat) -> AppResult<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            r"
            INSERT INTO chats (chat_id, context_id, sysprompt_id, description, messages, statuses, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            ",
        )
        .bind(&chat.chat_id)
        .bind(&chat.context_id)
        .bind(&chat.sysprompt_id)
        .bind(&chat.description)
        .bind(serde_json::to_string(&chat.messages)?)
        .bind(serde_json::to_string(&chat.statuses)?)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::already_exists(format!("Chat '{}'", chat.chat_id)))
            }
            Err(e) => Err(AppError::database(format!("Failed to create chat: {e}"))),
        }
    }

    async fn get_chat(&self, chat_id: &str) -> AppResult<Option<Chat>> {
        let row = sqlx::query(
            r"
            SELECT chat_id, context_id, sysprompt_id, description, messages, statuses
            FROM chats WHERE chat_id = $1
            ",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load chat: {e}")))?;

        row.as_ref().map(Self::row_to_chat).transpose()
    }

    async fn update_messages(&self, chat_id: &str, messages: &[Message]) -> AppResult<()> {
        let result = sqlx::query("UPDATE chats SET messages = $1, updated_at = $2 WHERE chat_id = $3")
            .bind(serde_json::to_string(messages)?)
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update messages: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Chat '{chat_id}'")));
        }
        Ok(())
    }

    async fn append_status(&self, chat_id: &str, status: &StatusRecord) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE chats SET statuses = json_insert(statuses, '$[#]', json($1)), updated_at = $2 WHERE chat_id = $3",
        )
        .bind(serde_json::to_string(status)?)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(chat_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to append status: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Chat '{chat_id}'")));
        }
        Ok(())
    }

    async fn delete_chat(&self, chat_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM chats WHERE chat_id = $1")
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete chat: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_prompt(&self, prompt: &Prompt) -> AppResult<()> {
        self.upsert_body("prompts", "prompt_id", &prompt.prompt_id, prompt)
            .await
    }

    async fn get_prompt(&self, prompt_id: &str) -> AppResult<Option<Prompt>> {
        self.get_body("prompts", "prompt_id", prompt_id).await
    }

    async fn upsert_document(&self, document: &Document) -> AppResult<()> {
        self.upsert_body("documents", "document_id", &document.document_id, document)
            .await
    }

    async fn get_document(&self, document_id: &str) -> AppResult<Option<Document>> {
        self.get_body("documents", "document_id", document_id).await
    }

    async fn list_documents(&self) -> AppResult<Vec<Document>> {
        self.list_bodies("documents", "document_id").await
    }

    async fn upsert_tool(&self, tool: &ToolSchema) -> AppResult<()> {
        self.upsert_body("tools", "tool_id", &tool.tool_id, tool).await
    }

    async fn list_tools(&self) -> AppResult<Vec<ToolSchema>> {
        self.list_bodies("tools", "tool_id").await
    }
}
