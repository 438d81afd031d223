// ABOUTME: In-process storage backend holding documents in RwLock-guarded maps
// ABOUTME: Used for development, tests, and single-process deployments without persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::DatabaseProvider;
use crate::errors::{AppError, AppResult};
use crate::models::{Chat, Document, Message, Prompt, StatusRecord, ToolSchema};

/// Map-backed store
#[derive(Default)]
pub struct MemoryDatabase {
    chats: RwLock<HashMap<String, Chat>>,
    prompts: RwLock<HashMap<String, Prompt>>,
    documents: RwLock<BTreeMap<String, Document>>,
    tools: RwLock<BTreeMap<String, ToolSchema>>,
}

impl MemoryDatabase {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatabaseProvider for MemoryDatabase {
    async fn create_chat(&self, chat: &Chat) -> AppResult<()> {
        let mut chats = self.chats.write().await;
        if chats.contains_key(&chat.chat_id) {
            return Err(AppError::already_exists(format!("Chat '{}'", chat.chat_id)));
        }
        chats.insert(chat.chat_id.clone(), chat.clone());
        Ok(())
    }

    async fn get_chat(&self, chat_id: &str) -> AppResult<Option<Chat>> {
        Ok(self.chats.read().await.get(chat_id).cloned())
    }

    async fn update_messages(&self, chat_id: &str, messages: &[Message]) -> AppResult<()> {
        let mut chats = self.chats.write().await;
        let chat = chats
            .get_mut(chat_id)
            .ok_or_else(|| AppError::not_found(format!("Chat '{chat_id}'")))?;
        chat.messages = messages.to_vec();
        Ok(())
    }

    async fn append_status(&self, chat_id: &str, status: &StatusRecord) -> AppResult<()> {
        let mut chats = self.chats.write().await;
        let chat = chats
            .get_mut(chat_id)
            .ok_or_else(|| AppError::not_found(format!("Chat '{chat_id}'")))?;
        chat.statuses.push(status.clone());
        Ok(())
    }

    async fn delete_chat(&self, chat_id: &str) -> AppResult<bool> {
        Ok(self.chats.write().await.remove(chat_id).is_some())
    }

    async fn upsert_prompt(&self, prompt: &Prompt) -> AppResult<()> {
        self.prompts
            .write()
            .await
            .insert(prompt.prompt_id.clone(), prompt.clone());
        Ok(())
    }

    async fn get_prompt(&self, prompt_id: &str) -> AppResult<Option<Prompt>> {
        Ok(self.prompts.read().await.get(prompt_id).cloned())
    }

    async fn upsert_document(&self, document: &Document) -> AppResult<()> {
        self.documents
            .write()
            .await
            .insert(document.document_id.clone(), document.clone());
        Ok(())
    }

    async fn get_document(&self, document_id: &str) -> AppResult<Option<Document>> {
        Ok(self.documents.read().await.get(document_id).cloned())
    }

    async fn list_documents(&self) -> AppResult<Vec<Document>> {
        Ok(self.documents.read().await.values().cloned().collect())
    }

    async fn upsert_tool(&self, tool: &ToolSchema) -> AppResult<()> {
        self.tools
            .write()
            .await
            .insert(tool.tool_id.clone(), tool.clone());
        Ok(())
    }

    async fn list_tools(&self) -> AppResult<Vec<ToolSchema>> {
        Ok(self.tools.read().await.values().cloned().collect())
    }
}
