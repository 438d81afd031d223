// ABOUTME: Conversation service for creating chats and answering message and status queries
// ABOUTME: Hides internal bookkeeping messages on request and renders empty ones with a placeholder
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::constants::turn::INTERNAL_MESSAGE_PLACEHOLDER;
use crate::database::DatabaseProvider;
use crate::errors::{AppError, AppResult};
use crate::models::{Chat, Message, StatusRecord};

/// Parameters for a new conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChatRequest {
    /// Conversation id; generated when absent
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Id handed to the reply callback
    #[serde(default)]
    pub context_id: Option<String>,
    /// Prompt used for turns
    #[serde(default)]
    pub sysprompt_id: Option<String>,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
}

/// Read and create operations on conversations
#[derive(Clone)]
pub struct ChatService {
    database: Arc<dyn DatabaseProvider>,
}

impl ChatService {
    /// Create the service
    #[must_use]
    pub fn new(database: Arc<dyn DatabaseProvider>) -> Self {
        Self { database }
    }

    /// Create an empty conversation
    ///
    /// # Errors
    ///
    /// Returns already-exists for a duplicate id and not-found for an unknown prompt.
    pub async fn create_chat(&self, request: CreateChatRequest) -> AppResult<Chat> {
        if let Some(prompt_id) = &request.sysprompt_id {
            if self.database.get_prompt(prompt_id).await?.is_none() {
                return Err(AppError::not_found(format!("Prompt '{prompt_id}'")));
            }
        }

        let chat = Chat {
            chat_id: request
                .chat_id
                .unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
            context_id: request.context_id,
            sysprompt_id: request.sysprompt_id,
            description: request.description,
            messages: Vec::new(),
            statuses: Vec::new(),
        };
        self.database.create_chat(&chat).await?;
        info!(chat_id = %chat.chat_id, "Chat created");
        Ok(chat)
    }

    async fn load(&self, chat_id: &str) -> AppResult<Chat> {
        self.database
            .get_chat(chat_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Chat '{chat_id}'")))
    }

    /// Messages of a conversation for display
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown conversation.
    pub async fn list_messages(&self, chat_id: &str, no_internal: bool) -> AppResult<Vec<Message>> {
        let chat = self.load(chat_id).await?;
        Ok(chat
            .visible_messages(no_internal)
            .into_iter()
            .map(|message| {
                let mut message = message.clone();
                if message.is_internal() && message.content.is_none() {
                    message.content = Some(INTERNAL_MESSAGE_PLACEHOLDER.to_owned());
                }
                message
            })
            .collect())
    }

    /// One user-facing message
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown conversation or message.
    pub async fn get_message(&self, chat_id: &str, message_id: &str) -> AppResult<Message> {
        let chat = self.load(chat_id).await?;
        chat.find_message(message_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Message '{message_id}'")))
    }

    /// Most recent status record of the conversation
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown conversation or one without status records.
    pub async fn latest_status(&self, chat_id: &str) -> AppResult<StatusRecord> {
        let chat = self.load(chat_id).await?;
        chat.latest_status()
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Status for chat '{chat_id}'")))
    }

    /// Latest status record of one turn
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown conversation or message id.
    pub async fn message_status(&self, chat_id: &str, message_id: &str) -> AppResult<StatusRecord> {
        let chat = self.load(chat_id).await?;
        chat.status_for(message_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Status for message '{message_id}'")))
    }
}
