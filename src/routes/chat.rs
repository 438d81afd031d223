// ABOUTME: Chat route handlers for conversation creation, turn submission, and status polling
// ABOUTME: Thin axum handlers delegating to the chat service and the turn dispatcher
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! Chat routes
//!
//! Turn submission returns a task immediately; clients poll the status
//! endpoints until the turn reaches `completed`, `failed` or `cancelled`.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Message, TaskStatus};
use crate::resources::ServerResources;
use crate::services::{CreateChatRequest, Task, TurnRequest};

/// Body of `POST /chats/:chat_id/send`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SendMessageRequest {
    /// User text
    pub message: String,
    /// Turn id; generated when absent
    #[serde(default)]
    pub message_id: Option<String>,
    /// Skip the model and reply with the canned text
    #[serde(default)]
    pub dry_run: bool,
    /// Values tools may receive as context parameters
    #[serde(default)]
    pub context: Map<String, Value>,
    /// Prompt overriding the conversation's own
    #[serde(default)]
    pub sysprompt_id: Option<String>,
    /// Text appended to the system prompt for this turn
    #[serde(default)]
    pub sysprompt_suffix: Option<String>,
}

/// Query parameters for listing messages
#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    /// Hide internal tool bookkeeping (default true)
    #[serde(default = "default_no_internal")]
    pub no_internal: bool,
}

const fn default_no_internal() -> bool {
    true
}

/// Response of the create endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCreatedResponse {
    /// New conversation id
    pub chat_id: String,
}

/// Messages of a conversation
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageListResponse {
    /// Conversation id
    pub chat_id: String,
    /// Messages in stored order
    pub messages: Vec<Message>,
}

/// Chat routes implementation
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/chats", post(Self::create_chat))
            .route("/chats/:chat_id/send", post(Self::send_message))
            .route("/chats/:chat_id/status", get(Self::latest_status))
            .route("/chats/:chat_id/messages", get(Self::list_messages))
            .route(
                "/chats/:chat_id/messages/:message_id",
                get(Self::get_message),
            )
            .route(
                "/chats/:chat_id/messages/:message_id/status",
                get(Self::message_status),
            )
            .with_state(resources)
    }

    async fn create_chat(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<CreateChatRequest>,
    ) -> Result<Response, AppError> {
        let chat = resources.chats.create_chat(request).await?;
        Ok((
            StatusCode::CREATED,
            Json(ChatCreatedResponse {
                chat_id: chat.chat_id,
            }),
        )
            .into_response())
    }

    async fn send_message(
        State(resources): State<Arc<ServerResources>>,
        Path(chat_id): Path<String>,
        Json(body): Json<SendMessageRequest>,
    ) -> Result<Response, AppError> {
        if body.message.trim().is_empty() {
            return Err(AppError::invalid_input("Message must not be empty"));
        }

        let message_id = body
            .message_id
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        info!(chat_id = %chat_id, message_id = %message_id, dry_run = body.dry_run, "Turn submitted");

        let request = TurnRequest {
            chat_id,
            message_id,
            text: body.message,
            dry_run: body.dry_run,
            context: body.context,
            sysprompt_id: body.sysprompt_id,
            sysprompt_suffix: body.sysprompt_suffix,
        };
        let task = resources.dispatcher.submit(request).await?;

        let status = if task.status == TaskStatus::Pending {
            StatusCode::ACCEPTED
        } else {
            StatusCode::OK
        };
        Ok((status, Json(task)).into_response())
    }

    async fn latest_status(
        State(resources): State<Arc<ServerResources>>,
        Path(chat_id): Path<String>,
    ) -> Result<Response, AppError> {
        let record = resources.chats.latest_status(&chat_id).await?;
        Ok((StatusCode::OK, Json(Task::from(&record))).into_response())
    }

    async fn message_status(
        State(resources): State<Arc<ServerResources>>,
        Path((chat_id, message_id)): Path<(String, String)>,
    ) -> Result<Response, AppError> {
        let record = resources
            .chats
            .message_status(&chat_id, &message_id)
            .await?;
        Ok((StatusCode::OK, Json(Task::from(&record))).into_response())
    }

    async fn list_messages(
        State(resources): State<Arc<ServerResources>>,
        Path(chat_id): Path<String>,
        Query(query): Query<ListMessagesQuery>,
    ) -> Result<Response, AppError> {
        let messages = resources
            .chats
            .list_messages(&chat_id, query.no_internal)
            .await?;
        Ok((StatusCode::OK, Json(MessageListResponse { chat_id, messages })).into_response())
    }

    async fn get_message(
        State(resources): State<Arc<ServerResources>>,
        Path((chat_id, message_id)): Path<(String, String)>,
    ) -> Result<Response, AppError> {
        let message = resources.chats.get_message(&chat_id, &message_id).await?;
        Ok((StatusCode::OK, Json(message)).into_response())
    }
}
