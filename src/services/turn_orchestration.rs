// ABOUTME: Turn orchestrator driving one inbound message through prompt assembly and the tool loop
// ABOUTME: Serializes turns per conversation, bounds tool rounds, and records every status transition
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! # Turn Orchestration
//!
//! A turn moves through `RECEIVED -> IN_PROGRESS -> TOOL_ROUND* -> COMPLETED | FAILED`:
//!
//! 1. `in_progress` is appended and the prompt, toolset and retrieval are resolved.
//!    A dry run stops after step 2 and replies with canned text.
//! 2. The user message is persisted before the first model call.
//! 3. Each tool round records the model's request, runs the calls in order,
//!    and appends one tool-result message per call.
//! 4. The final reply and `completed` are persisted, then the optional
//!    callback fires in a detached task.
//!
//! Any error after step 1 is recorded as `failed` (or `cancelled`) with the
//! error text, so status polling never stays at `in_progress`.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::callback::ReplyCallback;
use super::prompt_assembly::PromptAssembler;
use crate::config::TurnConfig;
use crate::constants::turn::{DRY_RUN_TEXT, MAX_CHAINED_TOOL_CALLS, USER_MESSAGE_ID_PREFIX};
use crate::database::DatabaseProvider;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::llm::{LlmGateway, LlmOutcome};
use crate::models::{Chat, Message, MessageRole, StatusRecord, TaskStatus, ToolSchema};
use crate::tools::{ToolExecutionContext, ToolExecutionEngine};

/// One inbound message to process
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRequest {
    /// Conversation
    pub chat_id: String,
    /// Turn id; the reply carries it, the stored user message carries it prefixed
    pub message_id: String,
    /// User text
    pub text: String,
    /// Skip the model and reply with the canned text
    pub dry_run: bool,
    /// Values tools may receive as context parameters
    pub context: Map<String, Value>,
    /// Prompt overriding the conversation's own
    pub sysprompt_id: Option<String>,
    /// Text appended to the system prompt for this turn only
    pub sysprompt_suffix: Option<String>,
}

impl TurnRequest {
    /// Create a request with no overrides
    #[must_use]
    pub fn new(
        chat_id: impl Into<String>,
        message_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_id: message_id.into(),
            text: text.into(),
            dry_run: false,
            context: Map::new(),
            sysprompt_id: None,
            sysprompt_suffix: None,
        }
    }

    /// Toggle dry-run
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Add a context value
    #[must_use]
    pub fn with_context(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(name.into(), value.into());
        self
    }

    /// Override the prompt
    #[must_use]
    pub fn with_sysprompt(mut self, sysprompt_id: impl Into<String>) -> Self {
        self.sysprompt_id = Some(sysprompt_id.into());
        self
    }

    /// Append text to the system prompt
    #[must_use]
    pub fn with_sysprompt_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.sysprompt_suffix = Some(suffix.into());
        self
    }
}

/// Result of a completed turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Turn id
    pub message_id: String,
    /// Reply text; `None` when suppressed by the skip word
    pub reply: Option<String>,
    /// Always `completed`
    pub status: TaskStatus,
    /// Tool rounds executed
    pub tool_rounds: usize,
}

/// Knobs of the turn loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSettings {
    /// Tool rounds allowed beyond the first before the turn fails
    pub max_chained_tool_calls: usize,
    /// Model output that suppresses the reply
    pub skip_word: Option<String>,
    /// Ask the model for a JSON object
    pub json_mode: bool,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            max_chained_tool_calls: MAX_CHAINED_TOOL_CALLS,
            skip_word: None,
            json_mode: false,
        }
    }
}

impl TurnSettings {
    /// Settings from the turn configuration
    #[must_use]
    pub fn from_config(turn: &TurnConfig, json_mode: bool) -> Self {
        Self {
            max_chained_tool_calls: turn.max_chained_tool_calls,
            skip_word: turn.skip_word.clone(),
            json_mode,
        }
    }
}

/// Sequences prompt assembly, the LLM gateway and the tool engine for each turn
pub struct TurnOrchestrator {
    database: Arc<dyn DatabaseProvider>,
    assembler: PromptAssembler,
    gateway: LlmGateway,
    engine: ToolExecutionEngine,
    callback: Option<Arc<dyn ReplyCallback>>,
    settings: TurnSettings,
    chat_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TurnOrchestrator {
    /// Wire an orchestrator from its collaborators
    #[must_use]
    pub fn new(
        database: Arc<dyn DatabaseProvider>,
        assembler: PromptAssembler,
        gateway: LlmGateway,
        engine: ToolExecutionEngine,
        settings: TurnSettings,
    ) -> Self {
        Self {
            database,
            assembler,
            gateway,
            engine,
            callback: None,
            settings,
            chat_locks: DashMap::new(),
        }
    }

    /// Deliver final replies to `callback`
    #[must_use]
    pub fn with_callback(mut self, callback: Arc<dyn ReplyCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Storage used by the orchestrator
    #[must_use]
    pub fn database(&self) -> &Arc<dyn DatabaseProvider> {
        &self.database
    }

    /// Loop settings
    #[must_use]
    pub const fn settings(&self) -> &TurnSettings {
        &self.settings
    }

    fn chat_lock(&self, chat_id: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.chat_locks.entry(chat_id.to_owned()).or_default().value())
    }

    // Only the map holds the lock once no turn is running or waiting on it.
    fn release_chat_lock(&self, chat_id: &str) {
        self.chat_locks.remove_if(chat_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Process one turn to completion.
    ///
    /// Turns on the same conversation run one at a time. On error the turn
    /// is marked `failed` (or `cancelled`) before the error is returned,
    /// tagged with the turn id as its request id.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the turn.
    #[instrument(skip(self, request, cancel), fields(chat_id = %request.chat_id, message_id = %request.message_id))]
    pub async fn process_turn(
        &self,
        request: TurnRequest,
        cancel: CancellationToken,
    ) -> AppResult<TurnOutcome> {
        let result = {
            let lock = self.chat_lock(&request.chat_id);
            let _guard = lock.lock().await;

            match self.run_turn(&request, &cancel).await {
                Ok(outcome) => Ok(outcome),
                Err(error) => {
                    error!(error = %error, "Turn failed");
                    self.record_failure(&request.chat_id, &request.message_id, &error)
                        .await;
                    Err(error.with_request_id(request.message_id.clone()))
                }
            }
        };
        self.release_chat_lock(&request.chat_id);
        result
    }

    /// Mark a turn as failed from outside the turn (e.g. after a timeout).
    ///
    /// Does not wait for the conversation lock: the abandoned turn no longer
    /// runs, and status appends never overwrite other turns' records.
    pub async fn fail_turn(&self, chat_id: &str, message_id: &str, error: &AppError) {
        self.record_failure(chat_id, message_id, error).await;
        self.release_chat_lock(chat_id);
    }

    /// Conversations with a turn running or queued
    #[must_use]
    pub fn active_chats(&self) -> usize {
        self.chat_locks.len()
    }

    async fn record_failure(&self, chat_id: &str, message_id: &str, error: &AppError) {
        let chat = match self.database.get_chat(chat_id).await {
            Ok(Some(chat)) => chat,
            Ok(None) => {
                warn!(chat_id, message_id, "Cannot record failure for missing chat");
                return;
            }
            Err(e) => {
                error!(chat_id, message_id, error = %e, "Cannot load chat to record failure");
                return;
            }
        };
        if chat.has_terminal_status(message_id) {
            debug!(chat_id, message_id, "Turn already has a terminal status");
            return;
        }

        let status = if error.code == ErrorCode::OperationCancelled {
            TaskStatus::Cancelled
        } else {
            TaskStatus::Failed
        };
        let record = StatusRecord::with_error(message_id, status, error.to_string());
        if let Err(e) = self.database.append_status(chat_id, &record).await {
            error!(chat_id, message_id, error = %e, "Failed to record turn failure");
        }
    }

    async fn run_turn(
        &self,
        request: &TurnRequest,
        cancel: &CancellationToken,
    ) -> AppResult<TurnOutcome> {
        let chat_id = request.chat_id.as_str();
        let message_id = request.message_id.as_str();

        let chat = self
            .database
            .get_chat(chat_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Chat '{chat_id}'")))?;
        if chat.has_terminal_status(message_id) {
            return Err(AppError::already_exists(format!("Turn '{message_id}'")));
        }

        self.database
            .append_status(chat_id, &StatusRecord::new(message_id, TaskStatus::InProgress))
            .await?;

        if cancel.is_cancelled() {
            return Err(AppError::cancelled("Turn cancelled before it started"));
        }

        let (reply, tool_rounds, messages) =
            self.run_assembled_turn(&chat, request, cancel).await?;

        self.finish_turn(&chat, message_id, reply, tool_rounds, messages)
            .await
    }

    async fn persist_user_message(
        &self,
        chat_id: &str,
        message_id: &str,
        text: &str,
        messages: &mut Vec<Message>,
    ) -> AppResult<usize> {
        messages.push(Message::user(
            format!("{USER_MESSAGE_ID_PREFIX}{message_id}"),
            text,
        ));
        self.database.update_messages(chat_id, messages).await?;
        Ok(messages.len() - 1)
    }

    async fn run_assembled_turn(
        &self,
        chat: &Chat,
        request: &TurnRequest,
        cancel: &CancellationToken,
    ) -> AppResult<(String, usize, Vec<Message>)> {
        let assembled = self
            .assembler
            .assemble(
                chat,
                &request.text,
                request.sysprompt_id.as_deref(),
                request.sysprompt_suffix.as_deref(),
            )
            .await?;
        let tools = self
            .engine
            .registry()
            .schemas_for(assembled.prompt.tool_names())?;

        let mut messages = chat.messages.clone();
        let user_index = self
            .persist_user_message(
                &chat.chat_id,
                &request.message_id,
                &assembled.stored_message,
                &mut messages,
            )
            .await?;

        if request.dry_run {
            info!("Dry run, skipping the model");
            return Ok((DRY_RUN_TEXT.to_owned(), 0, messages));
        }

        let mut context = ToolExecutionContext::from_map(request.context.clone());
        if context.get("chat_id").is_none() {
            context = context.with("chat_id", chat.chat_id.clone());
        }

        let (reply, rounds) = self
            .tool_loop(
                &assembled.system_prompt,
                &tools,
                &mut messages,
                user_index,
                &assembled.llm_message,
                &context,
                cancel,
            )
            .await?;
        Ok((reply, rounds, messages))
    }

    /// Call the model until it answers with text.
    ///
    /// The round counter starts at zero and is checked before each round,
    /// so `max_chained_tool_calls + 1` rounds run and the next tool-call
    /// answer fails the turn.
    #[allow(clippy::too_many_arguments)]
    async fn tool_loop(
        &self,
        system_prompt: &str,
        tools: &[ToolSchema],
        messages: &mut Vec<Message>,
        user_index: usize,
        llm_message: &str,
        context: &ToolExecutionContext,
        cancel: &CancellationToken,
    ) -> AppResult<(String, usize)> {
        let max_rounds = self.settings.max_chained_tool_calls;
        let mut rounds = 0_usize;

        loop {
            let view = model_view(messages, user_index, llm_message);
            let outcome = cancellable(
                cancel,
                self.gateway
                    .complete(system_prompt, &view, tools, self.settings.json_mode),
            )
            .await?;

            let (content, calls) = match outcome {
                LlmOutcome::Text(text) => return Ok((text, rounds)),
                LlmOutcome::ToolCalls { content, calls } => (content, calls),
            };

            messages.push(Message::tool_call_request(content, calls.clone()));
            if rounds > max_rounds {
                return Err(AppError::tool_chain_exceeded(max_rounds));
            }
            rounds += 1;
            info!(round = rounds, calls = calls.len(), "Executing tool round");

            for call in &calls {
                let output = cancellable(cancel, async {
                    self.engine
                        .execute(&call.function.name, &call.function.arguments, context)
                        .await
                        .map_err(AppError::from)
                })
                .await?;
                debug!(tool = %call.function.name, is_error = output.is_error, "Tool returned");
                messages.push(Message::tool_result(
                    call.id.clone(),
                    call.function.name.clone(),
                    output.content,
                ));
            }
        }
    }

    async fn finish_turn(
        &self,
        chat: &Chat,
        message_id: &str,
        reply: String,
        tool_rounds: usize,
        mut messages: Vec<Message>,
    ) -> AppResult<TurnOutcome> {
        let content = match &self.settings.skip_word {
            Some(skip_word) if *skip_word == reply => {
                info!("Reply matched the skip word, suppressing it");
                None
            }
            _ => Some(reply),
        };

        if messages
            .first()
            .is_some_and(|message| message.role == MessageRole::System)
        {
            messages.remove(0);
        }
        messages.push(Message::assistant_reply(message_id, content.clone()));

        self.database
            .update_messages(&chat.chat_id, &messages)
            .await?;
        self.database
            .append_status(
                &chat.chat_id,
                &StatusRecord::new(message_id, TaskStatus::Completed),
            )
            .await?;
        info!(tool_rounds, "Turn completed");

        if let (Some(callback), Some(text)) = (&self.callback, &content) {
            let callback = Arc::clone(callback);
            let text = text.clone();
            let context_id = chat.context_id.clone();
            let chat_id = chat.chat_id.clone();
            tokio::spawn(async move {
                if let Err(e) = callback.deliver(&text, context_id.as_deref()).await {
                    warn!(chat_id = %chat_id, error = %e, "Reply callback failed");
                }
            });
        }

        Ok(TurnOutcome {
            message_id: message_id.to_owned(),
            reply: content,
            status: TaskStatus::Completed,
            tool_rounds,
        })
    }
}

/// Messages as the model sees them: the user message carries ephemeral retrieval text
fn model_view(messages: &[Message], user_index: usize, llm_message: &str) -> Vec<Message> {
    let mut view = messages.to_vec();
    if let Some(message) = view.get_mut(user_index) {
        message.content = Some(llm_message.to_owned());
    }
    view
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AppError::cancelled("Turn cancelled")),
        result = future => result,
    }
}
