// ABOUTME: LLM gateway turning a stored conversation into a completion request
// ABOUTME: Offers model-facing tool schemas and classifies answers as text or tool calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::{ChatMessage, ChatRequest, LlmProvider};
use crate::errors::{AppError, AppResult};
use crate::models::{Message, MessageRole, ToolCallRecord, ToolSchema};

/// Classified answer of one completion
#[derive(Debug, Clone, PartialEq)]
pub enum LlmOutcome {
    /// Final text answer
    Text(String),
    /// Non-empty set of tool-call requests
    ToolCalls {
        /// Text the model sent alongside the calls, if any
        content: Option<String>,
        /// Requests in the order the model returned them
        calls: Vec<ToolCallRecord>,
    },
}

/// Submits conversations to an [`LlmProvider`] under a per-call timeout
#[derive(Clone)]
pub struct LlmGateway {
    provider: Arc<dyn LlmProvider>,
    model: Option<String>,
    timeout: Duration,
}

impl LlmGateway {
    /// Create a gateway over `provider`
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            model: None,
            timeout,
        }
    }

    /// Pin a model instead of the provider default
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// The underlying provider
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Build the wire request for one completion.
    ///
    /// Storage-only fields are dropped, any stored system message is
    /// replaced by `system_prompt`, and tools are offered only when
    /// `tools` is non-empty.
    #[must_use]
    pub fn build_request(
        &self,
        system_prompt: &str,
        history: &[Message],
        tools: &[ToolSchema],
        json_mode: bool,
    ) -> ChatRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(
            history
                .iter()
                .filter(|message| message.role != MessageRole::System)
                .map(ChatMessage::from),
        );

        let mut request = ChatRequest::new(messages);
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }
        if !tools.is_empty() {
            request = request.with_tools(tools.iter().map(ToolSchema::model_facing).collect());
        }
        if json_mode {
            request = request.with_json_mode();
        }
        request
    }

    /// Run one completion and classify the answer
    ///
    /// # Errors
    ///
    /// Returns a config error when the call needs tool calling or JSON mode
    /// and the provider lacks it. Otherwise returns the provider's error, a
    /// timeout error when the call exceeds the configured limit, or an
    /// external-service error when the answer carries neither text nor tool
    /// calls, or is not JSON in JSON mode.
    #[instrument(skip(self, system_prompt, history, tools), fields(provider = self.provider.name(), messages = history.len(), tools = tools.len()))]
    pub async fn complete(
        &self,
        system_prompt: &str,
        history: &[Message],
        tools: &[ToolSchema],
        json_mode: bool,
    ) -> AppResult<LlmOutcome> {
        let capabilities = self.provider.capabilities();
        if !tools.is_empty() && !capabilities.supports_function_calling() {
            return Err(AppError::config(format!(
                "{} does not support tool calling",
                self.provider.display_name()
            )));
        }
        if json_mode && !capabilities.supports_json_mode() {
            return Err(AppError::config(format!(
                "{} does not support JSON mode",
                self.provider.display_name()
            )));
        }

        let request = self.build_request(system_prompt, history, tools, json_mode);

        let response = tokio::time::timeout(self.timeout, self.provider.complete(&request))
            .await
            .map_err(|_| {
                warn!(seconds = self.timeout.as_secs(), "LLM completion timed out");
                AppError::timeout("LLM completion", self.timeout.as_secs())
            })??;

        if !response.tool_calls.is_empty() {
            debug!(calls = response.tool_calls.len(), "Model requested tool calls");
            return Ok(LlmOutcome::ToolCalls {
                content: response.content.filter(|c| !c.is_empty()),
                calls: response.tool_calls,
            });
        }

        let text = response
            .content
            .ok_or_else(|| AppError::external_service("LLM", "Completion carried no content"))?;

        if json_mode {
            let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
                AppError::external_service("LLM", format!("Expected a JSON answer: {e}"))
            })?;
            return Ok(LlmOutcome::Text(value.to_string()));
        }

        Ok(LlmOutcome::Text(text))
    }
}
