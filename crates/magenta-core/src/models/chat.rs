// ABOUTME: Conversation document types: chats, messages, tool-call records, and status logs
// ABOUTME: Stored whole and mutated only through the turn orchestrator during a turn
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction (never persisted by a turn)
    System,
    /// User input
    User,
    /// Model output, either text or a tool-call request
    Assistant,
    /// Result of a tool invocation
    Tool,
}

impl MessageRole {
    /// Wire name of the role
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// Function part of a recorded tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    /// Function name the model asked for
    pub name: String,
    /// Serialized JSON arguments exactly as the model produced them
    pub arguments: String,
}

/// A tool call requested by the model, as recorded in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Correlation id echoed back in the tool-result message
    pub id: String,
    /// Always `function`
    #[serde(rename = "type", default = "function_call_type")]
    pub call_type: String,
    /// Requested function
    pub function: ToolCallFunction,
}

fn function_call_type() -> String {
    "function".to_owned()
}

impl ToolCallRecord {
    /// Create a function tool call record
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            call_type: function_call_type(),
            function: ToolCallFunction {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// A single stored message.
///
/// A message with a `message_id` is user-facing; one without is internal
/// bookkeeping (tool-call requests and tool results).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Sender role
    pub role: MessageRole,
    /// Text content; absent for pure tool-call records and suppressed replies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Externally visible id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// When the message was stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Tool calls requested by an assistant message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRecord>>,
    /// Correlation id of the call a tool message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool name for tool messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn bare(role: MessageRole, content: Option<String>) -> Self {
        Self {
            role,
            content,
            message_id: None,
            timestamp: None,
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    /// System message (used only on the outgoing request)
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::bare(MessageRole::System, Some(content.into()))
    }

    /// User-facing inbound message
    #[must_use]
    pub fn user(message_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            timestamp: Some(Utc::now()),
            ..Self::bare(MessageRole::User, Some(content.into()))
        }
    }

    /// User-facing assistant reply; `content` is `None` when the reply was suppressed
    #[must_use]
    pub fn assistant_reply(message_id: impl Into<String>, content: Option<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            timestamp: Some(Utc::now()),
            ..Self::bare(MessageRole::Assistant, content)
        }
    }

    /// Internal assistant message recording the model's tool-call requests
    #[must_use]
    pub fn tool_call_request(content: Option<String>, calls: Vec<ToolCallRecord>) -> Self {
        Self {
            tool_calls: Some(calls),
            ..Self::bare(MessageRole::Assistant, content)
        }
    }

    /// Internal tool-result message answering one tool call
    #[must_use]
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
            ..Self::bare(MessageRole::Tool, Some(content.into()))
        }
    }

    /// Whether the message is internal bookkeeping
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        self.message_id.is_none()
    }
}

/// Status of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Record created
    Created,
    /// Accepted, waiting to run
    Pending,
    /// Handed to a worker
    Submitted,
    /// Turn is being processed
    InProgress,
    /// Turn finished with a reply
    Completed,
    /// Turn failed
    Failed,
    /// Record updated
    Updated,
    /// Scheduled for later
    Scheduled,
    /// Turn was cancelled before finishing
    Cancelled,
}

impl TaskStatus {
    /// Whether no further status may follow for the same message
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Wire name of the status
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Updated => "updated",
            Self::Scheduled => "scheduled",
            Self::Cancelled => "cancelled",
        }
    }
}

/// One status transition of a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Turn identifier (the inbound message id)
    pub message_id: String,
    /// New status
    pub status: TaskStatus,
    /// Failure detail for `failed` and `cancelled`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusRecord {
    /// Create a status record without error detail
    #[must_use]
    pub fn new(message_id: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            message_id: message_id.into(),
            status,
            error: None,
        }
    }

    /// Create a terminal record carrying an error detail
    #[must_use]
    pub fn with_error(
        message_id: impl Into<String>,
        status: TaskStatus,
        error: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            status,
            error: Some(error.into()),
        }
    }
}

/// A conversation document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    /// Conversation identity
    pub chat_id: String,
    /// Caller-supplied context id handed to the reply callback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    /// Prompt used for turns unless overridden
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sysprompt_id: Option<String>,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered, append-only message log
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Ordered status log
    #[serde(default)]
    pub statuses: Vec<StatusRecord>,
}

impl Chat {
    /// Create an empty conversation
    #[must_use]
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            context_id: None,
            sysprompt_id: None,
            description: None,
            messages: Vec::new(),
            statuses: Vec::new(),
        }
    }

    /// Set the prompt used for turns
    #[must_use]
    pub fn with_sysprompt(mut self, sysprompt_id: impl Into<String>) -> Self {
        self.sysprompt_id = Some(sysprompt_id.into());
        self
    }

    /// Set the callback context id
    #[must_use]
    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    /// Most recent status record of the conversation
    #[must_use]
    pub fn latest_status(&self) -> Option<&StatusRecord> {
        self.statuses.last()
    }

    /// Most recent status record for one turn
    #[must_use]
    pub fn status_for(&self, message_id: &str) -> Option<&StatusRecord> {
        self.statuses
            .iter()
            .rev()
            .find(|record| record.message_id == message_id)
    }

    /// Whether the turn already has a terminal status
    #[must_use]
    pub fn has_terminal_status(&self, message_id: &str) -> bool {
        self.statuses
            .iter()
            .any(|record| record.message_id == message_id && record.status.is_terminal())
    }

    /// Find a user-facing message by id
    #[must_use]
    pub fn find_message(&self, message_id: &str) -> Option<&Message> {
        self.messages
            .iter()
            .find(|message| message.message_id.as_deref() == Some(message_id))
    }

    /// Messages for display; internal ones are dropped when `no_internal` is set
    #[must_use]
    pub fn visible_messages(&self, no_internal: bool) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|message| !no_internal || !message.is_internal())
            .collect()
    }
}
