// ABOUTME: Core data models for the Magenta agent runtime
// ABOUTME: Re-exports conversation, prompt, document, and tool schema types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! # Data Models
//!
//! The persisted documents the runtime reads and writes. Every type here is
//! stored as a whole JSON document and round-trips through serde unchanged.
//!
//! ## Core Models
//!
//! - `Chat`: a conversation with its ordered messages and status log
//! - `Message`: one stored message; internal when it carries no `message_id`
//! - `StatusRecord`: one status transition for a turn
//! - `Prompt` / `RagSpec`: the system prompt and its attached documents
//! - `Document`: a referenced document body
//! - `ToolSchema`: declared tool interface and invocation kind

mod chat;
mod document;
mod prompt;
mod tool;

pub use chat::{
    Chat, Message, MessageRole, StatusRecord, TaskStatus, ToolCallFunction, ToolCallRecord,
};
pub use document::Document;
pub use prompt::{DocumentRef, Prompt, PromptKind, RagSpec};
pub use tool::{
    ContextParameter, FunctionParameters, FunctionSpec, HttpMethod, ParameterSchema,
    ParameterType, ToolKind, ToolSchema,
};
