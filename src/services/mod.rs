// ABOUTME: Domain service layer: prompt assembly, turn orchestration, dispatch, and callbacks
// ABOUTME: Protocol-agnostic logic reused by the HTTP routes and the binary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! Domain service layer
//!
//! Route handlers stay thin; everything with control flow lives here.

/// Reply callback delivery
pub mod callback;

/// Conversation creation and queries
pub mod conversations;

/// Background turn dispatch
pub mod dispatcher;

/// System prompt and user message assembly
pub mod prompt_assembly;

/// The per-turn state machine
pub mod turn_orchestration;

pub use callback::{ReplyCallback, WebhookCallback};
pub use conversations::{ChatService, CreateChatRequest};
pub use dispatcher::{Task, TurnDispatcher};
pub use prompt_assembly::{AssembledPrompt, PromptAssembler};
pub use turn_orchestration::{TurnOrchestrator, TurnOutcome, TurnRequest, TurnSettings};
