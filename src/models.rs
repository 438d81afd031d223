// ABOUTME: Re-exports the persisted data model from the core crate
// ABOUTME: Conversations, messages, statuses, prompts, documents, and tool schemas
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

pub use magenta_core::models::*;
