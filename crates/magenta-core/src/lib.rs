// ABOUTME: Core types and constants for the Magenta conversational agent runtime
// ABOUTME: Foundation crate with error handling, the persisted data model, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

#![deny(unsafe_code)]

//! # Magenta Core
//!
//! Foundation crate providing shared types and constants for the Magenta agent
//! runtime. This crate is designed to change infrequently, enabling incremental
//! compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `ToolError`
//! - **constants**: Turn, retrieval, and tool defaults
//! - **models**: Conversations, messages, status records, prompts, documents, and tool schemas

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Persisted data model (conversations, prompts, documents, tool schemas)
pub mod models;
