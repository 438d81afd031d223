// ABOUTME: Main library entry point for the Magenta conversational agent runtime
// ABOUTME: Turn orchestration, LLM gateway, tool execution, retrieval, and HTTP surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

#![deny(unsafe_code)]

//! # Magenta Server
//!
//! A conversational agent runtime. Given a stored conversation and a new inbound
//! message it produces a model-generated reply, optionally invoking tools in a
//! bounded loop and augmenting the prompt with retrieved context, while durably
//! recording every status transition.
//!
//! ## Architecture
//!
//! - **Tools**: registry with load-time signature validation and an execution engine
//! - **Retrieval**: embedding-based passage ranking behind the `Retriever` trait
//! - **LLM**: provider abstraction and the gateway that normalizes conversations
//! - **Services**: prompt assembly, turn orchestration, dispatch, and callbacks
//! - **Database**: conversation, prompt, document, and tool storage
//! - **Routes**: HTTP endpoints for turn submission and status polling
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use magenta_server::config::RuntimeConfig;
//! use magenta_server::errors::AppResult;
//! use magenta_server::resources::ServerResources;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = RuntimeConfig::from_env()?;
//!     let resources = ServerResources::build(config).await?;
//!     println!("{} tools registered", resources.registry.len());
//!     Ok(())
//! }
//! ```

/// Unified error handling (re-exported from `magenta-core`)
pub mod errors;

/// Application constants (re-exported from `magenta-core`)
pub mod constants;

/// Persisted data model (re-exported from `magenta-core`)
pub mod models;

/// Configuration loaded from the environment
pub mod config;

/// Structured logging setup
pub mod logging;

/// Conversation, prompt, document, and tool storage
pub mod database;

/// LLM provider abstraction and gateway
pub mod llm;

/// Tool registry, validation, and execution
pub mod tools;

/// Query-time retrieval of relevant passages
pub mod retrieval;

/// Prompt assembly, turn orchestration, dispatch, and callbacks
pub mod services;

/// HTTP routes
pub mod routes;

/// Wiring of shared server components
pub mod resources;
