// ABOUTME: Configuration management module for runtime settings loaded from the environment
// ABOUTME: Exposes RuntimeConfig and its typed sub-configurations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! Configuration module for the Magenta runtime
//!
//! All configuration comes from environment variables. Each concern has its own
//! typed struct with a `from_env()` constructor; `RuntimeConfig` assembles them.

/// Environment-driven runtime configuration
pub mod environment;

pub use environment::{
    CallbackConfig, DatabaseConfig, EmbedderKind, LlmConfig, RetrievalConfig, RuntimeConfig,
    ToolConfig, TurnConfig,
};
