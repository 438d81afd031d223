// ABOUTME: Tool subsystem: local tool trait, registry with load-time validation, and execution engine
// ABOUTME: Tools are dispatched by function name to in-process callables or HTTP endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

/// Built-in local tools
pub mod builtin;
/// Request-scoped context values
pub mod context;
/// Execution engine
pub mod engine;
/// Name-keyed registry
pub mod registry;
/// Tool output type
pub mod result;
/// Local tool trait
pub mod traits;
/// Schema and signature validation
pub mod validation;

pub use builtin::{builtin_tools, CurrentUtcDatetime, RollDice};
pub use context::ToolExecutionContext;
pub use engine::ToolExecutionEngine;
pub use registry::{ToolEntry, ToolRegistry};
pub use result::ToolOutput;
pub use traits::{LocalTool, ParamSpec};
