// ABOUTME: Defines the LocalTool trait implemented by in-process tool callables
// ABOUTME: Each tool reports its parameter signature so the registry can validate it against its schema
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! # Local Tool Trait
//!
//! A local tool is an async callable with an explicit signature. The
//! signature replaces runtime reflection: the registry compares it with the
//! declared [`ToolSchema`](crate::models::ToolSchema) before the tool can be
//! used.
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use magenta_server::errors::ToolError;
//! use magenta_server::models::ParameterType;
//! use magenta_server::tools::{LocalTool, ParamSpec};
//! use serde_json::{Map, Value};
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl LocalTool for Echo {
//!     fn name(&self) -> &'static str {
//!         "echo"
//!     }
//!
//!     fn signature(&self) -> Vec<ParamSpec> {
//!         vec![ParamSpec::required("text", ParameterType::String)]
//!     }
//!
//!     async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
//!         Ok(args.get("text").cloned().unwrap_or(Value::Null))
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::ToolError;
use crate::models::ParameterType;

/// One parameter of a local tool's signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,
    /// Accepted type; `Array` means a list of strings
    pub param_type: ParameterType,
    /// Whether the implementation supplies a default when the argument is absent
    pub has_default: bool,
}

impl ParamSpec {
    /// A parameter the caller must supply
    #[must_use]
    pub fn required(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            has_default: false,
        }
    }

    /// A parameter with an implementation default
    #[must_use]
    pub fn optional(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            has_default: true,
        }
    }
}

/// An in-process tool implementation
///
/// Implementations are `Send + Sync` and shared behind `Arc` by the registry.
/// Errors returned from [`call`](LocalTool::call) become observations for the
/// model, so they should read well as plain text.
#[async_trait]
pub trait LocalTool: Send + Sync {
    /// Function name this implementation answers to
    fn name(&self) -> &'static str;

    /// Parameters the implementation accepts, context parameters included
    fn signature(&self) -> Vec<ParamSpec>;

    /// Invoke the tool with merged model and context arguments
    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError>;
}
