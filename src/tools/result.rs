// ABOUTME: Observation produced by one tool invocation
// ABOUTME: Success and recovered failures both become text the model reads on its next round
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ToolError;

/// Result of executing a tool, as fed back to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text placed in the tool-result message
    pub content: String,
    /// Whether `content` describes a failure
    pub is_error: bool,
}

impl ToolOutput {
    /// Successful output; strings are used as-is, other values as compact JSON
    #[must_use]
    pub fn success(value: &Value) -> Self {
        let content = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        Self {
            content,
            is_error: false,
        }
    }

    /// Recovered failure rendered for the model
    #[must_use]
    pub fn failure(error: &ToolError) -> Self {
        Self {
            content: error.to_observation(),
            is_error: true,
        }
    }
}
