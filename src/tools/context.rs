// ABOUTME: Request-scoped values the runtime can inject into tool calls
// ABOUTME: Only names a tool declares as context parameters are ever merged into its arguments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use serde_json::{Map, Value};

use crate::models::ToolSchema;

/// Context map supplied with a turn (conversation id, tenant id, ...)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolExecutionContext {
    values: Map<String, Value>,
}

impl ToolExecutionContext {
    /// Empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing map
    #[must_use]
    pub const fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Add a value
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Look up a value
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Merge declared context parameters into `arguments`.
    ///
    /// Context values win over model-supplied values of the same name.
    pub fn merge_into(&self, schema: &ToolSchema, arguments: &mut Map<String, Value>) {
        for parameter in &schema.context_parameters {
            if let Some(value) = self.values.get(&parameter.name) {
                arguments.insert(parameter.name.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContextParameter, FunctionSpec};
    use serde_json::json;

    #[test]
    fn test_merge_only_declared_context_parameters() {
        let schema = ToolSchema::function("t", FunctionSpec::new("t", "test"))
            .with_context_parameter(ContextParameter::string("chat_id"));
        let context = ToolExecutionContext::new()
            .with("chat_id", "c1")
            .with("tenant_id", "acme");
        let mut args = Map::new();
        args.insert("chat_id".to_owned(), json!("spoofed"));

        context.merge_into(&schema, &mut args);

        assert_eq!(args.get("chat_id"), Some(&json!("c1")));
        assert!(!args.contains_key("tenant_id"));
    }
}
