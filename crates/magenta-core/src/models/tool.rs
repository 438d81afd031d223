// ABOUTME: Declared tool interfaces: function schema, context parameters, and invocation kind
// ABOUTME: Produces the model-facing function shape with registry-only fields removed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    /// JSON string
    String,
    /// JSON integer
    Integer,
    /// JSON array (of strings, see `items`)
    Array,
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Array => "array",
        })
    }
}

/// Schema of one parameter property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Declared type
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    /// Description shown to the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Element schema for arrays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ParameterSchema>>,
}

impl ParameterSchema {
    /// Create a property of the given type
    #[must_use]
    pub fn new(param_type: ParameterType, description: impl Into<String>) -> Self {
        Self {
            param_type,
            description: Some(description.into()),
            items: None,
        }
    }

    /// Create an array-of-strings property
    #[must_use]
    pub fn string_array(description: impl Into<String>) -> Self {
        Self {
            param_type: ParameterType::Array,
            description: Some(description.into()),
            items: Some(Box::new(Self {
                param_type: ParameterType::String,
                description: None,
                items: None,
            })),
        }
    }
}

fn object_type() -> String {
    "object".to_owned()
}

/// JSON-schema object describing a function's parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionParameters {
    /// Always `object`
    #[serde(rename = "type", default = "object_type")]
    pub schema_type: String,
    /// Declared properties by name
    #[serde(default)]
    pub properties: BTreeMap<String, ParameterSchema>,
    /// Names of required properties
    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for FunctionParameters {
    fn default() -> Self {
        Self {
            schema_type: object_type(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

/// Model-facing function declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Dispatch key shared by the gateway and the execution engine
    pub name: String,
    /// Description shown to the model
    #[serde(default)]
    pub description: String,
    /// Parameter schema
    #[serde(default)]
    pub parameters: FunctionParameters,
}

impl FunctionSpec {
    /// Create a function declaration without parameters
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: FunctionParameters::default(),
        }
    }

    /// Add a property
    #[must_use]
    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        schema: ParameterSchema,
        required: bool,
    ) -> Self {
        let name = name.into();
        if required {
            self.parameters.required.push(name.clone());
        }
        self.parameters.properties.insert(name, schema);
        self
    }
}

/// A parameter the runtime fills from request context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextParameter {
    /// Parameter name
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ContextParameter {
    /// Create a string context parameter
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: ParameterType::String,
            description: None,
        }
    }
}

/// HTTP method of an external tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Arguments go in the query string
    Get,
    /// Arguments go in a JSON body
    Post,
    /// Arguments go in a JSON body
    Put,
    /// Arguments go in the query string
    Delete,
}

impl HttpMethod {
    /// Whether arguments travel as query parameters
    #[must_use]
    pub const fn uses_query(&self) -> bool {
        matches!(self, Self::Get | Self::Delete)
    }
}

/// Invocation kind of a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// In-process callable
    Function,
    /// Outbound HTTP call
    External,
}

/// A registered tool's declared interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Registry key only; never sent to the model
    pub tool_id: String,
    /// Invocation kind
    #[serde(rename = "type")]
    pub kind: ToolKind,
    /// Function declaration
    pub function: FunctionSpec,
    /// Parameters injected from request context
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_parameters: Vec<ContextParameter>,
    /// Endpoint of an external tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// HTTP method of an external tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
}

impl ToolSchema {
    /// Declare a local function tool
    #[must_use]
    pub fn function(tool_id: impl Into<String>, function: FunctionSpec) -> Self {
        Self {
            tool_id: tool_id.into(),
            kind: ToolKind::Function,
            function,
            context_parameters: Vec::new(),
            url: None,
            method: None,
        }
    }

    /// Declare an external HTTP tool
    #[must_use]
    pub fn external(
        tool_id: impl Into<String>,
        function: FunctionSpec,
        url: impl Into<String>,
        method: HttpMethod,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            kind: ToolKind::External,
            function,
            context_parameters: Vec::new(),
            url: Some(url.into()),
            method: Some(method),
        }
    }

    /// Add a context parameter
    #[must_use]
    pub fn with_context_parameter(mut self, parameter: ContextParameter) -> Self {
        self.context_parameters.push(parameter);
        self
    }

    /// Dispatch name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Whether `name` is declared as a context parameter
    #[must_use]
    pub fn is_context_parameter(&self, name: &str) -> bool {
        self.context_parameters.iter().any(|p| p.name == name)
    }

    /// Function declaration as offered to the model, without context parameters
    #[must_use]
    pub fn model_facing(&self) -> FunctionSpec {
        let mut function = self.function.clone();
        function
            .parameters
            .properties
            .retain(|name, _| !self.is_context_parameter(name));
        function
            .parameters
            .required
            .retain(|name| !self.is_context_parameter(name));
        function
    }
}
