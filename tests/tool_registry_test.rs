// ABOUTME: Integration tests for tool registry loading and signature validation
// ABOUTME: Covers fail-closed batch loading, built-ins, external declarations, and toolset resolution
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use magenta_server::errors::{ErrorCode, ToolError};
use magenta_server::models::{
    ContextParameter, FunctionSpec, HttpMethod, ParameterSchema, ParameterType, ToolSchema,
};
use magenta_server::tools::{builtin_tools, LocalTool, ParamSpec, ToolRegistry};
use serde_json::{Map, Value};

// ============================================================================
// Test Tools
// ============================================================================

/// Takes a required query and an optional limit
struct SearchNotes;

#[async_trait]
impl LocalTool for SearchNotes {
    fn name(&self) -> &'static str {
        "search_notes"
    }

    fn signature(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("query", ParameterType::String),
            ParamSpec::optional("limit", ParameterType::Integer),
            ParamSpec::required("chat_id", ParameterType::String),
        ]
    }

    async fn call(&self, _args: Map<String, Value>) -> Result<Value, ToolError> {
        Ok(Value::Array(Vec::new()))
    }
}

fn search_schema() -> ToolSchema {
    ToolSchema::function(
        "searchnotes",
        FunctionSpec::new("search_notes", "Search stored notes")
            .with_parameter(
                "query",
                ParameterSchema::new(ParameterType::String, "Search text"),
                true,
            )
            .with_parameter(
                "limit",
                ParameterSchema::new(ParameterType::Integer, "Maximum hits"),
                false,
            ),
    )
    .with_context_parameter(ContextParameter::string("chat_id"))
}

fn weather_schema(url: &str) -> ToolSchema {
    ToolSchema::external(
        "weather",
        FunctionSpec::new("get_weather", "Current weather").with_parameter(
            "city",
            ParameterSchema::new(ParameterType::String, "City name"),
            true,
        ),
        url,
        HttpMethod::Get,
    )
}

fn validation_errors(error: &magenta_server::errors::AppError) -> Vec<String> {
    error.context.details["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e.as_str().unwrap().to_owned())
        .collect()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_builtin_tools_load() {
    let registry = ToolRegistry::with_builtin_tools().unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(
        registry.tool_names(),
        vec!["get_current_utc_datetime", "roll_dice"]
    );
}

#[test]
fn test_load_mixed_batch() {
    let (mut schemas, mut implementations) = builtin_tools();
    schemas.push(search_schema());
    schemas.push(weather_schema("https://weather.example.com/v1/current"));
    implementations.push(Arc::new(SearchNotes));

    let registry = ToolRegistry::load(schemas, implementations).unwrap();

    assert_eq!(registry.len(), 4);
    assert!(registry.contains("search_notes"));
    assert!(registry.contains("get_weather"));
}

#[test]
fn test_unimplemented_function_rejects_whole_batch() {
    let (mut schemas, implementations) = builtin_tools();
    schemas.push(search_schema());

    let error = ToolRegistry::load(schemas, implementations).unwrap_err();

    assert_eq!(error.code, ErrorCode::ConfigInvalid);
    assert_eq!(
        validation_errors(&error),
        vec!["Function 'search_notes' is defined but not implemented."]
    );
}

#[test]
fn test_signature_mismatches_are_all_reported() {
    let schema = ToolSchema::function(
        "searchnotes",
        FunctionSpec::new("search_notes", "Search stored notes")
            .with_parameter(
                "query",
                ParameterSchema::new(ParameterType::String, "Search text"),
                false,
            )
            .with_parameter(
                "limit",
                ParameterSchema::new(ParameterType::String, "Maximum hits"),
                true,
            )
            .with_parameter(
                "tags",
                ParameterSchema::string_array("Tags to match"),
                false,
            ),
    );

    let error = ToolRegistry::load(vec![schema], vec![Arc::new(SearchNotes)]).unwrap_err();
    let errors = validation_errors(&error);

    assert!(errors.contains(&"search_notes: Parameter 'tags' is defined but missing.".to_owned()));
    assert!(errors
        .contains(&"search_notes: Required parameter 'query' is not marked as required.".to_owned()));
    assert!(
        errors.contains(&"search_notes: Optional parameter 'limit' is marked as required.".to_owned())
    );
    assert!(
        errors.contains(&"search_notes: Function parameter 'chat_id' is not defined.".to_owned())
    );
    assert!(errors.iter().any(|e| e.contains("'limit' is defined as 'string'")));
}

#[test]
fn test_duplicate_function_name_is_rejected() {
    let (mut schemas, implementations) = builtin_tools();
    schemas.push(schemas[1].clone());

    let error = ToolRegistry::load(schemas, implementations).unwrap_err();

    assert_eq!(
        validation_errors(&error),
        vec!["roll_dice: Function name is registered more than once."]
    );
}

#[test]
fn test_external_tool_without_url_is_rejected() {
    let mut schema = weather_schema("https://weather.example.com");
    schema.url = None;
    schema.method = None;

    let error = ToolRegistry::load(vec![schema], Vec::new()).unwrap_err();
    let errors = validation_errors(&error);

    assert_eq!(errors.len(), 2);
    assert!(errors.contains(&"get_weather: External tool has no url.".to_owned()));
    assert!(errors.contains(&"get_weather: External tool has no HTTP method.".to_owned()));
}

#[test]
fn test_register_external_rejects_taken_name() {
    let mut registry = ToolRegistry::new();
    registry
        .register_external(weather_schema("https://weather.example.com"))
        .unwrap();

    let error = registry
        .register_external(weather_schema("https://other.example.com"))
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::ResourceAlreadyExists);
}

// ============================================================================
// Toolset resolution
// ============================================================================

#[test]
fn test_schemas_for_keeps_toolset_order() {
    let registry = ToolRegistry::with_builtin_tools().unwrap();
    let toolset = vec![
        "roll_dice".to_owned(),
        "get_current_utc_datetime".to_owned(),
    ];

    let schemas = registry.schemas_for(&toolset).unwrap();

    let names: Vec<&str> = schemas.iter().map(ToolSchema::name).collect();
    assert_eq!(names, vec!["roll_dice", "get_current_utc_datetime"]);
}

#[test]
fn test_schemas_for_unknown_tool_is_not_found() {
    let registry = ToolRegistry::with_builtin_tools().unwrap();

    let error = registry
        .schemas_for(&["launch_rocket".to_owned()])
        .unwrap_err();

    assert_eq!(error, ToolError::not_found("launch_rocket"));
}

#[test]
fn test_model_facing_schema_hides_context_parameters() {
    let facing = search_schema().model_facing();

    assert!(facing.parameters.properties.contains_key("query"));
    assert!(!facing.parameters.properties.contains_key("chat_id"));
    let json = serde_json::to_value(&facing).unwrap();
    assert!(json.get("tool_id").is_none());
}
