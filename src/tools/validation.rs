// ABOUTME: Schema and signature checks run when a batch of tools is loaded
// ABOUTME: Every mismatch is reported as a message prefixed with the function name
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use url::Url;

use super::traits::ParamSpec;
use crate::models::{ParameterType, ToolKind, ToolSchema};

/// Structural checks that do not need an implementation
#[must_use]
pub fn validate_declaration(schema: &ToolSchema) -> Vec<String> {
    let name = schema.name();
    let parameters = &schema.function.parameters;
    let mut errors = Vec::new();

    if name.is_empty() {
        errors.push(format!("Tool '{}' has an empty function name.", schema.tool_id));
    }

    for required in &parameters.required {
        if !parameters.properties.contains_key(required) && !schema.is_context_parameter(required)
        {
            errors.push(format!(
                "{name}: Required parameter '{required}' is not a declared property."
            ));
        }
    }

    for (param, property) in &parameters.properties {
        if schema.is_context_parameter(param) {
            errors.push(format!(
                "{name}: Context parameter '{param}' is also declared as a property."
            ));
        }
        if property.param_type == ParameterType::Array {
            let items_are_strings = property
                .items
                .as_ref()
                .is_some_and(|items| items.param_type == ParameterType::String);
            if !items_are_strings {
                errors.push(format!(
                    "{name}: Parameter '{param}' is defined as 'array' but its items are not strings."
                ));
            }
        }
    }

    if schema.kind == ToolKind::External {
        match schema.url.as_deref().map(Url::parse) {
            None => errors.push(format!("{name}: External tool has no url.")),
            Some(Err(e)) => errors.push(format!("{name}: External tool url is invalid: {e}.")),
            Some(Ok(_)) => {}
        }
        if schema.method.is_none() {
            errors.push(format!("{name}: External tool has no HTTP method."));
        }
    }

    errors
}

/// Compare a local implementation's signature with its declared schema
#[must_use]
pub fn validate_signature(schema: &ToolSchema, signature: &[ParamSpec]) -> Vec<String> {
    let name = schema.name();
    let parameters = &schema.function.parameters;
    let mut errors = Vec::new();

    for param in parameters.properties.keys() {
        if !signature.iter().any(|spec| &spec.name == param) {
            errors.push(format!("{name}: Parameter '{param}' is defined but missing."));
        }
    }

    for context in &schema.context_parameters {
        if !signature.iter().any(|spec| spec.name == context.name) {
            errors.push(format!(
                "{name}: Context parameter '{}' is defined but missing.",
                context.name
            ));
        }
    }

    for spec in signature {
        let is_context = schema.is_context_parameter(&spec.name);
        let declared_type = parameters
            .properties
            .get(&spec.name)
            .map(|property| property.param_type)
            .or_else(|| {
                schema
                    .context_parameters
                    .iter()
                    .find(|c| c.name == spec.name)
                    .map(|c| c.param_type)
            });

        let Some(declared_type) = declared_type else {
            errors.push(format!(
                "{name}: Function parameter '{}' is not defined.",
                spec.name
            ));
            continue;
        };

        if declared_type != spec.param_type {
            errors.push(format!(
                "{name}: Parameter '{}' is defined as '{declared_type}' but the implementation takes '{}'.",
                spec.name, spec.param_type
            ));
        }

        if is_context {
            continue;
        }

        let marked_required = parameters.required.contains(&spec.name);
        if !spec.has_default && !marked_required {
            errors.push(format!(
                "{name}: Required parameter '{}' is not marked as required.",
                spec.name
            ));
        } else if spec.has_default && marked_required {
            errors.push(format!(
                "{name}: Optional parameter '{}' is marked as required.",
                spec.name
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContextParameter, FunctionSpec, HttpMethod, ParameterSchema};

    fn dice_schema() -> ToolSchema {
        ToolSchema::function(
            "rolldice",
            FunctionSpec::new("roll_dice", "Roll a dice with d sides").with_parameter(
                "d",
                ParameterSchema::new(ParameterType::Integer, "Number of sides"),
                true,
            ),
        )
    }

    #[test]
    fn test_matching_signature_has_no_errors() {
        let errors = validate_signature(
            &dice_schema(),
            &[ParamSpec::required("d", ParameterType::Integer)],
        );
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_type_and_required_mismatches_are_reported() {
        let errors = validate_signature(
            &dice_schema(),
            &[ParamSpec::optional("d", ParameterType::String)],
        );
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].contains("defined as 'integer'"));
        assert!(errors[1].contains("Optional parameter 'd' is marked as required."));
    }

    #[test]
    fn test_missing_and_undefined_parameters() {
        let errors = validate_signature(
            &dice_schema(),
            &[ParamSpec::required("sides", ParameterType::Integer)],
        );
        assert!(errors.contains(&"roll_dice: Parameter 'd' is defined but missing.".to_owned()));
        assert!(errors
            .contains(&"roll_dice: Function parameter 'sides' is not defined.".to_owned()));
    }

    #[test]
    fn test_context_parameters_are_exempt_from_required_flags() {
        let schema = dice_schema().with_context_parameter(ContextParameter::string("chat_id"));
        let errors = validate_signature(
            &schema,
            &[
                ParamSpec::required("d", ParameterType::Integer),
                ParamSpec::required("chat_id", ParameterType::String),
            ],
        );
        assert!(errors.is_empty(), "{errors:?}");

        let errors = validate_signature(&schema, &[ParamSpec::required("d", ParameterType::Integer)]);
        assert_eq!(
            errors,
            vec!["roll_dice: Context parameter 'chat_id' is defined but missing.".to_owned()]
        );
    }

    #[test]
    fn test_declaration_checks() {
        let schema = ToolSchema::function(
            "bad",
            FunctionSpec::new("bad", "bad")
                .with_parameter(
                    "tags",
                    ParameterSchema::new(ParameterType::Array, "no items"),
                    true,
                )
                .with_parameter(
                    "chat_id",
                    ParameterSchema::new(ParameterType::String, "chat"),
                    false,
                ),
        )
        .with_context_parameter(ContextParameter::string("chat_id"));

        let errors = validate_declaration(&schema);
        assert_eq!(errors.len(), 2, "{errors:?}");

        let external = ToolSchema::external(
            "ext",
            FunctionSpec::new("ext", "external"),
            "not a url",
            HttpMethod::Get,
        );
        assert_eq!(validate_declaration(&external).len(), 1);
    }
}
