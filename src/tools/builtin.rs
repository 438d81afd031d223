// ABOUTME: Built-in local tools shipped with the runtime: UTC clock and dice roller
// ABOUTME: Registered through the same validation path as any other local tool
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde_json::{Map, Value};

use super::traits::{LocalTool, ParamSpec};
use crate::errors::ToolError;
use crate::models::{FunctionSpec, ParameterSchema, ParameterType, ToolSchema};

/// Returns the current UTC time as an ISO-8601 string
pub struct CurrentUtcDatetime;

impl CurrentUtcDatetime {
    /// Declared schema
    #[must_use]
    pub fn schema() -> ToolSchema {
        ToolSchema::function(
            "getcurrentutcdatetime",
            FunctionSpec::new("get_current_utc_datetime", "Get the current UTC datetime"),
        )
    }
}

#[async_trait]
impl LocalTool for CurrentUtcDatetime {
    fn name(&self) -> &'static str {
        "get_current_utc_datetime"
    }

    fn signature(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    async fn call(&self, _args: Map<String, Value>) -> Result<Value, ToolError> {
        Ok(Value::String(Utc::now().to_rfc3339()))
    }
}

/// Rolls a `d`-sided die
pub struct RollDice;

impl RollDice {
    /// Declared schema
    #[must_use]
    pub fn schema() -> ToolSchema {
        ToolSchema::function(
            "rolldice",
            FunctionSpec::new("roll_dice", "Roll a dice with d sides").with_parameter(
                "d",
                ParameterSchema::new(ParameterType::Integer, "Number of sides on the dice"),
                true,
            ),
        )
    }
}

#[async_trait]
impl LocalTool for RollDice {
    fn name(&self) -> &'static str {
        "roll_dice"
    }

    fn signature(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required("d", ParameterType::Integer)]
    }

    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let sides = args
            .get("d")
            .ok_or_else(|| ToolError::missing_parameter(self.name(), "d"))?
            .as_i64()
            .ok_or_else(|| ToolError::invalid_parameter(self.name(), "d", "must be an integer"))?;

        if sides < 1 {
            return Err(ToolError::invalid_parameter(
                self.name(),
                "d",
                format!("a die needs at least one side, got {sides}"),
            ));
        }

        let roll = rand::thread_rng().gen_range(1..=sides);
        Ok(Value::from(roll))
    }
}

/// Schemas and implementations of every built-in tool
#[must_use]
pub fn builtin_tools() -> (Vec<ToolSchema>, Vec<Arc<dyn LocalTool>>) {
    let implementations: Vec<Arc<dyn LocalTool>> =
        vec![Arc::new(CurrentUtcDatetime), Arc::new(RollDice)];
    (
        vec![CurrentUtcDatetime::schema(), RollDice::schema()],
        implementations,
    )
}
