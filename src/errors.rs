// ABOUTME: Re-exports the unified error types from the core crate
// ABOUTME: Keeps `crate::errors` paths stable for the server modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! # Unified Error Handling System
//!
//! See `magenta_core::errors` for the definitions.

pub use magenta_core::errors::{
    AppError, AppResult, ErrorCode, ErrorContext, ErrorResponse, ErrorResponseDetails,
    RegistryValidationError, ToolError,
};
