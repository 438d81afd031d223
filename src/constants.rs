// ABOUTME: Re-exports domain constants from the core crate
// ABOUTME: Turn, retrieval, tool, and LLM defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

pub use magenta_core::constants::{llm, retrieval, service_names, tools, turn};
