// ABOUTME: Reply callback delivery after a turn completes
// ABOUTME: Webhook implementation posts the reply text and conversation context id as JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::errors::{AppError, AppResult};

const WEBHOOK_TIMEOUT_SECS: u64 = 15;

/// Receives final replies; failures never affect the persisted turn
#[async_trait]
pub trait ReplyCallback: Send + Sync {
    /// Deliver one reply
    async fn deliver(&self, text: &str, context_id: Option<&str>) -> AppResult<()>;
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
    context_id: Option<&'a str>,
}

/// Posts `{"text": ..., "context_id": ...}` to a fixed URL
pub struct WebhookCallback {
    client: Client,
    url: String,
}

impl WebhookCallback {
    /// Create a webhook callback
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(url: impl Into<String>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ReplyCallback for WebhookCallback {
    async fn deliver(&self, text: &str, context_id: Option<&str>) -> AppResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { text, context_id })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(
                "Webhook",
                format!("{} answered {status}", self.url),
            ));
        }
        debug!(url = %self.url, "Reply delivered");
        Ok(())
    }
}
