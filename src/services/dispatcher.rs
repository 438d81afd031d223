// ABOUTME: Background dispatch of turns with task tracking, cancellation, and a whole-turn timeout
// ABOUTME: Accepts a turn, records it as pending, and returns a pollable task immediately
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, info_span, warn, Instrument};

use super::turn_orchestration::{TurnOrchestrator, TurnOutcome, TurnRequest};
use crate::database::DatabaseProvider;
use crate::errors::{AppError, AppResult};
use crate::models::{StatusRecord, TaskStatus};

/// Pollable view of a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Turn id
    pub task_id: String,
    /// Latest status
    pub status: TaskStatus,
    /// Failure detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Reply, only for synchronous dry runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl Task {
    /// A turn accepted for background processing
    #[must_use]
    pub fn pending(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Pending,
            error: None,
            result: None,
        }
    }
}

impl From<&StatusRecord> for Task {
    fn from(record: &StatusRecord) -> Self {
        Self {
            task_id: record.message_id.clone(),
            status: record.status,
            error: record.error.clone(),
            result: None,
        }
    }
}

impl From<TurnOutcome> for Task {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            task_id: outcome.message_id,
            status: outcome.status,
            error: None,
            result: outcome.reply,
        }
    }
}

/// Runs turns as tracked background tasks
pub struct TurnDispatcher {
    orchestrator: Arc<TurnOrchestrator>,
    database: Arc<dyn DatabaseProvider>,
    cancel: CancellationToken,
    tracker: TaskTracker,
    turn_timeout: Duration,
}

impl TurnDispatcher {
    /// Create a dispatcher; `turn_timeout` bounds each whole turn
    #[must_use]
    pub fn new(orchestrator: Arc<TurnOrchestrator>, turn_timeout: Duration) -> Self {
        let database = Arc::clone(orchestrator.database());
        Self {
            orchestrator,
            database,
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            turn_timeout,
        }
    }

    /// The orchestrator turns run on
    #[must_use]
    pub const fn orchestrator(&self) -> &Arc<TurnOrchestrator> {
        &self.orchestrator
    }

    /// Number of turns still running
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Accept a turn.
    ///
    /// Dry runs are processed inline and return the completed task with the
    /// canned reply. Every other turn is recorded as `pending` and spawned.
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown conversation, already-exists for a
    /// reused message id, and a cancelled error while shutting down.
    pub async fn submit(&self, request: TurnRequest) -> AppResult<Task> {
        if self.cancel.is_cancelled() {
            return Err(AppError::cancelled("Dispatcher is shutting down"));
        }

        let chat = self
            .database
            .get_chat(&request.chat_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Chat '{}'", request.chat_id)))?;
        if chat.status_for(&request.message_id).is_some() {
            return Err(AppError::already_exists(format!(
                "Turn '{}'",
                request.message_id
            )));
        }

        if request.dry_run {
            let outcome = self
                .orchestrator
                .process_turn(request, self.cancel.child_token())
                .await?;
            return Ok(outcome.into());
        }

        self.database
            .append_status(
                &request.chat_id,
                &StatusRecord::new(&request.message_id, TaskStatus::Pending),
            )
            .await?;

        let task = Task::pending(&request.message_id);
        let span = info_span!("turn_task", chat_id = %request.chat_id, message_id = %request.message_id);
        let orchestrator = Arc::clone(&self.orchestrator);
        let cancel = self.cancel.child_token();
        let timeout = self.turn_timeout;

        self.tracker.spawn(
            async move {
                let chat_id = request.chat_id.clone();
                let message_id = request.message_id.clone();
                match tokio::time::timeout(timeout, orchestrator.process_turn(request, cancel)).await
                {
                    Ok(Ok(_)) => debug!("Background turn finished"),
                    Ok(Err(e)) => debug!(error = %e, "Background turn ended with an error"),
                    Err(_) => {
                        let error = AppError::timeout("Turn", timeout.as_secs());
                        warn!(error = %error, "Turn exceeded its time budget");
                        orchestrator.fail_turn(&chat_id, &message_id, &error).await;
                    }
                }
            }
            .instrument(span),
        );

        Ok(task)
    }

    /// Cancel outstanding turns and wait for them to record their final status
    pub async fn shutdown(&self) {
        info!(in_flight = self.tracker.len(), "Shutting down turn dispatcher");
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}
