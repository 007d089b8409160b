//! Status reducer: maps bot status notifications to persisted record
//! mutations and registry retention decisions.
//!
//! Non-terminal statuses keep the bot registered; terminal statuses evict
//! and destroy it. Terminal eviction happens even when the final save fails
//! (after one retry), so no bot is ever left orphaned in the registry by a
//! store outage.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::Shared;
use crate::bot::{BotStatus, StatusEvent};
use crate::records::RecordStatus;

pub(super) async fn run(shared: Arc<Shared>, mut status_rx: mpsc::Receiver<StatusEvent>) {
    while let Some(event) = status_rx.recv().await {
        apply(&shared, event, Utc::now()).await;
    }
    tracing::debug!("status channel closed; reducer stopped");
}

/// Apply one status notification.
pub(super) async fn apply(shared: &Shared, event: StatusEvent, now: DateTime<Utc>) {
    tracing::debug!(id = %event.id, status = %event.status, "status event");

    match event.status {
        // Nothing persisted; the record already reflects its initial state.
        BotStatus::New => {}

        BotStatus::Captcha => {
            persist(shared, &event, RecordStatus::Captcha, "", now).await;
        }

        BotStatus::Initialized | BotStatus::InProgress => {
            persist(shared, &event, RecordStatus::InProgress, "", now).await;
        }

        BotStatus::Successful | BotStatus::OutOfDate | BotStatus::Failed => {
            let status = match event.status {
                BotStatus::Successful => RecordStatus::Successful,
                BotStatus::OutOfDate => RecordStatus::OutOfDate,
                _ => RecordStatus::Failed,
            };
            finish(shared, &event, status, now).await;
        }
    }
}

/// Persist a non-terminal transition. Failure is logged and the bot stays
/// registered; no rollback.
async fn persist(
    shared: &Shared,
    event: &StatusEvent,
    status: RecordStatus,
    message: &str,
    now: DateTime<Utc>,
) {
    if let Err(e) = shared
        .store
        .update_status(event.kind, event.id, status, message, now)
        .await
    {
        tracing::error!(id = %event.id, %status, error = %e, "status save failed");
    }
}

/// Persist a terminal transition and evict the bot.
///
/// The save is retried once on failure; the bot is unregistered and
/// destroyed regardless of the save outcome.
async fn finish(shared: &Shared, event: &StatusEvent, status: RecordStatus, now: DateTime<Utc>) {
    let save = shared
        .store
        .update_status(event.kind, event.id, status, &event.message, now)
        .await;
    if let Err(e) = save {
        tracing::error!(id = %event.id, %status, error = %e, "terminal status save failed; retrying once");
        if let Err(e) = shared
            .store
            .update_status(event.kind, event.id, status, &event.message, now)
            .await
        {
            tracing::error!(id = %event.id, %status, error = %e, "terminal status retry failed; evicting bot anyway");
        }
    }

    match shared.registry.unregister(event.id).await {
        Some(bot) => {
            if let Err(e) = bot.destroy().await {
                tracing::warn!(id = %event.id, error = %e, "bot teardown failed");
            }
            tracing::info!(id = %event.id, %status, message = %event.message, "bot finished");
        }
        None => {
            // Late notification from an already-evicted bot; dropped.
            tracing::debug!(id = %event.id, "terminal event for unregistered bot dropped");
        }
    }
}
