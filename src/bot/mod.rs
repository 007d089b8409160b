//! Bot trait, factory, and status notification types.
//!
//! A bot is the autonomous automation unit working one work item. Its
//! internals (browser control, CAPTCHA handling, the booking action itself)
//! are outside this crate; the orchestrator drives it through this narrow
//! lifecycle interface.

pub mod registry;
pub mod simulated;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::BotError;
use crate::records::{WorkItem, WorkItemKind};
use crate::settings::Settings;

/// Status a bot reports about its own progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    /// Constructed, nothing happened yet.
    New,
    /// Blocked on a CAPTCHA.
    Captcha,
    /// Finished setup, about to start working.
    Initialized,
    /// Actively working the item.
    InProgress,
    Successful,
    OutOfDate,
    Failed,
}

impl BotStatus {
    /// Terminal statuses end the bot's life.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Successful | Self::OutOfDate | Self::Failed)
    }
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Captcha => write!(f, "captcha"),
            Self::Initialized => write!(f, "initialized"),
            Self::InProgress => write!(f, "inprogress"),
            Self::Successful => write!(f, "successful"),
            Self::OutOfDate => write!(f, "outofdate"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A status change emitted by a bot.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    /// Work item identity (mirrors the record id).
    pub id: Uuid,
    /// Which collection the work item came from.
    pub kind: WorkItemKind,
    pub status: BotStatus,
    /// Free-form detail; persisted verbatim on terminal statuses.
    pub message: String,
}

impl StatusEvent {
    pub fn new(id: Uuid, kind: WorkItemKind, status: BotStatus, message: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            status,
            message: message.into(),
        }
    }
}

/// Handle to a running automation bot.
///
/// One instance per active work item. Bots emit [`StatusEvent`]s on the
/// sender they were constructed with and must not emit before
/// [`BotFactory::spawn`] has returned; the dispatcher registers the bot
/// before any of its events are consumed.
#[async_trait]
pub trait Bot: Send + Sync {
    /// Work item identity this bot is bound to.
    fn id(&self) -> Uuid;

    /// Which collection the bound work item came from.
    fn kind(&self) -> WorkItemKind;

    /// Replace the settings snapshot. Observed on the bot's next read;
    /// in-flight decisions made from the old snapshot are not revisited.
    async fn set_settings(&self, settings: Arc<Settings>);

    /// Tear the bot down. Idempotent; no events arrive after it resolves.
    async fn destroy(&self) -> Result<(), BotError>;
}

/// Constructs bots for newly observed work items.
#[async_trait]
pub trait BotFactory: Send + Sync {
    /// Build a bot bound to `record`, reporting on `status_tx`.
    async fn spawn(
        &self,
        record: &WorkItem,
        settings: Arc<Settings>,
        status_tx: mpsc::Sender<StatusEvent>,
    ) -> Result<Arc<dyn Bot>, BotError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(BotStatus::Successful.is_terminal());
        assert!(BotStatus::OutOfDate.is_terminal());
        assert!(BotStatus::Failed.is_terminal());
        assert!(!BotStatus::New.is_terminal());
        assert!(!BotStatus::Captcha.is_terminal());
        assert!(!BotStatus::Initialized.is_terminal());
        assert!(!BotStatus::InProgress.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&BotStatus::Initialized).unwrap(),
            "\"initialized\""
        );
        assert_eq!(
            serde_json::to_string(&BotStatus::OutOfDate).unwrap(),
            "\"outofdate\""
        );
    }
}
