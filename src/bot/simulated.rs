//! Scripted bot for dry runs.
//!
//! Walks a fixed status script (initialized → inprogress → successful)
//! against the shared status channel, one step per `step_delay`. Lets
//! operators exercise window and cadence configuration without a browser
//! runtime; also handy in tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::bot::{Bot, BotFactory, BotStatus, StatusEvent};
use crate::error::BotError;
use crate::records::{WorkItem, WorkItemKind};
use crate::settings::Settings;

/// Spawns [`SimulatedBot`]s that walk a fixed script.
pub struct SimulatedBotFactory {
    /// Delay between scripted status steps.
    pub step_delay: Duration,
    /// Final status of the script.
    pub outcome: BotStatus,
    /// Message reported with the final status.
    pub outcome_message: String,
}

impl Default for SimulatedBotFactory {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_secs(1),
            outcome: BotStatus::Successful,
            outcome_message: "booked (simulated)".to_string(),
        }
    }
}

#[async_trait]
impl BotFactory for SimulatedBotFactory {
    async fn spawn(
        &self,
        record: &WorkItem,
        settings: Arc<Settings>,
        status_tx: mpsc::Sender<StatusEvent>,
    ) -> Result<Arc<dyn Bot>, BotError> {
        let id = record.id();
        let kind = record.kind();
        let script = [
            (BotStatus::Initialized, String::new()),
            (BotStatus::InProgress, String::new()),
            (self.outcome, self.outcome_message.clone()),
        ];
        let step_delay = self.step_delay;

        let task = tokio::spawn(async move {
            for (status, message) in script {
                tokio::time::sleep(step_delay).await;
                if status_tx
                    .send(StatusEvent::new(id, kind, status, message))
                    .await
                    .is_err()
                {
                    // Orchestrator is gone; nothing left to report to.
                    return;
                }
            }
        });

        Ok(Arc::new(SimulatedBot {
            id,
            kind,
            settings: RwLock::new(settings),
            task: Mutex::new(Some(task)),
        }))
    }
}

/// A bot that emits a pre-scripted status sequence.
pub struct SimulatedBot {
    id: Uuid,
    kind: WorkItemKind,
    settings: RwLock<Arc<Settings>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedBot {
    /// Current settings snapshot, for inspection.
    pub async fn settings(&self) -> Arc<Settings> {
        self.settings.read().await.clone()
    }
}

#[async_trait]
impl Bot for SimulatedBot {
    fn id(&self) -> Uuid {
        self.id
    }

    fn kind(&self) -> WorkItemKind {
        self.kind
    }

    async fn set_settings(&self, settings: Arc<Settings>) {
        *self.settings.write().await = settings;
    }

    async fn destroy(&self) -> Result<(), BotError> {
        if let Some(task) = self.task.lock().await.take() {
            task.abort();
        }
        Ok(())
    }
}
