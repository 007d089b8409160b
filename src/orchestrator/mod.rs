//! Bot lifecycle orchestrator.
//!
//! [`Orchestrator::create`] waits for the browser runtime's ready signal,
//! loads settings, and spawns two cooperative tasks: the poll cycle that
//! discovers eligible work items and dispatches bots, and the status reducer
//! that turns bot status notifications into persisted record mutations and
//! retention decisions. The returned [`Controller`] is the external control
//! surface.

mod poll;
mod reducer;

pub use poll::REFRESH_INTERVAL;

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::bot::registry::Registry;
use crate::bot::{BotFactory, StatusEvent};
use crate::error::{OrchestratorError, SettingsError};
use crate::runtime::BrowserRuntime;
use crate::settings::{Settings, SettingsProvider};
use crate::store::RecordStore;

/// Buffered status events before bot senders start awaiting.
const STATUS_CHANNEL_CAPACITY: usize = 64;

/// External collaborators the orchestrator is wired with.
pub struct OrchestratorDeps {
    pub store: Arc<dyn RecordStore>,
    pub factory: Arc<dyn BotFactory>,
    pub runtime: Arc<dyn BrowserRuntime>,
    pub settings: Arc<dyn SettingsProvider>,
}

/// State shared between the poll cycle, the reducer, and the controller.
pub(crate) struct Shared {
    pub(crate) registry: Registry,
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) factory: Arc<dyn BotFactory>,
    pub(crate) provider: Arc<dyn SettingsProvider>,
    /// Current snapshot; replaced wholesale on reload.
    pub(crate) settings: RwLock<Arc<Settings>>,
    pub(crate) status_tx: mpsc::Sender<StatusEvent>,
}

impl Shared {
    pub(crate) async fn current_settings(&self) -> Arc<Settings> {
        self.settings.read().await.clone()
    }
}

pub struct Orchestrator;

impl Orchestrator {
    /// Bootstrap the runtime and start the orchestrator.
    ///
    /// Bootstrap failure is fatal: the error is surfaced and nothing is
    /// spawned. After a successful return the poll cycle is live.
    pub async fn create(deps: OrchestratorDeps) -> Result<Controller, OrchestratorError> {
        deps.runtime.initialize().await?;

        let initial = deps.settings.current_settings(true).await?;
        tracing::info!(
            target_time = %initial.booking_target_date_time,
            start_before = initial.start_before,
            open_tee_times = initial.open_tee_times,
            "orchestrator starting"
        );

        let (status_tx, status_rx) = mpsc::channel(STATUS_CHANNEL_CAPACITY);
        let shared = Arc::new(Shared {
            registry: Registry::new(),
            store: deps.store,
            factory: deps.factory,
            provider: deps.settings,
            settings: RwLock::new(Arc::new(initial)),
            status_tx,
        });

        let reducer_task = tokio::spawn(reducer::run(Arc::clone(&shared), status_rx));
        let poll_task = tokio::spawn(poll::run(Arc::clone(&shared)));

        Ok(Controller {
            shared,
            poll_task,
            reducer_task,
        })
    }
}

/// Control surface over a running orchestrator.
pub struct Controller {
    shared: Arc<Shared>,
    poll_task: JoinHandle<()>,
    reducer_task: JoinHandle<()>,
}

impl Controller {
    /// Fetch a fresh settings snapshot (bypassing any cache) and hand it to
    /// every active bot. Bots are not reconstructed.
    pub async fn reload_settings(&self) -> Result<(), SettingsError> {
        let fresh = Arc::new(self.shared.provider.current_settings(true).await?);
        *self.shared.settings.write().await = Arc::clone(&fresh);

        for bot in self.shared.registry.all().await {
            bot.set_settings(Arc::clone(&fresh)).await;
        }
        tracing::info!("settings reloaded");
        Ok(())
    }

    /// Unregister and asynchronously destroy the bot for `id`.
    ///
    /// Absent identity is a silent no-op, so repeated calls are harmless.
    pub async fn delete_bot(&self, id: Uuid) {
        let Some(bot) = self.shared.registry.unregister(id).await else {
            return;
        };
        tracing::info!(%id, "deleting bot");
        tokio::spawn(async move {
            if let Err(e) = bot.destroy().await {
                tracing::warn!(%id, error = %e, "bot teardown failed");
            }
        });
    }

    /// Number of currently active bots.
    pub async fn active_bots(&self) -> usize {
        self.shared.registry.len().await
    }

    /// Stop the poll and reducer tasks and destroy every remaining bot.
    pub async fn shutdown(self) {
        self.poll_task.abort();
        self.reducer_task.abort();

        for bot in self.shared.registry.drain().await {
            let id = bot.id();
            if let Err(e) = bot.destroy().await {
                tracing::warn!(%id, error = %e, "bot teardown failed during shutdown");
            }
        }
        tracing::info!("orchestrator stopped");
    }
}
