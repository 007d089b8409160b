//! Error types for the orchestrator and its collaborators.

use uuid::Uuid;

/// Errors from the record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A read query could not be executed.
    #[error("query failed: {reason}")]
    QueryFailed { reason: String },

    /// A status mutation could not be persisted.
    #[error("persist failed for {id}: {reason}")]
    PersistFailed { id: Uuid, reason: String },

    /// The referenced work item does not exist.
    #[error("work item not found: {id}")]
    NotFound { id: Uuid },
}

/// Errors from settings retrieval.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings source could not be read.
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    /// Settings source could not be parsed.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// No settings source is available.
    #[error("no settings available: {reason}")]
    Unavailable { reason: String },
}

/// Errors from the browser runtime bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The automation runtime failed to come up.
    #[error("runtime startup failed: {reason}")]
    StartupFailed { reason: String },
}

/// Errors from bot construction and teardown.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// The bot could not be constructed for a work item.
    #[error("bot spawn failed for {id}: {reason}")]
    SpawnFailed { id: Uuid, reason: String },

    /// The bot's teardown did not complete cleanly.
    #[error("bot destroy failed for {id}: {reason}")]
    DestroyFailed { id: Uuid, reason: String },
}

/// Errors from the active-bot registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A bot is already registered for this work item.
    #[error("a bot is already registered for work item {0}")]
    DuplicateIdentity(Uuid),
}

/// Errors surfaced by orchestrator creation.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Bootstrap failed; the orchestrator never started.
    #[error(transparent)]
    Bootstrap(#[from] RuntimeError),

    /// The initial settings load failed.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
