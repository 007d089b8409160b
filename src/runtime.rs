//! Browser runtime bootstrap.
//!
//! The whole poll cycle is gated behind the automation runtime's one-shot
//! ready signal. If it fails, the orchestrator never starts and the failure
//! is surfaced to the caller; there is no retry.

use async_trait::async_trait;

use crate::error::RuntimeError;

/// One-shot bootstrap of the external automation runtime.
#[async_trait]
pub trait BrowserRuntime: Send + Sync {
    /// Resolves once the runtime is ready, or fails with a startup error.
    async fn initialize(&self) -> Result<(), RuntimeError>;
}

/// Runtime that is always ready. Used by the simulation harness.
pub struct ReadyRuntime;

#[async_trait]
impl BrowserRuntime for ReadyRuntime {
    async fn initialize(&self) -> Result<(), RuntimeError> {
        Ok(())
    }
}
