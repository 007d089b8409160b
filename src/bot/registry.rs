//! In-memory registry of active bots, keyed by work item identity.
//!
//! The registry is the at-most-one-bot-per-identity guarantee: registration
//! of a duplicate identity fails instead of replacing. It is owned by one
//! orchestrator instance and shared by `Arc` with the poll and reducer
//! tasks; access is guarded because those run on a multi-threaded runtime.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::bot::Bot;
use crate::error::RegistryError;

/// Identity-keyed set of active bots. No iteration-order guarantee.
#[derive(Default)]
pub struct Registry {
    bots: RwLock<HashMap<Uuid, Arc<dyn Bot>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bot under its work item identity.
    ///
    /// Fails with [`RegistryError::DuplicateIdentity`] if a bot is already
    /// registered for that identity; the existing bot is untouched.
    pub async fn register(&self, bot: Arc<dyn Bot>) -> Result<(), RegistryError> {
        let id = bot.id();
        let mut bots = self.bots.write().await;
        match bots.entry(id) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateIdentity(id)),
            Entry::Vacant(slot) => {
                slot.insert(bot);
                Ok(())
            }
        }
    }

    /// Remove and return the bot for `id`. Absent identity is a no-op.
    pub async fn unregister(&self, id: Uuid) -> Option<Arc<dyn Bot>> {
        self.bots.write().await.remove(&id)
    }

    /// Look up the bot for `id`.
    pub async fn find(&self, id: Uuid) -> Option<Arc<dyn Bot>> {
        self.bots.read().await.get(&id).cloned()
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.bots.read().await.contains_key(&id)
    }

    /// Snapshot of all currently active bots.
    pub async fn all(&self) -> Vec<Arc<dyn Bot>> {
        self.bots.read().await.values().cloned().collect()
    }

    /// Remove and return every registered bot.
    pub async fn drain(&self) -> Vec<Arc<dyn Bot>> {
        self.bots.write().await.drain().map(|(_, bot)| bot).collect()
    }

    pub async fn len(&self) -> usize {
        self.bots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bots.read().await.is_empty()
    }
}
