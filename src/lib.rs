//! Fairway: tee-time booking bot orchestrator.
//!
//! The crate coordinates a pool of long-running automation bots, each
//! executing one booking-related task: reserve a slot on its launch date,
//! or watch a date range for a cancellation opening. The orchestrator
//! discovers eligible work items on a fixed cadence, keeps at most one
//! active bot per item, reduces bot status notifications into persisted
//! record mutations, restarts stalled bots, and tears bots down on terminal
//! outcomes.
//!
//! Booking business logic, the browser automation itself, and storage are
//! external: embedders supply [`BotFactory`], [`BrowserRuntime`],
//! [`RecordStore`] and [`SettingsProvider`] implementations and get back a
//! [`Controller`].

pub mod bot;
pub mod error;
pub mod orchestrator;
pub mod records;
pub mod runtime;
pub mod settings;
pub mod store;

pub use bot::registry::Registry;
pub use bot::{Bot, BotFactory, BotStatus, StatusEvent};
pub use error::{
    BotError, OrchestratorError, RegistryError, RuntimeError, SettingsError, StoreError,
};
pub use orchestrator::{Controller, Orchestrator, OrchestratorDeps, REFRESH_INTERVAL};
pub use records::{
    Account, BookingSchedule, CancellationWatch, RecordStatus, WorkItem, WorkItemKind,
};
pub use runtime::BrowserRuntime;
pub use settings::{Settings, SettingsProvider};
pub use store::{MemoryStore, RecordStore};
