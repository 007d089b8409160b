//! Record store abstraction.
//!
//! The orchestrator never talks to a concrete database; it consumes this
//! trait. Implementations must resolve the related [`Account`] for every
//! record they return.
//!
//! [`Account`]: crate::records::Account

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::records::{RecordStatus, WorkItem, WorkItemKind};

/// Queryable store of booking and cancellation-watch records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Scheduled bookings eligible for dispatch:
    /// `(status == pending AND launch_date == today) OR
    ///  (status == inprogress AND status_time < stale_before)`.
    async fn due_bookings(
        &self,
        today: NaiveDate,
        stale_before: DateTime<Utc>,
    ) -> Result<Vec<WorkItem>, StoreError>;

    /// Cancellation watches eligible for dispatch:
    /// `(status == active AND from_date <= last_open_date AND to_date >= today)
    ///  OR (status == inprogress AND status_time < stale_before)`.
    async fn active_watches(
        &self,
        today: NaiveDate,
        last_open_date: NaiveDate,
        stale_before: DateTime<Utc>,
    ) -> Result<Vec<WorkItem>, StoreError>;

    /// Persist a status mutation on the work item in the given collection.
    async fn update_status(
        &self,
        kind: WorkItemKind,
        id: Uuid,
        status: RecordStatus,
        message: &str,
        status_time: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
