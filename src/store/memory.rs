//! In-memory record store for the simulation harness and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::records::{BookingSchedule, CancellationWatch, RecordStatus, WorkItem, WorkItemKind};
use crate::store::RecordStore;

/// Record store backed by a pair of in-memory maps.
#[derive(Default)]
pub struct MemoryStore {
    bookings: RwLock<HashMap<Uuid, BookingSchedule>>,
    watches: RwLock<HashMap<Uuid, CancellationWatch>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub async fn insert(&self, item: WorkItem) {
        match item {
            WorkItem::Booking(b) => {
                self.bookings.write().await.insert(b.id, b);
            }
            WorkItem::Watch(w) => {
                self.watches.write().await.insert(w.id, w);
            }
        }
    }

    /// Look a record up across both collections.
    pub async fn get(&self, id: Uuid) -> Option<WorkItem> {
        if let Some(b) = self.bookings.read().await.get(&id) {
            return Some(WorkItem::Booking(b.clone()));
        }
        self.watches
            .read()
            .await
            .get(&id)
            .map(|w| WorkItem::Watch(w.clone()))
    }

    /// All records, both collections.
    pub async fn all(&self) -> Vec<WorkItem> {
        let mut items: Vec<WorkItem> = self
            .bookings
            .read()
            .await
            .values()
            .cloned()
            .map(WorkItem::Booking)
            .collect();
        items.extend(
            self.watches
                .read()
                .await
                .values()
                .cloned()
                .map(WorkItem::Watch),
        );
        items
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn due_bookings(
        &self,
        today: NaiveDate,
        stale_before: DateTime<Utc>,
    ) -> Result<Vec<WorkItem>, StoreError> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .values()
            .filter(|b| {
                (b.status == RecordStatus::Pending && b.launch_date == today)
                    || (b.status == RecordStatus::InProgress && b.status_time < stale_before)
            })
            .cloned()
            .map(WorkItem::Booking)
            .collect())
    }

    async fn active_watches(
        &self,
        today: NaiveDate,
        last_open_date: NaiveDate,
        stale_before: DateTime<Utc>,
    ) -> Result<Vec<WorkItem>, StoreError> {
        let watches = self.watches.read().await;
        Ok(watches
            .values()
            .filter(|w| {
                (w.status == RecordStatus::Active
                    && w.from_date <= last_open_date
                    && w.to_date >= today)
                    || (w.status == RecordStatus::InProgress && w.status_time < stale_before)
            })
            .cloned()
            .map(WorkItem::Watch)
            .collect())
    }

    async fn update_status(
        &self,
        kind: WorkItemKind,
        id: Uuid,
        status: RecordStatus,
        message: &str,
        status_time: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        match kind {
            WorkItemKind::Booking => {
                let mut bookings = self.bookings.write().await;
                let record = bookings.get_mut(&id).ok_or(StoreError::NotFound { id })?;
                record.status = status;
                record.status_message = message.to_string();
                record.status_time = status_time;
            }
            WorkItemKind::Watch => {
                let mut watches = self.watches.write().await;
                let record = watches.get_mut(&id).ok_or(StoreError::NotFound { id })?;
                record.status = status;
                record.status_message = message.to_string();
                record.status_time = status_time;
            }
        }
        Ok(())
    }
}
