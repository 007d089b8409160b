//! Work item records and their status vocabulary.
//!
//! A work item is one of two persisted record kinds: a [`BookingSchedule`]
//! (reserve a slot on its launch date) or a [`CancellationWatch`] (watch a
//! date range for an opening). The orchestrator only reads records and
//! requests status mutations through the store; it never owns them.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account a work item books on behalf of.
///
/// Resolved by the store alongside each record; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
}

/// Persisted status of a work item.
///
/// Exactly one current value per work item. The terminal statuses
/// (`successful`, `outofdate`, `failed`) are never left once entered; the
/// orchestrator destroys the item's bot upon reaching one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Booking waiting for its launch date.
    Pending,
    /// Cancellation watch inside its date range.
    Active,
    /// Bot is blocked on a CAPTCHA.
    Captcha,
    /// A bot is working the item.
    InProgress,
    Successful,
    OutOfDate,
    Failed,
}

impl RecordStatus {
    /// Whether this status finishes the work item.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Successful | Self::OutOfDate | Self::Failed)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
            Self::Captcha => write!(f, "captcha"),
            Self::InProgress => write!(f, "inprogress"),
            Self::Successful => write!(f, "successful"),
            Self::OutOfDate => write!(f, "outofdate"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Which collection a work item came from.
///
/// Carried by every bot so the reducer knows which collection to mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkItemKind {
    Booking,
    Watch,
}

impl fmt::Display for WorkItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Booking => write!(f, "booking"),
            Self::Watch => write!(f, "watch"),
        }
    }
}

/// A scheduled booking: reserve a slot when its launch date arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSchedule {
    pub id: Uuid,
    pub status: RecordStatus,
    pub status_message: String,
    pub status_time: DateTime<Utc>,
    /// Day the booking becomes actionable.
    pub launch_date: NaiveDate,
    pub account: Option<Account>,
}

/// A cancellation watch: monitor a date range for an opening.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationWatch {
    pub id: Uuid,
    pub status: RecordStatus,
    pub status_message: String,
    pub status_time: DateTime<Utc>,
    /// First day of the watched range.
    pub from_date: NaiveDate,
    /// Last day of the watched range.
    pub to_date: NaiveDate,
    pub account: Option<Account>,
}

/// A work item record, tagged by the collection it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WorkItem {
    Booking(BookingSchedule),
    Watch(CancellationWatch),
}

impl WorkItem {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Booking(b) => b.id,
            Self::Watch(w) => w.id,
        }
    }

    pub fn kind(&self) -> WorkItemKind {
        match self {
            Self::Booking(_) => WorkItemKind::Booking,
            Self::Watch(_) => WorkItemKind::Watch,
        }
    }

    pub fn status(&self) -> RecordStatus {
        match self {
            Self::Booking(b) => b.status,
            Self::Watch(w) => w.status,
        }
    }

    pub fn status_message(&self) -> &str {
        match self {
            Self::Booking(b) => &b.status_message,
            Self::Watch(w) => &w.status_message,
        }
    }

    pub fn status_time(&self) -> DateTime<Utc> {
        match self {
            Self::Booking(b) => b.status_time,
            Self::Watch(w) => w.status_time,
        }
    }

    pub fn account(&self) -> Option<&Account> {
        match self {
            Self::Booking(b) => b.account.as_ref(),
            Self::Watch(w) => w.account.as_ref(),
        }
    }

    /// Whether this record matched a query as a stalled `inprogress` item.
    pub fn is_stale(&self, stale_before: DateTime<Utc>) -> bool {
        self.status() == RecordStatus::InProgress && self.status_time() < stale_before
    }
}
