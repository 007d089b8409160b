//! Configuration snapshot and settings providers.
//!
//! [`Settings`] is a read-only value object: a reload replaces the whole
//! snapshot rather than mutating it in place. Active bots hold the snapshot
//! behind an `Arc` and observe a reload on their next read; decisions already
//! made from the old value are not revisited.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::SettingsError;

/// Grace period past the booking target time during which dispatch stays open.
const BOOKING_GRACE_MINUTES: i64 = 10;

/// Immutable-per-cycle orchestrator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Minutes after which an `inprogress` record counts as stalled.
    /// Defaults to 1 when unset.
    #[serde(default)]
    pub booking_interval: Option<i64>,
    /// Instant the venue releases new slots; bookings dispatch around it.
    pub booking_target_date_time: DateTime<Utc>,
    /// Minutes before the target time at which booking dispatch opens.
    pub start_before: i64,
    /// Days of lookahead the venue publishes open tee times for.
    pub open_tee_times: i64,
}

impl Settings {
    /// Timestamp before which an `inprogress` record is considered stalled.
    pub fn stale_before(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - TimeDelta::minutes(self.booking_interval.unwrap_or(1))
    }

    /// The booking dispatch window `[target - start_before, target + grace]`.
    pub fn booking_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.booking_target_date_time - TimeDelta::minutes(self.start_before),
            self.booking_target_date_time + TimeDelta::minutes(BOOKING_GRACE_MINUTES),
        )
    }

    /// Whether `now` falls inside the booking dispatch window.
    pub fn booking_window_contains(&self, now: DateTime<Utc>) -> bool {
        let (opens, closes) = self.booking_window();
        opens <= now && now <= closes
    }

    /// Last date still covered by the venue's published lookahead.
    pub fn last_open_date(&self, today: NaiveDate) -> NaiveDate {
        if self.open_tee_times >= 0 {
            today + Days::new(self.open_tee_times as u64)
        } else {
            today
        }
    }
}

/// Source of the current settings snapshot.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    /// Return the current settings. `force_reload` bypasses any cache.
    async fn current_settings(&self, force_reload: bool) -> Result<Settings, SettingsError>;
}

/// Settings backed by a TOML file, with a cached snapshot.
pub struct FileSettings {
    path: PathBuf,
    cached: RwLock<Option<Settings>>,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: RwLock::new(None),
        }
    }

    /// Default settings file location under the user config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fairway")
            .join("settings.toml")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsProvider for FileSettings {
    async fn current_settings(&self, force_reload: bool) -> Result<Settings, SettingsError> {
        if !force_reload {
            if let Some(settings) = self.cached.read().await.clone() {
                return Ok(settings);
            }
        }

        let raw = tokio::fs::read_to_string(&self.path).await?;
        let settings: Settings = toml::from_str(&raw)?;
        *self.cached.write().await = Some(settings.clone());
        Ok(settings)
    }
}

/// Settings held in memory. Used by the simulation harness and tests.
pub struct StaticSettings {
    current: RwLock<Settings>,
}

impl StaticSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            current: RwLock::new(settings),
        }
    }

    /// Replace the snapshot returned by subsequent loads.
    pub async fn set(&self, settings: Settings) {
        *self.current.write().await = settings;
    }
}

#[async_trait]
impl SettingsProvider for StaticSettings {
    async fn current_settings(&self, _force_reload: bool) -> Result<Settings, SettingsError> {
        Ok(self.current.read().await.clone())
    }
}
