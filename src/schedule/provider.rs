//! Schedule record sources.
//!
//! A provider is a read-only view over an ordered list of calendar entries.
//! The bot never mutates the underlying schedule; it only counts and reads.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// One calendar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// Date label, e.g. `"Monday"` or `"2026-09-01"`.
    pub date: String,
    /// Time label, e.g. `"10:30"`.
    pub time: String,
    /// What is happening.
    pub event: String,
}

impl ScheduleRecord {
    pub fn new(
        date: impl Into<String>,
        time: impl Into<String>,
        event: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            event: event.into(),
        }
    }
}

impl fmt::Display for ScheduleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "on {} at {} you have {}", self.date, self.time, self.event)
    }
}

/// Read-only source of schedule records.
#[async_trait]
pub trait ScheduleProvider: Send + Sync {
    /// Declared number of entries. A value of zero or less means the
    /// schedule is empty.
    async fn total_entries(&self) -> Result<i64, ProviderError>;

    /// Fetch the record at `index` (zero-based).
    async fn record_at(&self, index: i64) -> Result<ScheduleRecord, ProviderError>;
}

// ── In-memory provider ───────────────────────────────────────────────────

/// Fixed in-memory schedule. The default source when no schedule file is
/// configured, and the workhorse for tests.
#[derive(Debug, Clone)]
pub struct InMemorySchedule {
    records: Vec<ScheduleRecord>,
    declared_total: Option<i64>,
}

impl InMemorySchedule {
    pub fn new(records: Vec<ScheduleRecord>) -> Self {
        Self {
            records,
            declared_total: None,
        }
    }

    /// Override the declared total independently of how many records exist.
    /// Lets tests model sources whose header count disagrees with the data.
    pub fn with_declared_total(records: Vec<ScheduleRecord>, total: i64) -> Self {
        Self {
            records,
            declared_total: Some(total),
        }
    }

    /// A small demo schedule.
    pub fn sample() -> Self {
        Self::new(vec![
            ScheduleRecord::new("Monday", "09:00", "the weekly planning meeting"),
            ScheduleRecord::new("Tuesday", "10:30", "a dentist appointment"),
            ScheduleRecord::new("Wednesday", "12:00", "lunch with Sam"),
            ScheduleRecord::new("Thursday", "15:00", "a design review"),
            ScheduleRecord::new("Friday", "17:30", "nothing, go home early"),
        ])
    }
}

#[async_trait]
impl ScheduleProvider for InMemorySchedule {
    async fn total_entries(&self) -> Result<i64, ProviderError> {
        Ok(self
            .declared_total
            .unwrap_or(self.records.len() as i64))
    }

    async fn record_at(&self, index: i64) -> Result<ScheduleRecord, ProviderError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.records.get(i))
            .cloned()
            .ok_or(ProviderError::OutOfRange {
                index,
                total: self.records.len() as i64,
            })
    }
}

// ── JSON file provider ───────────────────────────────────────────────────

/// Schedule file layout: a declared total plus the entry list.
#[derive(Debug, Deserialize)]
struct ScheduleFile {
    total: i64,
    #[serde(alias = "Entries")]
    entries: Vec<ScheduleRecord>,
}

/// Schedule backed by a JSON file on disk.
///
/// The file is re-read on every call, so edits show up on the next turn
/// without restarting the bot.
#[derive(Debug, Clone)]
pub struct JsonFileSchedule {
    path: PathBuf,
}

impl JsonFileSchedule {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<ScheduleFile, ProviderError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        serde_json::from_str(&raw).map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl ScheduleProvider for JsonFileSchedule {
    async fn total_entries(&self) -> Result<i64, ProviderError> {
        Ok(self.load().await?.total)
    }

    async fn record_at(&self, index: i64) -> Result<ScheduleRecord, ProviderError> {
        let file = self.load().await?;
        usize::try_from(index)
            .ok()
            .and_then(|i| file.entries.get(i))
            .cloned()
            .ok_or(ProviderError::OutOfRange {
                index,
                total: file.entries.len() as i64,
            })
    }
}
