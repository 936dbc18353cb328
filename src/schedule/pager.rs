//! Cursor-driven paging over a schedule provider.

use std::sync::Arc;

use tracing::debug;

use crate::error::ProviderError;
use crate::schedule::provider::{ScheduleProvider, ScheduleRecord};

/// Outcome of advancing the read window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAdvance {
    /// Records fetched by this advance, in schedule order.
    pub records: Vec<ScheduleRecord>,
    /// Cursor after the advance. Callers persist this only when the window
    /// was not exhausted; an exhausted pass leaves the stored cursor alone.
    pub cursor: i64,
    /// True when the advance ran past the declared total before filling
    /// the window.
    pub exhausted: bool,
}

/// Pages through a schedule a fixed number of entries at a time.
///
/// The cursor is the index of the last entry already read, so a fresh
/// conversation starts from `-1` and the first advance reads index `0`.
pub struct SchedulePager {
    provider: Arc<dyn ScheduleProvider>,
    window: usize,
}

impl SchedulePager {
    pub fn new(provider: Arc<dyn ScheduleProvider>, window: usize) -> Self {
        Self { provider, window }
    }

    /// Whether the declared total marks the schedule as empty.
    pub async fn is_empty(&self) -> Result<bool, ProviderError> {
        Ok(self.provider.total_entries().await? <= 0)
    }

    /// Advance one full window from `cursor`.
    pub async fn advance(&self, cursor: i64) -> Result<WindowAdvance, ProviderError> {
        self.advance_by(cursor, self.window).await
    }

    /// Advance up to `window` entries from `cursor`.
    ///
    /// Each slot bumps the cursor first and then checks it against the
    /// declared total, so entries past the end are never fetched. Stopping
    /// early marks the advance exhausted; the partial window is still
    /// returned for reading out.
    pub async fn advance_by(
        &self,
        cursor: i64,
        window: usize,
    ) -> Result<WindowAdvance, ProviderError> {
        let total = self.provider.total_entries().await?;
        let mut cursor = cursor;
        let mut records = Vec::with_capacity(window);
        let mut exhausted = false;

        for _ in 0..window {
            cursor += 1;
            if cursor >= total {
                exhausted = true;
                break;
            }
            records.push(self.provider.record_at(cursor).await?);
        }

        debug!(
            cursor,
            total,
            emitted = records.len(),
            exhausted,
            "Advanced schedule window"
        );
        Ok(WindowAdvance {
            records,
            cursor,
            exhausted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::provider::InMemorySchedule;

    fn records(n: usize) -> Vec<ScheduleRecord> {
        (0..n)
            .map(|i| ScheduleRecord::new(format!("day-{i}"), "10:00", format!("event-{i}")))
            .collect()
    }

    fn pager(n: usize) -> SchedulePager {
        SchedulePager::new(Arc::new(InMemorySchedule::new(records(n))), 3)
    }

    #[tokio::test]
    async fn first_page_reads_exactly_one_entry() {
        let advance = pager(5).advance_by(-1, 1).await.unwrap();
        assert_eq!(advance.records.len(), 1);
        assert_eq!(advance.records[0].event, "event-0");
        assert_eq!(advance.cursor, 0);
        assert!(!advance.exhausted);
    }

    #[tokio::test]
    async fn full_window_advances_three_entries() {
        let advance = pager(7).advance(0).await.unwrap();
        let events: Vec<&str> = advance.records.iter().map(|r| r.event.as_str()).collect();
        assert_eq!(events, ["event-1", "event-2", "event-3"]);
        assert_eq!(advance.cursor, 3);
        assert!(!advance.exhausted);
    }

    #[tokio::test]
    async fn exhaustion_mid_window_returns_partial_page() {
        // Two entries total, entry 0 already read.
        let advance = pager(2).advance(0).await.unwrap();
        let events: Vec<&str> = advance.records.iter().map(|r| r.event.as_str()).collect();
        assert_eq!(events, ["event-1"]);
        assert!(advance.exhausted);
    }

    #[tokio::test]
    async fn window_landing_exactly_on_total_is_not_exhausted() {
        // Entries 1..=3 exist, the window fills completely.
        let advance = pager(4).advance(0).await.unwrap();
        assert_eq!(advance.records.len(), 3);
        assert!(!advance.exhausted);
        assert_eq!(advance.cursor, 3);

        // The next advance finds nothing and exhausts on its first slot.
        let next = pager(4).advance(3).await.unwrap();
        assert!(next.records.is_empty());
        assert!(next.exhausted);
    }

    #[tokio::test]
    async fn empty_and_negative_totals_exhaust_immediately() {
        for total in [0, -3] {
            let provider = InMemorySchedule::with_declared_total(records(2), total);
            let pager = SchedulePager::new(Arc::new(provider), 3);
            assert!(pager.is_empty().await.unwrap());
            let advance = pager.advance(-1).await.unwrap();
            assert!(advance.records.is_empty());
            assert!(advance.exhausted);
        }
    }

    #[tokio::test]
    async fn positive_cursor_against_empty_schedule_stays_in_bounds() {
        let provider = InMemorySchedule::with_declared_total(Vec::new(), 0);
        let pager = SchedulePager::new(Arc::new(provider), 3);
        // No out-of-range read is attempted; the advance just exhausts.
        let advance = pager.advance(5).await.unwrap();
        assert!(advance.records.is_empty());
        assert!(advance.exhausted);
    }

    #[tokio::test]
    async fn never_reads_past_declared_total() {
        // Declared total smaller than the record list caps the window.
        let provider = InMemorySchedule::with_declared_total(records(10), 2);
        let pager = SchedulePager::new(Arc::new(provider), 3);
        let advance = pager.advance(-1).await.unwrap();
        let events: Vec<&str> = advance.records.iter().map(|r| r.event.as_str()).collect();
        assert_eq!(events, ["event-0", "event-1"]);
        assert!(advance.exhausted);
    }
}
