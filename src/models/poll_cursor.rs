//! # Watermark Cursor
//!
//! The persisted "resume point" for a poll stream. One row per logical stream,
//! created on first poll, mutated exactly once per cycle, never deleted.
//! `next_start_time` is monotonically non-decreasing across successful cycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Watermark cursor for one poll stream.
/// Maps to the `poll_cursors` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PollCursor {
    /// Unique poll identity
    pub name: String,
    /// Start of the next extraction window
    pub next_start_time: DateTime<Utc>,
    /// Number of records fetched by the last cycle
    pub record_count: i32,
}

impl PollCursor {
    /// Fresh cursor at a bootstrap start time
    pub fn bootstrap(name: impl Into<String>, next_start_time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            next_start_time,
            record_count: 0,
        }
    }

    /// Cursor advanced to a new start time with the cycle's fetch count
    pub fn advanced(&self, next_start_time: DateTime<Utc>, record_count: i32) -> Self {
        Self {
            name: self.name.clone(),
            next_start_time,
            record_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_bootstrap_has_zero_record_count() {
        let start = Utc.with_ymd_and_hms(2021, 6, 8, 12, 0, 0).unwrap();
        let cursor = PollCursor::bootstrap("prison-events", start);
        assert_eq!(cursor.record_count, 0);
        assert_eq!(cursor.next_start_time, start);
    }

    #[test]
    fn test_advanced_keeps_name() {
        let start = Utc.with_ymd_and_hms(2021, 6, 8, 12, 0, 0).unwrap();
        let cursor = PollCursor::bootstrap("prison-events", start);
        let later = start + chrono::Duration::minutes(5);
        let advanced = cursor.advanced(later, 42);
        assert_eq!(advanced.name, "prison-events");
        assert_eq!(advanced.next_start_time, later);
        assert_eq!(advanced.record_count, 42);
    }
}
