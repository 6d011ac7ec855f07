//! # Watermark Poll Engine
//!
//! One poll cycle: load (or bootstrap) the cursor, compute the extraction
//! window behind the safety horizon, fetch, publish in ascending order,
//! advance the cursor. The fetch-publish-advance sequence is strictly
//! sequential: advancement depends on the maximum timestamp over the whole
//! window, and publish order must match event order for downstream consumers.
//!
//! A publish failure aborts the cycle with the cursor unmodified, so the same
//! window is retried next tick: at-least-once, duplicates tolerated
//! downstream.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::PrisonApi;
use crate::config::PollerConfig;
use crate::error::EventsResult;
use crate::logging::log_poll_cycle;
use crate::messaging::RawEventPublisher;
use crate::models::PollCursor;
use crate::poller::cursor_store::CursorStore;

/// One extraction window, inclusive start, exclusive end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Compute the next extraction window for a gated cycle.
///
/// `None` means the cursor has caught up with the safety horizon and nothing
/// is safe to fetch yet. Otherwise the window end is the horizon, capped at
/// `max_window` past the start to bound batch size after a long outage.
pub fn compute_window(
    next_start: DateTime<Utc>,
    now: DateTime<Utc>,
    wind_back: Duration,
    max_window: Duration,
) -> Option<PollWindow> {
    let safety_horizon = now - wind_back;
    if next_start >= safety_horizon {
        return None;
    }
    Some(PollWindow {
        start: next_start,
        end: (next_start + max_window).min(safety_horizon),
    })
}

/// The scheduled poll driver
pub struct WatermarkPollEngine {
    prison_api: Arc<dyn PrisonApi>,
    cursor_store: Arc<dyn CursorStore>,
    raw_publisher: RawEventPublisher,
    config: PollerConfig,
}

impl WatermarkPollEngine {
    pub fn new(
        prison_api: Arc<dyn PrisonApi>,
        cursor_store: Arc<dyn CursorStore>,
        raw_publisher: RawEventPublisher,
        config: PollerConfig,
    ) -> Self {
        Self {
            prison_api,
            cursor_store,
            raw_publisher,
            config,
        }
    }

    /// Run one main poll cycle; returns the number of events fetched
    pub async fn run_poll_cycle(&self) -> EventsResult<usize> {
        let poll_name = self.config.poll_name.clone();
        self.run_cycle(&poll_name, true, Utc::now()).await
    }

    /// Run one diagnostic poll cycle against a separate cursor. The identical
    /// windowing arithmetic applies, but the horizon skip rule does not: a
    /// fetch is always attempted. A shadow cursor mirrors the prior
    /// `next_start_time` before each advance, for external inspection.
    pub async fn run_test_polls(&self) -> EventsResult<usize> {
        let poll_name = self.config.diagnostic_poll_name.clone();
        let now = Utc::now();

        let cursor = self.load_or_bootstrap(&poll_name, now).await?;
        let shadow = PollCursor {
            name: format!("{poll_name}-previous"),
            next_start_time: cursor.next_start_time,
            record_count: cursor.record_count,
        };
        self.cursor_store.save(&shadow).await?;

        self.run_cycle(&poll_name, false, now).await
    }

    /// Run one cycle with an explicit clock, the testable core.
    /// `gated` applies the safety-horizon skip rule of the main stream.
    pub async fn run_cycle(
        &self,
        poll_name: &str,
        gated: bool,
        now: DateTime<Utc>,
    ) -> EventsResult<usize> {
        let cursor = self.load_or_bootstrap(poll_name, now).await?;

        let window = compute_window(
            cursor.next_start_time,
            now,
            self.config.wind_back(),
            self.config.max_window(),
        );

        let window = match (window, gated) {
            (Some(window), _) => window,
            (None, true) => {
                // Caught up: touch the cursor unchanged and stop, issuing no
                // source query this cycle
                self.cursor_store.save(&cursor).await?;
                log_poll_cycle(poll_name, None, None, 0, "caught_up");
                return Ok(0);
            }
            (None, false) => {
                // Diagnostic stream always attempts a fetch, clamped to an
                // empty range at the horizon
                let safety_horizon = now - self.config.wind_back();
                PollWindow {
                    start: cursor.next_start_time,
                    end: cursor.next_start_time.max(safety_horizon),
                }
            }
        };

        let events = self
            .prison_api
            .fetch_events(window.start, window.end)
            .await?;
        debug!(
            poll_name = %poll_name,
            fetched = events.len(),
            window_start = %window.start,
            window_end = %window.end,
            "Fetched source events"
        );

        // Strictly ascending publish; any failure propagates and leaves the
        // cursor where it was
        for event in &events {
            self.raw_publisher.publish(event).await?;
        }

        let next_start = match events.iter().map(|e| e.event_datetime).max() {
            // Source range queries are inclusive at both ends; the nudge
            // prevents re-fetching the boundary event
            Some(max_ts) => max_ts + Duration::microseconds(1),
            // Quiet window: advance to the window end so an empty range is
            // never re-scanned forever
            None => window.end,
        };

        let advanced = cursor.advanced(next_start, events.len() as i32);
        self.cursor_store.save(&advanced).await?;

        log_poll_cycle(
            poll_name,
            Some(&window.start.to_rfc3339()),
            Some(&window.end.to_rfc3339()),
            events.len(),
            "advanced",
        );
        Ok(events.len())
    }

    async fn load_or_bootstrap(
        &self,
        poll_name: &str,
        now: DateTime<Utc>,
    ) -> EventsResult<PollCursor> {
        if let Some(cursor) = self.cursor_store.load(poll_name).await? {
            return Ok(cursor);
        }

        let safety_horizon = now - self.config.wind_back();
        let cursor = PollCursor::bootstrap(
            poll_name,
            safety_horizon - self.config.bootstrap_lookback(),
        );
        self.cursor_store.save(&cursor).await?;
        info!(
            poll_name = %poll_name,
            next_start_time = %cursor.next_start_time,
            "🆕 Bootstrapped poll cursor"
        );
        Ok(cursor)
    }
}
