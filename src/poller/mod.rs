//! # Watermark Poll Engine
//!
//! The scheduled driver of the pipeline: computes the next extraction window
//! behind a safety horizon, fetches raw events from the source, republishes
//! them in order, and advances the persisted cursor. Guarantees no gap and
//! bounded duplication across runs despite source clock skew and commit
//! latency.

pub mod cursor_store;
pub mod engine;
pub mod scheduler;

pub use cursor_store::{CursorStore, PgCursorStore};
pub use engine::{compute_window, PollWindow, WatermarkPollEngine};
pub use scheduler::{
    LockSession, LockSessionSource, PgAdvisoryLock, PollScheduler, SchedulerLock,
    SessionAdvisoryLock,
};
