//! # Poll Scheduling and Mutual Exclusion
//!
//! A periodic timer drives poll cycles; a cluster-wide lock guarantees at
//! most one instance executes a cycle at a time. A tick that cannot acquire
//! the lock is skipped, not queued. Unexpected errors inside a cycle are
//! caught at the top of the tick and logged; the next tick proceeds normally.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres, Row};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::EventsResult;
use crate::logging::log_error;
use crate::poller::engine::WatermarkPollEngine;

/// Cluster-wide mutual exclusion capability.
///
/// `lease` is advisory: implementations that hold locks per session (such as
/// Postgres advisory locks) recover a crashed holder through session death
/// rather than lease expiry.
#[async_trait]
pub trait SchedulerLock: Send + Sync {
    async fn try_acquire(&self, name: &str, lease: Duration) -> EventsResult<bool>;
    async fn release(&self, name: &str) -> EventsResult<()>;
}

/// One database session capable of taking and releasing advisory locks.
/// Advisory locks are session-scoped, so the lock and unlock statements must
/// run on the same session; a lock taken on one pooled connection cannot be
/// released from another.
#[async_trait]
pub trait LockSession: Send {
    async fn try_lock(&mut self, name: &str) -> EventsResult<bool>;
    /// Returns false when this session did not hold the lock
    async fn unlock(&mut self, name: &str) -> EventsResult<bool>;
}

/// Checks out lock sessions, one per acquire attempt
#[async_trait]
pub trait LockSessionSource: Send + Sync {
    type Session: LockSession + 'static;
    async fn session(&self) -> EventsResult<Self::Session>;
}

/// Session-pinned advisory lock: the session that takes the lock is held
/// until `release`, which unlocks on that same session and returns it.
pub struct SessionAdvisoryLock<S: LockSessionSource> {
    source: S,
    held: tokio::sync::Mutex<Option<S::Session>>,
}

/// Postgres advisory-lock implementation over a connection pool
pub type PgAdvisoryLock = SessionAdvisoryLock<PgPool>;

impl<S: LockSessionSource> SessionAdvisoryLock<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            held: tokio::sync::Mutex::new(None),
        }
    }
}

#[async_trait]
impl<S: LockSessionSource> SchedulerLock for SessionAdvisoryLock<S> {
    async fn try_acquire(&self, name: &str, _lease: Duration) -> EventsResult<bool> {
        let mut held = self.held.lock().await;
        if held.is_some() {
            // Already holding from this instance; advisory locks stack per
            // session, so do not take a second count release cannot drain
            return Ok(true);
        }
        let mut session = self.source.session().await?;
        if session.try_lock(name).await? {
            *held = Some(session);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn release(&self, name: &str) -> EventsResult<()> {
        let mut held = self.held.lock().await;
        if let Some(mut session) = held.take() {
            if !session.unlock(name).await? {
                warn!(lock_name = %name, "Advisory unlock reported no lock held on its own session");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LockSession for PoolConnection<Postgres> {
    async fn try_lock(&mut self, name: &str) -> EventsResult<bool> {
        let row = sqlx::query("SELECT pg_try_advisory_lock(hashtext($1)) AS acquired")
            .bind(name)
            .fetch_one(&mut **self)
            .await?;
        Ok(row.try_get::<bool, _>("acquired")?)
    }

    async fn unlock(&mut self, name: &str) -> EventsResult<bool> {
        let row = sqlx::query("SELECT pg_advisory_unlock(hashtext($1)) AS released")
            .bind(name)
            .fetch_one(&mut **self)
            .await?;
        Ok(row.try_get::<bool, _>("released")?)
    }
}

#[async_trait]
impl LockSessionSource for PgPool {
    type Session = PoolConnection<Postgres>;

    async fn session(&self) -> EventsResult<Self::Session> {
        Ok(self.acquire().await?)
    }
}

/// Periodic driver for the main and diagnostic poll streams
pub struct PollScheduler {
    engine: Arc<WatermarkPollEngine>,
    lock: Arc<dyn SchedulerLock>,
    lock_name: String,
    lock_lease: Duration,
    interval: Duration,
}

impl PollScheduler {
    pub fn new(
        engine: Arc<WatermarkPollEngine>,
        lock: Arc<dyn SchedulerLock>,
        lock_name: impl Into<String>,
        lock_lease: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            engine,
            lock,
            lock_name: lock_name.into(),
            lock_lease,
            interval,
        }
    }

    /// Run the scheduler until the process stops
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// One scheduled tick. Never propagates an error: failure surfaces
    /// through logging only, and the cursor semantics of the engine make the
    /// next tick retry the same window.
    pub async fn tick(&self) {
        let acquired = match self.lock.try_acquire(&self.lock_name, self.lock_lease).await {
            Ok(acquired) => acquired,
            Err(e) => {
                log_error("scheduler", "lock_acquire", &e.to_string(), None);
                return;
            }
        };
        if !acquired {
            debug!(lock_name = %self.lock_name, "Another instance holds the poll lock, skipping tick");
            return;
        }

        if let Err(e) = self.engine.run_poll_cycle().await {
            log_error("scheduler", "poll_cycle", &e.to_string(), None);
        }
        if let Err(e) = self.engine.run_test_polls().await {
            log_error("scheduler", "test_polls", &e.to_string(), None);
        }

        if let Err(e) = self.lock.release(&self.lock_name).await {
            warn!(lock_name = %self.lock_name, error = %e, "Failed to release poll lock");
        }
    }
}
