//! # Custody Events Configuration System
//!
//! Explicit, validated configuration loading for the pipeline. All settings come
//! from YAML files with environment overrides; no hardcoded fallbacks scattered
//! through the code.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use custody_events::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let wind_back = manager.config().poller.wind_back_seconds;
//! # Ok(())
//! # }
//! ```

pub mod loader;

use chrono::Duration;
use serde::{Deserialize, Serialize};

pub use loader::ConfigManager;

use crate::error::{EventsError, EventsResult};

/// Root configuration structure mirroring custody-events.yaml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustodyEventsConfig {
    /// Database connection settings (cursor store, advisory lock, pgmq)
    pub database: DatabaseConfig,

    /// Prison source API client settings
    pub prison_api: ApiClientConfig,

    /// Probation recall lookup API client settings
    pub probation_api: ApiClientConfig,

    /// Case notes API, used only to build detail URLs on case-note events
    pub case_notes: CaseNotesConfig,

    /// Watermark poll engine settings
    pub poller: PollerConfig,

    /// Topic and queue names for the messaging layer
    pub queues: QueueConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool: u32,
}

/// Settings for an outbound HTTP API client
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiClientConfig {
    pub base_url: String,
    /// Request timeout in milliseconds; a timeout is a transient failure,
    /// never a not-found
    pub timeout_ms: u64,
    /// Static bearer token; OAuth token refresh is external plumbing
    #[serde(default)]
    pub token: Option<String>,
}

/// Case notes API location, for `detailUrl` construction
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaseNotesConfig {
    pub base_url: String,
}

/// Watermark poll engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollerConfig {
    /// Cursor name for the main poll stream
    pub poll_name: String,
    /// Cursor name for the diagnostic poll stream
    pub diagnostic_poll_name: String,
    /// Lag behind now below which source data is assumed durably committed
    pub wind_back_seconds: i64,
    /// Startup window when no cursor exists yet
    pub bootstrap_lookback_seconds: i64,
    /// Cap on a single extraction window, bounding batch size after an outage
    pub max_window_seconds: i64,
    /// Seconds between scheduled poll ticks
    pub interval_seconds: u64,
    /// Advisory lock lease; shorter than the cycle timeout so a crashed
    /// holder is recoverable
    pub lock_lease_seconds: u64,
}

impl PollerConfig {
    pub fn wind_back(&self) -> Duration {
        Duration::seconds(self.wind_back_seconds)
    }

    pub fn bootstrap_lookback(&self) -> Duration {
        Duration::seconds(self.bootstrap_lookback_seconds)
    }

    pub fn max_window(&self) -> Duration {
        Duration::seconds(self.max_window_seconds)
    }
}

/// Topic and queue names plus subscriber tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Topic receiving verbatim raw source events
    pub raw_events_topic: String,
    /// Topic receiving canonical domain events
    pub domain_events_topic: String,
    /// Queue the classification listener consumes raw events from
    pub listener_queue: String,
    /// Visibility timeout for listener reads; an unfinished message
    /// reappears after this many seconds
    pub visibility_timeout_seconds: i32,
    /// Maximum messages per listener read batch
    pub batch_size: i32,
}

impl CustodyEventsConfig {
    /// Validate cross-field constraints that serde cannot express
    pub fn validate(&self) -> EventsResult<()> {
        if self.poller.wind_back_seconds < 0 {
            return Err(EventsError::configuration(
                "poller",
                "wind_back_seconds must not be negative",
            ));
        }
        if self.poller.max_window_seconds <= 0 {
            return Err(EventsError::configuration(
                "poller",
                "max_window_seconds must be positive",
            ));
        }
        if self.poller.bootstrap_lookback_seconds <= 0 {
            return Err(EventsError::configuration(
                "poller",
                "bootstrap_lookback_seconds must be positive",
            ));
        }
        if self.poller.poll_name == self.poller.diagnostic_poll_name {
            return Err(EventsError::configuration(
                "poller",
                "poll_name and diagnostic_poll_name must differ",
            ));
        }
        if self.queues.batch_size <= 0 {
            return Err(EventsError::configuration(
                "queues",
                "batch_size must be positive",
            ));
        }
        Ok(())
    }
}

impl Default for CustodyEventsConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/custody_events".to_string(),
                pool: 10,
            },
            prison_api: ApiClientConfig {
                base_url: "http://localhost:8081".to_string(),
                timeout_ms: 10_000,
                token: None,
            },
            probation_api: ApiClientConfig {
                base_url: "http://localhost:8082".to_string(),
                timeout_ms: 10_000,
                token: None,
            },
            case_notes: CaseNotesConfig {
                base_url: "http://localhost:8083".to_string(),
            },
            poller: PollerConfig {
                poll_name: "prison-events".to_string(),
                diagnostic_poll_name: "prison-events-diagnostic".to_string(),
                wind_back_seconds: 120,
                bootstrap_lookback_seconds: 600,
                max_window_seconds: 3600,
                interval_seconds: 60,
                lock_lease_seconds: 45,
            },
            queues: QueueConfig {
                raw_events_topic: "prison_events".to_string(),
                domain_events_topic: "domain_events".to_string(),
                listener_queue: "prison_events".to_string(),
                visibility_timeout_seconds: 30,
                batch_size: 10,
            },
        }
    }
}
