#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Custody Events Core
//!
//! Bridges a prison-management source system and downstream consumers. Raw
//! movement/event records are extracted incrementally behind a safety
//! horizon, republished verbatim to a raw-event topic, and separately
//! classified into a small set of canonical, versioned domain events
//! (prisoner received/released/merged, case-note published).
//!
//! ## Architecture
//!
//! The pipeline is extraction → classification → emission:
//!
//! 1. The **watermark poll engine** computes bounded extraction windows
//!    behind a wind-back horizon, fetches raw events, publishes them in
//!    order, and advances a persisted cursor, with no gap and bounded
//!    duplication.
//! 2. Raw events re-enter via the **queue subscription** and flow through the
//!    **reason calculators**, which consult the prison API (and conditionally
//!    the probation API) to classify each event.
//! 3. The **domain event assembler** turns significant events plus their
//!    outcomes into canonical envelopes with routing attributes.
//!
//! Delivery is at-least-once end to end: publish failures abort a cycle with
//! the cursor unadvanced, queued messages are redelivered after their
//! visibility timeout, and downstream consumers tolerate duplicates.
//!
//! ## Module Organization
//!
//! - [`poller`] - Watermark poll engine, cursor persistence, scheduling lock
//! - [`classification`] - Reason calculators and pure decision tables
//! - [`assembler`] - Raw event to domain event mapping
//! - [`messaging`] - Topic publishers and the raw-event listener
//! - [`clients`] - Prison and probation API clients
//! - [`models`] - Raw events, cursors, lookup results, domain envelopes
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use custody_events::config::ConfigManager;
//! use custody_events::poller::compute_window;
//! use chrono::{Duration, Utc};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let poller = &manager.config().poller;
//!
//! let window = compute_window(
//!     Utc::now() - Duration::minutes(10),
//!     Utc::now(),
//!     poller.wind_back(),
//!     poller.max_window(),
//! );
//! println!("next window: {window:?}");
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod classification;
pub mod clients;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod poller;
pub mod test_support;

pub use assembler::DomainEventAssembler;
pub use config::{ConfigManager, CustodyEventsConfig, PollerConfig, QueueConfig};
pub use error::{EventsError, EventsResult};
pub use messaging::{
    DomainEventPublisher, PrisonEventsListener, RawEventProcessor, RawEventPublisher,
};
pub use models::{DomainEvent, OffenderEvent, PollCursor, PrisonerDetails};
pub use poller::{PollScheduler, WatermarkPollEngine};
