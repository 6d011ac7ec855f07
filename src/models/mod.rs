//! # Data Model Layer
//!
//! The value types flowing through the pipeline: raw source events as fetched
//! from the prison system, the persisted watermark cursor, prisoner and recall
//! lookup results, classification outcomes, and the canonical domain event
//! envelope.

pub mod domain_event;
pub mod offender_event;
pub mod outcomes;
pub mod poll_cursor;
pub mod prisoner;

pub use domain_event::{DomainEvent, PersonIdentifier, PersonReference};
pub use offender_event::OffenderEvent;
pub use outcomes::{
    MergeOutcome, ReasonSource, ReceiveOutcome, ReceiveReason, ReleaseOutcome, ReleaseReason,
};
pub use poll_cursor::PollCursor;
pub use prisoner::{LegalStatus, PrisonerDetails, Recall};
