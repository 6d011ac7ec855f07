//! # Pipeline Constants
//!
//! Raw and domain event type literals, routing attribute keys, and the other
//! string constants that define the external interface of the pipeline.
//!
//! Raw event types come from the prison source system verbatim; domain event
//! types are the canonical, versioned names consumers subscribe to.

/// Raw event types fetched from the prison source system
pub mod raw_events {
    pub const MOVEMENT_RECEPTION: &str = "OFFENDER_MOVEMENT-RECEPTION";
    pub const MOVEMENT_DISCHARGE: &str = "OFFENDER_MOVEMENT-DISCHARGE";
    pub const BOOKING_NUMBER_CHANGED: &str = "BOOKING_NUMBER-CHANGED";
    pub const CASE_NOTE: &str = "CASE_NOTE";
}

/// Canonical domain event types emitted to the domain-event topic
pub mod domain_events {
    pub const PRISONER_RECEIVED: &str = "prisoner.received";
    pub const PRISONER_RELEASED: &str = "prisoner.released";
    pub const PRISONER_MERGED: &str = "prisoner.merged";
    pub const CASE_NOTE_PUBLISHED: &str = "case-note.published";
}

/// Message attribute keys used for subscriber-side filtering
pub mod attributes {
    pub const EVENT_TYPE: &str = "eventType";
    pub const CODE: &str = "code";
    pub const CASE_NOTE_TYPE: &str = "caseNoteType";
}

/// Keys of the `additionalInformation` map on domain events
pub mod info_keys {
    pub const REASON: &str = "reason";
    pub const PROBABLE_CAUSE: &str = "probableCause";
    pub const PRISON_ID: &str = "prisonId";
    pub const SOURCE: &str = "source";
    pub const CURRENT_LOCATION: &str = "currentLocation";
    pub const CURRENT_PRISON_STATUS: &str = "currentPrisonStatus";
    pub const REMOVED_NOMS_NUMBER: &str = "removedNomsNumber";
    pub const CASE_NOTE_TYPE: &str = "caseNoteType";
    pub const CASE_NOTE_ID: &str = "caseNoteId";
}

/// Identifier type for the person reference on every domain event
pub const NOMS_IDENTIFIER_TYPE: &str = "NOMS";

/// `reason` value for every reception-derived domain event
pub const REASON_ADMISSION: &str = "ADMISSION";

/// `reason` value for every merge-derived domain event
pub const REASON_MERGE: &str = "MERGE";

/// Domain event schema version
pub const DOMAIN_EVENT_VERSION: i32 = 1;
