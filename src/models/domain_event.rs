//! # Domain Event Envelope
//!
//! The canonical, versioned, cross-system event representation, distinct from
//! raw source events. Built fresh per emission via named constructors and
//! never mutated after construction; null/absent fields are omitted from the
//! serialized form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::constants::{self, DOMAIN_EVENT_VERSION, NOMS_IDENTIFIER_TYPE};
use crate::models::outcomes::{MergeOutcome, ReceiveOutcome, ReleaseOutcome};

/// One identifier on the person reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonIdentifier {
    #[serde(rename = "type")]
    pub identifier_type: String,
    pub value: String,
}

/// Identifiers resolving the person a domain event concerns.
/// Every event carries exactly one NOMS entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonReference {
    pub identifiers: Vec<PersonIdentifier>,
}

impl PersonReference {
    pub fn noms(noms_number: impl Into<String>) -> Self {
        Self {
            identifiers: vec![PersonIdentifier {
                identifier_type: NOMS_IDENTIFIER_TYPE.to_string(),
                value: noms_number.into(),
            }],
        }
    }

    /// The NOMS number on this reference, if present
    pub fn noms_number(&self) -> Option<&str> {
        self.identifiers
            .iter()
            .find(|id| id.identifier_type == NOMS_IDENTIFIER_TYPE)
            .map(|id| id.value.as_str())
    }
}

/// Canonical domain event published to the domain-event topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    pub version: i32,
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub published_at: DateTime<Utc>,
    pub person_reference: PersonReference,
    #[serde(skip_serializing_if = "Map::is_empty", default)]
    pub additional_information: Map<String, serde_json::Value>,
}

impl DomainEvent {
    /// A `prisoner.received` event from a receive-flow outcome
    pub fn prisoner_received(
        noms_number: &str,
        outcome: &ReceiveOutcome,
        occurred_at: DateTime<Utc>,
        published_at: DateTime<Utc>,
    ) -> Self {
        let mut info = Map::new();
        info.insert(
            constants::info_keys::REASON.to_string(),
            constants::REASON_ADMISSION.into(),
        );
        info.insert(
            constants::info_keys::PROBABLE_CAUSE.to_string(),
            outcome.reason.as_str().into(),
        );
        info.insert(
            constants::info_keys::PRISON_ID.to_string(),
            outcome.prison_id.as_str().into(),
        );
        info.insert(
            constants::info_keys::SOURCE.to_string(),
            serde_json::to_value(outcome.source).unwrap_or_default(),
        );
        info.insert(
            constants::info_keys::CURRENT_LOCATION.to_string(),
            outcome.current_location.as_str().into(),
        );
        info.insert(
            constants::info_keys::CURRENT_PRISON_STATUS.to_string(),
            outcome.current_prison_status.as_str().into(),
        );

        Self {
            version: DOMAIN_EVENT_VERSION,
            event_type: constants::domain_events::PRISONER_RECEIVED.to_string(),
            description: Some("A prisoner has been received into prison".to_string()),
            detail_url: None,
            occurred_at,
            published_at,
            person_reference: PersonReference::noms(noms_number),
            additional_information: info,
        }
    }

    /// A `prisoner.released` event from a release-flow outcome
    pub fn prisoner_released(
        noms_number: &str,
        outcome: &ReleaseOutcome,
        occurred_at: DateTime<Utc>,
        published_at: DateTime<Utc>,
    ) -> Self {
        let mut info = Map::new();
        info.insert(
            constants::info_keys::REASON.to_string(),
            outcome.reason.as_str().into(),
        );
        info.insert(
            constants::info_keys::PRISON_ID.to_string(),
            outcome.prison_id.as_str().into(),
        );
        info.insert(
            constants::info_keys::CURRENT_LOCATION.to_string(),
            outcome.current_location.as_str().into(),
        );
        info.insert(
            constants::info_keys::CURRENT_PRISON_STATUS.to_string(),
            outcome.current_prison_status.as_str().into(),
        );

        Self {
            version: DOMAIN_EVENT_VERSION,
            event_type: constants::domain_events::PRISONER_RELEASED.to_string(),
            description: Some("A prisoner has been released from prison".to_string()),
            detail_url: None,
            occurred_at,
            published_at,
            person_reference: PersonReference::noms(noms_number),
            additional_information: info,
        }
    }

    /// A `prisoner.merged` event for one merged-identifier pairing.
    /// The person reference carries the remaining (surviving) NOMS number.
    pub fn prisoner_merged(
        outcome: &MergeOutcome,
        occurred_at: DateTime<Utc>,
        published_at: DateTime<Utc>,
    ) -> Self {
        let mut info = Map::new();
        info.insert(
            constants::info_keys::REASON.to_string(),
            constants::REASON_MERGE.into(),
        );
        info.insert(
            constants::info_keys::REMOVED_NOMS_NUMBER.to_string(),
            outcome.merged_number.as_str().into(),
        );

        Self {
            version: DOMAIN_EVENT_VERSION,
            event_type: constants::domain_events::PRISONER_MERGED.to_string(),
            description: Some(format!(
                "A prisoner has been merged from {} to {}",
                outcome.merged_number, outcome.remaining_number
            )),
            detail_url: None,
            occurred_at,
            published_at,
            person_reference: PersonReference::noms(&outcome.remaining_number),
            additional_information: info,
        }
    }

    /// A `case-note.published` event
    pub fn case_note_published(
        noms_number: &str,
        case_note_id: i64,
        case_note_type: &str,
        detail_url: String,
        occurred_at: DateTime<Utc>,
        published_at: DateTime<Utc>,
    ) -> Self {
        let mut info = Map::new();
        info.insert(
            constants::info_keys::CASE_NOTE_TYPE.to_string(),
            case_note_type.into(),
        );
        info.insert(
            constants::info_keys::CASE_NOTE_ID.to_string(),
            case_note_id.to_string().into(),
        );

        Self {
            version: DOMAIN_EVENT_VERSION,
            event_type: constants::domain_events::CASE_NOTE_PUBLISHED.to_string(),
            description: Some("A prison case note has been created or amended".to_string()),
            detail_url: Some(detail_url),
            occurred_at,
            published_at,
            person_reference: PersonReference::noms(noms_number),
            additional_information: info,
        }
    }

    /// The `caseNoteType` entry, when this event carries one
    pub fn case_note_type(&self) -> Option<&str> {
        self.additional_information
            .get(constants::info_keys::CASE_NOTE_TYPE)
            .and_then(|v| v.as_str())
    }
}
