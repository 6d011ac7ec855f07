//! # Domain Event Assembler
//!
//! Maps a raw source event to zero or more canonical domain events. Only a
//! fixed allow-list of raw event types is significant; everything else is
//! dropped silently with no lookups and no publish. A subject that no longer
//! exists drops the affected event: absence is an expected condition,
//! distinct from transient failures, which propagate so the transport can
//! redeliver.

use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use crate::classification::{MergeCalculator, ReceiveReasonCalculator, ReleaseReasonCalculator};
use crate::clients::{PrisonApi, ProbationApi};
use crate::constants::raw_events;
use crate::error::{EventsError, EventsResult};
use crate::models::{DomainEvent, OffenderEvent};

/// Turns raw events plus classification outcomes into domain events
pub struct DomainEventAssembler {
    receive: ReceiveReasonCalculator,
    release: ReleaseReasonCalculator,
    merge: MergeCalculator,
    case_notes_base_url: String,
}

impl DomainEventAssembler {
    pub fn new(
        prison_api: Arc<dyn PrisonApi>,
        probation_api: Arc<dyn ProbationApi>,
        case_notes_base_url: impl Into<String>,
    ) -> Self {
        Self {
            receive: ReceiveReasonCalculator::new(prison_api.clone(), probation_api),
            release: ReleaseReasonCalculator::new(prison_api.clone()),
            merge: MergeCalculator::new(prison_api),
            case_notes_base_url: case_notes_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Assemble the domain events for one raw event. An empty result means
    /// the event was not significant or its subject is gone.
    pub async fn assemble(&self, raw: &OffenderEvent) -> EventsResult<Vec<DomainEvent>> {
        match raw.event_type.as_str() {
            raw_events::MOVEMENT_RECEPTION => self.assemble_reception(raw).await,
            raw_events::MOVEMENT_DISCHARGE => self.assemble_discharge(raw).await,
            raw_events::BOOKING_NUMBER_CHANGED => self.assemble_merge(raw).await,
            raw_events::CASE_NOTE => self.assemble_case_note(raw),
            other => {
                debug!(event_type = %other, "Raw event type not significant, dropping");
                Ok(Vec::new())
            }
        }
    }

    async fn assemble_reception(&self, raw: &OffenderEvent) -> EventsResult<Vec<DomainEvent>> {
        let noms_number = subject_of(raw)?;
        let outcome = match self.receive.calculate_reason_for_prisoner(noms_number).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_not_found() => {
                debug!(noms_number = %noms_number, "Subject not found for reception, dropping event");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        Ok(vec![DomainEvent::prisoner_received(
            noms_number,
            &outcome,
            raw.event_datetime,
            Utc::now(),
        )])
    }

    async fn assemble_discharge(&self, raw: &OffenderEvent) -> EventsResult<Vec<DomainEvent>> {
        let noms_number = subject_of(raw)?;
        let outcome = match self.release.calculate_reason_for_release(noms_number).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_not_found() => {
                debug!(noms_number = %noms_number, "Subject not found for discharge, dropping event");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        Ok(vec![DomainEvent::prisoner_released(
            noms_number,
            &outcome,
            raw.event_datetime,
            Utc::now(),
        )])
    }

    async fn assemble_merge(&self, raw: &OffenderEvent) -> EventsResult<Vec<DomainEvent>> {
        let booking_id = raw.booking_id.ok_or_else(|| {
            EventsError::serialization(format!(
                "{} event without bookingId",
                raw_events::BOOKING_NUMBER_CHANGED
            ))
        })?;
        let outcomes = self.merge.identify_merged_prisoner(booking_id).await?;
        Ok(outcomes
            .iter()
            .map(|outcome| DomainEvent::prisoner_merged(outcome, raw.event_datetime, Utc::now()))
            .collect())
    }

    fn assemble_case_note(&self, raw: &OffenderEvent) -> EventsResult<Vec<DomainEvent>> {
        let noms_number = subject_of(raw)?;
        let case_note_id = raw.case_note_id.ok_or_else(|| {
            EventsError::serialization(format!("{} event without caseNoteId", raw_events::CASE_NOTE))
        })?;
        let case_note_type = raw.case_note_type.as_deref().ok_or_else(|| {
            EventsError::serialization(format!(
                "{} event without caseNoteType",
                raw_events::CASE_NOTE
            ))
        })?;
        let detail_url = format!(
            "{}/case-notes/{noms_number}/{case_note_id}",
            self.case_notes_base_url
        );
        Ok(vec![DomainEvent::case_note_published(
            noms_number,
            case_note_id,
            case_note_type,
            detail_url,
            raw.event_datetime,
            Utc::now(),
        )])
    }
}

fn subject_of(raw: &OffenderEvent) -> EventsResult<&str> {
    raw.offender_id_display.as_deref().ok_or_else(|| {
        EventsError::serialization(format!(
            "{} event without offenderIdDisplay",
            raw.event_type
        ))
    })
}
