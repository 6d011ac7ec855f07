//! # Test Doubles
//!
//! In-memory implementations of the pipeline's seams, shared by unit and
//! integration tests. No network, no database: the scripted APIs serve
//! whatever state the test loads into them, the in-memory topic records what
//! was published, and the in-memory cursor store keeps cursors in a map.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::clients::{PrisonApi, ProbationApi};
use crate::error::{EventsError, EventsResult};
use crate::messaging::publisher::{TopicMessage, TopicPublisher};
use crate::models::{OffenderEvent, PollCursor, PrisonerDetails, Recall};
use crate::poller::cursor_store::CursorStore;
use crate::poller::scheduler::SchedulerLock;

/// Records published envelopes; optionally fails every publish
#[derive(Default)]
pub struct InMemoryTopicPublisher {
    messages: Mutex<Vec<TopicMessage>>,
    fail: AtomicBool,
}

impl InMemoryTopicPublisher {
    /// A publisher whose every publish fails with a transient error
    pub fn failing() -> Self {
        let publisher = Self::default();
        publisher.fail.store(true, Ordering::SeqCst);
        publisher
    }

    /// Everything published so far, in publish order
    pub fn published(&self) -> Vec<TopicMessage> {
        self.messages.lock().expect("publisher mutex poisoned").clone()
    }
}

#[async_trait]
impl TopicPublisher for InMemoryTopicPublisher {
    async fn publish(&self, body: String, attributes: Vec<(String, String)>) -> EventsResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EventsError::publish("in-memory", "scripted publish failure"));
        }
        self.messages
            .lock()
            .expect("publisher mutex poisoned")
            .push(TopicMessage::new(body, attributes));
        Ok(())
    }
}

/// Cursor store over a plain map
#[derive(Default)]
pub struct InMemoryCursorStore {
    cursors: Mutex<HashMap<String, PollCursor>>,
}

#[async_trait]
impl CursorStore for InMemoryCursorStore {
    async fn load(&self, name: &str) -> EventsResult<Option<PollCursor>> {
        Ok(self
            .cursors
            .lock()
            .expect("cursor mutex poisoned")
            .get(name)
            .cloned())
    }

    async fn save(&self, cursor: &PollCursor) -> EventsResult<()> {
        self.cursors
            .lock()
            .expect("cursor mutex poisoned")
            .insert(cursor.name.clone(), cursor.clone());
        Ok(())
    }
}

/// Prison API serving scripted state
#[derive(Default)]
pub struct ScriptedPrisonApi {
    events: Mutex<Vec<OffenderEvent>>,
    prisoners: Mutex<HashMap<String, PrisonerDetails>>,
    bookings: Mutex<HashMap<i64, String>>,
    merged: Mutex<HashMap<i64, Vec<String>>>,
    fetch_calls: AtomicUsize,
    prisoner_lookups: AtomicUsize,
    fail_fetches: AtomicBool,
    fail_prisoner_lookups: AtomicBool,
}

impl ScriptedPrisonApi {
    pub fn add_event(&self, event: OffenderEvent) {
        self.events.lock().expect("events mutex poisoned").push(event);
    }

    pub fn add_prisoner(&self, details: PrisonerDetails) {
        self.prisoners
            .lock()
            .expect("prisoners mutex poisoned")
            .insert(details.offender_no.clone(), details);
    }

    pub fn add_booking(&self, booking_id: i64, noms_number: &str) {
        self.bookings
            .lock()
            .expect("bookings mutex poisoned")
            .insert(booking_id, noms_number.to_string());
    }

    pub fn add_merged_identifiers(&self, booking_id: i64, identifiers: Vec<&str>) {
        self.merged
            .lock()
            .expect("merged mutex poisoned")
            .insert(booking_id, identifiers.into_iter().map(String::from).collect());
    }

    pub fn fail_fetches(&self) {
        self.fail_fetches.store(true, Ordering::SeqCst);
    }

    pub fn fail_prisoner_lookups(&self) {
        self.fail_prisoner_lookups.store(true, Ordering::SeqCst);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn prisoner_lookups(&self) -> usize {
        self.prisoner_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PrisonApi for ScriptedPrisonApi {
    async fn fetch_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EventsResult<Vec<OffenderEvent>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(EventsError::http(503, "scripted source outage"));
        }
        let mut events: Vec<OffenderEvent> = self
            .events
            .lock()
            .expect("events mutex poisoned")
            .iter()
            .filter(|e| e.event_datetime >= from && e.event_datetime < to)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.event_datetime);
        Ok(events)
    }

    async fn prisoner_details(&self, noms_number: &str) -> EventsResult<PrisonerDetails> {
        self.prisoner_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_prisoner_lookups.load(Ordering::SeqCst) {
            return Err(EventsError::http(500, "scripted prison outage"));
        }
        self.prisoners
            .lock()
            .expect("prisoners mutex poisoned")
            .get(noms_number)
            .cloned()
            .ok_or_else(|| EventsError::not_found(format!("prisoner {noms_number}")))
    }

    async fn booking_noms_number(&self, booking_id: i64) -> EventsResult<Option<String>> {
        Ok(self
            .bookings
            .lock()
            .expect("bookings mutex poisoned")
            .get(&booking_id)
            .cloned())
    }

    async fn merged_identifiers(&self, booking_id: i64) -> EventsResult<Vec<String>> {
        Ok(self
            .merged
            .lock()
            .expect("merged mutex poisoned")
            .get(&booking_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Probation API serving scripted recall history
#[derive(Default)]
pub struct ScriptedProbationApi {
    recalls: Mutex<HashMap<String, Vec<Recall>>>,
    calls: AtomicUsize,
}

impl ScriptedProbationApi {
    pub fn add_recalls(&self, noms_number: &str, recalls: Vec<Recall>) {
        self.recalls
            .lock()
            .expect("recalls mutex poisoned")
            .insert(noms_number.to_string(), recalls);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProbationApi for ScriptedProbationApi {
    async fn recalls(&self, noms_number: &str) -> EventsResult<Vec<Recall>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // unknown subject means no recall history, matching the 404 rule
        Ok(self
            .recalls
            .lock()
            .expect("recalls mutex poisoned")
            .get(noms_number)
            .cloned()
            .unwrap_or_default())
    }
}

/// Lock that always grants
#[derive(Default)]
pub struct AlwaysGrantedLock;

#[async_trait]
impl SchedulerLock for AlwaysGrantedLock {
    async fn try_acquire(&self, _name: &str, _lease: Duration) -> EventsResult<bool> {
        Ok(true)
    }

    async fn release(&self, _name: &str) -> EventsResult<()> {
        Ok(())
    }
}

/// Lock held by "another instance"
pub struct DeniedLock;

#[async_trait]
impl SchedulerLock for DeniedLock {
    async fn try_acquire(&self, _name: &str, _lease: Duration) -> EventsResult<bool> {
        Ok(false)
    }

    async fn release(&self, _name: &str) -> EventsResult<()> {
        Ok(())
    }
}
