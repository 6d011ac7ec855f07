//! # Topic Publishers
//!
//! The transport envelope plus the two domain-specific publishers: raw source
//! events republished verbatim, and canonical domain events. Attributes
//! travel alongside the body, not inside it, so subscribers can filter
//! without deserializing.

use async_trait::async_trait;
use pgmq::PGMQueue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::constants::attributes;
use crate::error::{EventsError, EventsResult};
use crate::models::{DomainEvent, OffenderEvent};

/// One routing attribute value on the transport envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAttributeValue {
    #[serde(rename = "Value")]
    pub value: String,
}

/// Transport envelope wrapping a published message body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicMessage {
    #[serde(rename = "MessageId")]
    pub message_id: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "MessageAttributes")]
    pub message_attributes: BTreeMap<String, MessageAttributeValue>,
}

impl TopicMessage {
    pub fn new(body: String, attributes: Vec<(String, String)>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            message: body,
            message_attributes: attributes
                .into_iter()
                .map(|(key, value)| (key, MessageAttributeValue { value }))
                .collect(),
        }
    }

    /// A routing attribute by key
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.message_attributes.get(key).map(|a| a.value.as_str())
    }
}

/// Push a message body with routing attributes onto one topic
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    async fn publish(&self, body: String, attributes: Vec<(String, String)>) -> EventsResult<()>;
}

/// pgmq-backed topic publisher
#[derive(Debug, Clone)]
pub struct PgmqTopicPublisher {
    pgmq: PGMQueue,
    queue_name: String,
}

impl PgmqTopicPublisher {
    /// Create the publisher, ensuring the backing queue exists
    pub async fn new(database_url: &str, queue_name: &str) -> EventsResult<Self> {
        let pgmq = PGMQueue::new(database_url.to_string())
            .await
            .map_err(|e| EventsError::publish(queue_name, e.to_string()))?;
        pgmq.create(queue_name)
            .await
            .map_err(|e| EventsError::publish(queue_name, e.to_string()))?;
        Ok(Self {
            pgmq,
            queue_name: queue_name.to_string(),
        })
    }
}

#[async_trait]
impl TopicPublisher for PgmqTopicPublisher {
    async fn publish(&self, body: String, attributes: Vec<(String, String)>) -> EventsResult<()> {
        let envelope = TopicMessage::new(body, attributes);
        let message_id = self
            .pgmq
            .send(&self.queue_name, &envelope)
            .await
            .map_err(|e| EventsError::publish(&self.queue_name, e.to_string()))?;

        debug!(
            queue_name = %self.queue_name,
            pgmq_message_id = message_id,
            envelope_message_id = %envelope.message_id,
            "📤 Message published"
        );
        Ok(())
    }
}

/// Publishes raw source events verbatim to the raw-event topic
pub struct RawEventPublisher {
    topic: Arc<dyn TopicPublisher>,
}

impl RawEventPublisher {
    pub fn new(topic: Arc<dyn TopicPublisher>) -> Self {
        Self { topic }
    }

    /// Publish one raw event. Attributes: `eventType` always, `code` when the
    /// event carries an alert code or a movement/direction pair.
    pub async fn publish(&self, event: &OffenderEvent) -> EventsResult<()> {
        let body = serde_json::to_string(event)?;
        let mut attrs = vec![(attributes::EVENT_TYPE.to_string(), event.event_type.clone())];
        if let Some(code) = event.code_attribute() {
            attrs.push((attributes::CODE.to_string(), code));
        }
        self.topic.publish(body, attrs).await
    }
}

/// Publishes canonical domain events to the domain-event topic
pub struct DomainEventPublisher {
    topic: Arc<dyn TopicPublisher>,
}

impl DomainEventPublisher {
    pub fn new(topic: Arc<dyn TopicPublisher>) -> Self {
        Self { topic }
    }

    /// Publish one domain event. Attributes: `eventType` always,
    /// `caseNoteType` when the additional information carries one.
    pub async fn publish(&self, event: &DomainEvent) -> EventsResult<()> {
        let body = serde_json::to_string(event)?;
        let mut attrs = vec![(attributes::EVENT_TYPE.to_string(), event.event_type.clone())];
        if let Some(case_note_type) = event.case_note_type() {
            attrs.push((
                attributes::CASE_NOTE_TYPE.to_string(),
                case_note_type.to_string(),
            ));
        }
        self.topic.publish(body, attrs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryTopicPublisher;

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = TopicMessage::new(
            "{\"eventType\":\"ALERT\"}".to_string(),
            vec![("eventType".to_string(), "ALERT".to_string())],
        );
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.get("Message").is_some());
        assert!(json.get("MessageId").is_some());
        assert_eq!(json["MessageAttributes"]["eventType"]["Value"], "ALERT");
    }

    #[tokio::test]
    async fn test_raw_publisher_sets_code_attribute() {
        let topic = Arc::new(InMemoryTopicPublisher::default());
        let publisher = RawEventPublisher::new(topic.clone());

        let event: OffenderEvent = serde_json::from_str(
            r#"{"eventType":"OFFENDER_MOVEMENT-DISCHARGE","eventDatetime":"2021-06-08T14:41:11.526762","movementType":"REL","directionCode":"OUT"}"#,
        )
        .unwrap();
        publisher.publish(&event).await.unwrap();

        let published = topic.published();
        assert_eq!(published.len(), 1);
        assert_eq!(
            published[0].attribute("eventType"),
            Some("OFFENDER_MOVEMENT-DISCHARGE")
        );
        assert_eq!(published[0].attribute("code"), Some("REL-OUT"));
    }

    #[tokio::test]
    async fn test_domain_publisher_sets_case_note_type_attribute() {
        let topic = Arc::new(InMemoryTopicPublisher::default());
        let publisher = DomainEventPublisher::new(topic.clone());

        let event = DomainEvent::case_note_published(
            "A1234BC",
            1,
            "PR-OSE",
            "http://case-notes/case-notes/A1234BC/1".to_string(),
            chrono::Utc::now(),
            chrono::Utc::now(),
        );
        publisher.publish(&event).await.unwrap();

        let published = topic.published();
        assert_eq!(published[0].attribute("eventType"), Some("case-note.published"));
        assert_eq!(published[0].attribute("caseNoteType"), Some("PR-OSE"));
    }
}
