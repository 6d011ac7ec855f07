//! # Raw Event Subscription
//!
//! Consumes the raw-event topic and drives classification and domain-event
//! emission. Delivery is at-least-once: a message is only deleted once its
//! unit of work completed or was deliberately dropped; transient failures
//! leave it in place for redelivery after the visibility timeout.

use pgmq::PGMQueue;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::assembler::DomainEventAssembler;
use crate::config::QueueConfig;
use crate::error::{EventsError, EventsResult};
use crate::messaging::publisher::{DomainEventPublisher, TopicMessage};
use crate::models::OffenderEvent;

/// What to do with a delivered message after processing
#[derive(Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Unit of work done; delete the message
    Completed { published: usize },
    /// Malformed or no longer applicable; delete without retry
    Dropped { reason: String },
    /// Transient failure; leave the message for redelivery
    Retry { error: String },
}

/// Per-message processing core, independent of the queue transport
pub struct RawEventProcessor {
    assembler: DomainEventAssembler,
    domain_publisher: DomainEventPublisher,
}

impl RawEventProcessor {
    pub fn new(assembler: DomainEventAssembler, domain_publisher: DomainEventPublisher) -> Self {
        Self {
            assembler,
            domain_publisher,
        }
    }

    /// Process one delivered transport envelope
    pub async fn process(&self, delivered: &Value) -> Disposition {
        let envelope: TopicMessage = match serde_json::from_value(delivered.clone()) {
            Ok(envelope) => envelope,
            Err(e) => {
                return Disposition::Dropped {
                    reason: format!("unparseable transport envelope: {e}"),
                }
            }
        };

        let raw: OffenderEvent = match serde_json::from_str(&envelope.message) {
            Ok(raw) => raw,
            Err(e) => {
                return Disposition::Dropped {
                    reason: format!("unparseable raw event body: {e}"),
                }
            }
        };

        debug!(
            message_id = %envelope.message_id,
            event_type = %raw.event_type,
            "Processing raw event"
        );

        let events = match self.assembler.assemble(&raw).await {
            Ok(events) => events,
            Err(EventsError::Serialization { message }) => {
                return Disposition::Dropped { reason: message }
            }
            Err(e) => {
                return Disposition::Retry {
                    error: e.to_string(),
                }
            }
        };

        let mut published = 0;
        for event in &events {
            if let Err(e) = self.domain_publisher.publish(event).await {
                // Partially published: redelivery re-runs classification,
                // duplicates are tolerated downstream
                return Disposition::Retry {
                    error: e.to_string(),
                };
            }
            published += 1;
            info!(
                event_type = %event.event_type,
                occurred_at = %event.occurred_at,
                "📤 Domain event published"
            );
        }

        Disposition::Completed { published }
    }
}

/// pgmq consumer loop for the raw-event queue
pub struct PrisonEventsListener {
    pgmq: PGMQueue,
    config: QueueConfig,
    processor: RawEventProcessor,
}

impl PrisonEventsListener {
    pub async fn new(
        database_url: &str,
        config: QueueConfig,
        processor: RawEventProcessor,
    ) -> EventsResult<Self> {
        let pgmq = PGMQueue::new(database_url.to_string())
            .await
            .map_err(|e| EventsError::publish(&config.listener_queue, e.to_string()))?;
        pgmq.create(&config.listener_queue)
            .await
            .map_err(|e| EventsError::publish(&config.listener_queue, e.to_string()))?;
        Ok(Self {
            pgmq,
            config,
            processor,
        })
    }

    /// Consume until the process stops
    pub async fn run(&self) {
        loop {
            match self.poll_once().await {
                Ok(0) => tokio::time::sleep(std::time::Duration::from_millis(500)).await,
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Listener poll failed, backing off");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                }
            }
        }
    }

    /// Read and process one batch; returns the number of delivered messages
    pub async fn poll_once(&self) -> EventsResult<usize> {
        let queue = &self.config.listener_queue;
        let messages = self
            .pgmq
            .read_batch::<Value>(
                queue,
                Some(self.config.visibility_timeout_seconds),
                self.config.batch_size,
            )
            .await
            .map_err(|e| EventsError::publish(queue, e.to_string()))?
            .unwrap_or_default();

        let delivered = messages.len();
        for message in messages {
            match self.processor.process(&message.message).await {
                Disposition::Completed { published } => {
                    debug!(msg_id = message.msg_id, published = published, "Message completed");
                    self.delete(message.msg_id).await?;
                }
                Disposition::Dropped { reason } => {
                    warn!(msg_id = message.msg_id, reason = %reason, "Message dropped");
                    self.delete(message.msg_id).await?;
                }
                Disposition::Retry { error } => {
                    // No delete: the message reappears after the visibility
                    // timeout
                    warn!(msg_id = message.msg_id, error = %error, "Message left for redelivery");
                }
            }
        }
        Ok(delivered)
    }

    async fn delete(&self, msg_id: i64) -> EventsResult<()> {
        self.pgmq
            .delete(&self.config.listener_queue, msg_id)
            .await
            .map_err(|e| EventsError::publish(&self.config.listener_queue, e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::DomainEventAssembler;
    use crate::models::{LegalStatus, PrisonerDetails};
    use crate::test_support::{InMemoryTopicPublisher, ScriptedPrisonApi, ScriptedProbationApi};
    use std::sync::Arc;

    fn processor(
        prison: Arc<ScriptedPrisonApi>,
    ) -> (RawEventProcessor, Arc<InMemoryTopicPublisher>) {
        let topic = Arc::new(InMemoryTopicPublisher::default());
        let assembler = DomainEventAssembler::new(
            prison,
            Arc::new(ScriptedProbationApi::default()),
            "http://case-notes",
        );
        (
            RawEventProcessor::new(assembler, DomainEventPublisher::new(topic.clone())),
            topic,
        )
    }

    fn envelope(body: &str, event_type: &str) -> Value {
        serde_json::to_value(TopicMessage::new(
            body.to_string(),
            vec![("eventType".to_string(), event_type.to_string())],
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_reception_message_completes_and_publishes() {
        let prison = Arc::new(ScriptedPrisonApi::default());
        prison.add_prisoner(PrisonerDetails {
            offender_no: "A1234BC".to_string(),
            legal_status: LegalStatus::Remand,
            recall: false,
            last_movement_type_code: "ADM".to_string(),
            last_movement_reason_code: "I".to_string(),
            status: "ACTIVE IN".to_string(),
            latest_location_id: "MDI".to_string(),
        });
        let (processor, topic) = processor(prison);

        let disposition = processor
            .process(&envelope(
                r#"{"eventType":"OFFENDER_MOVEMENT-RECEPTION","eventDatetime":"2021-06-08T14:41:11.526762","offenderIdDisplay":"A1234BC"}"#,
                "OFFENDER_MOVEMENT-RECEPTION",
            ))
            .await;

        assert_eq!(disposition, Disposition::Completed { published: 1 });
        assert_eq!(topic.published().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_subject_completes_with_zero_published() {
        let (processor, topic) = processor(Arc::new(ScriptedPrisonApi::default()));

        let disposition = processor
            .process(&envelope(
                r#"{"eventType":"OFFENDER_MOVEMENT-RECEPTION","eventDatetime":"2021-06-08T14:41:11.526762","offenderIdDisplay":"A9999XX"}"#,
                "OFFENDER_MOVEMENT-RECEPTION",
            ))
            .await;

        assert_eq!(disposition, Disposition::Completed { published: 0 });
        assert!(topic.published().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_dropped() {
        let (processor, _) = processor(Arc::new(ScriptedPrisonApi::default()));

        let disposition = processor
            .process(&envelope("{not json", "OFFENDER_MOVEMENT-RECEPTION"))
            .await;

        assert!(matches!(disposition, Disposition::Dropped { .. }));
    }

    #[tokio::test]
    async fn test_transient_lookup_failure_requests_redelivery() {
        let prison = Arc::new(ScriptedPrisonApi::default());
        prison.fail_prisoner_lookups();
        let (processor, _) = processor(prison);

        let disposition = processor
            .process(&envelope(
                r#"{"eventType":"OFFENDER_MOVEMENT-RECEPTION","eventDatetime":"2021-06-08T14:41:11.526762","offenderIdDisplay":"A1234BC"}"#,
                "OFFENDER_MOVEMENT-RECEPTION",
            ))
            .await;

        assert!(matches!(disposition, Disposition::Retry { .. }));
    }
}
