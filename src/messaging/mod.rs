//! # Messaging Layer
//!
//! Topic publishing and the inbound raw-event subscription. Topics are pgmq
//! queues; every published message is wrapped in a transport envelope carrying
//! the inner JSON body, a message id, and routing attributes for
//! subscriber-side filtering.

pub mod publisher;
pub mod subscriber;

pub use publisher::{
    DomainEventPublisher, MessageAttributeValue, PgmqTopicPublisher, RawEventPublisher,
    TopicMessage, TopicPublisher,
};
pub use subscriber::{Disposition, PrisonEventsListener, RawEventProcessor};
