//! # Error Types
//!
//! Structured error handling for the custody events pipeline using thiserror
//! instead of `Box<dyn Error>` patterns.
//!
//! The taxonomy matters operationally:
//!
//! - `NotFound` is non-fatal: the affected unit of work is skipped (event dropped,
//!   merge outcome list empty) and processing continues.
//! - `Timeout` / `Http` / `Database` are transient: a poll cycle aborts with the
//!   cursor unadvanced, a queued message is left for redelivery.
//! - `Serialization` marks malformed data: logged and dropped, never retried.

use thiserror::Error;

/// Pipeline error types
#[derive(Error, Debug)]
pub enum EventsError {
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network timeout: operation {operation} timed out")]
    Timeout { operation: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Publish failed for queue {queue_name}: {message}")]
    Publish { queue_name: String, message: String },

    #[error("Configuration error: {component}: {message}")]
    Configuration { component: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EventsError {
    /// Create a not-found error for a named resource
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create an HTTP error from a status code
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a publish error
    pub fn publish(queue_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            queue_name: queue_name.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True when the error is the non-fatal not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True when the error should be retried via redelivery rather than dropped
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Http { .. } | Self::Database { .. } | Self::Publish { .. }
        )
    }
}

impl From<sqlx::Error> for EventsError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => EventsError::not_found("database row"),
            sqlx::Error::PoolTimedOut => EventsError::timeout("database_pool"),
            _ => EventsError::database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for EventsError {
    fn from(err: serde_json::Error) -> Self {
        EventsError::serialization(err.to_string())
    }
}

impl From<reqwest::Error> for EventsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return EventsError::timeout(
                err.url().map(|u| u.path().to_string()).unwrap_or_default(),
            );
        }
        match err.status() {
            Some(status) => EventsError::http(status.as_u16(), err.to_string()),
            None => EventsError::internal(err.to_string()),
        }
    }
}

impl From<pgmq::errors::PgmqError> for EventsError {
    fn from(err: pgmq::errors::PgmqError) -> Self {
        EventsError::publish("unknown", err.to_string())
    }
}

/// Result type alias for pipeline operations
pub type EventsResult<T> = Result<T, EventsError>;
