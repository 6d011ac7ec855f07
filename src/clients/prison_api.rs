//! # Prison Source API Client
//!
//! Time-bounded event extraction plus the per-subject lookups the reason
//! calculators need. A 404 on `prisoner_details` is a distinguishable
//! not-found (`EventsError::NotFound`), never folded into transient failures:
//! a deleted subject must drop one event, not abort a cycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::ApiClientConfig;
use crate::error::{EventsError, EventsResult};
use crate::models::{OffenderEvent, PrisonerDetails};

/// Prison source system operations
#[async_trait]
pub trait PrisonApi: Send + Sync {
    /// Fetch raw events with `event_datetime` in `[from, to)`, ascending.
    /// Repeated calls with the same bounds may overlap; the poll engine
    /// tolerates that via cursor advancement, not dedup.
    async fn fetch_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EventsResult<Vec<OffenderEvent>>;

    /// Full current state for a subject. Absent subject is
    /// `EventsError::NotFound`.
    async fn prisoner_details(&self, noms_number: &str) -> EventsResult<PrisonerDetails>;

    /// Current NOMS number for a booking; `None` when the booking is unknown
    /// or already purged
    async fn booking_noms_number(&self, booking_id: i64) -> EventsResult<Option<String>>;

    /// Historical NOMS numbers merged into this booking, in lookup order
    async fn merged_identifiers(&self, booking_id: i64) -> EventsResult<Vec<String>>;
}

/// reqwest-backed prison API client
#[derive(Debug, Clone)]
pub struct HttpPrisonApiClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingSummary {
    offender_no: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingIdentifier {
    value: String,
}

impl HttpPrisonApiClient {
    pub fn new(config: &ApiClientConfig) -> EventsResult<Self> {
        let client = build_client(config)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PrisonApi for HttpPrisonApiClient {
    async fn fetch_events(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EventsResult<Vec<OffenderEvent>> {
        let url = format!("{}/api/events", self.base_url);
        debug!(from = %from, to = %to, "Fetching source events");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("from", from.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()),
                ("to", to.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()),
                ("sortBy", "eventDatetime".to_string()),
            ])
            .send()
            .await?;
        let response = error_for_status(response, "source events").await?;
        Ok(response.json().await?)
    }

    async fn prisoner_details(&self, noms_number: &str) -> EventsResult<PrisonerDetails> {
        let url = format!("{}/api/prisoners/{noms_number}", self.base_url);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(EventsError::not_found(format!("prisoner {noms_number}")));
        }
        let response = error_for_status(response, "prisoner details").await?;
        Ok(response.json().await?)
    }

    async fn booking_noms_number(&self, booking_id: i64) -> EventsResult<Option<String>> {
        let url = format!("{}/api/bookings/{booking_id}", self.base_url);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = error_for_status(response, "booking").await?;
        let summary: BookingSummary = response.json().await?;
        Ok(Some(summary.offender_no))
    }

    async fn merged_identifiers(&self, booking_id: i64) -> EventsResult<Vec<String>> {
        let url = format!(
            "{}/api/bookings/{booking_id}/identifiers",
            self.base_url
        );
        let response = self
            .client
            .get(&url)
            .query(&[("type", "MERGED")])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let response = error_for_status(response, "booking identifiers").await?;
        let identifiers: Vec<BookingIdentifier> = response.json().await?;
        Ok(identifiers.into_iter().map(|id| id.value).collect())
    }
}

/// Build a reqwest client from API config: timeout plus optional static
/// bearer token (token refresh is external plumbing)
pub(crate) fn build_client(config: &ApiClientConfig) -> EventsResult<Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    if let Some(token) = &config.token {
        let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| EventsError::configuration("api_client", e.to_string()))?;
        headers.insert(reqwest::header::AUTHORIZATION, value);
    }

    Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .default_headers(headers)
        .build()
        .map_err(|e| EventsError::configuration("api_client", e.to_string()))
}

/// Map non-success statuses to `EventsError::Http`
pub(crate) async fn error_for_status(
    response: reqwest::Response,
    operation: &str,
) -> EventsResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(EventsError::http(
        status.as_u16(),
        format!("{operation}: {body}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> reqwest::Response {
        http::Response::builder()
            .status(status)
            .body(body.to_string())
            .unwrap()
            .into()
    }

    #[tokio::test]
    async fn test_success_response_passes_through() {
        let ok = error_for_status(response(200, "[]"), "source events")
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_server_error_maps_to_http_with_status_and_body() {
        let err = error_for_status(response(503, "upstream down"), "source events")
            .await
            .unwrap_err();
        match err {
            EventsError::Http { status, message } => {
                assert_eq!(status, 503);
                assert!(message.contains("source events"));
                assert!(message.contains("upstream down"));
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_error_body_is_carried_in_message() {
        let err = error_for_status(response(400, "bad from parameter"), "source events")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bad from parameter"));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_reqwest_status_error_converts_to_transient_http_variant() {
        let status_error = response(503, "").error_for_status().unwrap_err();
        let converted: EventsError = status_error.into();
        assert!(matches!(converted, EventsError::Http { status: 503, .. }));
        assert!(converted.is_transient());
    }
}
