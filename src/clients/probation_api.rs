//! # Probation Recall Lookup Client
//!
//! Consulted only when prison-side data cannot rule out a recall. A 404 here
//! means "no recall history" and maps to an empty list, not an error: the
//! probation system simply may not know the subject.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::clients::prison_api::{build_client, error_for_status};
use crate::config::ApiClientConfig;
use crate::error::EventsResult;
use crate::models::Recall;

/// Probation system operations
#[async_trait]
pub trait ProbationApi: Send + Sync {
    /// Recall history for a subject; unknown subject yields an empty list
    async fn recalls(&self, noms_number: &str) -> EventsResult<Vec<Recall>>;
}

/// reqwest-backed probation API client
#[derive(Debug, Clone)]
pub struct HttpProbationApiClient {
    client: Client,
    base_url: String,
}

impl HttpProbationApiClient {
    pub fn new(config: &ApiClientConfig) -> EventsResult<Self> {
        let client = build_client(config)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProbationApi for HttpProbationApiClient {
    async fn recalls(&self, noms_number: &str) -> EventsResult<Vec<Recall>> {
        let url = format!("{}/probation-case/{noms_number}/recalls", self.base_url);
        debug!(noms_number = %noms_number, "Fetching probation recall history");

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let response = error_for_status(response, "probation recalls").await?;
        Ok(response.json().await?)
    }
}
