//! HTTP client for the external AI prediction service.

use super::models::{Enrichment, PredictionResponse};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::warn;

/// Fetches AI pre-annotations for a (user, recording) pair.
///
/// Enrichment is best-effort: callers go through [`fetch_or_default`] and
/// never fail a clip delivery because the service is down.
///
/// [`fetch_or_default`]: AiEnrichmentClient::fetch_or_default
pub struct AiEnrichmentClient {
    client: reqwest::Client,
    base_url: String,
}

impl AiEnrichmentClient {
    /// `base_url` is the full prediction endpoint
    /// (e.g. "http://localhost:5000/predict"); `timeout_sec` bounds the
    /// whole request so a stalled service cannot hold up clip serving.
    pub fn new(base_url: String, timeout_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// One GET, no retries. Any failure mode (connect error, non-2xx,
    /// malformed body, timeout) is an Err.
    pub async fn fetch(&self, user_id: &str, recording_id: &str) -> Result<Enrichment> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("user_id", user_id), ("recording_id", recording_id)])
            .send()
            .await
            .context("Failed to reach the prediction service")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Prediction service answered {} for recording {}",
                response.status(),
                recording_id
            );
        }

        let body: PredictionResponse = response
            .json()
            .await
            .context("Failed to parse prediction response")?;
        Ok(body.into())
    }

    /// [`fetch`] with every failure collapsed to the zero-value
    /// [`Enrichment`]; the error only reaches the log.
    ///
    /// [`fetch`]: AiEnrichmentClient::fetch
    pub async fn fetch_or_default(&self, user_id: &str, recording_id: &str) -> Enrichment {
        match self.fetch(user_id, recording_id).await {
            Ok(enrichment) => enrichment,
            Err(err) => {
                warn!(
                    "Enrichment unavailable for recording {}: {:#}",
                    recording_id, err
                );
                Enrichment::default()
            }
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
