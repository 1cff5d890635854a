//! HTTP access to the persistence/enrichment backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{InsightError, SourceError};
use crate::insights::InsightProvider;
use crate::models::RawReview;
use crate::source::{decode_reviews, ReviewSource};

pub fn build_client(timeout: Duration) -> Result<Client, SourceError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// `GET /api/reviews`.
#[derive(Debug, Clone)]
pub struct HttpReviewSource {
    client: Client,
    base_url: String,
}

impl HttpReviewSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ReviewSource for HttpReviewSource {
    async fn fetch_reviews(&self) -> Result<Vec<RawReview>, SourceError> {
        let url = endpoint(&self.base_url, "api/reviews");
        let start = Instant::now();
        debug!("Fetching reviews - url={}", url);

        let http = |source| SourceError::Http {
            url: url.clone(),
            source,
        };
        let body = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(http)?
            .text()
            .await
            .map_err(http)?;

        let raw = decode_reviews(&body)?;
        info!(
            "Reviews fetched - count={}, duration={:.2}s",
            raw.len(),
            start.elapsed().as_secs_f32()
        );
        Ok(raw)
    }
}

#[derive(Deserialize)]
struct InsightsResponse {
    insights: Vec<String>,
}

/// `POST /api/analytics/insights?rating=N`.
#[derive(Debug, Clone)]
pub struct HttpInsightProvider {
    client: Client,
    base_url: String,
}

impl HttpInsightProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl InsightProvider for HttpInsightProvider {
    async fn fetch_insights(&self, rating: u8) -> Result<Vec<String>, InsightError> {
        let url = endpoint(&self.base_url, "api/analytics/insights");
        let provider_err = |e: reqwest::Error| InsightError::Provider(e.to_string());

        let response: InsightsResponse = self
            .client
            .post(&url)
            .query(&[("rating", rating)])
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(provider_err)?
            .json()
            .await
            .map_err(provider_err)?;

        Ok(response.insights)
    }
}
