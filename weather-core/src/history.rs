//! Client for the history backend.
//!
//! Only the two endpoints the search flow needs live here: persisting a
//! record after a successful search and the date-range lookup.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;
use tracing::instrument;

use crate::{
    error::SearchError,
    model::{DateRangeResult, HistoryRecord},
};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000/api";

#[async_trait]
pub trait HistoryStore: Send + Sync + Debug {
    /// `POST /weather`
    async fn save(&self, record: &HistoryRecord) -> Result<(), SearchError>;

    /// `GET /weather/search-range`
    async fn search_range(
        &self,
        location: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DateRangeResult, SearchError>;
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: Client,
}

/// FastAPI-style error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http: Client::new() }
    }

    async fn error_from(response: reqwest::Response, fallback: &str) -> SearchError {
        let status = response.status();
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail)
            .map(|detail| match detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            });

        tracing::debug!(%status, ?detail, "backend request failed");
        SearchError::Backend(detail.unwrap_or_else(|| fallback.to_string()))
    }
}

#[async_trait]
impl HistoryStore for BackendClient {
    #[instrument(skip(self, record), fields(location = %record.location), level = "debug")]
    async fn save(&self, record: &HistoryRecord) -> Result<(), SearchError> {
        let url = format!("{}/weather", self.base_url);

        let response = self.http.post(&url).json(record).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "Failed to save weather query").await);
        }

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn search_range(
        &self,
        location: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DateRangeResult, SearchError> {
        let url = format!("{}/weather/search-range", self.base_url);
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();

        let response = self
            .http
            .get(&url)
            .query(&[
                ("location", location),
                ("start_date", start.as_str()),
                ("end_date", end.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "Failed to fetch date range data").await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|err| SearchError::Backend(format!("malformed date range result: {err}")))
    }
}
