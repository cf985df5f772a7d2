use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::{
    error::SearchError,
    model::Suggestion,
    normalize::{CurrentPayload, ForecastPayload, parse_current, parse_forecast, parse_suggestions},
};

use super::WeatherProvider;

pub const WEATHERAPI_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// WeatherAPI.com client.
#[derive(Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl std::fmt::Debug for WeatherApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiProvider").field("base_url", &self.base_url).finish()
    }
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, WEATHERAPI_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self { api_key, base_url, http: Client::new() }
    }

    /// GET `{base}/{endpoint}` and return the body of a 2xx response.
    async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, SearchError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            debug!(%status, body = %truncate_body(&body), "WeatherAPI {endpoint} request failed");
            return Err(SearchError::from_status(status));
        }

        Ok(body)
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    #[instrument(skip(self), level = "debug")]
    async fn current(&self, location: &str) -> Result<CurrentPayload, SearchError> {
        let body = self.get("current.json", &[("q", location), ("alerts", "yes")]).await?;
        parse_current(&body)
    }

    #[instrument(skip(self), level = "debug")]
    async fn forecast(&self, location: &str, days: usize) -> Result<ForecastPayload, SearchError> {
        let days = days.to_string();
        let body = self.get("forecast.json", &[("q", location), ("days", days.as_str())]).await?;
        parse_forecast(&body)
    }

    #[instrument(skip(self), level = "debug")]
    async fn suggestions(&self, partial: &str) -> Result<Vec<Suggestion>, SearchError> {
        let body = self.get("search.json", &[("q", partial)]).await?;
        parse_suggestions(&body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
