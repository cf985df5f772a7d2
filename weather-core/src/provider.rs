use crate::{
    Config,
    error::SearchError,
    model::Suggestion,
    normalize::{CurrentPayload, ForecastPayload},
    provider::weatherapi::WeatherApiProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod weatherapi;

/// HTTP capability for the upstream weather API.
///
/// Implementations return raw payloads; normalization happens in the caller.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, location: &str) -> Result<CurrentPayload, SearchError>;

    async fn forecast(&self, location: &str, days: usize) -> Result<ForecastPayload, SearchError>;

    async fn suggestions(&self, partial: &str) -> Result<Vec<Suggestion>, SearchError>;
}

/// Construct the provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key()?;

    Ok(Arc::new(WeatherApiProvider::with_base_url(
        api_key.to_owned(),
        config.provider.base_url.clone(),
    )))
}
