//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - The location search box: debounced, sequence-checked suggestions and keyboard navigation
//! - Normalization of provider payloads into one canonical weather/forecast model
//! - Condition-text classification into icon categories
//! - The search flow tying provider, normalizer and history backend together
//! - Configuration & credentials handling
//!
//! It is used by `weather-cli`, but can also be reused by other front ends.

pub mod classify;
pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod search;
pub mod suggest;

pub use classify::{IconCategory, classify};
pub use config::{Config, SearchSettings, SuggestionSettings};
pub use error::{GeolocationError, SearchError};
pub use history::{BackendClient, HistoryStore};
pub use model::{
    Coordinates, DateRangeResult, DayPhase, ForecastDay, NormalizedForecast, NormalizedWeather,
    SearchOutcome, Suggestion,
};
pub use provider::{WeatherProvider, provider_from_config};
pub use search::SearchOrchestrator;
pub use suggest::{Key, SuggestionController, SuggestionUpdate};
