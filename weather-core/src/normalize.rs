//! Provider payloads and their conversion into the canonical model.
//!
//! Everything here is pure: the provider hands over a body, these functions
//! turn it into `NormalizedWeather` / `NormalizedForecast`.

use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{
    error::SearchError,
    model::{
        Alert, AlertTime, Condition, Coordinates, DayPhase, ForecastDay, NormalizedForecast,
        NormalizedWeather, Suggestion, Temperature,
    },
};

pub const DEFAULT_FORECAST_DAYS: usize = 5;

/// `current.json` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentPayload {
    #[serde(default)]
    pub location: Option<WaLocation>,
    #[serde(default)]
    pub current: Option<WaCurrent>,
    #[serde(default)]
    pub alerts: Option<WaAlerts>,
}

/// `forecast.json` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastPayload {
    #[serde(default)]
    pub location: Option<WaLocation>,
    #[serde(default)]
    pub forecast: Option<WaForecast>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaLocation {
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub localtime_epoch: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaCondition {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaCurrent {
    pub temp_c: f64,
    pub feelslike_c: f64,
    pub humidity: f64,
    #[serde(default)]
    pub pressure_mb: f64,
    pub condition: WaCondition,
    #[serde(default)]
    pub wind_kph: f64,
    #[serde(default)]
    pub cloud: f64,
    #[serde(default)]
    pub vis_km: f64,
    #[serde(default)]
    pub is_day: u8,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WaAlerts {
    #[serde(default)]
    pub alert: Vec<WaAlert>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaAlert {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub effective: Option<AlertTime>,
    #[serde(default)]
    pub expires: Option<AlertTime>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WaForecast {
    #[serde(default)]
    pub forecastday: Option<Vec<WaForecastDay>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaForecastDay {
    pub date: String,
    pub day: WaDay,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaDay {
    pub maxtemp_c: f64,
    pub mintemp_c: f64,
    pub avgtemp_c: f64,
    pub condition: WaCondition,
}

fn parse_body<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, SearchError> {
    serde_json::from_str(body)
        .map_err(|err| SearchError::upstream_shape(format!("malformed {what} payload: {err}")))
}

pub fn parse_current(body: &str) -> Result<CurrentPayload, SearchError> {
    parse_body(body, "current weather")
}

pub fn parse_forecast(body: &str) -> Result<ForecastPayload, SearchError> {
    parse_body(body, "forecast")
}

/// `search.json` returns a bare array; extra fields (id, lat, url, ...) are ignored.
pub fn parse_suggestions(body: &str) -> Result<Vec<Suggestion>, SearchError> {
    parse_body(body, "suggestion")
}

/// Convert a `current.json` payload. Inputs are metric.
pub fn normalize_current(raw: &CurrentPayload) -> Result<NormalizedWeather, SearchError> {
    let location = raw
        .location
        .as_ref()
        .ok_or_else(|| SearchError::upstream_shape("current weather payload has no `location`"))?;
    let current = raw
        .current
        .as_ref()
        .ok_or_else(|| SearchError::upstream_shape("current weather payload has no `current`"))?;

    let alerts = raw
        .alerts
        .as_ref()
        .map(|a| a.alert.iter().map(normalize_alert).collect())
        .unwrap_or_default();

    Ok(NormalizedWeather {
        name: location.name.clone(),
        country: location.country.clone(),
        coordinates: Coordinates::new(location.lat, location.lon),
        temperature: Temperature {
            temp: current.temp_c,
            feels_like: current.feelslike_c,
            humidity: current.humidity,
            pressure_hpa: current.pressure_mb,
        },
        condition: Condition::from_label(current.condition.text.clone()),
        wind_speed_ms: current.wind_kph / 3.6,
        cloudiness_pct: current.cloud,
        visibility_m: current.vis_km * 1000.0,
        local_time: location.localtime_epoch,
        phase: if current.is_day == 1 { DayPhase::Day } else { DayPhase::Night },
        alerts,
    })
}

fn normalize_alert(raw: &WaAlert) -> Alert {
    Alert {
        event: raw.event.clone(),
        headline: raw.headline.clone(),
        effective_at: raw.effective.clone(),
        expires_at: raw.expires.clone(),
    }
}

/// Convert a `forecast.json` payload, keeping at most `max_days` days in
/// provider order. The provider's date string is kept verbatim.
pub fn normalize_forecast(
    raw: &ForecastPayload,
    max_days: usize,
) -> Result<NormalizedForecast, SearchError> {
    let entries = raw
        .forecast
        .as_ref()
        .and_then(|f| f.forecastday.as_ref())
        .ok_or_else(|| SearchError::upstream_shape("forecast payload has no `forecastday`"))?;

    let days = entries
        .iter()
        .take(max_days)
        .map(|entry| {
            // Validate only; the literal string stays authoritative.
            NaiveDate::parse_from_str(&entry.date, "%Y-%m-%d").map_err(|_| {
                SearchError::upstream_shape(format!("forecast day has bad date `{}`", entry.date))
            })?;

            Ok(ForecastDay {
                date_key: entry.date.clone(),
                temp_min: entry.day.mintemp_c,
                temp_max: entry.day.maxtemp_c,
                avg_temp: entry.day.avgtemp_c,
                condition: Condition::from_label(entry.day.condition.text.clone()),
            })
        })
        .collect::<Result<Vec<_>, SearchError>>()?;

    Ok(NormalizedForecast { days })
}
