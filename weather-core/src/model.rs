use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::classify::{IconCategory, classify};

/// One entry of the location dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    #[serde(default)]
    pub region: String,
    pub country: String,
}

impl Suggestion {
    /// Location string submitted when the suggestion is picked.
    pub fn location_string(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `"lat,lon"` form accepted by the provider's `q` parameter.
    pub fn to_query(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub label: String,
    pub icon: IconCategory,
}

impl Condition {
    pub fn from_label(label: impl Into<String>) -> Self {
        let label = label.into();
        let icon = classify(&label);
        Self { label, icon }
    }
}

/// Day or night at the observed location, derived once during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPhase {
    Day,
    Night,
}

/// Alert timestamps are passed through exactly as the provider sent them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlertTime {
    Epoch(i64),
    Text(String),
}

impl std::fmt::Display for AlertTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertTime::Epoch(ts) => write!(f, "{ts}"),
            AlertTime::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub event: String,
    pub headline: String,
    pub effective_at: Option<AlertTime>,
    pub expires_at: Option<AlertTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure_hpa: f64,
}

/// Canonical instant weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedWeather {
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,
    pub temperature: Temperature,
    pub condition: Condition,
    pub wind_speed_ms: f64,
    pub cloudiness_pct: f64,
    pub visibility_m: f64,
    /// Local time of the observation, epoch seconds.
    pub local_time: i64,
    pub phase: DayPhase,
    pub alerts: Vec<Alert>,
}

impl NormalizedWeather {
    pub fn is_day(&self) -> bool {
        self.phase == DayPhase::Day
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// Provider's literal `YYYY-MM-DD`.
    pub date_key: String,
    pub temp_min: f64,
    pub temp_max: f64,
    pub avg_temp: f64,
    pub condition: Condition,
}

impl ForecastDay {
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date_key, "%Y-%m-%d").ok()
    }

    /// "Today" when the date key is `today`, otherwise the weekday name.
    pub fn day_label(&self, today: NaiveDate) -> String {
        match self.date() {
            Some(date) if date == today => "Today".to_string(),
            Some(date) => weekday_name(date.weekday()).to_string(),
            None => self.date_key.clone(),
        }
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedForecast {
    pub days: Vec<ForecastDay>,
}

/// Result of a successful `search`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub weather: NormalizedWeather,
    pub forecast: NormalizedForecast,
}

/// Record persisted by the history backend (`POST /weather`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub location: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub temperature: f64,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub weather_condition: String,
    pub weather_description: Option<String>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
    pub cloudiness: Option<f64>,
    pub visibility: Option<f64>,
}

impl HistoryRecord {
    pub fn from_weather(weather: &NormalizedWeather, today: NaiveDate) -> Self {
        let condition = weather.condition.label.clone();
        Self {
            location: weather.name.clone(),
            country: weather.country.clone(),
            latitude: weather.coordinates.lat,
            longitude: weather.coordinates.lon,
            date_from: today,
            date_to: today,
            temperature: weather.temperature.temp,
            feels_like: Some(weather.temperature.feels_like),
            temp_min: None,
            temp_max: None,
            weather_condition: condition.clone(),
            weather_description: Some(condition),
            humidity: Some(weather.temperature.humidity),
            pressure: Some(weather.temperature.pressure_hpa),
            wind_speed: Some(weather.wind_speed_ms),
            cloudiness: Some(weather.cloudiness_pct),
            visibility: Some(weather.visibility_m),
        }
    }
}

/// Backend-shaped range result, returned as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRangeResult {
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub data: Vec<DateRangeDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRangeDay {
    pub date: String,
    pub temperature: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub condition: Option<String>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
}
