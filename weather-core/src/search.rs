//! Confirmed location → current weather + forecast, with a best-effort
//! history save on success.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Days, NaiveDate, Utc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::{
    config::SearchSettings,
    error::{GeolocationError, SearchError},
    history::HistoryStore,
    model::{Coordinates, DateRangeResult, HistoryRecord, SearchOutcome},
    normalize::{normalize_current, normalize_forecast},
    provider::WeatherProvider,
};

#[derive(Debug)]
pub struct SearchOrchestrator {
    provider: Arc<dyn WeatherProvider>,
    history: Arc<dyn HistoryStore>,
    settings: SearchSettings,
    pending_saves: Mutex<JoinSet<()>>,
}

impl SearchOrchestrator {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        history: Arc<dyn HistoryStore>,
        settings: SearchSettings,
    ) -> Self {
        Self { provider, history, settings, pending_saves: Mutex::new(JoinSet::new()) }
    }

    /// Fetch current weather and forecast for `location` concurrently.
    ///
    /// Both must succeed. On success a history save is started in the
    /// background; its outcome never affects the returned result.
    pub async fn search(&self, location: &str) -> Result<SearchOutcome, SearchError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(SearchError::validation("Please enter a location"));
        }

        let days = self.settings.forecast_days;
        let (current, forecast) = tokio::try_join!(
            self.provider.current(location),
            self.provider.forecast(location, days),
        )?;

        let weather = normalize_current(&current)?;
        let forecast = normalize_forecast(&forecast, days)?;

        info!(
            query = %location,
            name = %weather.name,
            days = forecast.days.len(),
            "search succeeded"
        );
        self.spawn_history_save(HistoryRecord::from_weather(&weather, Utc::now().date_naive()));

        Ok(SearchOutcome { weather, forecast })
    }

    pub async fn search_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<SearchOutcome, SearchError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(SearchError::validation(format!("Invalid coordinates: {lat},{lon}")));
        }
        self.search(&Coordinates::new(lat, lon).to_query()).await
    }

    /// Search at a device position, or report why none is available.
    pub async fn search_from_position(
        &self,
        position: Result<Coordinates, GeolocationError>,
    ) -> Result<SearchOutcome, SearchError> {
        let coords = position?;
        self.search_by_coordinates(coords.lat, coords.lon).await
    }

    /// Backend range lookup; the result is returned exactly as the backend shaped it.
    pub async fn search_date_range(
        &self,
        location: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DateRangeResult, SearchError> {
        self.search_date_range_from(Utc::now().date_naive(), location, start, end).await
    }

    async fn search_date_range_from(
        &self,
        today: NaiveDate,
        location: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DateRangeResult, SearchError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(SearchError::validation("Please enter a location"));
        }
        if start > end {
            return Err(SearchError::validation("Start date must be before or equal to end date"));
        }

        let horizon_days = self.settings.range_horizon_days;
        let horizon = today.checked_add_days(Days::new(u64::from(horizon_days))).ok_or_else(|| {
            SearchError::validation(format!("Date range horizon of {horizon_days} days is too far"))
        })?;
        if start < today || end > horizon {
            return Err(SearchError::validation(format!(
                "Dates must be between {today} and {horizon}"
            )));
        }

        self.history.search_range(location, start, end).await
    }

    fn spawn_history_save(&self, record: HistoryRecord) {
        let history = Arc::clone(&self.history);
        let mut saves = self.pending_saves.lock().unwrap_or_else(PoisonError::into_inner);

        while let Some(joined) = saves.try_join_next() {
            if let Err(err) = joined {
                warn!(error = %err, "history save task did not complete");
            }
        }

        saves.spawn(async move {
            match history.save(&record).await {
                Ok(()) => debug!(location = %record.location, "saved search to history"),
                Err(err) => warn!(location = %record.location, error = %err, "history save failed"),
            }
        });
    }

    /// Wait for every history save started so far. Returns how many finished.
    pub async fn flush_history(&self) -> usize {
        let mut saves = {
            let mut guard = self.pending_saves.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *guard)
        };

        let mut finished = 0;
        while let Some(joined) = saves.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "history save task did not complete");
            }
            finished += 1;
        }
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{DateRangeDay, Suggestion},
        normalize::{CurrentPayload, ForecastPayload, parse_current, parse_forecast},
    };
    use async_trait::async_trait;
    use chrono::Duration;
    use serde_json::json;
    use std::time::Duration as StdDuration;

    #[derive(Debug, Default)]
    struct FakeProvider {
        queries: Mutex<Vec<String>>,
        forecast_fails: bool,
        latency: Option<StdDuration>,
    }

    impl FakeProvider {
        fn queries(&self) -> Vec<String> {
            self.queries.lock().expect("lock").clone()
        }

        async fn simulate(&self, location: &str) -> Result<(), SearchError> {
            self.queries.lock().expect("lock").push(location.to_string());
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            if location == "Toronto" { Err(SearchError::NotFound) } else { Ok(()) }
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn current(&self, location: &str) -> Result<CurrentPayload, SearchError> {
            self.simulate(location).await?;
            let name = location.split(',').next().unwrap_or(location);
            parse_current(
                &json!({
                    "location": { "name": name, "country": "France", "lat": 48.8, "lon": 2.3 },
                    "current": {
                        "temp_c": 14.0, "feelslike_c": 13.0, "humidity": 55,
                        "condition": { "text": "Partly cloudy" }, "wind_kph": 18.0, "is_day": 1
                    }
                })
                .to_string(),
            )
        }

        async fn forecast(
            &self,
            location: &str,
            days: usize,
        ) -> Result<ForecastPayload, SearchError> {
            self.simulate(location).await?;
            if self.forecast_fails {
                return Err(SearchError::Unavailable { status: 500 });
            }
            let forecastday: Vec<_> = (1..=days + 2)
                .map(|d| {
                    json!({
                        "date": format!("2024-06-{d:02}"),
                        "day": {
                            "maxtemp_c": 20.0,
                            "mintemp_c": 10.0,
                            "avgtemp_c": 15.0,
                            "condition": { "text": "Sunny" }
                        }
                    })
                })
                .collect();
            parse_forecast(&json!({ "forecast": { "forecastday": forecastday } }).to_string())
        }

        async fn suggestions(&self, _partial: &str) -> Result<Vec<Suggestion>, SearchError> {
            Ok(Vec::new())
        }
    }

    #[derive(Debug, Default)]
    struct FakeHistory {
        saved: Mutex<Vec<HistoryRecord>>,
        ranges: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
        failing: bool,
    }

    #[async_trait]
    impl HistoryStore for FakeHistory {
        async fn save(&self, record: &HistoryRecord) -> Result<(), SearchError> {
            self.saved.lock().expect("lock").push(record.clone());
            if self.failing {
                return Err(SearchError::Backend("database is down".into()));
            }
            Ok(())
        }

        async fn search_range(
            &self,
            location: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<DateRangeResult, SearchError> {
            self.ranges.lock().expect("lock").push((location.to_string(), start, end));
            Ok(DateRangeResult {
                location: location.to_string(),
                start_date: start.to_string(),
                end_date: end.to_string(),
                data: vec![DateRangeDay {
                    date: start.to_string(),
                    temperature: Some(3.0),
                    temp_min: None,
                    temp_max: None,
                    condition: Some("Fog".into()),
                    humidity: None,
                    wind_speed: None,
                }],
            })
        }
    }

    fn orchestrator(
        provider: &Arc<FakeProvider>,
        history: &Arc<FakeHistory>,
    ) -> SearchOrchestrator {
        let p: Arc<dyn WeatherProvider> = provider.clone();
        let h: Arc<dyn HistoryStore> = history.clone();
        SearchOrchestrator::new(p, h, SearchSettings::default())
    }

    fn pending_saves(orch: &SearchOrchestrator) -> usize {
        orch.pending_saves.lock().expect("lock").len()
    }

    fn saved(history: &FakeHistory) -> Vec<HistoryRecord> {
        history.saved.lock().expect("lock").clone()
    }

    #[tokio::test]
    async fn successful_search_saves_once_even_if_save_fails() {
        let provider = Arc::new(FakeProvider::default());
        let history = Arc::new(FakeHistory { failing: true, ..FakeHistory::default() });
        let orch = orchestrator(&provider, &history);

        let outcome = orch.search("Paris").await.expect("search succeeds");
        assert_eq!(orch.flush_history().await, 1);

        let records = saved(&history);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].location, outcome.weather.name);
        assert_eq!(outcome.forecast.days.len(), 5);
        assert!((outcome.weather.wind_speed_ms - 5.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn not_found_skips_history() {
        let provider = Arc::new(FakeProvider::default());
        let history = Arc::new(FakeHistory::default());
        let orch = orchestrator(&provider, &history);

        let err = orch.search("Toronto").await.unwrap_err();
        assert_eq!(err, SearchError::NotFound);
        assert!(err.user_message().to_lowercase().contains("not found"));
        assert_eq!(orch.flush_history().await, 0);
        assert!(saved(&history).is_empty());
    }

    #[tokio::test]
    async fn forecast_failure_fails_the_search() {
        let provider = Arc::new(FakeProvider { forecast_fails: true, ..FakeProvider::default() });
        let history = Arc::new(FakeHistory::default());
        let orch = orchestrator(&provider, &history);

        let err = orch.search("Paris").await.unwrap_err();
        assert_eq!(err, SearchError::Unavailable { status: 500 });
        assert_eq!(orch.flush_history().await, 0);
    }

    #[tokio::test]
    async fn finished_saves_do_not_pile_up() {
        let provider = Arc::new(FakeProvider::default());
        let history = Arc::new(FakeHistory::default());
        let orch = orchestrator(&provider, &history);

        for _ in 0..200 {
            orch.search("Paris").await.expect("search succeeds");
            tokio::time::sleep(StdDuration::from_millis(1)).await;
        }

        assert_eq!(saved(&history).len(), 200);
        assert!(pending_saves(&orch) <= 1, "finished saves were kept: {}", pending_saves(&orch));
        assert!(orch.flush_history().await <= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_run_concurrently() {
        let provider = Arc::new(FakeProvider {
            latency: Some(StdDuration::from_millis(200)),
            ..FakeProvider::default()
        });
        let history = Arc::new(FakeHistory::default());
        let orch = orchestrator(&provider, &history);

        let started = tokio::time::Instant::now();
        orch.search("Paris").await.expect("search succeeds");
        assert!(started.elapsed() < StdDuration::from_millis(400));
    }

    #[tokio::test]
    async fn blank_location_is_rejected_before_any_fetch() {
        let provider = Arc::new(FakeProvider::default());
        let history = Arc::new(FakeHistory::default());
        let orch = orchestrator(&provider, &history);

        let err = orch.search("   ").await.unwrap_err();
        assert!(matches!(err, SearchError::Validation(_)));
        assert!(provider.queries().is_empty());
    }

    #[tokio::test]
    async fn coordinates_compose_lat_lon_query() {
        let provider = Arc::new(FakeProvider::default());
        let history = Arc::new(FakeHistory::default());
        let orch = orchestrator(&provider, &history);

        orch.search_by_coordinates(48.85, 2.35).await.expect("search succeeds");
        assert_eq!(provider.queries(), vec!["48.85,2.35".to_string(), "48.85,2.35".to_string()]);

        let err = orch.search_by_coordinates(91.0, 0.0).await.unwrap_err();
        assert!(matches!(err, SearchError::Validation(_)));
    }

    #[tokio::test]
    async fn position_errors_map_to_fixed_messages() {
        let provider = Arc::new(FakeProvider::default());
        let history = Arc::new(FakeHistory::default());
        let orch = orchestrator(&provider, &history);

        let err = orch.search_from_position(Err(GeolocationError::PermissionDenied)).await;
        let err = err.unwrap_err();
        assert!(err.user_message().starts_with("Location permission denied"));
        assert!(provider.queries().is_empty());

        orch.search_from_position(Ok(Coordinates::new(1.0, 2.0))).await.expect("searches");
        assert_eq!(provider.queries()[0], "1,2");
    }

    #[tokio::test]
    async fn date_range_is_validated_then_delegated() {
        let provider = Arc::new(FakeProvider::default());
        let history = Arc::new(FakeHistory::default());
        let orch = orchestrator(&provider, &history);
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).expect("date");
        let day = |n: i64| today + Duration::days(n);

        let err = orch.search_date_range_from(today, "Oslo", day(2), day(1)).await.unwrap_err();
        assert_eq!(err.user_message(), "Start date must be before or equal to end date");

        let err = orch.search_date_range_from(today, "Oslo", day(0), day(4)).await.unwrap_err();
        assert!(matches!(err, SearchError::Validation(_)));

        let err = orch.search_date_range_from(today, "Oslo", day(-1), day(1)).await.unwrap_err();
        assert!(matches!(err, SearchError::Validation(_)));

        let err = orch.search_date_range_from(today, " ", day(0), day(1)).await.unwrap_err();
        assert_eq!(err.user_message(), "Please enter a location");

        let result =
            orch.search_date_range_from(today, "Oslo", day(0), day(3)).await.expect("delegated");
        assert_eq!(result.location, "Oslo");
        assert_eq!(result.data[0].condition.as_deref(), Some("Fog"));
        assert_eq!(history.ranges.lock().expect("lock").len(), 1);
        assert!(saved(&history).is_empty());
    }

    #[tokio::test]
    async fn oversized_range_horizon_is_rejected_without_panicking() {
        let provider = Arc::new(FakeProvider::default());
        let history = Arc::new(FakeHistory::default());
        let p: Arc<dyn WeatherProvider> = provider.clone();
        let h: Arc<dyn HistoryStore> = history.clone();
        let settings = SearchSettings { range_horizon_days: u32::MAX, ..SearchSettings::default() };
        let orch = SearchOrchestrator::new(p, h, settings);
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).expect("date");

        let err = orch.search_date_range_from(today, "Oslo", today, today).await.unwrap_err();
        assert!(matches!(err, SearchError::Validation(_)));
        assert!(history.ranges.lock().expect("lock").is_empty());
    }
}
