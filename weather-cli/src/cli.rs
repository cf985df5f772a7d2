use std::sync::Arc;

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select, Text, list_option::ListOption};
use weather_core::{
    BackendClient, Config, Coordinates, SearchError, SearchOrchestrator, Suggestion,
    SuggestionController, SuggestionUpdate, provider_from_config,
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather search CLI")]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the WeatherAPI key and the history backend URL.
    Configure,

    /// Show current weather and forecast for a location.
    Show {
        /// Place name, postal code, or "lat,lon".
        #[arg(required_unless_present = "coords", conflicts_with = "coords")]
        location: Option<String>,

        /// Coordinates as LAT,LON.
        #[arg(long, value_parser = parse_coords, allow_hyphen_values = true)]
        coords: Option<Coordinates>,
    },

    /// Look up matching locations for partial text and pick one.
    Find {
        /// Partial location name.
        partial: String,
    },

    /// Query the history backend for a date range.
    Range {
        location: String,

        /// First day, YYYY-MM-DD.
        #[arg(long)]
        from: NaiveDate,

        /// Last day, YYYY-MM-DD.
        #[arg(long)]
        to: NaiveDate,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { location, coords } => {
                let config = Config::load()?;
                let orchestrator = orchestrator(&config)?;

                let outcome = match (coords, location) {
                    (Some(c), _) => orchestrator.search_by_coordinates(c.lat, c.lon).await,
                    (None, Some(location)) => orchestrator.search(&location).await,
                    (None, None) => Err(SearchError::validation("Please enter a location")),
                }
                .map_err(user_facing)?;

                output::print_outcome(&outcome);
                orchestrator.flush_history().await;
                Ok(())
            }
            Command::Find { partial } => find(&partial).await,
            Command::Range { location, from, to } => {
                let config = Config::load()?;
                let orchestrator = orchestrator(&config)?;

                let result = orchestrator
                    .search_date_range(&location, from, to)
                    .await
                    .map_err(user_facing)?;

                output::print_range(&result);
                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("WeatherAPI key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let backend_url = Text::new("History backend URL:")
        .with_default(&config.backend.base_url)
        .prompt()
        .context("Failed to read backend URL")?;

    config.set_api_key(api_key.trim().to_string());
    config.backend.base_url = backend_url.trim().to_string();
    config.save()?;

    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn find(partial: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;
    let orchestrator = orchestrator_with(&config, Arc::clone(&provider));

    let mut controller =
        SuggestionController::new(provider, config.search.suggestion_settings());
    controller.on_query_changed(partial);

    if !controller.is_pending() {
        return Err(anyhow!(
            "Type at least {} characters to get suggestions.",
            config.search.min_query_len
        ));
    }

    let items = loop {
        match controller.next_update().await {
            Some(SuggestionUpdate::Loading { .. }) => continue,
            Some(SuggestionUpdate::Suggestions(items)) => break items,
            Some(SuggestionUpdate::Failed(err)) => return Err(user_facing(err)),
            None => return Err(anyhow!("Suggestion lookup stopped unexpectedly.")),
        }
    };

    let location = if items.is_empty() {
        println!("No matching locations, searching for \"{}\" as typed.", partial.trim());
        controller.submit().map_err(user_facing)?
    } else {
        let labels: Vec<String> = items.iter().map(output::suggestion_label).collect();
        let choice = Select::new("Pick a location:", labels)
            .raw_prompt()
            .context("No location picked")?;
        controller.select_suggestion(picked_suggestion(&items, &choice)?)
    };

    let outcome = orchestrator.search(&location).await.map_err(user_facing)?;
    output::print_outcome(&outcome);
    orchestrator.flush_history().await;
    Ok(())
}

/// Map a prompt choice back to its suggestion by position, so repeated labels stay distinct.
fn picked_suggestion<'a>(
    items: &'a [Suggestion],
    choice: &ListOption<String>,
) -> anyhow::Result<&'a Suggestion> {
    items
        .get(choice.index)
        .ok_or_else(|| anyhow!("Picked location {} is not in the list", choice.value))
}

fn orchestrator(config: &Config) -> anyhow::Result<SearchOrchestrator> {
    Ok(orchestrator_with(config, provider_from_config(config)?))
}

fn orchestrator_with(
    config: &Config,
    provider: Arc<dyn weather_core::WeatherProvider>,
) -> SearchOrchestrator {
    let history = Arc::new(BackendClient::new(config.backend.base_url.clone()));
    SearchOrchestrator::new(provider, history, config.search.search_settings())
}

fn user_facing(err: SearchError) -> anyhow::Error {
    tracing::debug!(error = ?err, "search failed");
    anyhow!(err.user_message())
}

fn parse_coords(value: &str) -> Result<Coordinates, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got `{value}`"))?;

    let lat: f64 = lat.trim().parse().map_err(|_| format!("invalid latitude `{lat}`"))?;
    let lon: f64 = lon.trim().parse().map_err(|_| format!("invalid longitude `{lon}`"))?;
    Ok(Coordinates::new(lat, lon))
}
