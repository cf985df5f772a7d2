use chrono::Local;
use weather_core::{DateRangeResult, SearchOutcome, Suggestion};

pub fn suggestion_label(item: &Suggestion) -> String {
    if item.region.is_empty() {
        format!("{}, {}", item.name, item.country)
    } else {
        format!("{}, {}, {}", item.name, item.region, item.country)
    }
}

pub fn print_outcome(outcome: &SearchOutcome) {
    let w = &outcome.weather;
    let phase = if w.is_day() { "day" } else { "night" };

    println!(
        "{}, {} ({:.2}, {:.2}) [{phase}]",
        w.name, w.country, w.coordinates.lat, w.coordinates.lon
    );
    println!(
        "  {:.1}°C (feels like {:.1}°C), {} [{}]",
        w.temperature.temp,
        w.temperature.feels_like,
        w.condition.label,
        w.condition.icon.icon_asset()
    );
    println!(
        "  humidity {:.0}%, pressure {:.0} hPa, wind {:.1} m/s, clouds {:.0}%, visibility {:.0} m",
        w.temperature.humidity,
        w.temperature.pressure_hpa,
        w.wind_speed_ms,
        w.cloudiness_pct,
        w.visibility_m
    );

    for alert in &w.alerts {
        let from = alert.effective_at.as_ref().map(ToString::to_string).unwrap_or_default();
        let until = alert.expires_at.as_ref().map(ToString::to_string).unwrap_or_default();
        println!("  ALERT {}: {} ({from} - {until})", alert.event, alert.headline);
    }

    let today = Local::now().date_naive();
    println!();
    for day in &outcome.forecast.days {
        println!(
            "  {:<10} {:>5.0}° {:>5.0}°  {}",
            day.day_label(today),
            day.temp_max,
            day.temp_min,
            day.condition.label
        );
    }
}

pub fn print_range(result: &DateRangeResult) {
    println!("{}: {} - {}", result.location, result.start_date, result.end_date);

    if result.data.is_empty() {
        println!("  no data");
        return;
    }

    for day in &result.data {
        let temp = day.temperature.map(|t| format!("{t:.1}°C")).unwrap_or_else(|| "-".into());
        let range = match (day.temp_min, day.temp_max) {
            (Some(min), Some(max)) => format!(" ({min:.0}°..{max:.0}°)"),
            _ => String::new(),
        };
        println!(
            "  {} {temp}{range} {}",
            day.date,
            day.condition.as_deref().unwrap_or("Unknown")
        );
    }
}
