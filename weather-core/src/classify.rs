//! Free-text weather condition to icon category.
//!
//! Providers describe conditions in prose ("Patchy light snow", "Moderate or
//! heavy rain with thunder"). The classifier walks an ordered rule list and
//! returns the category of the first rule with a matching keyword, so more
//! severe or more specific conditions must come first.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconCategory {
    Thunder,
    HeavyRain,
    LightSnow,
    Snow,
    Rain,
    Windy,
    Cloudy,
    Clear,
}

impl IconCategory {
    /// Returned when no rule matches.
    pub const DEFAULT: IconCategory = IconCategory::Cloudy;

    pub fn as_str(&self) -> &'static str {
        match self {
            IconCategory::Thunder => "thunder",
            IconCategory::HeavyRain => "heavy_rain",
            IconCategory::LightSnow => "light_snow",
            IconCategory::Snow => "snow",
            IconCategory::Rain => "rain",
            IconCategory::Windy => "windy",
            IconCategory::Cloudy => "cloudy",
            IconCategory::Clear => "clear",
        }
    }

    /// Image used to render the category.
    ///
    /// `Rain` shares the heavy-rain artwork with `HeavyRain`.
    pub fn icon_asset(&self) -> &'static str {
        match self {
            IconCategory::Thunder => "thunder.png",
            IconCategory::HeavyRain | IconCategory::Rain => "heavy-rain.png",
            IconCategory::LightSnow => "light snow.png",
            IconCategory::Snow => "snow.png",
            IconCategory::Windy => "wind.png",
            IconCategory::Cloudy => "partially sunny.png",
            IconCategory::Clear => "sun.png",
        }
    }
}

impl std::fmt::Display for IconCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the priority list.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub category: IconCategory,
    pub keywords: &'static [&'static str],
}

impl Rule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|kw| lowered.contains(kw))
    }
}

/// Evaluated top to bottom; first match wins.
pub const RULES: &[Rule] = &[
    Rule { category: IconCategory::Thunder, keywords: &["thunder", "storm", "lightning"] },
    Rule {
        category: IconCategory::HeavyRain,
        keywords: &["heavy rain", "torrential", "pouring", "moderate or heavy rain"],
    },
    Rule { category: IconCategory::LightSnow, keywords: &["light snow", "flurries"] },
    Rule { category: IconCategory::Snow, keywords: &["snow", "blizzard", "sleet", "ice"] },
    Rule { category: IconCategory::Rain, keywords: &["rain", "drizzle", "shower"] },
    Rule { category: IconCategory::Windy, keywords: &["wind", "gale", "breezy"] },
    Rule {
        category: IconCategory::Cloudy,
        keywords: &["cloudy", "overcast", "partly", "partial", "mist", "fog", "haze"],
    },
    Rule { category: IconCategory::Clear, keywords: &["clear", "sunny", "fair"] },
];

/// Classify a provider condition string. Never fails.
pub fn classify(condition: &str) -> IconCategory {
    let lowered = condition.to_lowercase();

    RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.category)
        .unwrap_or(IconCategory::DEFAULT)
}
