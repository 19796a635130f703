use std::fmt::Display;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::inference::geo::Coordinate;

/// Coordinate used for the weather lookup when no place is configured.
pub const DEFAULT_WEATHER_LOCATION: Coordinate = Coordinate {
    latitude: 31.0258,
    longitude: 121.4376,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Sunny,
    Cloudy,
    Rainy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeColors {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub background: &'static str,
}

impl Theme {
    pub fn colors(&self) -> ThemeColors {
        match self {
            Theme::Sunny => ThemeColors {
                primary: "#FFD700",
                secondary: "#32CD32",
                background: "#FFFAF0",
            },
            Theme::Cloudy => ThemeColors {
                primary: "#696969",
                secondary: "#8A2BE2",
                background: "#F8F8FF",
            },
            Theme::Rainy => ThemeColors {
                primary: "#1E90FF",
                secondary: "#2F4F4F",
                background: "#F0F8FF",
            },
        }
    }

    /// Maps a weather description to a theme. Unknown descriptions get the sunny theme.
    pub fn for_weather(weather: &str) -> Self {
        match weather.trim().to_lowercase().as_str() {
            "clear" | "sunny" => Theme::Sunny,
            "cloudy" | "overcast" => Theme::Cloudy,
            "rain" | "rainy" | "snow" => Theme::Rainy,
            _ => Theme::Sunny,
        }
    }
}

impl Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Sunny => write!(f, "sunny"),
            Theme::Cloudy => write!(f, "cloudy"),
            Theme::Rainy => write!(f, "rainy"),
        }
    }
}

pub trait WeatherProvider {
    /// Short description of the current weather, e.g. `sunny` or `rain`.
    fn current_weather(&self, at: Coordinate) -> Result<String>;
}

/// Stands in for a weather service.
pub struct StubWeatherProvider;

impl WeatherProvider for StubWeatherProvider {
    fn current_weather(&self, _at: Coordinate) -> Result<String> {
        Ok("sunny".into())
    }
}

/// Picks the theme for the current weather. Lookup failures fall back to the default theme.
pub fn current_theme(provider: &dyn WeatherProvider, at: Coordinate) -> Theme {
    match provider.current_weather(at) {
        Ok(weather) => {
            let theme = Theme::for_weather(&weather);
            info!("Weather {weather} mapped to theme {theme}");
            theme
        }
        Err(e) => {
            warn!("Weather lookup failed, using default theme: {e:?}");
            Theme::default()
        }
    }
}
