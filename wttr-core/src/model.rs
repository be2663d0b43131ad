use std::{fmt, str::FromStr};

use serde::Serialize;

/// A single reading that the upstream service may or may not have supplied.
///
/// Serializes as the bare value, or `null` when unknown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Measure<T> {
    Known(T),
    Unknown,
}

impl<T> Measure<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Measure::Known(v) => Some(v),
            Measure::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Measure::Known(_))
    }
}

impl<T: FromStr> Measure<T> {
    /// Parse a raw upstream string. Missing, blank or malformed input is `Unknown`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s.parse().map(Measure::Known).unwrap_or(Measure::Unknown),
            None => Measure::Unknown,
        }
    }
}

impl<T> Default for Measure<T> {
    fn default() -> Self {
        Measure::Unknown
    }
}

impl<T> From<Option<T>> for Measure<T> {
    fn from(value: Option<T>) -> Self {
        value.map(Measure::Known).unwrap_or(Measure::Unknown)
    }
}

impl<T: fmt::Display> fmt::Display for Measure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Known(v) => v.fmt(f),
            Measure::Unknown => f.write_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Temperature {
    pub celsius: Measure<i32>,
    pub fahrenheit: Measure<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WindSpeed {
    pub kmh: Measure<u32>,
    pub mph: Measure<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Pressure {
    pub mb: Measure<u32>,
    pub inches: Measure<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Visibility {
    pub km: Measure<u32>,
    pub miles: Measure<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Location {
    pub city: Measure<String>,
    pub region: Measure<String>,
    pub country: Measure<String>,
}

/// Current conditions for one place, as of one fetch.
///
/// Records are never patched after creation; a newer fetch replaces the whole
/// value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct WeatherRecord {
    pub temperature: Temperature,
    pub feels_like: Temperature,
    pub description: Measure<String>,
    pub humidity: Measure<u8>,
    pub wind_speed: WindSpeed,
    pub pressure: Pressure,
    pub visibility: Visibility,
    pub uv_index: Measure<u8>,
    pub location: Location,
}

impl WeatherRecord {
    pub fn icon(&self) -> ConditionIcon {
        self.description
            .known()
            .map(|d| ConditionIcon::from_description(d))
            .unwrap_or_default()
    }
}

/// Coarse condition category used to pick a glyph for the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConditionIcon {
    Clear,
    Clouds,
    Rain,
    Snow,
    #[default]
    Default,
}

impl ConditionIcon {
    // First match wins, so "light rain shower, overcast" is Rain.
    const KEYWORDS: &'static [(ConditionIcon, &'static [&'static str])] = &[
        (ConditionIcon::Snow, &["snow", "sleet", "blizzard", "ice"]),
        (ConditionIcon::Rain, &["rain", "drizzle", "shower", "thunder"]),
        (ConditionIcon::Clouds, &["cloud", "overcast", "mist", "fog"]),
        (ConditionIcon::Clear, &["clear", "sunny"]),
    ];

    pub fn from_description(description: &str) -> Self {
        let lower = description.to_lowercase();
        Self::KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map(|(icon, _)| *icon)
            .unwrap_or_default()
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            ConditionIcon::Clear => "☀",
            ConditionIcon::Clouds => "☁",
            ConditionIcon::Rain => "☂",
            ConditionIcon::Snow => "❄",
            ConditionIcon::Default => "·",
        }
    }
}
