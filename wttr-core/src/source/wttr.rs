use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{
    error::FetchError,
    model::{Location, Measure, Pressure, Temperature, Visibility, WeatherRecord, WindSpeed},
};

use super::WeatherSource;

pub const DEFAULT_BASE_URL: &str = "https://wttr.in";

/// Current conditions from wttr.in's `format=j1` JSON endpoint.
#[derive(Debug, Clone)]
pub struct WttrSource {
    base_url: Url,
    http: Client,
}

impl WttrSource {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid base URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            bail!("Base URL cannot take a path: {base_url}");
        }

        let http = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("wttr-widget/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { base_url, http })
    }

    /// `{base}/{city}` with the city as a single percent-encoded segment.
    fn endpoint(&self, city: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(city);
        }
        url
    }

    async fn get(&self, url: Url) -> Result<String, FetchError> {
        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("request to {url} failed: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| FetchError::Network(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(FetchError::Network(format!(
                "wttr.in returned status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        Ok(body)
    }

    /// wttr.in's plain-text report for `city`, without terminal colour codes.
    pub async fn fetch_text(&self, city: &str) -> Result<String, FetchError> {
        let city = checked_city(city)?;
        let mut url = self.endpoint(city);
        url.set_query(Some("T"));

        tracing::debug!(%url, "fetching text report");
        self.get(url).await
    }
}

#[async_trait]
impl WeatherSource for WttrSource {
    async fn fetch(&self, city: &str) -> Result<WeatherRecord, FetchError> {
        let city = checked_city(city)?;
        let mut url = self.endpoint(city);
        url.query_pairs_mut().append_pair("format", "j1");

        tracing::debug!(%url, "fetching current conditions");
        let body = self.get(url).await?;

        let parsed: WttrResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::Parse(format!("invalid JSON: {e}")))?;

        parsed.into_record()
    }
}

fn checked_city(city: &str) -> Result<&str, FetchError> {
    let city = city.trim();
    if city.is_empty() {
        return Err(FetchError::EmptyCity);
    }
    Ok(city)
}

/// `[{"value": "..."}]`, wttr.in's wrapper for every text field.
#[derive(Debug, Default, Deserialize)]
struct WttrText {
    #[serde(default, deserialize_with = "lenient_text")]
    value: Option<String>,
}

fn first_text(list: &[WttrText]) -> Option<&str> {
    list.first().and_then(|t| t.value.as_deref())
}

/// A leaf value as a string. Numbers keep their JSON text; `null` and any
/// other shape read as `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// A wrapper list. Anything other than an array reads as empty, and entries
/// that are not `{"value": ...}` objects are skipped.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<WttrText>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[derive(Debug, Deserialize)]
struct WttrCurrent {
    #[serde(rename = "temp_C", default, deserialize_with = "lenient_text")]
    temp_c: Option<String>,
    #[serde(rename = "temp_F", default, deserialize_with = "lenient_text")]
    temp_f: Option<String>,
    #[serde(rename = "FeelsLikeC", default, deserialize_with = "lenient_text")]
    feels_like_c: Option<String>,
    #[serde(rename = "FeelsLikeF", default, deserialize_with = "lenient_text")]
    feels_like_f: Option<String>,
    #[serde(rename = "weatherDesc", default, deserialize_with = "lenient_list")]
    weather_desc: Vec<WttrText>,
    #[serde(default, deserialize_with = "lenient_text")]
    humidity: Option<String>,
    #[serde(rename = "windspeedKmph", default, deserialize_with = "lenient_text")]
    windspeed_kmph: Option<String>,
    #[serde(rename = "windspeedMiles", default, deserialize_with = "lenient_text")]
    windspeed_miles: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pressure: Option<String>,
    #[serde(rename = "pressureInches", default, deserialize_with = "lenient_text")]
    pressure_inches: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    visibility: Option<String>,
    #[serde(rename = "visibilityMiles", default, deserialize_with = "lenient_text")]
    visibility_miles: Option<String>,
    #[serde(rename = "uvIndex", default, deserialize_with = "lenient_text")]
    uv_index: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WttrArea {
    #[serde(rename = "areaName", default, deserialize_with = "lenient_list")]
    area_name: Vec<WttrText>,
    #[serde(default, deserialize_with = "lenient_list")]
    region: Vec<WttrText>,
    #[serde(default, deserialize_with = "lenient_list")]
    country: Vec<WttrText>,
}

#[derive(Debug, Deserialize)]
struct WttrResponse {
    #[serde(default)]
    current_condition: Vec<WttrCurrent>,
    #[serde(default)]
    nearest_area: Vec<WttrArea>,
}

impl WttrResponse {
    fn into_record(self) -> Result<WeatherRecord, FetchError> {
        let current = self
            .current_condition
            .first()
            .ok_or_else(|| FetchError::Parse("response has no current_condition".into()))?;
        let area = self
            .nearest_area
            .first()
            .ok_or_else(|| FetchError::Parse("response has no nearest_area".into()))?;

        Ok(WeatherRecord {
            temperature: Temperature {
                celsius: Measure::parse(current.temp_c.as_deref()),
                fahrenheit: Measure::parse(current.temp_f.as_deref()),
            },
            feels_like: Temperature {
                celsius: Measure::parse(current.feels_like_c.as_deref()),
                fahrenheit: Measure::parse(current.feels_like_f.as_deref()),
            },
            description: Measure::parse(first_text(&current.weather_desc)),
            humidity: Measure::parse(current.humidity.as_deref()),
            wind_speed: WindSpeed {
                kmh: Measure::parse(current.windspeed_kmph.as_deref()),
                mph: Measure::parse(current.windspeed_miles.as_deref()),
            },
            pressure: Pressure {
                mb: Measure::parse(current.pressure.as_deref()),
                inches: Measure::parse(current.pressure_inches.as_deref()),
            },
            visibility: Visibility {
                km: Measure::parse(current.visibility.as_deref()),
                miles: Measure::parse(current.visibility_miles.as_deref()),
            },
            uv_index: Measure::parse(current.uv_index.as_deref()),
            location: Location {
                city: Measure::parse(first_text(&area.area_name)),
                region: Measure::parse(first_text(&area.region)),
                country: Measure::parse(first_text(&area.country)),
            },
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
