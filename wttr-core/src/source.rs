use std::fmt::Debug;

use async_trait::async_trait;

use crate::{Config, FetchError, WeatherRecord};

pub mod wttr;

#[cfg(test)]
pub(crate) mod scripted;

pub use wttr::WttrSource;

/// Something that can fetch current conditions for a city.
///
/// Implementations perform one outbound request per call and report every
/// failure as a [`FetchError`] value.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch(&self, city: &str) -> Result<WeatherRecord, FetchError>;
}

/// Build the wttr.in source described by `config`.
pub fn source_from_config(config: &Config) -> anyhow::Result<WttrSource> {
    WttrSource::new(&config.base_url, config.request_timeout())
}
