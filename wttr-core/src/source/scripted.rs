//! In-memory source for worker and coordinator tests.

use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{FetchError, Measure, WeatherRecord, model::Temperature};

use super::WeatherSource;

/// Replays queued results, then repeats `fallback` forever.
#[derive(Debug)]
pub(crate) struct ScriptedSource {
    queued: Mutex<VecDeque<Result<WeatherRecord, FetchError>>>,
    fallback: Result<WeatherRecord, FetchError>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(fallback: Result<WeatherRecord, FetchError>) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn ok(celsius: i32) -> Self {
        Self::new(Ok(record(celsius)))
    }

    pub fn failing(reason: &str) -> Self {
        Self::new(Err(FetchError::Network(reason.to_string())))
    }

    /// Every fetch sleeps this long (tokio time) before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn then(self, result: Result<WeatherRecord, FetchError>) -> Self {
        self.queued.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherSource for ScriptedSource {
    async fn fetch(&self, _city: &str) -> Result<WeatherRecord, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.queued.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

pub(crate) fn record(celsius: i32) -> WeatherRecord {
    WeatherRecord {
        temperature: Temperature {
            celsius: Measure::Known(celsius),
            fahrenheit: Measure::Known(celsius * 9 / 5 + 32),
        },
        description: Measure::Known("Partly cloudy".to_string()),
        location: crate::model::Location {
            city: Measure::Known("Poltava".to_string()),
            region: Measure::Known("Poltava".to_string()),
            country: Measure::Known("Ukraine".to_string()),
        },
        ..WeatherRecord::default()
    }
}
