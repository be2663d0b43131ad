//! The UI-side owner of everything the widget displays.
//!
//! `UpdateCoordinator` lives on the single interactive task. Worker events are
//! fed to it through [`UpdateCoordinator::handle_event`]; nothing else writes
//! to [`DisplayState`].

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Local};
use tokio::time::{self, Instant};

use crate::{
    ConditionIcon, WeatherRecord, WeatherSource,
    worker::{WorkerControl, WorkerEvent},
};

pub const IDLE_LABEL: &str = "Update the weather";
pub const BUSY_LABEL: &str = "Updating...";
pub const TIMEOUT_MESSAGE: &str = "Update timed out. Try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    pub enabled: bool,
    pub label: String,
}

impl ButtonState {
    pub fn idle() -> Self {
        Self {
            enabled: true,
            label: IDLE_LABEL.to_string(),
        }
    }

    pub fn busy() -> Self {
        Self {
            enabled: false,
            label: BUSY_LABEL.to_string(),
        }
    }

    pub fn is_busy(&self) -> bool {
        !self.enabled && self.label == BUSY_LABEL
    }
}

impl Default for ButtonState {
    fn default() -> Self {
        Self::idle()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    pub city: String,
    pub record: Option<WeatherRecord>,
    pub icon: ConditionIcon,
    pub last_update: Option<DateTime<Local>>,
    pub error_text: Option<String>,
    pub button: ButtonState,
    /// The worker reported that its loop exited.
    pub worker_finished: bool,
    /// Bumped on every change, so a view can skip redundant redraws.
    pub revision: u64,
}

#[derive(Debug)]
pub struct UpdateCoordinator {
    source: Arc<dyn WeatherSource>,
    worker: WorkerControl,
    update_timeout: Duration,
    timeout_deadline: Option<Instant>,
    state: DisplayState,
}

impl UpdateCoordinator {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        city: impl Into<String>,
        worker: WorkerControl,
        update_timeout: Duration,
    ) -> Self {
        Self {
            source,
            worker,
            update_timeout,
            timeout_deadline: None,
            state: DisplayState {
                city: city.into(),
                ..DisplayState::default()
            },
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// When the armed update timeout expires, if one is armed.
    pub fn timeout_deadline(&self) -> Option<Instant> {
        self.timeout_deadline
    }

    /// Refresh now and nudge the worker to refresh too.
    ///
    /// Allowed while an update is already in flight; the new timeout
    /// replaces the old one.
    pub async fn request_update(&mut self) {
        tracing::info!(city = %self.state.city, "update requested");
        let deadline = self.begin_update();

        let outcome = time::timeout_at(deadline, self.source.fetch(&self.state.city)).await;
        match outcome {
            Ok(Ok(record)) => self.on_weather_updated(record),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "immediate fetch failed");
                self.on_error(&e.to_string());
            }
            Err(_) => {
                tracing::warn!("immediate fetch still pending at update timeout");
                self.check_timeout(deadline);
            }
        }

        self.worker.request_manual_update();
    }

    fn begin_update(&mut self) -> Instant {
        let deadline = Instant::now() + self.update_timeout;
        self.timeout_deadline = Some(deadline);
        self.state.button = ButtonState::busy();
        self.state.error_text = None;
        self.touch();
        deadline
    }

    pub fn handle_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Updated(record) => self.on_weather_updated(record),
            WorkerEvent::Failed(e) => self.on_error(&e.to_string()),
            WorkerEvent::Finished => {
                tracing::info!("polling worker finished");
                self.state.worker_finished = true;
                self.touch();
            }
        }
    }

    /// Fire the update timeout if it is due.
    ///
    /// Returns `true` when the button was forced back to idle. Each armed
    /// deadline fires at most once.
    pub fn check_timeout(&mut self, now: Instant) -> bool {
        match self.timeout_deadline {
            Some(deadline) if now >= deadline => self.timeout_deadline = None,
            _ => return false,
        }

        if !self.state.button.is_busy() {
            return false;
        }

        tracing::warn!("update timed out");
        self.state.button = ButtonState::idle();
        self.state.error_text = Some(TIMEOUT_MESSAGE.to_string());
        self.touch();
        true
    }

    fn on_weather_updated(&mut self, record: WeatherRecord) {
        tracing::debug!(
            temperature = %record.temperature.celsius,
            description = %record.description,
            "weather updated"
        );
        self.state.icon = record.icon();
        self.state.record = Some(record);
        self.state.last_update = Some(Local::now());
        self.finish_update(None);
    }

    fn on_error(&mut self, message: &str) {
        self.finish_update(Some(format!("Error: {message}")));
    }

    fn finish_update(&mut self, error_text: Option<String>) {
        self.state.error_text = error_text;
        self.state.button = ButtonState::idle();
        self.timeout_deadline = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.state.revision += 1;
    }
}
