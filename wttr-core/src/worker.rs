//! Background polling of a [`WeatherSource`].
//!
//! The worker fetches once, then waits for the configured interval. The wait
//! is a series of short sleeps; between them the worker re-checks whether it
//! was stopped or whether a manual update is pending, so either can cut the
//! wait short without cancelling timers.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU8, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant},
};

use crate::{FetchError, WeatherRecord, WeatherSource};

/// Upper bound on the interrupt-check granularity.
pub const MAX_CHECK_GRANULARITY: Duration = Duration::from_millis(500);

/// What the worker reports to the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Updated(WeatherRecord),
    Failed(FetchError),
    /// The loop has exited. Sent exactly once.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Idle,
    Running,
    Stopped,
}

impl WorkerPhase {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => WorkerPhase::Idle,
            1 => WorkerPhase::Running,
            _ => WorkerPhase::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            WorkerPhase::Idle => 0,
            WorkerPhase::Running => 1,
            WorkerPhase::Stopped => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    pub interval: Duration,
    pub check_granularity: Duration,
}

impl WorkerSettings {
    /// Granularity is clamped to `1ms..=MAX_CHECK_GRANULARITY`.
    pub fn new(interval: Duration, check_granularity: Duration) -> Self {
        Self {
            interval,
            check_granularity: check_granularity
                .clamp(Duration::from_millis(1), MAX_CHECK_GRANULARITY),
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self::new(Duration::from_secs(300), Duration::from_millis(100))
    }
}

/// The only state shared between the worker task and everyone else.
#[derive(Debug)]
struct PollingFlags {
    phase: AtomicU8,
    manual_update_requested: AtomicBool,
}

/// Cloneable remote control for a worker.
#[derive(Debug, Clone)]
pub struct WorkerControl {
    flags: Arc<PollingFlags>,
}

impl WorkerControl {
    pub fn phase(&self) -> WorkerPhase {
        WorkerPhase::from_u8(self.flags.phase.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.phase() == WorkerPhase::Running
    }

    /// Ask the worker to fetch again as soon as it is waiting.
    ///
    /// Repeated requests before the worker notices collapse into one.
    pub fn request_manual_update(&self) {
        self.flags.manual_update_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_manual_update_pending(&self) -> bool {
        self.flags.manual_update_requested.load(Ordering::SeqCst)
    }

    /// Move to `Stopped`. Returns `true` only for the call that did it.
    pub fn stop(&self) -> bool {
        let previous = self
            .flags
            .phase
            .swap(WorkerPhase::Stopped.as_u8(), Ordering::SeqCst);
        previous != WorkerPhase::Stopped.as_u8()
    }

    fn begin(&self) -> bool {
        self.flags
            .phase
            .compare_exchange(
                WorkerPhase::Idle.as_u8(),
                WorkerPhase::Running.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    fn take_manual_request(&self) -> bool {
        self.flags.manual_update_requested.swap(false, Ordering::SeqCst)
    }
}

enum WaitOutcome {
    Elapsed,
    ManualRequest,
    Stopped,
}

/// Periodically fetches weather for one city and reports it over a channel.
#[derive(Debug)]
pub struct PollingWorker {
    source: Arc<dyn WeatherSource>,
    city: String,
    settings: WorkerSettings,
    control: WorkerControl,
    events: mpsc::UnboundedSender<WorkerEvent>,
}

impl PollingWorker {
    /// Create an idle worker and the inbox its events arrive on.
    pub fn new(
        source: Arc<dyn WeatherSource>,
        city: impl Into<String>,
        settings: WorkerSettings,
    ) -> (Self, mpsc::UnboundedReceiver<WorkerEvent>) {
        let (events, inbox) = mpsc::unbounded_channel();
        let control = WorkerControl {
            flags: Arc::new(PollingFlags {
                phase: AtomicU8::new(WorkerPhase::Idle.as_u8()),
                manual_update_requested: AtomicBool::new(false),
            }),
        };

        let worker = Self {
            source,
            city: city.into(),
            settings,
            control,
            events,
        };
        (worker, inbox)
    }

    pub fn control(&self) -> WorkerControl {
        self.control.clone()
    }

    /// Spawn the polling loop on the current tokio runtime.
    ///
    /// A worker stopped before it starts never fetches; it only reports
    /// `Finished`.
    pub fn start(self) -> WorkerHandle {
        let control = self.control.clone();
        if !control.begin() {
            tracing::debug!("worker stopped before start");
        }
        let task = tokio::spawn(self.run());
        WorkerHandle { control, task }
    }

    async fn run(self) {
        tracing::info!(
            city = %self.city,
            interval_secs = self.settings.interval.as_secs(),
            "polling worker started"
        );

        while self.control.is_running() {
            tracing::debug!(city = %self.city, "fetching weather");
            let result = self.source.fetch(&self.city).await;

            if !self.control.is_running() {
                tracing::debug!("worker stopped during fetch, discarding result");
                break;
            }

            let event = match result {
                Ok(record) => WorkerEvent::Updated(record),
                Err(e) => {
                    tracing::warn!(error = %e, "weather fetch failed");
                    WorkerEvent::Failed(e)
                }
            };
            self.emit(event);

            match self.wait_for_next_poll().await {
                WaitOutcome::Elapsed => {}
                WaitOutcome::ManualRequest => tracing::info!("manual update requested"),
                WaitOutcome::Stopped => break,
            }
        }

        tracing::info!("polling worker stopped");
        self.emit(WorkerEvent::Finished);
    }

    async fn wait_for_next_poll(&self) -> WaitOutcome {
        let deadline = Instant::now() + self.settings.interval;
        loop {
            if !self.control.is_running() {
                return WaitOutcome::Stopped;
            }
            if self.control.take_manual_request() {
                return WaitOutcome::ManualRequest;
            }

            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::Elapsed;
            }
            time::sleep(self.settings.check_granularity.min(deadline - now)).await;
        }
    }

    fn emit(&self, event: WorkerEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("worker inbox closed, event dropped");
        }
    }
}

/// Owner's handle to a started worker.
#[derive(Debug)]
pub struct WorkerHandle {
    control: WorkerControl,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn control(&self) -> WorkerControl {
        self.control.clone()
    }

    /// Stop the worker and wait at most `bound` for its loop to exit.
    ///
    /// Returns `false` if the task had to be aborted or had panicked.
    pub async fn shutdown(mut self, bound: Duration) -> bool {
        self.control.stop();
        match time::timeout(bound, &mut self.task).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "polling worker task failed");
                false
            }
            Err(_) => {
                tracing::warn!(?bound, "polling worker did not exit in time, aborting");
                self.task.abort();
                false
            }
        }
    }
}
