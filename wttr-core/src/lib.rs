//! Core library for the `wttr-widget` binary.
//!
//! This crate defines:
//! - The weather source abstraction and its wttr.in implementation
//! - The background polling worker
//! - The coordinator that owns everything the widget displays
//! - Configuration handling
//!
//! Frontends drive an [`UpdateCoordinator`] from a single task and feed it the
//! [`WorkerEvent`]s a [`PollingWorker`] produces.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod source;
pub mod worker;

pub use config::Config;
pub use coordinator::{ButtonState, DisplayState, UpdateCoordinator};
pub use error::FetchError;
pub use model::{ConditionIcon, Measure, WeatherRecord};
pub use source::{WeatherSource, WttrSource, source_from_config};
pub use worker::{
    PollingWorker, WorkerControl, WorkerEvent, WorkerHandle, WorkerPhase, WorkerSettings,
};
