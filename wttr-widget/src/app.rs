//! The interactive loop behind `wttr-widget watch`.
//!
//! Everything that touches [`DisplayState`](wttr_core::DisplayState) runs on
//! this one task. The polling worker runs beside it and only talks to it
//! through its event channel.

use std::{io, sync::Arc, time::Duration};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use wttr_core::{Config, PollingWorker, UpdateCoordinator, WeatherSource, source_from_config};

use crate::view::TextView;

/// How long shutdown waits for the worker to exit before aborting it.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Update,
    Quit,
    Unknown,
}

impl Input {
    fn parse(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "" | "u" | "update" => Input::Update,
            "q" | "quit" | "exit" => Input::Quit,
            _ => Input::Unknown,
        }
    }
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let source: Arc<dyn WeatherSource> = Arc::new(source_from_config(&config)?);

    let (worker, mut inbox) =
        PollingWorker::new(source.clone(), config.city.clone(), config.worker_settings());
    let mut coordinator = UpdateCoordinator::new(
        source,
        config.city.clone(),
        worker.control(),
        config.update_timeout(),
    );
    let worker = worker.start();

    let mut view = TextView::new(io::stdout());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    coordinator.request_update().await;
    view.draw(coordinator.state())?;

    // request_update settles its own timeout before returning, so the loop
    // never has an armed deadline to wait on.
    loop {
        tokio::select! {
            Some(event) = inbox.recv() => coordinator.handle_event(event),
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    tracing::debug!("stdin closed");
                    break;
                };
                match Input::parse(&line) {
                    Input::Update => coordinator.request_update().await,
                    Input::Quit => break,
                    Input::Unknown => view.note(&format!(
                        "Unknown command {:?}; press Enter to update or q to quit",
                        line.trim()
                    ))?,
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("interrupted");
                break;
            }
        }

        view.draw(coordinator.state())?;
    }

    if !worker.shutdown(SHUTDOWN_GRACE).await {
        tracing::warn!("polling worker did not shut down cleanly");
    }
    while let Ok(event) = inbox.try_recv() {
        coordinator.handle_event(event);
    }

    Ok(())
}
