use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{CustomType, Text};
use wttr_core::{Config, WeatherSource, source_from_config};

use crate::{app, view};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wttr-widget", version, about = "Weather widget backed by wttr.in")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set the city and polling interval.
    Configure,

    /// Fetch the weather once and print it.
    Show {
        /// City name; defaults to the configured city.
        city: Option<String>,

        /// Print the full record as JSON.
        #[arg(long, conflicts_with = "text")]
        json: bool,

        /// Print wttr.in's own text report.
        #[arg(long)]
        text: bool,
    },

    /// Run the widget: poll in the background, update on demand.
    Watch {
        /// Override the configured city.
        #[arg(long)]
        city: Option<String>,

        /// Override the polling interval, in seconds.
        #[arg(long)]
        interval: Option<u64>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure => configure(config)?,
            Command::Show { city, json, text } => {
                if let Some(city) = city {
                    config.city = city;
                }
                config.validate()?;
                show(&config, json, text).await?;
            }
            Command::Watch { city, interval } => {
                if let Some(city) = city {
                    config.city = city;
                }
                if let Some(interval) = interval {
                    config.interval_secs = interval;
                }
                config.validate()?;
                app::run(config).await?;
            }
        }

        Ok(())
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let city = Text::new("City:")
        .with_default(&config.city)
        .prompt()
        .context("Failed to read city")?;
    config.city = city;

    config.interval_secs = CustomType::<u64>::new("Polling interval (seconds):")
        .with_default(config.interval_secs)
        .with_error_message("Please type a whole number of seconds")
        .prompt()
        .context("Failed to read polling interval")?;

    config.validate()?;
    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

async fn show(config: &Config, json: bool, text: bool) -> anyhow::Result<()> {
    let source = source_from_config(config)?;

    if text {
        let report = source.fetch_text(&config.city).await?;
        print!("{report}");
        return Ok(());
    }

    let record = source.fetch(&config.city).await?;
    if json {
        let out = serde_json::to_string_pretty(&record).context("Failed to serialize record")?;
        println!("{out}");
    } else {
        for line in view::summary(&record) {
            println!("{line}");
        }
    }

    Ok(())
}
