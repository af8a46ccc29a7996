//! Sargassum forecast viewer.
//!
//! Command-line front end over a viewer session: list EEZs, print the
//! statistics panel and chart payload for an EEZ, dump the density grid for
//! a day, or play the forecast window day by day.

mod commands;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use forecast_client::{HttpTransport, ViewerSession};
use sargassum_common::{EezCatalog, ForecastWindow};

use crate::config::ViewerConfig;

/// Sargassum forecast viewer
#[derive(Parser, Debug)]
#[command(name = "sargassum-viewer")]
#[command(about = "Browse sargassum density forecasts per Exclusive Economic Zone")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "SARGASSUM_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the EEZs of the boundary source
    Eez,

    /// Print peak, covering periods and visual measure for an EEZ
    Stats {
        /// EEZ GEONAME (defaults to the configured initial EEZ)
        #[arg(long)]
        eez: Option<String>,

        /// Density threshold in m2/km2
        #[arg(long)]
        threshold: Option<f64>,

        /// Print the report as JSON
        #[arg(long)]
        raw: bool,
    },

    /// Print the chart datasets for an EEZ as JSON
    Chart {
        #[arg(long)]
        eez: Option<String>,

        /// Overlay the previous forecast
        #[arg(long)]
        previous: bool,

        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Print the density layer for one day: GeoJSON cells, colour ramp and style
    Grid {
        /// Forecast day (defaults to the first day of the window)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Play the forecast window from a given day until the end or Ctrl-C
    Play {
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Override the configured animation delay
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Override the configured day step
        #[arg(long)]
        day_step: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    // Logs go to stderr; stdout carries command output.
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if args.json {
        builder.json().init();
    } else {
        builder.init();
    }

    let mut config = ViewerConfig::load(args.config.as_deref())?;

    let catalog = EezCatalog::from_path(&config.eez_source).with_context(|| {
        format!(
            "Failed to load EEZ boundaries from {}",
            config.eez_source.display()
        )
    })?;
    info!(
        eez_count = catalog.len(),
        source = %config.eez_source.display(),
        "EEZ catalog loaded"
    );

    if let Command::Eez = args.command {
        commands::list_eez(&catalog);
        return Ok(());
    }

    if let Command::Play {
        delay_ms, day_step, ..
    } = &args.command
    {
        if let Some(delay_ms) = delay_ms {
            config.animation.delay_ms = *delay_ms;
        }
        if let Some(day_step) = day_step {
            config.animation.day_step = *day_step;
        }
        config.validate()?;
    }

    let window = ForecastWindow::from_today(config.window_months)?;
    info!(
        start = %window.start,
        end = %window.end,
        total_days = window.total_days,
        "Forecast window"
    );

    let transport = Arc::new(HttpTransport::new(&config.api_url, config.request_timeout())?);
    let session = Arc::new(ViewerSession::new(
        transport,
        catalog,
        config.session_settings(window),
    )?);

    match args.command {
        Command::Eez => Ok(()),
        Command::Stats {
            eez,
            threshold,
            raw,
        } => {
            let eez = eez.unwrap_or_else(|| config.initial_eez.clone());
            commands::stats(&session, &eez, threshold, raw).await
        }
        Command::Chart {
            eez,
            previous,
            threshold,
        } => {
            let eez = eez.unwrap_or_else(|| config.initial_eez.clone());
            commands::chart(&session, &eez, previous, threshold).await
        }
        Command::Grid { date } => commands::grid(&session, date).await,
        Command::Play { from, .. } => commands::play(session, config.playback(), from).await,
    }
}
