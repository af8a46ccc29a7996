//! Subcommand handlers. Command output goes to stdout, logs to stderr.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{info, warn};

use forecast_client::{
    FetchOutcome, ForecastTransport, PlaybackEnd, PlaybackSettings, Player, ViewerSession,
};
use sargassum_common::time::format_human_date;
use sargassum_common::{EezCatalog, ForecastWindow};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Turn a fetch outcome into a command result.
fn require_applied(outcome: FetchOutcome, what: &str) -> Result<()> {
    match outcome {
        FetchOutcome::Applied => Ok(()),
        FetchOutcome::Failed(err) => Err(err).with_context(|| format!("Failed to load {}", what)),
        other => bail!("{} was not loaded ({:?})", what, other),
    }
}

pub fn list_eez(catalog: &EezCatalog) {
    let mut features: Vec<_> = catalog.iter().collect();
    features.sort_by(|a, b| a.name.cmp(&b.name));
    for feature in features {
        println!("{:>12.0} km2  {}", feature.area_km2, feature.name);
    }
}

async fn select<T: ForecastTransport>(
    session: &ViewerSession<T>,
    eez: &str,
    threshold: Option<f64>,
) -> Result<()> {
    if let Some(threshold) = threshold {
        session.set_threshold(threshold).await?;
    }
    let outcome = session.select_eez(eez).await?;
    require_applied(outcome, "forecast series")
}

pub async fn stats<T: ForecastTransport>(
    session: &ViewerSession<T>,
    eez: &str,
    threshold: Option<f64>,
    raw: bool,
) -> Result<()> {
    select(session, eez, threshold).await?;
    let report = session.report().await;

    if raw {
        return print_json(&report);
    }

    println!("EEZ:            {}", eez);
    if let Some(bounds) = session.selected_bounds().await {
        println!(
            "Bounds:         {:.3}, {:.3} .. {:.3}, {:.3}",
            bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y
        );
    }
    println!("Threshold:      {} m2/km2", session.threshold().await);
    println!("Peak:           {}", report.peak);
    println!("Visual measure: {}", report.visual_measure);
    println!("Above threshold:");
    for period in &report.periods {
        println!("  {}", period);
    }
    Ok(())
}

pub async fn chart<T: ForecastTransport>(
    session: &ViewerSession<T>,
    eez: &str,
    previous: bool,
    threshold: Option<f64>,
) -> Result<()> {
    select(session, eez, threshold).await?;
    if previous {
        let outcome = session.set_show_previous(true).await;
        if let FetchOutcome::Failed(err) = outcome {
            warn!(error = %err, "Previous forecast unavailable");
        }
    }
    print_json(&session.chart().await)
}

fn offset_for(window: &ForecastWindow, date: NaiveDate) -> Result<i64> {
    let at = Utc.from_utc_datetime(&date.and_time(NaiveTime::default()));
    match window.offset_of(&at) {
        Some(offset) => Ok(offset as i64),
        None => bail!(
            "{} is outside the forecast window {} .. {}",
            date,
            window.start.date_naive(),
            window.end.date_naive()
        ),
    }
}

pub async fn grid<T: ForecastTransport>(
    session: &ViewerSession<T>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let offset = match date {
        Some(date) => offset_for(session.window(), date)?,
        None => 0,
    };
    require_applied(session.select_date(offset).await, "density samples")?;

    let layer = session.heatmap_layer().await;
    info!(
        date = %format_human_date(&layer.date),
        cells = layer.cells.len(),
        "Density grid ready"
    );
    print_json(&layer)
}

pub async fn play<T: ForecastTransport + 'static>(
    session: Arc<ViewerSession<T>>,
    settings: PlaybackSettings,
    from: Option<NaiveDate>,
) -> Result<()> {
    let offset = match from {
        Some(date) => offset_for(session.window(), date)?,
        None => 0,
    };
    require_applied(session.select_date(offset).await, "density samples")?;

    let player = Player::new(Arc::clone(&session), settings);
    player.play().await;

    let end = tokio::select! {
        end = player.wait() => end,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            player.pause().await;
            player.wait().await
        }
    };

    let date = session.current_date().await;
    println!(
        "{} on {} ({} cells)",
        match end {
            Some(PlaybackEnd::Completed) => "Completed",
            _ => "Paused",
        },
        format_human_date(&date),
        session.grid().await.len()
    );
    Ok(())
}
