//! Single-flight, cancellable forecast retrieval.
//!
//! Series requests go through one of two slots, [`SeriesSlot::Current`] and
//! [`SeriesSlot::Previous`]. Each slot holds at most one request in flight:
//! starting a new one cancels the predecessor's token before the new request
//! is issued, and a completion is applied only while its ticket is still the
//! live one for the slot.
//!
//! The heatmap path uses a different policy. A trigger while a sample fetch is
//! outstanding is dropped, never queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use sargassum_common::time::format_iso_date;
use sargassum_common::{ForecastSeries, SamplePoint, ViewerError};

use crate::error::{FetchError, FetchResult};
use crate::payload::{decode_samples, decode_volume};
use crate::transport::ForecastTransport;

/// Which series a request fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesSlot {
    Current,
    Previous,
}

impl SeriesSlot {
    pub const ALL: [SeriesSlot; 2] = [SeriesSlot::Current, SeriesSlot::Previous];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesSlot::Current => "current",
            SeriesSlot::Previous => "previous",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Fetching,
}

/// Proof of having started a request in a slot.
#[derive(Debug, Clone)]
pub struct SlotTicket {
    slot: SeriesSlot,
    generation: u64,
    token: CancellationToken,
}

impl SlotTicket {
    pub fn slot(&self) -> SeriesSlot {
        self.slot
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[derive(Debug, Default)]
struct SlotEntry {
    generation: u64,
    /// `Some` while a request is in flight.
    in_flight: Option<CancellationToken>,
}

/// Per-slot request bookkeeping.
///
/// Lives next to the data it guards so that a liveness check and the write it
/// permits happen under the same lock.
#[derive(Debug, Default)]
pub struct SlotTable {
    current: SlotEntry,
    previous: SlotEntry,
}

impl SlotTable {
    fn entry(&self, slot: SeriesSlot) -> &SlotEntry {
        match slot {
            SeriesSlot::Current => &self.current,
            SeriesSlot::Previous => &self.previous,
        }
    }

    fn entry_mut(&mut self, slot: SeriesSlot) -> &mut SlotEntry {
        match slot {
            SeriesSlot::Current => &mut self.current,
            SeriesSlot::Previous => &mut self.previous,
        }
    }

    pub fn state(&self, slot: SeriesSlot) -> SlotState {
        if self.entry(slot).in_flight.is_some() {
            SlotState::Fetching
        } else {
            SlotState::Idle
        }
    }

    /// Start a request, cancelling any predecessor first.
    pub fn begin(&mut self, slot: SeriesSlot) -> SlotTicket {
        let entry = self.entry_mut(slot);
        if let Some(previous) = entry.in_flight.take() {
            previous.cancel();
            counter!("forecast_fetch_cancelled_total", "slot" => slot.as_str()).increment(1);
            debug!(slot = slot.as_str(), "Cancelled in-flight request");
        }

        entry.generation += 1;
        let token = CancellationToken::new();
        entry.in_flight = Some(token.clone());
        counter!("forecast_fetch_started_total", "slot" => slot.as_str()).increment(1);

        SlotTicket {
            slot,
            generation: entry.generation,
            token,
        }
    }

    /// Cancel whatever is in flight. Returns whether anything was.
    pub fn cancel(&mut self, slot: SeriesSlot) -> bool {
        let entry = self.entry_mut(slot);
        entry.generation += 1;
        match entry.in_flight.take() {
            Some(token) => {
                token.cancel();
                counter!("forecast_fetch_cancelled_total", "slot" => slot.as_str()).increment(1);
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for slot in SeriesSlot::ALL {
            self.cancel(slot);
        }
    }

    pub fn is_live(&self, ticket: &SlotTicket) -> bool {
        let entry = self.entry(ticket.slot);
        entry.generation == ticket.generation && !ticket.token.is_cancelled()
    }

    /// Settle a finished request.
    ///
    /// A live ticket returns the slot to idle and hands back the result for
    /// the caller to apply. A stale one leaves the slot untouched.
    pub fn settle<T>(&mut self, ticket: &SlotTicket, result: FetchResult<T>) -> Settled<T> {
        if !self.is_live(ticket) {
            return Settled::Stale;
        }
        self.entry_mut(ticket.slot).in_flight = None;

        match result {
            Ok(value) => Settled::Ready(value),
            Err(FetchError::Cancelled) => Settled::Stale,
            Err(FetchError::Failed(err)) => {
                counter!("forecast_fetch_failed_total", "slot" => ticket.slot.as_str())
                    .increment(1);
                if err.is_transient() {
                    warn!(slot = ticket.slot.as_str(), error = %err, "Forecast fetch failed");
                } else {
                    error!(slot = ticket.slot.as_str(), error = %err, "Forecast fetch failed");
                }
                Settled::Failed(err)
            }
        }
    }
}

/// What [`SlotTable::settle`] decided.
#[derive(Debug)]
pub enum Settled<T> {
    /// Live and successful: apply it.
    Ready(T),
    /// Superseded or cancelled: drop silently.
    Stale,
    /// Live but failed: keep prior state.
    Failed(ViewerError),
}

/// Result of a user action that may have fetched.
#[derive(Debug)]
pub enum FetchOutcome {
    /// New data was written.
    Applied,
    /// The request was superseded or withdrawn; nothing changed.
    Cancelled,
    /// The request failed; prior state is retained.
    Failed(ViewerError),
    /// Nothing to fetch (no selection, heatmap busy, overlay off).
    Skipped,
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied)
    }
}

impl<T> From<Settled<T>> for FetchOutcome {
    fn from(settled: Settled<T>) -> Self {
        match settled {
            Settled::Ready(_) => FetchOutcome::Applied,
            Settled::Stale => FetchOutcome::Cancelled,
            Settled::Failed(err) => FetchOutcome::Failed(err),
        }
    }
}

/// "Fetch in progress" flag for the heatmap path.
#[derive(Debug, Clone, Default)]
pub struct HeatmapGuard {
    busy: Arc<AtomicBool>,
}

impl HeatmapGuard {
    /// Claim the guard, or `None` while another fetch holds it.
    pub fn try_acquire(&self) -> Option<HeatmapPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| HeatmapPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held for the duration of one heatmap fetch; releases the guard on drop,
/// including on failure paths.
#[derive(Debug)]
pub struct HeatmapPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for HeatmapPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Issues forecast requests over a transport.
pub struct ForecastFetchCoordinator<T> {
    transport: Arc<T>,
    heatmap: HeatmapGuard,
}

impl<T: ForecastTransport> ForecastFetchCoordinator<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            heatmap: HeatmapGuard::default(),
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Fetch and decode a volume series under `ticket`'s token.
    #[instrument(skip(self, ticket, date), fields(slot = ticket.slot().as_str(), date = %format_iso_date(date)))]
    pub async fn fetch_series(
        &self,
        ticket: &SlotTicket,
        date: &DateTime<Utc>,
        eez: &str,
    ) -> FetchResult<ForecastSeries> {
        if ticket.token().is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let body = self.transport.fetch_volume(date, eez, ticket.token()).await?;

        // A body that raced a cancellation is discarded unparsed.
        if ticket.token().is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let series = decode_volume(&body)?;
        info!(points = series.len(), "Fetched forecast series");
        Ok(series)
    }

    /// Claim the heatmap guard; a `None` means the trigger is dropped.
    pub fn try_begin_heatmap(&self) -> Option<HeatmapPermit> {
        let permit = self.heatmap.try_acquire();
        if permit.is_none() {
            counter!("heatmap_fetch_skipped_total").increment(1);
            debug!("Heatmap fetch in progress, dropping trigger");
        }
        permit
    }

    pub fn heatmap_busy(&self) -> bool {
        self.heatmap.is_busy()
    }

    /// Fetch and decode point samples while holding the heatmap guard.
    #[instrument(skip(self, _permit, date), fields(date = %format_iso_date(date)))]
    pub async fn fetch_samples(
        &self,
        _permit: &HeatmapPermit,
        date: &DateTime<Utc>,
    ) -> FetchResult<Vec<SamplePoint>> {
        counter!("heatmap_fetch_started_total").increment(1);
        let body = self.transport.fetch_samples(date).await?;
        let samples = decode_samples(&body, *date)?;
        debug!(samples = samples.len(), "Fetched point samples");
        Ok(samples)
    }
}
