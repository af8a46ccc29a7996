//! Viewer session: the state behind one map + chart view.
//!
//! All mutable state sits behind one async mutex that is never held across a
//! network await. Fetch paths lock to start a request, release, await the
//! transport, then lock again to settle and apply, so a liveness check and
//! the write it permits are atomic with respect to newer requests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use density_analysis::grid::to_feature_collection;
use density_analysis::{
    build_grid, DensityScale, GridCell, GridCellProperties, HeatmapRamp, HeatmapStyle, ScanBoundary,
    SeriesStatistics, StatisticsEngine, StatisticsReport,
};
use sargassum_common::{
    BoundingBox, EezCatalog, FeatureCollection, ForecastSeries, ForecastWindow, ViewerError,
    ViewerResult, NO_SELECTION,
};

use crate::chart::{chart_payload, click_to_offset, ChartDatasets, ChartPayload};
use crate::coordinator::{
    FetchOutcome, ForecastFetchCoordinator, SeriesSlot, Settled, SlotState, SlotTable,
};
use crate::error::FetchError;
use crate::transport::ForecastTransport;

/// Default threshold in m2/km2.
pub const DEFAULT_THRESHOLD: f64 = 80.0;

/// Static settings a session is created with.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub window: ForecastWindow,
    pub threshold: f64,
    pub density: DensityScale,
    pub scan_boundary: ScanBoundary,
    pub heatmap: HeatmapStyle,
}

impl SessionSettings {
    pub fn new(window: ForecastWindow) -> Self {
        Self {
            window,
            threshold: DEFAULT_THRESHOLD,
            density: DensityScale::default(),
            scan_boundary: ScanBoundary::default(),
            heatmap: HeatmapStyle::default(),
        }
    }
}

#[derive(Debug)]
struct SessionState {
    slots: SlotTable,
    datasets: ChartDatasets,
    selected: Option<String>,
    threshold: f64,
    offset: u32,
    show_previous: bool,
    grid: Vec<GridCell>,
    grid_revision: u64,
    heatmap: HeatmapStyle,
}

/// Point-in-time view of the session, for display and inspection.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub selected_eez: Option<String>,
    pub area_km2: Option<f64>,
    pub threshold: f64,
    pub offset: u32,
    pub date: DateTime<Utc>,
    pub show_previous: bool,
    pub current: ForecastSeries,
    pub previous: Option<ForecastSeries>,
    pub current_revision: u64,
    pub previous_revision: u64,
    pub grid_cells: usize,
    pub grid_revision: u64,
    pub heatmap: HeatmapStyle,
}

/// Everything the map needs to draw the density layer.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapLayer {
    pub date: DateTime<Utc>,
    pub style: HeatmapStyle,
    /// Colour stops over the normalised cell value.
    pub ramp: HeatmapRamp,
    pub cells: FeatureCollection<GridCellProperties>,
}

pub struct ViewerSession<T> {
    coordinator: ForecastFetchCoordinator<T>,
    catalog: EezCatalog,
    window: ForecastWindow,
    density: DensityScale,
    engine: StatisticsEngine,
    state: Mutex<SessionState>,
}

fn validate_threshold(value: f64) -> ViewerResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ViewerError::Config(format!(
            "threshold must be a non-negative number, got {}",
            value
        )))
    }
}

impl<T: ForecastTransport> ViewerSession<T> {
    pub fn new(
        transport: Arc<T>,
        catalog: EezCatalog,
        settings: SessionSettings,
    ) -> ViewerResult<Self> {
        if !settings.density.is_valid() {
            return Err(ViewerError::Config(format!(
                "density scale needs min < max, got {} .. {}",
                settings.density.min, settings.density.max
            )));
        }
        let threshold = validate_threshold(settings.threshold)?;

        Ok(Self {
            coordinator: ForecastFetchCoordinator::new(transport),
            catalog,
            window: settings.window,
            density: settings.density,
            engine: StatisticsEngine::new(settings.scan_boundary),
            state: Mutex::new(SessionState {
                slots: SlotTable::default(),
                datasets: ChartDatasets::default(),
                selected: None,
                threshold,
                offset: 0,
                show_previous: false,
                grid: Vec::new(),
                grid_revision: 0,
                heatmap: settings.heatmap,
            }),
        })
    }

    pub fn window(&self) -> &ForecastWindow {
        &self.window
    }

    pub fn catalog(&self) -> &EezCatalog {
        &self.catalog
    }

    pub fn coordinator(&self) -> &ForecastFetchCoordinator<T> {
        &self.coordinator
    }

    // === EEZ selection ===

    /// Select an EEZ by GEONAME and fetch its series.
    ///
    /// [`NO_SELECTION`] clears the selection and both datasets. Switching to
    /// a different EEZ withdraws both slots and clears both datasets before
    /// fetching. An unknown name fails with [`ViewerError::EezNotFound`] and
    /// changes nothing.
    #[instrument(skip(self))]
    pub async fn select_eez(&self, name: &str) -> ViewerResult<FetchOutcome> {
        if name == NO_SELECTION {
            let mut state = self.state.lock().await;
            state.slots.cancel_all();
            state.selected = None;
            state.datasets.clear();
            info!("EEZ selection cleared");
            return Ok(FetchOutcome::Skipped);
        }

        let feature = self.catalog.get(name)?;
        {
            let mut state = self.state.lock().await;
            if state.selected.as_deref() != Some(feature.name.as_str()) {
                // Series of the previous EEZ must not be shown or scored
                // against this one.
                state.slots.cancel_all();
                state.datasets.clear();
            }
            state.selected = Some(feature.name.clone());
        }
        info!(area_km2 = feature.area_km2, "EEZ selected");

        Ok(self.refresh_current().await)
    }

    pub async fn selected_eez(&self) -> Option<String> {
        self.state.lock().await.selected.clone()
    }

    /// Fit-bounds box of the selected EEZ.
    pub async fn selected_bounds(&self) -> Option<BoundingBox> {
        let selected = self.selected_eez().await?;
        self.catalog.get(&selected).ok()?.bounding_box()
    }

    // === Series fetches ===

    /// Re-fetch the current series for the selected EEZ, then the previous
    /// forecast if the overlay is on.
    #[instrument(skip(self))]
    pub async fn refresh_current(&self) -> FetchOutcome {
        let (ticket, eez) = {
            let mut state = self.state.lock().await;
            let Some(eez) = state.selected.clone() else {
                return FetchOutcome::Skipped;
            };
            (state.slots.begin(SeriesSlot::Current), eez)
        };

        let result = self
            .coordinator
            .fetch_series(&ticket, &self.window.start, &eez)
            .await;

        let (outcome, follow_up) = {
            let mut state = self.state.lock().await;
            let outcome = match state.slots.settle(&ticket, result) {
                Settled::Ready(series) => {
                    state.datasets.set(SeriesSlot::Current, series);
                    FetchOutcome::Applied
                }
                other => other.into(),
            };
            let follow_up = outcome.is_applied() && state.show_previous;
            (outcome, follow_up)
        };

        if follow_up {
            let previous = self.refresh_previous().await;
            debug!(outcome = ?previous, "Previous forecast refreshed");
        }
        outcome
    }

    /// Fetch the previous forecast, anchored at the first date of the
    /// current series and trimmed to its span.
    #[instrument(skip(self))]
    pub async fn refresh_previous(&self) -> FetchOutcome {
        let (ticket, eez, first, last) = {
            let mut state = self.state.lock().await;
            if !state.show_previous {
                return FetchOutcome::Skipped;
            }
            let Some(eez) = state.selected.clone() else {
                return FetchOutcome::Skipped;
            };
            let Some((first, last)) = state
                .datasets
                .get(SeriesSlot::Current)
                .and_then(ForecastSeries::time_span)
            else {
                return FetchOutcome::Skipped;
            };
            (state.slots.begin(SeriesSlot::Previous), eez, first, last)
        };

        let result = self
            .coordinator
            .fetch_series(&ticket, &first, &eez)
            .await
            .map(|series| series.within(first, last));

        let mut state = self.state.lock().await;
        match state.slots.settle(&ticket, result) {
            Settled::Ready(series) => {
                state.datasets.set(SeriesSlot::Previous, series);
                FetchOutcome::Applied
            }
            other => other.into(),
        }
    }

    /// Turn the previous-forecast overlay on or off.
    ///
    /// Turning it off withdraws any in-flight request and removes the dataset.
    pub async fn set_show_previous(&self, show: bool) -> FetchOutcome {
        {
            let mut state = self.state.lock().await;
            state.show_previous = show;
            if !show {
                state.slots.cancel(SeriesSlot::Previous);
                state.datasets.remove(SeriesSlot::Previous);
                return FetchOutcome::Skipped;
            }
        }
        self.refresh_previous().await
    }

    pub async fn slot_state(&self, slot: SeriesSlot) -> SlotState {
        self.state.lock().await.slots.state(slot)
    }

    pub async fn series(&self, slot: SeriesSlot) -> Option<ForecastSeries> {
        self.state.lock().await.datasets.get(slot).cloned()
    }

    pub async fn dataset_revision(&self, slot: SeriesSlot) -> u64 {
        self.state.lock().await.datasets.revision(slot)
    }

    // === Threshold and statistics ===

    pub async fn threshold(&self) -> f64 {
        self.state.lock().await.threshold
    }

    pub async fn set_threshold(&self, value: f64) -> ViewerResult<()> {
        let value = validate_threshold(value)?;
        self.state.lock().await.threshold = value;
        debug!(threshold = value, "Threshold updated");
        Ok(())
    }

    /// Statistics of the current series for the selected EEZ; recomputed on
    /// every call.
    pub async fn statistics(&self) -> SeriesStatistics {
        let state = self.state.lock().await;
        let Some(area) = state
            .selected
            .as_deref()
            .and_then(|name| self.catalog.get(name).ok())
            .map(|feature| feature.area_km2)
        else {
            return SeriesStatistics::default();
        };

        match state.datasets.get(SeriesSlot::Current) {
            Some(series) => self.engine.compute(series.points(), state.threshold, area),
            None => SeriesStatistics::default(),
        }
    }

    pub async fn report(&self) -> StatisticsReport {
        StatisticsReport::from_statistics(&self.statistics().await)
    }

    pub async fn chart(&self) -> ChartPayload {
        let state = self.state.lock().await;
        chart_payload(
            &state.datasets,
            state.show_previous,
            state.threshold,
            self.window.date_at(state.offset as i64),
        )
    }

    // === Date ===

    pub async fn offset(&self) -> u32 {
        self.state.lock().await.offset
    }

    pub async fn current_date(&self) -> DateTime<Utc> {
        self.window.date_at(self.offset().await as i64)
    }

    /// Move the date without fetching (slider drag). Returns the clamped offset.
    pub async fn set_offset(&self, offset: i64) -> u32 {
        let clamped = self.window.clamp_offset(offset);
        self.state.lock().await.offset = clamped;
        clamped
    }

    /// Advance the date by `days`, clamped to the window.
    pub async fn step_offset(&self, days: u32) -> u32 {
        let mut state = self.state.lock().await;
        state.offset = self
            .window
            .clamp_offset(state.offset as i64 + days as i64);
        state.offset
    }

    /// Move the date and refresh the heatmap (slider release).
    pub async fn select_date(&self, offset: i64) -> FetchOutcome {
        self.set_offset(offset).await;
        self.refresh_heatmap().await
    }

    /// Jump to the date of chart point `index`; `None` when the click does
    /// not map onto the window.
    pub async fn chart_click(&self, index: usize) -> Option<FetchOutcome> {
        let offset = {
            let state = self.state.lock().await;
            let series = state.datasets.get(SeriesSlot::Current)?;
            click_to_offset(series, index, &self.window)?
        };
        Some(self.select_date(offset as i64).await)
    }

    // === Heatmap ===

    /// Fetch point samples for the selected date and rebuild the grid.
    ///
    /// Dropped with [`FetchOutcome::Skipped`] while another heatmap fetch is
    /// outstanding.
    #[instrument(skip(self))]
    pub async fn refresh_heatmap(&self) -> FetchOutcome {
        let Some(permit) = self.coordinator.try_begin_heatmap() else {
            return FetchOutcome::Skipped;
        };
        let date = self.current_date().await;

        match self.coordinator.fetch_samples(&permit, &date).await {
            Ok(samples) => {
                let cells = build_grid(&samples, &self.density);
                let mut state = self.state.lock().await;
                state.grid = cells;
                state.grid_revision += 1;
                debug!(cells = state.grid.len(), "Heatmap grid replaced");
                FetchOutcome::Applied
            }
            Err(FetchError::Cancelled) => FetchOutcome::Cancelled,
            Err(FetchError::Failed(err)) => {
                warn!(error = %err, "Heatmap fetch failed");
                FetchOutcome::Failed(err)
            }
        }
    }

    pub async fn grid(&self) -> Vec<GridCell> {
        self.state.lock().await.grid.clone()
    }

    pub async fn grid_geojson(&self) -> FeatureCollection<GridCellProperties> {
        to_feature_collection(&self.state.lock().await.grid)
    }

    pub async fn heatmap_layer(&self) -> HeatmapLayer {
        let state = self.state.lock().await;
        HeatmapLayer {
            date: self.window.date_at(state.offset as i64),
            style: state.heatmap,
            ramp: HeatmapRamp::default(),
            cells: to_feature_collection(&state.grid),
        }
    }

    pub async fn heatmap_style(&self) -> HeatmapStyle {
        self.state.lock().await.heatmap
    }

    pub async fn set_heatmap_radius(&self, radius: u32) {
        self.state.lock().await.heatmap.radius = radius;
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            area_km2: state
                .selected
                .as_deref()
                .and_then(|name| self.catalog.get(name).ok())
                .map(|f| f.area_km2),
            selected_eez: state.selected.clone(),
            threshold: state.threshold,
            offset: state.offset,
            date: self.window.date_at(state.offset as i64),
            show_previous: state.show_previous,
            current: state
                .datasets
                .get(SeriesSlot::Current)
                .cloned()
                .unwrap_or_default(),
            previous: state.datasets.get(SeriesSlot::Previous).cloned(),
            current_revision: state.datasets.revision(SeriesSlot::Current),
            previous_revision: state.datasets.revision(SeriesSlot::Previous),
            grid_cells: state.grid.len(),
            grid_revision: state.grid_revision,
            heatmap: state.heatmap,
        }
    }
}
