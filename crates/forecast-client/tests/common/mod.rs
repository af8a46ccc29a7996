//! Shared helpers for forecast-client integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use forecast_client::{
    FetchError, FetchResult, ForecastTransport, SessionSettings, ViewerSession,
};
use sargassum_common::time::format_iso_date;
use sargassum_common::{EezCatalog, ForecastWindow, ViewerError, ViewerResult};

#[derive(Debug, Clone)]
pub enum FakeResponse {
    Body(String),
    Status(u16),
}

#[derive(Default)]
struct FakeState {
    /// Keyed by (ISO date, EEZ). The last queued response is reused.
    volumes: HashMap<(String, String), VecDeque<FakeResponse>>,
    samples: VecDeque<FakeResponse>,
    volume_gates: VecDeque<oneshot::Receiver<()>>,
    sample_gates: VecDeque<oneshot::Receiver<()>>,
    volume_requests: Vec<(String, String)>,
    sample_requests: Vec<String>,
    ignore_cancellation: bool,
}

fn next(queue: Option<&mut VecDeque<FakeResponse>>) -> FakeResponse {
    match queue {
        Some(q) if q.len() > 1 => q.pop_front().unwrap(),
        Some(q) => q.front().cloned().unwrap_or(FakeResponse::Status(404)),
        None => FakeResponse::Status(404),
    }
}

fn into_result(response: FakeResponse, url: String) -> ViewerResult<String> {
    match response {
        FakeResponse::Body(body) => Ok(body),
        FakeResponse::Status(status) => Err(ViewerError::HttpStatus { status, url }),
    }
}

/// In-memory transport with scripted responses and per-request gates.
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<FakeState>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_volume(&self, date: &DateTime<Utc>, eez: &str, response: FakeResponse) {
        self.state
            .lock()
            .unwrap()
            .volumes
            .entry((format_iso_date(date), eez.to_string()))
            .or_default()
            .push_back(response);
    }

    pub fn push_samples(&self, response: FakeResponse) {
        self.state.lock().unwrap().samples.push_back(response);
    }

    /// Hold the next volume request until the returned sender fires or drops.
    pub fn hold_next_volume(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().volume_gates.push_back(rx);
        tx
    }

    pub fn hold_next_samples(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().sample_gates.push_back(rx);
        tx
    }

    /// Keep serving held requests after their token is cancelled.
    pub fn ignore_cancellation(&self) {
        self.state.lock().unwrap().ignore_cancellation = true;
    }

    pub fn volume_requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().volume_requests.clone()
    }

    pub fn sample_requests(&self) -> Vec<String> {
        self.state.lock().unwrap().sample_requests.clone()
    }

    pub async fn wait_for_volume_requests(&self, n: usize) {
        while self.volume_requests().len() < n {
            tokio::task::yield_now().await;
        }
    }

    pub async fn wait_for_sample_requests(&self, n: usize) {
        while self.sample_requests().len() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl ForecastTransport for FakeTransport {
    async fn fetch_volume(
        &self,
        date: &DateTime<Utc>,
        eez: &str,
        cancel: &CancellationToken,
    ) -> FetchResult<String> {
        let key = (format_iso_date(date), eez.to_string());
        let (response, gate, honour_cancel) = {
            let mut state = self.state.lock().unwrap();
            state.volume_requests.push(key.clone());
            let response = next(state.volumes.get_mut(&key));
            (
                response,
                state.volume_gates.pop_front(),
                !state.ignore_cancellation,
            )
        };

        if let Some(gate) = gate {
            if honour_cancel {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                    _ = gate => {}
                }
            } else {
                let _ = gate.await;
            }
        }

        Ok(into_result(response, format!("{}/volume/{}", key.0, key.1))?)
    }

    async fn fetch_samples(&self, date: &DateTime<Utc>) -> ViewerResult<String> {
        let iso = format_iso_date(date);
        let (response, gate) = {
            let mut state = self.state.lock().unwrap();
            state.sample_requests.push(iso.clone());
            let response = next(Some(&mut state.samples));
            (response, state.sample_gates.pop_front())
        };

        if let Some(gate) = gate {
            let _ = gate.await;
        }

        into_result(response, iso)
    }
}

pub fn window() -> ForecastWindow {
    ForecastWindow::starting(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(), 7).unwrap()
}

pub fn catalog() -> EezCatalog {
    EezCatalog::from_geojson_str(&test_utils::eez_geojson()).unwrap()
}

pub fn session(transport: Arc<FakeTransport>) -> Arc<ViewerSession<FakeTransport>> {
    session_with(transport, SessionSettings::new(window()))
}

pub fn session_with(
    transport: Arc<FakeTransport>,
    settings: SessionSettings,
) -> Arc<ViewerSession<FakeTransport>> {
    Arc::new(ViewerSession::new(transport, catalog(), settings).unwrap())
}
