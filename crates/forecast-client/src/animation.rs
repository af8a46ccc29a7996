//! Date playback.
//!
//! While playing, each step advances the date, triggers the heatmap fetch
//! (dropped by the guard if the previous one is still running) and then
//! waits the animation delay. Playback stops by itself on the last day of the
//! window; scrubbing pauses it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::session::ViewerSession;
use crate::transport::ForecastTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSettings {
    pub delay: Duration,
    /// Days advanced per step.
    pub day_step: u32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
            day_step: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
}

/// How a playback run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    /// Reached the last day of the window.
    Completed,
    Paused,
}

struct Running {
    token: CancellationToken,
    /// Set once by the playback task when it ends.
    end: watch::Receiver<Option<PlaybackEnd>>,
}

impl Running {
    fn is_playing(&self) -> bool {
        !self.token.is_cancelled()
            && self.end.borrow().is_none()
            && self.end.has_changed().is_ok()
    }
}

/// Resolve once the playback task has ended. A task that died without
/// reporting counts as paused.
async fn finished(mut end: watch::Receiver<Option<PlaybackEnd>>) -> PlaybackEnd {
    end.wait_for(Option::is_some)
        .await
        .map(|reported| *reported)
        .ok()
        .flatten()
        .unwrap_or(PlaybackEnd::Paused)
}

/// Play/pause control over a session.
///
/// At most one playback task steps the session at a time.
pub struct Player<T> {
    session: Arc<ViewerSession<T>>,
    settings: PlaybackSettings,
    running: Mutex<Option<Running>>,
}

impl<T: ForecastTransport + 'static> Player<T> {
    pub fn new(session: Arc<ViewerSession<T>>, settings: PlaybackSettings) -> Self {
        Self {
            session,
            settings,
            running: Mutex::new(None),
        }
    }

    pub fn session(&self) -> &Arc<ViewerSession<T>> {
        &self.session
    }

    pub async fn state(&self) -> PlaybackState {
        match self.running.lock().await.as_ref() {
            Some(run) if run.is_playing() => PlaybackState::Playing,
            _ => PlaybackState::Paused,
        }
    }

    /// Start playback unless already playing.
    ///
    /// A paused run that is still finishing its last step is awaited first.
    pub async fn play(&self) -> PlaybackState {
        let mut running = self.running.lock().await;
        if let Some(run) = running.as_ref() {
            if run.is_playing() {
                return PlaybackState::Playing;
            }
            finished(run.end.clone()).await;
        }

        let token = CancellationToken::new();
        let (tx, rx) = watch::channel(None);
        let session = Arc::clone(&self.session);
        let settings = self.settings;
        let loop_token = token.clone();
        tokio::spawn(async move {
            let end = run_playback(session, settings, loop_token).await;
            tx.send_replace(Some(end));
        });
        *running = Some(Running { token, end: rx });
        info!(
            delay_ms = self.settings.delay.as_millis() as u64,
            day_step = self.settings.day_step,
            "Playback started"
        );
        PlaybackState::Playing
    }

    /// Stop playback after the current step.
    pub async fn pause(&self) -> PlaybackState {
        if let Some(run) = self.running.lock().await.as_ref() {
            if !run.token.is_cancelled() {
                run.token.cancel();
                info!("Playback paused");
            }
        }
        PlaybackState::Paused
    }

    pub async fn toggle(&self) -> PlaybackState {
        match self.state().await {
            PlaybackState::Playing => self.pause().await,
            PlaybackState::Paused => self.play().await,
        }
    }

    /// Manual date change: pauses playback, then moves the date and
    /// refreshes the heatmap.
    pub async fn scrub(&self, offset: i64) -> u32 {
        self.pause().await;
        let clamped = self.session.set_offset(offset).await;
        let outcome = self.session.refresh_heatmap().await;
        debug!(offset = clamped, outcome = ?outcome, "Scrubbed");
        clamped
    }

    /// Wait for the latest run to end; `None` if nothing was started.
    ///
    /// Any number of tasks may wait; the run stays controllable meanwhile.
    pub async fn wait(&self) -> Option<PlaybackEnd> {
        let end = self.running.lock().await.as_ref()?.end.clone();
        Some(finished(end).await)
    }
}

async fn run_playback<T: ForecastTransport>(
    session: Arc<ViewerSession<T>>,
    settings: PlaybackSettings,
    token: CancellationToken,
) -> PlaybackEnd {
    let window = *session.window();
    loop {
        if token.is_cancelled() {
            return PlaybackEnd::Paused;
        }
        if window.is_last(session.offset().await) {
            return PlaybackEnd::Completed;
        }

        let offset = session.step_offset(settings.day_step).await;
        let outcome = session.refresh_heatmap().await;
        debug!(offset, outcome = ?outcome, "Playback step");

        if window.is_last(offset) {
            info!(offset, "Playback reached end of window");
            return PlaybackEnd::Completed;
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => return PlaybackEnd::Paused,
            _ = tokio::time::sleep(settings.delay) => {}
        }
    }
}
