//! Playback over a short window with the tokio clock paused.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use common::{session_with, FakeResponse, FakeTransport};
use forecast_client::{PlaybackEnd, PlaybackSettings, PlaybackState, Player, SessionSettings};
use sargassum_common::ForecastWindow;
use test_utils::points_json;

/// 2025-01-15 to 2025-02-01: 17 days.
fn short_window() -> ForecastWindow {
    ForecastWindow::starting(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(), 1).unwrap()
}

fn player(day_step: u32) -> (Player<FakeTransport>, Arc<FakeTransport>) {
    let fake = FakeTransport::new();
    fake.push_samples(FakeResponse::Body(points_json(&[(-61.0, 16.0, 0.02)], None)));
    let session = session_with(fake.clone(), SessionSettings::new(short_window()));
    let settings = PlaybackSettings {
        delay: Duration::from_millis(1000),
        day_step,
    };
    (Player::new(session, settings), fake)
}

#[tokio::test(start_paused = true)]
async fn test_playback_runs_to_end_of_window() {
    let (player, fake) = player(1);
    assert_eq!(short_window().total_days, 17);

    assert_eq!(player.play().await, PlaybackState::Playing);
    assert_eq!(player.wait().await, Some(PlaybackEnd::Completed));

    assert_eq!(player.session().offset().await, 17);
    assert_eq!(fake.sample_requests().len(), 17);
    assert_eq!(fake.sample_requests().first().unwrap(), "2025-01-16");
    assert_eq!(fake.sample_requests().last().unwrap(), "2025-02-01");
    assert_eq!(player.state().await, PlaybackState::Paused);
}

#[tokio::test(start_paused = true)]
async fn test_day_step_clamps_to_last_day() {
    let (player, fake) = player(5);

    player.play().await;
    assert_eq!(player.wait().await, Some(PlaybackEnd::Completed));

    assert_eq!(
        fake.sample_requests(),
        vec!["2025-01-20", "2025-01-25", "2025-01-30", "2025-02-01"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_pause_stops_after_current_step() {
    let (player, fake) = player(1);

    player.play().await;
    // Steps run at t = 0, 1000 and 2000 ms
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(player.toggle().await, PlaybackState::Paused);
    assert_eq!(player.wait().await, Some(PlaybackEnd::Paused));

    assert_eq!(player.session().offset().await, 3);
    assert_eq!(fake.sample_requests().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_play_at_end_completes_immediately() {
    let (player, fake) = player(1);
    player.session().set_offset(100).await;

    player.play().await;
    assert_eq!(player.wait().await, Some(PlaybackEnd::Completed));
    assert!(fake.sample_requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_scrub_pauses_playback() {
    let (player, fake) = player(1);

    player.play().await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    let offset = player.scrub(10).await;

    assert_eq!(offset, 10);
    assert_eq!(player.state().await, PlaybackState::Paused);
    assert_eq!(player.wait().await, Some(PlaybackEnd::Paused));
    assert_eq!(player.session().offset().await, 10);
    assert_eq!(fake.sample_requests().last().unwrap(), "2025-01-25");
}

#[tokio::test(start_paused = true)]
async fn test_pause_while_another_task_waits() {
    let (player, fake) = player(1);
    let player = Arc::new(player);

    player.play().await;
    let waiter = tokio::spawn({
        let player = Arc::clone(&player);
        async move { player.wait().await }
    });
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(player.state().await, PlaybackState::Playing);
    assert_eq!(player.toggle().await, PlaybackState::Paused);
    assert_eq!(waiter.await.unwrap(), Some(PlaybackEnd::Paused));
    assert_eq!(fake.sample_requests().len(), 2);

    // Resuming runs a single loop at the configured rate
    assert_eq!(player.toggle().await, PlaybackState::Playing);
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(fake.sample_requests().len(), 5);
    assert_eq!(player.session().offset().await, 5);
}

#[tokio::test]
async fn test_wait_without_play() {
    let (player, _fake) = player(1);
    assert_eq!(player.wait().await, None);
    assert_eq!(player.state().await, PlaybackState::Paused);
}
