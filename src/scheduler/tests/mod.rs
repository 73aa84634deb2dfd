use super::*;
use crate::tracker::test_helpers::{base_path, create_test_tracker, queue_item};
use crate::types::{COMPLETED, ExtractStatus, TORRENT};
use chrono::TimeDelta;

const HOUR: Duration = Duration::from_secs(3600);

#[tokio::test]
async fn test_tick_advances_before_detecting() {
    let t = create_test_tracker(HOUR);
    let now = Utc::now();
    t.insert(
        "old",
        Application::Sonarr,
        ExtractStatus::Extracted,
        now - TimeDelta::minutes(5),
    )
    .await;
    t.locator.add(base_path(Application::Radarr).join("new"), 1);
    t.set_queue(Application::Radarr, vec![queue_item("new", COMPLETED, TORRENT)])
        .await;

    let scheduler = Scheduler::new(
        t.tracker.clone(),
        vec![Application::Sonarr, Application::Radarr],
        Duration::from_secs(60),
    );
    let counts = scheduler.tick(now).await;

    // Counts reflect history before this tick's detections
    assert_eq!(counts.extracted, 1);
    assert_eq!(counts.extracting, 0);

    t.drain().await;
    assert_eq!(t.status("old").await, Some(ExtractStatus::Imported));
    assert_eq!(t.status("new").await, Some(ExtractStatus::Extracted));
}

#[tokio::test]
async fn test_tick_skips_unlisted_applications() {
    let t = create_test_tracker(HOUR);
    t.locator.add(base_path(Application::Radarr).join("movie"), 1);
    t.set_queue(Application::Radarr, vec![queue_item("movie", COMPLETED, TORRENT)])
        .await;

    let scheduler = Scheduler::new(
        t.tracker.clone(),
        vec![Application::Sonarr],
        Duration::from_secs(60),
    );
    scheduler.tick(Utc::now()).await;
    t.drain().await;

    assert!(t.tracker.history().is_empty().await);
}

#[tokio::test]
async fn test_run_stops_on_cancel() {
    let t = create_test_tracker(HOUR);
    let scheduler = Scheduler::new(t.tracker.clone(), vec![], Duration::from_secs(60));
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(scheduler.run(cancel.clone()));
    cancel.cancel();

    // Exits without waiting for the next minute tick
    let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
    assert!(result.is_ok(), "scheduler should exit on cancellation");
}

#[tokio::test]
async fn test_run_ticks_periodically() {
    let t = create_test_tracker(HOUR);
    t.locator.add(base_path(Application::Sonarr).join("Show.S03E01"), 1);
    t.set_queue(
        Application::Sonarr,
        vec![queue_item("Show.S03E01", COMPLETED, TORRENT)],
    )
    .await;

    let scheduler = Scheduler::new(
        t.tracker.clone(),
        vec![Application::Sonarr],
        Duration::from_millis(20),
    );
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(scheduler.run(cancel.clone()));

    let mut status = None;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        status = t.status("Show.S03E01").await;
        if status == Some(ExtractStatus::Extracted) {
            break;
        }
    }
    assert_eq!(status, Some(ExtractStatus::Extracted));

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_run_with_extreme_intervals_still_cancels() {
    for interval in [Duration::ZERO, Duration::MAX] {
        let t = create_test_tracker(HOUR);
        let scheduler = Scheduler::new(t.tracker.clone(), vec![Application::Sonarr], interval);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(scheduler.run(cancel.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(
            matches!(result, Ok(Ok(()))),
            "scheduler with {interval:?} interval should run and stop cleanly"
        );
    }
}
