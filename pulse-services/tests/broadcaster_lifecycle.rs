//! End-to-end behaviour of the metrics broadcaster: subscriptions, ticks,
//! boost toggling and the timer lifecycle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pulse_core::{Snapshot, UpdateCause};
use pulse_services::{BroadcasterConfig, MetricsBroadcaster};

fn broadcaster(seed: u64) -> Arc<MetricsBroadcaster> {
    Arc::new(
        MetricsBroadcaster::new(BroadcasterConfig {
            seed: Some(seed),
            ..BroadcasterConfig::default()
        })
        .unwrap(),
    )
}

fn recorder() -> (Arc<Mutex<Vec<Snapshot>>>, impl Fn(&Snapshot) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |snapshot: &Snapshot| sink.lock().push(snapshot.clone()))
}

#[test]
fn test_subscribe_delivers_current_snapshot_immediately() {
    let broadcaster = broadcaster(1);
    broadcaster.tick_predictions();
    broadcaster.tick_networks();

    let (seen, listener) = recorder();
    let _subscription = broadcaster.subscribe(listener);

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].cause, UpdateCause::Initial);
    assert_eq!(seen[0].sequence, 2);
    assert_eq!(seen[0].predictions, broadcaster.predictions());
}

#[test]
fn test_tick_snapshot_respects_capacity_and_coherence_range() {
    let broadcaster = broadcaster(2);
    let (seen, listener) = recorder();
    let _subscription = broadcaster.subscribe(listener);

    broadcaster.tick_predictions();

    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    let snapshot = &seen[1];
    assert_eq!(snapshot.cause, UpdateCause::PredictionTick);
    assert!(snapshot.predictions.len() <= broadcaster.config().max_predictions);
    assert!(snapshot.system.coherence >= 95.0 && snapshot.system.coherence <= 99.99);
}

#[test]
fn test_toggle_boost_twice_restores_flag_and_notifies_twice() {
    let broadcaster = broadcaster(3);
    let original = broadcaster.system_state().boost_enabled;

    let (seen, listener) = recorder();
    let _subscription = broadcaster.subscribe(listener);
    seen.lock().clear();

    assert_eq!(broadcaster.toggle_boost(), !original);
    assert_eq!(broadcaster.toggle_boost(), original);
    assert_eq!(broadcaster.system_state().boost_enabled, original);

    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|s| s.cause == UpdateCause::BoostToggled));
    assert_eq!(seen[0].system.boost_enabled, !original);
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let broadcaster = broadcaster(4);
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    let subscription = broadcaster.subscribe(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(broadcaster.listener_count(), 1);

    broadcaster.tick_predictions();
    assert!(subscription.unsubscribe());
    assert!(!subscription.unsubscribe());
    assert!(!broadcaster.unsubscribe(subscription.id()));

    broadcaster.tick_predictions();
    broadcaster.tick_networks();
    broadcaster.toggle_boost();

    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(broadcaster.listener_count(), 0);
}

#[test]
fn test_failing_subscriber_does_not_block_others() {
    let broadcaster = broadcaster(5);
    let _bad = broadcaster.subscribe(|snapshot| {
        if snapshot.cause != UpdateCause::Initial {
            panic!("subscriber failure");
        }
    });
    let (seen, listener) = recorder();
    let _good = broadcaster.subscribe(listener);

    broadcaster.tick_predictions();
    broadcaster.toggle_boost();

    assert_eq!(seen.lock().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_timers_drive_ticks_until_stopped() {
    let broadcaster = broadcaster(6);
    let (seen, listener) = recorder();
    let _subscription = broadcaster.subscribe(listener);

    assert!(broadcaster.start());
    assert!(!broadcaster.start());
    assert!(broadcaster.is_running());

    // Network ticks at 2s and 4s, prediction tick at 5s
    tokio::time::sleep(Duration::from_millis(5_500)).await;
    {
        let seen = seen.lock();
        let causes: Vec<UpdateCause> = seen.iter().map(|s| s.cause).collect();
        assert_eq!(
            causes,
            vec![
                UpdateCause::Initial,
                UpdateCause::NetworkTick,
                UpdateCause::NetworkTick,
                UpdateCause::PredictionTick,
            ]
        );
        assert!(seen.windows(2).all(|w| w[0].sequence < w[1].sequence));
    }

    assert!(broadcaster.stop());
    assert!(!broadcaster.is_running());
    assert!(!broadcaster.stop());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(seen.lock().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_broadcaster_cancels_timers() {
    let broadcaster = broadcaster(9);
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    let _subscription = broadcaster.subscribe(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });

    broadcaster.start();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);

    // Timer tasks only hold weak references
    let weak = Arc::downgrade(&broadcaster);
    drop(broadcaster);
    assert!(weak.upgrade().is_none());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_stop() {
    let broadcaster = broadcaster(7);
    let (seen, listener) = recorder();
    let _subscription = broadcaster.subscribe(listener);

    broadcaster.start();
    broadcaster.stop();
    assert!(broadcaster.start());

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(seen.lock().last().map(|s| s.cause), Some(UpdateCause::NetworkTick));
    broadcaster.stop();
}

#[tokio::test(start_paused = true)]
async fn test_bounds_hold_under_running_timers() {
    let broadcaster = Arc::new(
        MetricsBroadcaster::new(BroadcasterConfig {
            prediction_interval: Duration::from_millis(50),
            network_interval: Duration::from_millis(20),
            spawn_probability: 1.0,
            seed: Some(8),
            ..BroadcasterConfig::default()
        })
        .unwrap(),
    );
    let bounds = *broadcaster.bounds();
    let violations = Arc::new(AtomicUsize::new(0));
    let v = Arc::clone(&violations);
    let _subscription = broadcaster.subscribe(move |snapshot| {
        if !snapshot.system.is_within(&bounds) || snapshot.predictions.len() > 10 {
            v.fetch_add(1, Ordering::SeqCst);
        }
    });

    broadcaster.start();
    tokio::time::sleep(Duration::from_secs(10)).await;
    broadcaster.stop();

    assert_eq!(violations.load(Ordering::SeqCst), 0);
    assert_eq!(broadcaster.predictions().len(), 10);
}
