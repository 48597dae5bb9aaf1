mod common;

use std::{sync::Arc, time::Duration};

use common::{equator_walk, start_time, ManualProvider, SHORT};
use summit_track::{
    error::PositionError,
    position_source::{PositionEvent, PositionSource, SourceEvent, SourceState, WatchOptions},
};
use summit_track_lib::geo_point::GeoPoint;
use tokio::sync::mpsc;

fn source(provider: &ManualProvider) -> (PositionSource, mpsc::UnboundedReceiver<SourceEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (PositionSource::new(Arc::new(provider.clone()), tx), rx)
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<SourceEvent>) -> SourceEvent {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("no event within a second")
        .expect("channel closed")
}

#[tokio::test]
async fn start_twice_gives_one_subscription() {
    let provider = ManualProvider::new();
    let (mut source, mut rx) = source(&provider);

    source.start().unwrap();
    source.start().unwrap();
    assert_eq!(source.state(), SourceState::Active);
    assert_eq!(provider.watch_count(), 1);

    let point = equator_walk(1, 0.).remove(0);
    provider.push(Ok(point.clone()));

    let event = recv(&mut rx).await;
    assert_eq!(event.event, PositionEvent::Reading(point));
    assert!(tokio::time::timeout(SHORT, rx.recv()).await.is_err(), "reading delivered twice");
}

#[tokio::test]
async fn unsupported_capability_does_not_start() {
    let provider = ManualProvider::new();
    provider.set_unavailable(true);
    let (mut source, _rx) = source(&provider);

    let err = source.start().unwrap_err();

    assert!(matches!(err, PositionError::UnsupportedCapability(_)));
    assert_eq!(source.state(), SourceState::Stopped);
    assert_eq!(provider.watch_count(), 0);
}

#[tokio::test]
async fn stop_is_idempotent_and_releases_the_stream() {
    let provider = ManualProvider::new();
    let (mut source, _rx) = source(&provider);

    source.stop();
    assert_eq!(source.state(), SourceState::Stopped);

    source.start().unwrap();
    assert_eq!(provider.live_watchers(), 1);

    source.stop();
    source.stop();
    assert_eq!(source.state(), SourceState::Stopped);
    assert!(!source.is_current(1));

    tokio::time::sleep(SHORT).await;
    assert_eq!(provider.live_watchers(), 0);
}

#[tokio::test]
async fn restart_uses_a_fresh_subscription() {
    let provider = ManualProvider::new();
    let (mut source, mut rx) = source(&provider);

    source.start().unwrap();
    source.stop();
    source.start().unwrap();
    tokio::time::sleep(SHORT).await;

    assert_eq!(provider.watch_count(), 2);
    assert_eq!(provider.live_watchers(), 1);
    assert!(source.is_current(2));
    assert!(!source.is_current(1));

    provider.push(Ok(equator_walk(1, 0.).remove(0)));
    let event = recv(&mut rx).await;
    assert_eq!(event.generation, 2);
}

#[tokio::test]
async fn errors_do_not_end_the_subscription() {
    let provider = ManualProvider::new();
    let (mut source, mut rx) = source(&provider);
    source.start().unwrap();

    let point = equator_walk(1, 0.).remove(0);
    provider.push(Err(PositionError::SignalLost));
    provider.push(Err(PositionError::PermissionDenied("denied".into())));
    provider.push(Ok(point.clone()));

    assert_eq!(recv(&mut rx).await.event, PositionEvent::Error(PositionError::SignalLost));
    assert!(matches!(
        recv(&mut rx).await.event,
        PositionEvent::Error(PositionError::PermissionDenied(_))
    ));
    assert_eq!(recv(&mut rx).await.event, PositionEvent::Reading(point));
    assert_eq!(source.state(), SourceState::Active);
}

#[tokio::test(start_paused = true)]
async fn timeout_fails_one_attempt_only() {
    let provider = ManualProvider::new();
    let (mut source, mut rx) = source(&provider);
    source.start().unwrap();

    let before = tokio::time::Instant::now();
    let event = rx.recv().await.unwrap();
    assert_eq!(event.event, PositionEvent::Error(PositionError::ReadTimeout));
    assert!(before.elapsed() >= Duration::from_millis(5000));

    let point = equator_walk(1, 0.).remove(0);
    provider.push(Ok(point.clone()));
    assert_eq!(rx.recv().await.unwrap().event, PositionEvent::Reading(point));
}

#[tokio::test]
async fn readings_keep_arrival_order() {
    let provider = ManualProvider::new();
    let (mut source, mut rx) = source(&provider);
    source.start().unwrap();

    let points = equator_walk(20, 0.001);
    for point in &points {
        provider.push(Ok(point.clone()));
    }

    for point in points {
        assert_eq!(recv(&mut rx).await.event, PositionEvent::Reading(point));
    }
}

#[tokio::test]
async fn fixes_going_back_in_time_are_dropped() {
    let provider = ManualProvider::new();
    let (mut source, mut rx) = source(&provider);
    source.start().unwrap();

    let at = |secs: i64| GeoPoint::new(1., 1., start_time() + chrono::Duration::seconds(secs));
    provider.push(Ok(at(10)));
    provider.push(Ok(at(5)));
    provider.push(Ok(at(10)));
    provider.push(Ok(at(11)));

    assert_eq!(recv(&mut rx).await.event, PositionEvent::Reading(at(10)));
    assert_eq!(recv(&mut rx).await.event, PositionEvent::Reading(at(10)));
    assert_eq!(recv(&mut rx).await.event, PositionEvent::Reading(at(11)));
}

#[tokio::test]
async fn dropping_the_source_cancels() {
    let provider = ManualProvider::new();
    let (mut source, _rx) = source(&provider);
    source.start().unwrap();
    drop(source);

    tokio::time::sleep(SHORT).await;
    assert_eq!(provider.live_watchers(), 0);
}

#[tokio::test(start_paused = true)]
async fn default_and_custom_read_timeout() {
    let provider = ManualProvider::new();
    let (source, _rx) = source(&provider);
    let options = source.options().clone();
    assert!(options.high_accuracy);
    assert_eq!(options.maximum_age, Duration::ZERO);
    assert_eq!(options.timeout, Duration::from_millis(5000));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut source = PositionSource::new(Arc::new(provider.clone()), tx).with_options(WatchOptions {
        timeout: Duration::from_secs(1),
        ..options
    });
    source.start().unwrap();

    let before = tokio::time::Instant::now();
    assert_eq!(rx.recv().await.unwrap().event, PositionEvent::Error(PositionError::ReadTimeout));
    assert_eq!(rx.recv().await.unwrap().event, PositionEvent::Error(PositionError::ReadTimeout));
    let elapsed = before.elapsed();
    assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(5));
}
