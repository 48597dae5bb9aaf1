#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use summit_track::{
    advisor::Advisor,
    display::TrackDisplay,
    error::{AdvisoryError, PositionError},
    position_source::{PositionProvider, Reading, ReadingStream, WatchOptions},
};
use summit_track_lib::{advisory::AdvisoryStats, geo_point::GeoPoint, track_state::TrackState};
use tokio::sync::mpsc;

/// Provider whose readings are pushed by the test.
#[derive(Clone, Default)]
pub struct ManualProvider {
    watchers: Arc<Mutex<Vec<mpsc::UnboundedSender<Reading>>>>,
    watch_count: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl ManualProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn watch_count(&self) -> usize {
        self.watch_count.load(Ordering::SeqCst)
    }

    /// Number of streams that are still being listened to.
    pub fn live_watchers(&self) -> usize {
        let mut watchers = self.watchers.lock().unwrap();
        watchers.retain(|watcher| !watcher.is_closed());
        watchers.len()
    }

    pub fn push(&self, reading: Reading) {
        let mut watchers = self.watchers.lock().unwrap();
        watchers.retain(|watcher| watcher.send(reading.clone()).is_ok());
    }
}

impl PositionProvider for ManualProvider {
    fn watch(&self, _options: &WatchOptions) -> Result<ReadingStream, PositionError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PositionError::UnsupportedCapability("test provider disabled".into()));
        }

        self.watch_count.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.watchers.lock().unwrap().push(tx);
        Ok(stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|reading| (reading, rx)) }).boxed())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Render { points: usize, distance: f64, tracking: bool, offline_mode: bool },
    Advice(String),
    HideAdvice,
    Notice(String),
}

#[derive(Clone, Default)]
pub struct RecordingDisplay {
    pub shown: Arc<Mutex<Vec<Shown>>>,
}

impl RecordingDisplay {
    pub fn shown(&self) -> Vec<Shown> {
        self.shown.lock().unwrap().clone()
    }

    pub fn advice(&self) -> Vec<String> {
        self.shown()
            .into_iter()
            .filter_map(|shown| match shown {
                Shown::Advice(advice) => Some(advice),
                _ => None,
            })
            .collect()
    }
}

impl TrackDisplay for RecordingDisplay {
    fn render(&mut self, state: &TrackState, offline_mode: bool) {
        self.shown.lock().unwrap().push(Shown::Render {
            points: state.path.len(),
            distance: state.distance,
            tracking: state.tracking,
            offline_mode,
        });
    }

    fn show_advice(&mut self, advice: &str) {
        self.shown.lock().unwrap().push(Shown::Advice(advice.into()));
    }

    fn hide_advice(&mut self) {
        self.shown.lock().unwrap().push(Shown::HideAdvice);
    }

    fn notify(&mut self, message: &str) {
        self.shown.lock().unwrap().push(Shown::Notice(message.into()));
    }
}

/// Answers with a fixed text, or fails, and remembers what it was asked.
#[derive(Clone, Default)]
pub struct ScriptedAdvisor {
    pub asked: Arc<Mutex<Vec<AdvisoryStats>>>,
    pub fail: bool,
}

impl ScriptedAdvisor {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn asked(&self) -> Vec<AdvisoryStats> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Advisor for ScriptedAdvisor {
    async fn advise(&self, stats: &AdvisoryStats) -> Result<String, AdvisoryError> {
        self.asked.lock().unwrap().push(stats.clone());
        if self.fail {
            Err(AdvisoryError::Status(503))
        } else {
            Ok(format!("Drink water at {:.0} m", stats.distance))
        }
    }
}

pub fn start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_750_000_000, 0).unwrap()
}

/// Points along the equator, one per second, `step` degrees of longitude apart.
pub fn equator_walk(count: usize, step: f64) -> Vec<GeoPoint> {
    (0..count)
        .map(|i| GeoPoint::new(0., i as f64 * step, start_time() + chrono::Duration::seconds(i as i64)))
        .collect()
}

pub const SHORT: Duration = Duration::from_millis(200);
