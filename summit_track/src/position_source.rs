use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use futures::{stream::BoxStream, StreamExt};
use summit_track_lib::geo_point::GeoPoint;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::PositionError;

pub type Reading = Result<GeoPoint, PositionError>;
pub type ReadingStream = BoxStream<'static, Reading>;

/// How a provider is asked to deliver fixes.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// Oldest cached fix a provider may hand out. Zero means always wait for a fresh one.
    pub maximum_age: Duration,
    /// A single read attempt fails if nothing arrives within this time.
    pub timeout: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::ZERO,
            timeout: Duration::from_millis(5000),
        }
    }
}

/// Something that can produce a continuous stream of position fixes.
pub trait PositionProvider: Send + Sync {
    /// Opens a fresh stream of readings. Every call must return a new,
    /// independent stream.
    fn watch(&self, options: &WatchOptions) -> Result<ReadingStream, PositionError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Reading(GeoPoint),
    Error(PositionError),
}

/// An event tagged with the subscription that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEvent {
    pub generation: u64,
    pub event: PositionEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Stopped,
    Active,
}

struct Subscription {
    generation: u64,
    task: JoinHandle<()>,
}

/// Owns the single live subscription to a [`PositionProvider`].
///
/// Events are forwarded to the channel given at construction. A consumer must
/// check [`PositionSource::is_current`] before applying an event, events of a
/// stopped subscription can still be sitting in the channel.
pub struct PositionSource {
    provider: Arc<dyn PositionProvider>,
    options: WatchOptions,
    events: mpsc::UnboundedSender<SourceEvent>,
    subscription: Option<Subscription>,
    last_generation: u64,
}

impl PositionSource {
    pub fn new(provider: Arc<dyn PositionProvider>, events: mpsc::UnboundedSender<SourceEvent>) -> Self {
        Self {
            provider,
            options: WatchOptions::default(),
            events,
            subscription: None,
            last_generation: 0,
        }
    }

    pub fn with_options(mut self, options: WatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    pub fn state(&self) -> SourceState {
        match self.subscription {
            Some(_) => SourceState::Active,
            None => SourceState::Stopped,
        }
    }

    pub fn start(&mut self) -> Result<(), PositionError> {
        if self.subscription.is_some() {
            tracing::debug!("Position source already active");
            return Ok(());
        }

        let stream = self.provider.watch(&self.options)?;

        self.last_generation += 1;
        let generation = self.last_generation;
        let task = tokio::spawn(forward_readings(
            stream,
            generation,
            self.options.timeout,
            self.events.clone(),
        ));

        self.subscription = Some(Subscription { generation, task });
        tracing::info!("Started position subscription {}", generation);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.task.abort();
            tracing::info!("Stopped position subscription {}", subscription.generation);
        }
    }

    /// True if `generation` is the subscription that is live right now.
    pub fn is_current(&self, generation: u64) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|subscription| subscription.generation == generation)
    }
}

impl Drop for PositionSource {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn forward_readings(
    mut stream: ReadingStream,
    generation: u64,
    timeout: Duration,
    events: mpsc::UnboundedSender<SourceEvent>,
) {
    let mut last_timestamp: Option<DateTime<Utc>> = None;

    loop {
        let event = match tokio::time::timeout(timeout, stream.next()).await {
            Err(_) => PositionEvent::Error(PositionError::ReadTimeout),
            Ok(Some(Err(err))) => PositionEvent::Error(err),
            Ok(Some(Ok(point))) => {
                if last_timestamp.is_some_and(|last| point.timestamp < last) {
                    tracing::warn!("Dropping out of order fix from {}", point.timestamp);
                    continue;
                }
                last_timestamp = Some(point.timestamp);
                PositionEvent::Reading(point)
            }
            Ok(None) => {
                tracing::info!("Position stream {} ended", generation);
                let _ = events.send(SourceEvent {
                    generation,
                    event: PositionEvent::Error(PositionError::SignalLost),
                });
                break;
            }
        };

        if events.send(SourceEvent { generation, event }).is_err() {
            tracing::debug!("Position event receiver dropped, ending subscription {}", generation);
            break;
        }
    }
}
