use std::{ops::ControlFlow, sync::Arc, time::Duration};

use summit_track_lib::{
    advisory::{kilometer_crossed, AdvisoryStats},
    track_state::TrackState,
};
use tokio::{sync::mpsc, time::Instant};

use crate::{
    advisor::Advisor,
    display::TrackDisplay,
    position_source::{PositionEvent, PositionProvider, PositionSource, SourceEvent, SourceState},
};

/// User controls. `Reset` must only be sent once the user confirmed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleTracking,
    Reset,
    ToggleDisplayMode,
    Quit,
}

/// One tracking session: the only writer of the [`TrackState`].
pub struct Tracker {
    state: TrackState,
    offline_mode: bool,
    source: PositionSource,
    events: mpsc::UnboundedReceiver<SourceEvent>,
    display: Box<dyn TrackDisplay>,
    advisor: Option<Arc<dyn Advisor>>,
    advice_tx: mpsc::UnboundedSender<String>,
    advice_rx: mpsc::UnboundedReceiver<String>,
    advice_display: Duration,
    advice_deadline: Option<Instant>,
}

impl Tracker {
    pub fn new(provider: Arc<dyn PositionProvider>, display: Box<dyn TrackDisplay>) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (advice_tx, advice_rx) = mpsc::unbounded_channel();

        Self {
            state: TrackState::new(),
            offline_mode: false,
            source: PositionSource::new(provider, events_tx),
            events,
            display,
            advisor: None,
            advice_tx,
            advice_rx,
            advice_display: Duration::from_secs(8),
            advice_deadline: None,
        }
    }

    pub fn with_advisor(self, advisor: Arc<dyn Advisor>, advice_display: Duration) -> Self {
        Self {
            advisor: Some(advisor),
            advice_display,
            ..self
        }
    }

    pub fn with_offline_mode(self, offline_mode: bool) -> Self {
        Self { offline_mode, ..self }
    }

    pub fn state(&self) -> &TrackState {
        &self.state
    }

    pub fn offline_mode(&self) -> bool {
        self.offline_mode
    }

    pub fn source_state(&self) -> SourceState {
        self.source.state()
    }

    /// Runs until `Quit` or until the command channel closes. Returns the final state.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> TrackState {
        self.render();

        loop {
            let deadline = self.advice_deadline;

            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        tracing::debug!("Command channel closed");
                        break;
                    };
                    if self.handle_command(command).is_break() {
                        break;
                    }
                }
                Some(event) = self.events.recv() => self.handle_event(event),
                Some(advice) = self.advice_rx.recv() => self.show_advice(advice),
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.advice_deadline = None;
                    self.display.hide_advice();
                    self.render();
                }
            }
        }

        self.source.stop();
        tracing::info!("Tracker finished after {:.0} m", self.state.distance);
        self.state
    }

    pub fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        tracing::debug!("Command: {:?}", command);

        match command {
            Command::ToggleTracking if self.state.tracking => {
                self.source.stop();
                self.state = std::mem::take(&mut self.state).with_tracking(false);
            }
            Command::ToggleTracking => match self.source.start() {
                Ok(()) => self.state = std::mem::take(&mut self.state).with_tracking(true),
                Err(err) => {
                    tracing::error!("Failed to start tracking: {}", err);
                    self.display.notify(&err.to_string());
                }
            },
            Command::Reset => {
                tracing::info!("Resetting path of {} points", self.state.path.len());
                self.state = std::mem::take(&mut self.state).reset();
            }
            Command::ToggleDisplayMode => self.offline_mode = !self.offline_mode,
            Command::Quit => return ControlFlow::Break(()),
        }

        self.render();
        ControlFlow::Continue(())
    }

    /// Applies one event from the position source. Events of a subscription
    /// that has been stopped are dropped.
    pub fn handle_event(&mut self, event: SourceEvent) {
        if !self.source.is_current(event.generation) {
            tracing::debug!("Discarding event of stopped subscription {}", event.generation);
            return;
        }

        match event.event {
            PositionEvent::Reading(point) => {
                if !point.is_within_bounds() {
                    tracing::warn!("Dropping out of range fix {}, {}", point.latitude, point.longitude);
                    return;
                }

                let previous = self.state.distance;
                self.state = std::mem::take(&mut self.state).accumulate(point);

                if self.state.tracking {
                    if let Some(km) = kilometer_crossed(previous, self.state.distance) {
                        self.request_advice(km);
                    }
                }

                self.render();
            }
            PositionEvent::Error(err) => tracing::warn!("Position error: {}", err),
        }
    }

    /// Waits for the next raw event of the position source without applying it.
    ///
    /// `run` does this itself. Together with [`Tracker::handle_command`] and
    /// [`Tracker::handle_event`] it lets a caller step the session one event
    /// at a time instead, which is how the integration tests drive it.
    pub async fn next_event(&mut self) -> Option<SourceEvent> {
        self.events.recv().await
    }

    fn request_advice(&self, km: u64) {
        let Some(advisor) = self.advisor.clone() else {
            return;
        };

        let stats = AdvisoryStats::from_state(&self.state);
        let advice_tx = self.advice_tx.clone();
        tracing::info!("Passed {} km, asking for advice", km);

        tokio::spawn(async move {
            match advisor.advise(&stats).await {
                Ok(advice) => {
                    let _ = advice_tx.send(advice);
                }
                Err(err) => tracing::error!("Advice for km {} failed: {}", km, err),
            }
        });
    }

    fn show_advice(&mut self, advice: String) {
        tracing::info!("Advice: {}", advice);
        self.display.show_advice(&advice);
        self.advice_deadline = Some(Instant::now() + self.advice_display);
    }

    fn render(&mut self) {
        self.display.render(&self.state, self.offline_mode);
    }
}
