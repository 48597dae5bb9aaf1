use crate::track_state::TrackState;

pub const FALLBACK_ADVICE: &str = "Keep moving at a steady pace.";

/// Snapshot of the numbers the advisory service is asked about.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryStats {
    /// Meters.
    pub distance: f64,
    pub altitude: Option<f64>,
    /// Meters per second.
    pub speed: Option<f64>,
}

impl AdvisoryStats {
    pub fn from_state(state: &TrackState) -> Self {
        Self {
            distance: state.distance,
            altitude: state.altitude(),
            speed: state.speed(),
        }
    }

    pub fn prompt(&self) -> String {
        let altitude = self
            .altitude
            .map(|a| format!("{a:.0}"))
            .unwrap_or_else(|| "Unknown".into());
        let speed_kph = self.speed.unwrap_or(0.) * 3.6;

        format!(
            "I am currently hiking.\n\
             Distance traveled: {:.0} meters.\n\
             Current Altitude: {} meters.\n\
             Current Speed: {:.1} km/h.\n\
             Provide one short sentence of advice for a mountaineer based on these stats.\n\
             Keep it under 15 words. Focus on safety, pace, or hydration.",
            self.distance, altitude, speed_kph
        )
    }
}

/// Returns the kilometer mark reached if moving from `previous` to `current`
/// meters crossed a whole kilometer. Nothing below the first kilometer counts.
pub fn kilometer_crossed(previous: f64, current: f64) -> Option<u64> {
    let before = (previous / 1000.).floor();
    let after = (current / 1000.).floor();
    (after > before && after >= 1.).then_some(after as u64)
}
