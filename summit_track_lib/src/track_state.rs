use serde::{Deserialize, Serialize};

use crate::geo_point::GeoPoint;

/// Everything accumulated during one tracking session.
///
/// `distance` is always the sum of the great-circle distances between
/// consecutive points of `path`, in path order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackState {
    pub path: Vec<GeoPoint>,
    pub current_location: Option<GeoPoint>,
    /// Meters.
    pub distance: f64,
    pub tracking: bool,
}

impl TrackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a reading and extends the distance by the leg from the previous one.
    ///
    /// Takes the state by value, the caller's previous state is never observed
    /// in a half updated form.
    pub fn accumulate(mut self, point: GeoPoint) -> Self {
        let leg = self.last_point().map_or(0., |last| last.distance_to(&point));
        self.distance += leg;
        self.current_location = Some(point.clone());
        self.path.push(point);
        self
    }

    /// Clears the path and distance. The tracking flag and the last known
    /// location are kept, so the map still shows where the user is.
    pub fn reset(self) -> Self {
        Self {
            path: Vec::new(),
            distance: 0.,
            ..self
        }
    }

    pub fn with_tracking(self, tracking: bool) -> Self {
        Self { tracking, ..self }
    }

    pub fn last_point(&self) -> Option<&GeoPoint> {
        self.path.last()
    }

    pub fn altitude(&self) -> Option<f64> {
        self.current_location.as_ref().and_then(|p| p.altitude)
    }

    pub fn speed(&self) -> Option<f64> {
        self.current_location.as_ref().and_then(|p| p.speed)
    }
}
