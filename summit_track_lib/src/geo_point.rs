use chrono::{DateTime, Utc};
use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::distance::great_circle_distance;

/// A single positional sample as delivered by a position provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    /// Meters above sea level, if the receiver knows it.
    pub altitude: Option<f64>,
    /// Meters per second, if the receiver knows it.
    pub speed: Option<f64>,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
            altitude: None,
            speed: None,
        }
    }

    pub fn with_altitude(self, altitude: Option<f64>) -> Self {
        Self { altitude, ..self }
    }

    pub fn with_speed(self, speed: Option<f64>) -> Self {
        // Negative speeds are receiver noise, not a direction.
        Self { speed: speed.map(|s| s.max(0.0)), ..self }
    }

    /// Position as a `geo_types` point, x = longitude and y = latitude.
    pub fn position(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }

    pub fn is_within_bounds(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        great_circle_distance(self, other)
    }
}
