use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::Utc;
use futures::{stream, StreamExt};
use summit_track_lib::{distance::EARTH_RADIUS_M, geo_point::GeoPoint};

use crate::{
    error::PositionError,
    position_source::{PositionProvider, ReadingStream, WatchOptions},
};

const HIGH_ACCURACY_JITTER_M: f64 = 2.;
const LOW_ACCURACY_JITTER_M: f64 = 15.;

/// A walker moving in a straight line, for running without a receiver.
pub struct SimulatedProvider {
    heading: f64,
    speed: f64,
    interval: Duration,
    altitude: Option<f64>,
    walk: Arc<Mutex<Walk>>,
}

struct Walk {
    position: (f64, f64),
    last_fix: Option<GeoPoint>,
}

impl SimulatedProvider {
    /// `heading` in degrees clockwise from north, `speed` in m/s.
    pub fn new(start: (f64, f64), heading: f64, speed: f64, interval: Duration) -> Self {
        Self {
            heading,
            speed,
            interval,
            altitude: None,
            walk: Arc::new(Mutex::new(Walk {
                position: start,
                last_fix: None,
            })),
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }
}

impl PositionProvider for SimulatedProvider {
    fn watch(&self, options: &WatchOptions) -> Result<ReadingStream, PositionError> {
        let jitter = if options.high_accuracy {
            HIGH_ACCURACY_JITTER_M
        } else {
            LOW_ACCURACY_JITTER_M
        };

        let cached = {
            let walk = self.walk.lock().map_err(|_| PositionError::SignalLost)?;
            walk.last_fix.clone().filter(|fix| {
                let age = (Utc::now() - fix.timestamp).to_std().unwrap_or(Duration::ZERO);
                !options.maximum_age.is_zero() && age <= options.maximum_age
            })
        };

        let step = self.speed * self.interval.as_secs_f64();
        let (heading, interval, altitude, walk) = (self.heading, self.interval, self.altitude, self.walk.clone());

        let fresh = stream::unfold(walk, move |walk| async move {
            tokio::time::sleep(interval).await;

            let fix = {
                let mut state = match walk.lock() {
                    Ok(state) => state,
                    Err(_) => return Some((Err(PositionError::SignalLost), walk.clone())),
                };
                let (lat, lng) = destination(state.position, heading, step);
                state.position = (lat, lng);

                let (jitter_lat, jitter_lng) = offset(
                    (lat, lng),
                    (rand::random::<f64>() * 2. - 1.) * jitter,
                    (rand::random::<f64>() * 2. - 1.) * jitter,
                );
                let fix = GeoPoint::new(jitter_lat, jitter_lng, Utc::now())
                    .with_altitude(altitude)
                    .with_speed(Some(step / interval.as_secs_f64()));
                state.last_fix = Some(fix.clone());
                fix
            };

            Some((Ok(fix), walk))
        });

        Ok(stream::iter(cached.map(Ok)).chain(fresh).boxed())
    }
}

/// Point reached from `start` after `distance` meters along `bearing` degrees.
fn destination(start: (f64, f64), bearing: f64, distance: f64) -> (f64, f64) {
    let lat1 = start.0.to_radians();
    let lng1 = start.1.to_radians();
    let bearing = bearing.to_radians();
    let delta = distance / EARTH_RADIUS_M;

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * bearing.cos()).asin();
    let lng2 = lng1 + f64::atan2(
        bearing.sin() * delta.sin() * lat1.cos(),
        delta.cos() - lat1.sin() * lat2.sin(),
    );

    // Normalise into [-180, 180).
    let lng2 = (lng2.to_degrees() + 540.) % 360. - 180.;
    (lat2.to_degrees(), lng2)
}

/// Small planar offset in meters north and east.
fn offset(position: (f64, f64), north: f64, east: f64) -> (f64, f64) {
    let d_lat = (north / EARTH_RADIUS_M).to_degrees();
    let d_lng = (east / (EARTH_RADIUS_M * position.0.to_radians().cos())).to_degrees();
    (position.0 + d_lat, position.1 + d_lng)
}
