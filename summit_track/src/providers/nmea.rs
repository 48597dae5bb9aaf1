use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use futures::{stream, StreamExt};
use nmea::{
    sentences::{FixType, GgaData, RmcData, rmc::RmcStatusOfFix},
    ParseResult,
};
use summit_track_lib::geo_point::GeoPoint;
use tokio::{
    fs::File,
    io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines},
};

use crate::{
    error::PositionError,
    position_source::{PositionProvider, Reading, ReadingStream, WatchOptions},
};

const KNOTS_TO_MPS: f64 = 1852. / 3600.;

/// Reads NMEA 0183 sentences from a GNSS receiver device (or a recorded log).
pub struct NmeaProvider {
    device: PathBuf,
}

impl NmeaProvider {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self { device: device.into() }
    }
}

impl PositionProvider for NmeaProvider {
    fn watch(&self, _options: &WatchOptions) -> Result<ReadingStream, PositionError> {
        // Receivers always stream fresh fixes at their best accuracy, nothing to configure.
        if !self.device.exists() {
            return Err(PositionError::UnsupportedCapability(format!(
                "no GNSS device at {:?}",
                self.device
            )));
        }

        let device = self.device.clone();
        let opened = stream::once(async move {
            match File::open(&device).await {
                Ok(file) => Ok(nmea_stream(BufReader::new(file))),
                Err(err) => Err(open_error(&device, err)),
            }
        });

        Ok(opened
            .flat_map(|result| match result {
                Ok(readings) => readings,
                Err(err) => stream::iter([Err(err)]).boxed(),
            })
            .boxed())
    }
}

/// Turns a line oriented NMEA source into a stream of readings.
pub fn nmea_stream<R: AsyncBufRead + Unpin + Send + 'static>(reader: R) -> ReadingStream {
    stream::unfold(
        (reader.lines(), NmeaDecoder::default()),
        |(mut lines, mut decoder)| async move {
            let reading = next_reading(&mut lines, &mut decoder).await?;
            Some((reading, (lines, decoder)))
        },
    )
    .boxed()
}

async fn next_reading<R: AsyncBufRead + Unpin>(lines: &mut Lines<R>, decoder: &mut NmeaDecoder) -> Option<Reading> {
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return None,
            Err(err) => {
                tracing::error!("Failed to read from GNSS device: {}", err);
                return None;
            }
        };

        if let Some(reading) = decoder.feed(&line) {
            return Some(reading);
        }
    }
}

/// Combines RMC and GGA sentences into readings.
#[derive(Debug, Default)]
pub struct NmeaDecoder {
    pending_altitude: Option<f64>,
}

impl NmeaDecoder {
    /// Feeds one line. Returns a reading when the line completes a fix or
    /// reports that the signal is gone.
    pub fn feed(&mut self, line: &str) -> Option<Reading> {
        let line = line.trim();

        match nmea::parse_str(line) {
            Ok(ParseResult::RMC(rmc)) => {
                let altitude = self.pending_altitude.take();
                let reading = fix_from_rmc(&rmc, line).map(|point| point.with_altitude(altitude));
                if reading.is_err() {
                    tracing::warn!("Unusable fix: {}", line);
                }
                Some(reading)
            }
            Ok(ParseResult::GGA(gga)) => {
                self.pending_altitude = altitude_from_gga(&gga);
                None
            }
            Ok(_) => None,
            // A recommended minimum sentence is the read attempt itself, losing it loses the fix.
            Err(err) if is_rmc(line) => {
                tracing::warn!("Failed to parse RMC sentence {:?}: {}", line, err);
                self.pending_altitude = None;
                Some(Err(PositionError::SignalLost))
            }
            Err(err) => {
                tracing::debug!("Ignoring NMEA line {:?}: {}", line, err);
                None
            }
        }
    }
}

fn fix_from_rmc(rmc: &RmcData, line: &str) -> Reading {
    if matches!(rmc.status_of_fix, RmcStatusOfFix::Invalid) {
        return Err(PositionError::SignalLost);
    }

    let (Some(latitude), Some(longitude), Some(date), Some(time)) = (rmc.lat, rmc.lon, rmc.fix_date, rmc.fix_time) else {
        return Err(PositionError::SignalLost);
    };

    if !coordinate_minutes_valid(line) {
        return Err(PositionError::SignalLost);
    }

    let point = GeoPoint::new(latitude, longitude, NaiveDateTime::new(date, time).and_utc())
        .with_speed(rmc.speed_over_ground.map(|knots| knots as f64 * KNOTS_TO_MPS));

    if !point.is_within_bounds() {
        return Err(PositionError::SignalLost);
    }

    Ok(point)
}

fn altitude_from_gga(gga: &GgaData) -> Option<f64> {
    match gga.fix_type {
        Some(FixType::Invalid) | None => None,
        Some(_) => gga.altitude.map(f64::from),
    }
}

fn is_rmc(line: &str) -> bool {
    line.get(3..6) == Some("RMC")
}

/// The minutes of `ddmm.mmmm` latitude and `dddmm.mmmm` longitude must stay below 60.
fn coordinate_minutes_valid(line: &str) -> bool {
    let body = line.split('*').next().unwrap_or(line);
    let fields: Vec<&str> = body.split(',').collect();

    [3, 5].iter().all(|&index| {
        let Some(field) = fields.get(index) else {
            return false;
        };
        let whole = field.split('.').next().unwrap_or(field);
        whole
            .get(whole.len().saturating_sub(2)..)
            .and_then(|minutes| minutes.parse::<u8>().ok())
            .is_some_and(|minutes| minutes < 60)
    })
}

fn open_error(device: &Path, err: std::io::Error) -> PositionError {
    match err.kind() {
        ErrorKind::PermissionDenied => PositionError::PermissionDenied(format!("{:?}: {}", device, err)),
        _ => {
            tracing::error!("Failed to open GNSS device {:?}: {}", device, err);
            PositionError::SignalLost
        }
    }
}
