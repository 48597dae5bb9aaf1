//! Text helpers for the watch face overlay.

pub fn format_distance(meters: f64) -> String {
    if meters < 1000. {
        format!("{}m", meters.round())
    } else {
        format!("{:.2}km", meters / 1000.)
    }
}

pub fn format_speed(mps: Option<f64>) -> String {
    match mps {
        Some(mps) if mps != 0. => format!("{:.1} km/h", mps * 3.6),
        _ => "0.0 km/h".into(),
    }
}

pub fn format_altitude(meters: Option<f64>) -> String {
    format!("{}m", meters.unwrap_or(0.).round())
}
