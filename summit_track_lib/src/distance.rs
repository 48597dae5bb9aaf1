use crate::geo_point::GeoPoint;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two points. Altitude is ignored.
pub fn great_circle_distance(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    haversine_distance((p1.latitude, p1.longitude), (p2.latitude, p2.longitude))
}

/// Same as [`great_circle_distance`] on raw `(lat, lng)` pairs in degrees.
pub fn haversine_distance(p1: (f64, f64), p2: (f64, f64)) -> f64 {
    let lat1 = p1.0.to_radians();
    let lat2 = p2.0.to_radians();
    let d_lat = (p2.0 - p1.0).to_radians();
    let d_lon = (p2.1 - p1.1).to_radians();

    let a = f64::sin(d_lat / 2.).powi(2)
        + f64::cos(lat1) * f64::cos(lat2) * f64::sin(d_lon / 2.).powi(2);
    let c = 2. * f64::atan2(a.sqrt(), (1. - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Total length of a path, summing consecutive pairs in order.
pub fn path_length(path: &[GeoPoint]) -> f64 {
    path.windows(2)
        .map(|pair| great_circle_distance(&pair[0], &pair[1]))
        .sum()
}
