mod nmea;
mod simulated;

pub use nmea::*;
pub use simulated::*;
