pub mod advisory;
pub mod distance;
pub mod format;
pub mod geo_point;
pub mod map_layer;
pub mod track_state;
