pub mod advisor;
pub mod configuration;
pub mod display;
pub mod error;
pub mod position_source;
pub mod providers;
pub mod tracker;
