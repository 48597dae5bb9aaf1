use std::{path::{Path, PathBuf}, str::FromStr, time::Duration};

use anyhow::{anyhow, Context, Result};

use crate::advisor::DEFAULT_MODEL;

pub const CONFIG_FILE: &str = "summit_track.conf";
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    /// GNSS receiver emitting NMEA sentences.
    pub device: PathBuf,
    /// Use a simulated walker instead of `device`.
    pub simulate: bool,
    pub simulate_start: (f64, f64),
    pub simulate_heading: f64,
    pub simulate_speed: f64,

    pub api_key: Option<String>,
    pub model: String,
    pub advice_display: Duration,

    pub offline_mode: bool,
    pub log_file: PathBuf,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/ttyACM0"),
            simulate: false,
            simulate_start: (46.5483, 7.9822),
            simulate_heading: 45.,
            simulate_speed: 1.4,
            api_key: None,
            model: DEFAULT_MODEL.into(),
            advice_display: Duration::from_secs(8),
            offline_mode: false,
            log_file: PathBuf::from("log/summit_track.log"),
        }
    }
}

impl Configuration {
    /// Reads the configuration file if there is one, then applies the environment.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
            Self::parse(&text).with_context(|| format!("Invalid configuration in {:?}", path))?
        } else {
            tracing::info!("No configuration at {:?}, using defaults", path);
            Self::default()
        };

        if let Ok(key) = std::env::var(API_KEY_VAR) {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }

        Ok(config)
    }

    /// `key = value` lines, `#` starts a comment line.
    pub fn parse(text: &str) -> Result<Self> {
        let mut config = Self::default();

        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| anyhow!("line {}: expected `key = value`", number + 1))?;
            let (key, value) = (key.trim(), value.trim());

            let context = || format!("line {}: bad value for {}", number + 1, key);
            match key {
                "device" => config.device = PathBuf::from(value),
                "simulate" => config.simulate = parse_value(value).with_context(context)?,
                "simulate_start" => config.simulate_start = parse_coordinate(value).with_context(context)?,
                "simulate_heading" => config.simulate_heading = parse_value(value).with_context(context)?,
                "simulate_speed" => config.simulate_speed = parse_value(value).with_context(context)?,
                "api_key" => config.api_key = Some(value.to_string()).filter(|key| !key.is_empty()),
                "model" => config.model = value.to_string(),
                "advice_display_secs" => {
                    config.advice_display = Duration::from_secs(parse_value(value).with_context(context)?)
                }
                "offline_mode" => config.offline_mode = parse_value(value).with_context(context)?,
                "log_file" => config.log_file = PathBuf::from(value),
                _ => tracing::warn!("Unknown config key: {}", key),
            }
        }

        Ok(config)
    }
}

fn parse_value<T>(value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(value.parse()?)
}

fn parse_coordinate(value: &str) -> Result<(f64, f64)> {
    let (lat, lng) = value.split_once(',').ok_or_else(|| anyhow!("expected `lat,lng`"))?;
    let (lat, lng): (f64, f64) = (parse_value(lat.trim())?, parse_value(lng.trim())?);
    if !(-90. ..=90.).contains(&lat) || !(-180. ..=180.).contains(&lng) {
        return Err(anyhow!("coordinate out of range"));
    }
    Ok((lat, lng))
}
