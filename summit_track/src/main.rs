use std::{fs::OpenOptions, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use summit_track::{
    advisor::{Advisor, GeminiAdvisor},
    configuration::{Configuration, CONFIG_FILE},
    display::ConsoleDisplay,
    position_source::PositionProvider,
    providers::{NmeaProvider, SimulatedProvider},
    tracker::{Command, Tracker},
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let root: PathBuf = project_root::get_project_root().unwrap_or_else(|_| PathBuf::from("."));
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| root.join(CONFIG_FILE));

    let config = Configuration::load(&config_path)?;

    let log_file = root.join(&config.log_file);
    if let Some(dir) = log_file.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory {:?}", dir))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .with_context(|| format!("Failed to open log file {:?}", log_file))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    tracing::info!("Starting SummitTrack with {:?}", config_path);

    let provider: Arc<dyn PositionProvider> = if config.simulate {
        tracing::info!("Simulating a walk from {:?}", config.simulate_start);
        Arc::new(SimulatedProvider::new(
            config.simulate_start,
            config.simulate_heading,
            config.simulate_speed,
            Duration::from_secs(1),
        ))
    } else {
        tracing::info!("Reading NMEA from {:?}", config.device);
        Arc::new(NmeaProvider::new(&config.device))
    };

    let mut tracker = Tracker::new(provider, Box::new(ConsoleDisplay::default())).with_offline_mode(config.offline_mode);

    match &config.api_key {
        Some(api_key) => {
            let advisor: Arc<dyn Advisor> = Arc::new(GeminiAdvisor::new(api_key.clone(), config.model.clone())?);
            tracker = tracker.with_advisor(advisor, config.advice_display);
        }
        None => tracing::warn!("No {} set, advice is disabled", summit_track::configuration::API_KEY_VAR),
    }

    let (commands_tx, commands_rx) = mpsc::channel(16);
    tokio::spawn(read_commands(commands_tx));

    println!("t = start/stop tracking, r = reset path, m = toggle offline map, q = quit");
    tracker.run(commands_rx).await;

    tracing::info!("Stopped");
    Ok(())
}

/// Turns stdin lines into commands. Reset asks for confirmation first.
async fn read_commands(commands: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let command = match line.trim() {
            "t" => Command::ToggleTracking,
            "m" => Command::ToggleDisplayMode,
            "q" => Command::Quit,
            "r" => {
                println!("Reset current path? [y/N]");
                match lines.next_line().await {
                    Ok(Some(answer)) if answer.trim().eq_ignore_ascii_case("y") => Command::Reset,
                    _ => continue,
                }
            }
            "" => continue,
            other => {
                println!("Unknown command {:?}", other);
                continue;
            }
        };

        if commands.send(command).await.is_err() {
            break;
        }
    }
}
