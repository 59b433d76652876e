//! Configuration and CLI argument handling

use std::{env, path::PathBuf};

use clap::Parser;

use crate::{alarm::SoundType, state::MAX_TOTAL_SECONDS};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "noodle-timer")]
#[command(about = "A cooking countdown timer with a shared state and a looping alarm")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding the shared timer state (defaults to ~/.local/state/noodle-timer)
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// Keep the timer state in memory only
    #[arg(long, conflicts_with = "state_dir")]
    pub memory: bool,

    /// Directory holding alarm sound files (alarm<N>.mp3 / alarm<N>.wav)
    #[arg(long, default_value = "sounds")]
    pub sounds_dir: PathBuf,

    /// Initial alarm sound: "silent" or "custom<N>"
    #[arg(long, default_value = "silent")]
    pub sound: SoundType,

    /// Preset durations in seconds
    #[arg(long, value_delimiter = ',', default_value = "180,240,300", value_parser = parse_preset)]
    pub presets: Vec<u64>,

    /// Command used to play sound files
    #[arg(long, default_value = "paplay")]
    pub player: String,

    /// Ring the terminal bell in place of vibration
    #[arg(long)]
    pub bell: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_preset(value: &str) -> Result<u64, String> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err("preset must be at least one second".to_string()),
        Ok(seconds) if seconds > MAX_TOTAL_SECONDS => {
            Err(format!("preset must be at most {} seconds", MAX_TOTAL_SECONDS))
        }
        Ok(seconds) => Ok(seconds),
        Err(e) => Err(format!("invalid preset {:?}: {}", value, e)),
    }
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Resolve the state directory, `None` when running in memory
    pub fn state_dir(&self) -> Option<PathBuf> {
        if self.memory {
            return None;
        }
        if let Some(dir) = &self.state_dir {
            return Some(dir.clone());
        }
        Some(match env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(".local").join("state").join("noodle-timer"),
            None => PathBuf::from("noodle-timer-state"),
        })
    }
}
