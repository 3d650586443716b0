use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::error::ConfigError;

fn default_record_path() -> PathBuf {
    // Streamers keep recordings in the platform video directory; fall back
    // to the home directory, then the current directory.
    dirs::video_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_match_duration() -> u64 {
    crate::state::MATCH_DURATION_SECS
}

fn default_tick_interval_ms() -> u64 {
    250
}

/// Destination directories and filename prefixes for image exports and the
/// match log. Passed through to the tracker unchanged, not validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputPaths {
    /// Directory for overlay images the stream reads live
    pub stream_path: PathBuf,

    /// Filename prefix for opponent images on the stream side
    pub stream_prefix: String,

    /// Directory for the match log and archived recognition images
    pub log_path: PathBuf,

    /// Filename prefix for archived opponent images
    pub log_prefix: String,
}

impl Default for OutputPaths {
    fn default() -> Self {
        let record_path = default_record_path();
        Self {
            stream_path: record_path.join("stream"),
            stream_prefix: "OpponentPokemon".to_string(),
            log_path: record_path.join("log"),
            log_prefix: "OpponentPokemon".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Export destinations
    #[serde(default)]
    pub output: OutputPaths,

    /// Text file the on-stream countdown widget reads from
    pub countdown_file: PathBuf,

    /// Fixed match duration for the countdown
    #[serde(default = "default_match_duration")]
    pub match_duration_secs: u64,

    /// Delay between capture ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let output = OutputPaths::default();
        let countdown_file = output.stream_path.join("countdown.txt");
        Self {
            output,
            countdown_file,
            match_duration_secs: default_match_duration(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Config {
    /// Load configuration from the exe-relative config directory.
    /// Creates default config if file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content =
                fs::read_to_string(&config_path).map_err(|e| ConfigError::LoadFailed {
                    path: config_path.display().to_string(),
                    source: Box::new(e),
                })?;
            let config: Config =
                serde_json::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: config_path.display().to_string(),
                    source: Box::new(e),
                })?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            println!("✓ Created default config at: {}", config_path.display());
            println!("  Edit this file to customize settings.");
            Ok(config)
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed {
                path: config_path.display().to_string(),
                source: Box::new(e),
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: config_path.display().to_string(),
            source: Box::new(e),
        })?;
        fs::write(&config_path, json).map_err(|e| ConfigError::SaveFailed {
            path: config_path.display().to_string(),
            source: Box::new(e),
        })?;

        Ok(())
    }

    /// Get the config file path (in app's base directory)
    fn config_path() -> Result<PathBuf, ConfigError> {
        let exe_path = env::current_exe().map_err(|e| ConfigError::LoadFailed {
            path: "current_exe".to_string(),
            source: Box::new(e),
        })?;
        let exe_dir = exe_path.parent().ok_or(ConfigError::NoExeDir)?;

        Ok(exe_dir.join("config").join("config.json"))
    }

    /// Append-only log the tracker flushes one record per match into
    pub fn match_log_file(&self) -> PathBuf {
        self.output.log_path.join("match_log.txt")
    }

    /// Where end-of-match screenshots land
    pub fn screenshot_dir(&self) -> PathBuf {
        self.output.log_path.join("screenshots")
    }
}
