//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where projects are stored.
    pub projects_dir: PathBuf,

    /// Engine tuning shared by the model, playback, and geometry crates.
    #[serde(default)]
    pub engine: EngineDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Timing, clamping, and zoom parameters of the timeline engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineDefaults {
    /// Shortest duration a clip may have (seconds).
    pub min_clip_duration: f64,

    /// Duration given to new image and text clips (seconds).
    pub default_clip_duration: f64,

    /// Two keyframes closer than this (seconds) share a timestamp.
    pub keyframe_epsilon: f64,

    /// Allowed playback rates.
    pub playback_rates: Vec<f64>,

    /// Drift tolerated on explicit seeks before a media handle is corrected.
    pub seek_drift_tolerance_secs: f64,

    /// Drift tolerated during playback ticks (looser than seeks).
    pub tick_drift_tolerance_secs: f64,

    /// Drift tolerated by the compositor for a paused media handle.
    pub paused_draw_drift_secs: f64,

    /// Drift tolerated by the compositor for a playing media handle.
    pub playing_draw_drift_secs: f64,

    /// Initial timeline zoom.
    pub default_px_per_sec: f64,

    /// Lower bound for timeline zoom.
    pub min_px_per_sec: f64,

    /// Canvas size of new projects.
    pub canvas_width: u32,
    pub canvas_height: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "clipweave=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            projects_dir: dirs_default_projects(),
            engine: EngineDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EngineDefaults {
    fn default() -> Self {
        Self {
            min_clip_duration: 0.1,
            default_clip_duration: 5.0,
            keyframe_epsilon: 0.001,
            playback_rates: vec![0.25, 0.5, 1.0, 1.5, 2.0],
            seek_drift_tolerance_secs: 0.05,
            tick_drift_tolerance_secs: 0.15,
            paused_draw_drift_secs: 0.05,
            playing_draw_drift_secs: 0.20,
            default_px_per_sec: 50.0,
            min_px_per_sec: 1.0,
            canvas_width: 1280,
            canvas_height: 720,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl EngineDefaults {
    /// Whether `rate` is one of the allowed playback rates.
    pub fn is_allowed_rate(&self, rate: f64) -> bool {
        self.playback_rates
            .iter()
            .any(|allowed| (allowed - rate).abs() < 1e-9)
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("clipweave").join("config.json")
}

/// Default projects directory.
fn dirs_default_projects() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("clipweave").join("projects")
}
