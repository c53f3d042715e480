//! Generator configuration
//!
//! Built-in defaults, then an optional TOML file, then environment overrides.
//! Command-line flags are applied last by the binary.

use crate::channel::DEFAULT_FIFO_PATH;
use crate::ring::CAPACITY;
use crate::shm::DEFAULT_SHM_NAME;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 50;
pub const DEFAULT_SAMPLES_PER_FRAME: usize = 1000;

pub const FRAME_INTERVAL_ENV: &str = "SINESCOPE_FRAME_INTERVAL_MS";
pub const SAMPLES_PER_FRAME_ENV: &str = "SINESCOPE_SAMPLES_PER_FRAME";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub fifo_path: PathBuf,
    pub shm_name: String,
    /// Wall-clock time between frames
    pub frame_interval_ms: u64,
    pub samples_per_frame: usize,
    pub initial_frequency: f64,
    pub initial_amplitude: f64,
    /// Start producing immediately instead of waiting for a start command
    pub auto_start: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            fifo_path: PathBuf::from(DEFAULT_FIFO_PATH),
            shm_name: DEFAULT_SHM_NAME.to_string(),
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            samples_per_frame: DEFAULT_SAMPLES_PER_FRAME,
            initial_frequency: 100.0,
            initial_amplitude: 0.8,
            auto_start: false,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Failed to read {}: {}", path.display(), e),
            ConfigError::Parse(path, msg) => {
                write!(f, "Invalid config {}: {}", path.display(), msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// `~/.config/sinescope/config.toml` (or the platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sinescope").join("config.toml"))
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a number", key, raw);
            None
        }
    }
}

impl GeneratorConfig {
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(origin.to_path_buf(), e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::parse(&content, path)
    }

    /// Resolve the effective configuration
    ///
    /// An explicit path must exist. Without one the default location is used
    /// only if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!("Loading config from {}", path.display());
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };

        Ok(base.with_env_overrides().clamped())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(ms) = parse_env(FRAME_INTERVAL_ENV) {
            self.frame_interval_ms = ms;
        }
        if let Some(n) = parse_env(SAMPLES_PER_FRAME_ENV) {
            self.samples_per_frame = n;
        }
        self
    }

    /// Keep pacing and frame size within workable bounds
    ///
    /// A frame never exceeds what the ring can hold unread.
    pub fn clamped(mut self) -> Self {
        self.frame_interval_ms = self.frame_interval_ms.clamp(1, 1000);
        self.samples_per_frame = self.samples_per_frame.clamp(1, CAPACITY - 1);
        self
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}
