//! Configuration file support for ARQ CLI tools
//!
//! Both tools accept an optional TOML file. Command-line flags override the
//! values it contains.
//!
//! ```toml
//! [sender]
//! mode = "go-back-n"
//! window = 10
//! timeout_ms = 100
//!
//! [receiver]
//! mode = "go-back-n"
//! reliability = 0
//! ```

use arq::protocol::{ArqMode, DEFAULT_WINDOW_SIZE, MAX_PAYLOAD_SIZE};
use arq::{TransferConfig, DEFAULT_LINGER, DEFAULT_RETRANSMIT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// ARQ discipline as named on the command line and in config files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ModeName {
    StopAndWait,
    #[default]
    GoBackN,
}

impl ModeName {
    /// Resolve to a protocol mode; `window` only applies to Go-Back-N
    pub fn to_mode(self, window: usize) -> Result<ArqMode, ConfigError> {
        match self {
            ModeName::StopAndWait => Ok(ArqMode::StopAndWait),
            ModeName::GoBackN => {
                ArqMode::go_back_n(window).map_err(|e| ConfigError::Invalid(e.to_string()))
            }
        }
    }
}

/// Sender configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderConfig {
    /// ARQ discipline
    #[serde(default)]
    pub mode: ModeName,
    /// Go-Back-N window size
    #[serde(default = "default_window")]
    pub window: usize,
    /// Retransmission timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Payload bytes per frame
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_window() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_timeout_ms() -> u64 {
    DEFAULT_RETRANSMIT_TIMEOUT.as_millis() as u64
}

fn default_chunk_size() -> usize {
    MAX_PAYLOAD_SIZE
}

fn default_linger_ms() -> u64 {
    DEFAULT_LINGER.as_millis() as u64
}

impl Default for SenderConfig {
    fn default() -> Self {
        SenderConfig {
            mode: ModeName::default(),
            window: default_window(),
            timeout_ms: default_timeout_ms(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl SenderConfig {
    /// Get the retransmission timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Build and validate the session configuration
    pub fn transfer_config(&self) -> Result<TransferConfig, ConfigError> {
        let config = TransferConfig::default()
            .with_mode(self.mode.to_mode(self.window)?)
            .with_chunk_size(self.chunk_size)
            .with_retransmit_timeout(self.timeout());
        config
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(config)
    }
}

/// Receiver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// ARQ discipline; must match the sender
    #[serde(default)]
    pub mode: ModeName,
    /// Synthetic loss divisor: roughly one frame in `reliability` is dropped,
    /// 0 disables
    #[serde(default)]
    pub reliability: u32,
    /// Seed for the loss generator
    pub seed: Option<u64>,
    /// Quiet period to keep re-acking after the final frame, in milliseconds
    #[serde(default = "default_linger_ms")]
    pub linger_ms: u64,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        ReceiverConfig {
            mode: ModeName::default(),
            reliability: 0,
            seed: None,
            linger_ms: default_linger_ms(),
        }
    }
}

impl ReceiverConfig {
    /// Get the linger period as Duration
    pub fn linger(&self) -> Duration {
        Duration::from_millis(self.linger_ms)
    }

    /// Build and validate the session configuration
    ///
    /// The receiver's acceptance rule does not depend on the window size, so
    /// the default window stands in for Go-Back-N.
    pub fn transfer_config(&self) -> Result<TransferConfig, ConfigError> {
        let config = TransferConfig::default()
            .with_mode(self.mode.to_mode(DEFAULT_WINDOW_SIZE)?)
            .with_linger(self.linger());
        config
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(config)
    }
}

/// Combined configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Sender configuration
    pub sender: Option<SenderConfig>,
    /// Receiver configuration
    pub receiver: Option<ReceiverConfig>,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Load `path` if given, otherwise start from defaults
    pub fn load_optional<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Config::default()),
        }
    }

    /// Create example configuration with both sections filled in
    pub fn example() -> Self {
        Config {
            sender: Some(SenderConfig::default()),
            receiver: Some(ReceiverConfig::default()),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
