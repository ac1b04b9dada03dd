use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::matcher::{MATCH_ALL, ProcessMatcher};
use crate::tracker::CpuPercentMode;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Seconds between samples.
    pub period: u64,
    pub procs: Vec<String>,
    pub cpu_percent_mode: String,
    /// Ticks between tracker eviction passes; 0 disables eviction.
    pub gc_every: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            period: 1,
            procs: vec![MATCH_ALL.to_string()],
            cpu_percent_mode: "single_core".to_string(),
            gc_every: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub queue_capacity: usize,
    /// Indented multi-line objects; output is no longer one object per line.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            queue_capacity: 64,
            pretty: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.input.period)
    }

    pub fn matcher(&self) -> Result<ProcessMatcher, ConfigError> {
        ProcessMatcher::new(self.input.procs.as_slice())
    }

    pub fn cpu_percent_mode(&self, logical_cores: usize) -> Result<CpuPercentMode, ConfigError> {
        match self.input.cpu_percent_mode.to_lowercase().as_str() {
            "single_core" => Ok(CpuPercentMode::SingleCore),
            "core_scaled" => Ok(CpuPercentMode::CoreScaled { logical_cores }),
            other => Err(ConfigError::UnknownCpuMode(other.to_string())),
        }
    }

    pub fn log_format(&self) -> Result<LogFormat, ConfigError> {
        match self.logging.format.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::UnknownLogFormat(other.to_string())),
        }
    }

    /// Check everything that would otherwise fail once sampling has started.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.period == 0 {
            return Err(ConfigError::InvalidPeriod);
        }
        self.matcher()?;
        self.cpu_percent_mode(1)?;
        self.log_format()?;
        Ok(())
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("topwatch").join("config.toml"))
}

/// Load the default config file, or defaults when there is none.
pub fn load_config() -> Result<Config, ConfigError> {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Ok(Config::default()),
    }
}

pub fn load_config_from_path(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
