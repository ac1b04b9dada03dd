use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration problems. All of these are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("period must be greater than 0 seconds")]
    InvalidPeriod,

    #[error("invalid process pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown cpu_percent_mode {0:?} (expected \"single_core\" or \"core_scaled\")")]
    UnknownCpuMode(String),

    #[error("unknown log format {0:?} (expected \"text\" or \"json\")")]
    UnknownLogFormat(String),
}

/// Failure of an OS-facing data source. Never fatal to the sampling loop.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("I/O error reading {what}: {source}")]
    Io {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("malformed {what}: {detail}")]
    Parse { what: &'static str, detail: String },

    #[error("{0} is not available on this platform")]
    Unsupported(&'static str),

    /// The process exited between listing and fetching it.
    #[error("process {0} is gone")]
    ProcessGone(u32),
}

impl ProviderError {
    pub fn parse(what: &'static str, detail: impl Into<String>) -> Self {
        ProviderError::Parse {
            what,
            detail: detail.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("event sink is closed")]
    Closed,

    #[error("failed to write event: {0}")]
    Io(#[from] io::Error),

    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
}
