use clap::{Args, ValueEnum};
use std::path::PathBuf;

use crate::error::{Result, TrackerError};
use crate::latency::{LatencyHook, NoLatency, SimulatedLatency, DEFAULT_MAX_MS, DEFAULT_MIN_MS};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Settings shared by every command. Each flag falls back to an environment variable.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Directory holding store.db (default: nearest .bugtrack upwards from cwd)
    #[arg(long, global = true, env = "BUGTRACK_DIR")]
    pub dir: Option<PathBuf>,

    /// Lower bound of the simulated latency, in milliseconds
    #[arg(long, global = true, env = "BUGTRACK_LATENCY_MIN_MS", default_value_t = DEFAULT_MIN_MS)]
    pub latency_min_ms: u64,

    /// Upper bound of the simulated latency, in milliseconds
    #[arg(long, global = true, env = "BUGTRACK_LATENCY_MAX_MS", default_value_t = DEFAULT_MAX_MS)]
    pub latency_max_ms: u64,

    /// Log output format
    #[arg(long, global = true, env = "BUGTRACK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Remote API base URL (reserved; the local store never calls it)
    #[arg(long, global = true, env = "BUGTRACK_API_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dir: None,
            latency_min_ms: DEFAULT_MIN_MS,
            latency_max_ms: DEFAULT_MAX_MS,
            log_format: LogFormat::Text,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.latency_min_ms > self.latency_max_ms {
            return Err(TrackerError::Validation(format!(
                "Latency minimum ({}ms) exceeds maximum ({}ms)",
                self.latency_min_ms, self.latency_max_ms
            )));
        }
        Ok(())
    }

    pub fn latency(&self) -> Box<dyn LatencyHook> {
        if self.latency_max_ms == 0 {
            Box::new(NoLatency)
        } else {
            Box::new(SimulatedLatency::from_millis(
                self.latency_min_ms,
                self.latency_max_ms,
            ))
        }
    }
}
