use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::TerminalGate;
use crate::{dlog_debug, Error, Result};

pub const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_MAX_LOG_LINES: u32 = 1000;
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workers: usize,
    pub output_dir: String,
    pub client: String,
    pub max_log_lines: u32,
    /// Zero disables the timeout.
    pub command_timeout_secs: u64,
    pub resources: Vec<String>,
    pub log_resources: Vec<String>,
    pub monitor_pattern: String,
    pub analysis_gate: TerminalGate,
    /// Zero means producers hand tasks directly to an idle worker.
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            output_dir: "diagdump-output".to_string(),
            client: "oc".to_string(),
            max_log_lines: DEFAULT_MAX_LOG_LINES,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            resources: ["deploymentconfigs", "pods", "services", "events"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            log_resources: vec!["pods".to_string()],
            monitor_pattern: "nagios".to_string(),
            analysis_gate: TerminalGate::default(),
            channel_capacity: 0,
        }
    }
}

impl Config {
    pub fn diagdump_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".diagdump"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::diagdump_dir()?.join("diagdump.toml"))
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        match self.command_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        expand_tilde(&self.output_dir)
    }

    /// Load from `path`, or from the default location when `path` is None.
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = Self::config_path()?;
                if !default.exists() {
                    dlog_debug!("Config file not found, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };
        dlog_debug!("Config::load path={}", path.display());
        let config = Self::from_toml(&fs::read_to_string(&path)?)?;
        dlog_debug!(
            "Config loaded: workers={}, client={}, gate={:?}",
            config.workers,
            config.client,
            config.analysis_gate
        );
        Ok(config)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Validation("workers must be at least 1".to_string()));
        }
        if self.client.trim().is_empty() {
            return Err(Error::Validation("client cannot be empty".to_string()));
        }
        regex::Regex::new(&self.monitor_pattern)?;
        Ok(())
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
