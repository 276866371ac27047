use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::sweep::policy::RemovalPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub removal: RemovalConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// "http" or "https"; derived from the port when omitted
    pub protocol: Option<String>,
    #[serde(default = "default_url_path")]
    pub url_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RemovalConfig {
    /// Minutes a completed torrent must dwell before it is stopped.
    /// Zero stops on the first poll after the completion is observed.
    pub delay_minutes: Option<i64>,
    /// Upload ratio at which a completed torrent is stopped.
    /// Mutually exclusive with `delay_minutes`.
    pub ratio: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    pub path: Option<PathBuf>,
    #[serde(default = "default_console")]
    pub console: bool,
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9091
}

fn default_url_path() -> String {
    "/transmission/rpc/".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_interval_secs() -> u64 {
    60
}

fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

fn default_console() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
            protocol: None,
            url_path: default_url_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            num_threads: default_num_threads(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            path: None,
            console: default_console(),
        }
    }
}

impl ConnectionConfig {
    /// Protocol to use, deriving https for the conventional TLS port when
    /// none is configured.
    pub fn protocol(&self) -> &str {
        match self.protocol.as_deref() {
            Some(p) => p,
            None if self.port == 443 => "https",
            None => "http",
        }
    }

    pub fn endpoint_url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.protocol(),
            self.host,
            self.port,
            self.url_path
        )
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values. Everything rejected here is rejected
    /// before the poll loop starts.
    pub fn validate(&self) -> Result<()> {
        // Validate connection config
        if self.connection.host.is_empty() {
            bail!("host must not be empty");
        }

        if self.connection.port == 0 {
            bail!("port must be greater than 0");
        }

        if let Some(protocol) = self.connection.protocol.as_deref() {
            if protocol != "http" && protocol != "https" {
                bail!(
                    "Invalid protocol '{}'. Must be one of: http, https",
                    protocol
                );
            }
        }

        if self.connection.url_path.is_empty() {
            bail!("url_path must not be empty");
        }

        if self.connection.timeout_secs == 0 {
            bail!("timeout_secs must be greater than 0");
        }

        // Validate removal config; the delay/ratio exclusivity lives in the
        // policy resolution so it cannot drift from what the loop runs with
        RemovalPolicy::from_config(&self.removal)?;

        // Validate poll config
        if self.poll.interval_secs == 0 {
            bail!("interval_secs must be greater than 0");
        }

        if self.poll.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}
