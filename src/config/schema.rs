//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sidecar.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Root configuration for the admin sidecar.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SidecarConfig {
    /// Admin HTTP server settings.
    pub admin: AdminConfig,

    /// Log rotation settings.
    pub rotation: RotationConfig,

    /// Supervised process settings.
    pub process: ProcessConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Admin server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// IP address to listen on.
    pub ip: String,

    /// Port to listen on.
    pub port: u16,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl AdminConfig {
    /// `host:port` the admin server binds, with IPv6 addresses bracketed.
    pub fn listen_address(&self) -> String {
        match self.ip.parse::<IpAddr>() {
            Ok(IpAddr::V6(ip)) => format!("[{}]:{}", ip, self.port),
            _ => format!("{}:{}", self.ip, self.port),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            port: 9000,
            request_timeout_secs: 10,
        }
    }
}

/// Log rotation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Rotation frequency in seconds (minimum 60).
    pub frequency_secs: u64,

    /// Number of rotated files kept per log (minimum 1).
    pub keep: u32,
}

impl RotationConfig {
    pub fn frequency(&self) -> Duration {
        Duration::from_secs(self.frequency_secs)
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            frequency_secs: 24 * 60 * 60,
            keep: 10,
        }
    }
}

/// How the supervised process is told to reopen its logs after rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReopenSignal {
    /// Send SIGUSR1.
    #[default]
    Usr1,
    /// Do nothing.
    None,
}

/// Supervised process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Executable to run.
    pub command: String,

    /// Arguments passed to the executable.
    pub args: Vec<String>,

    /// Log files to rotate.
    pub log_paths: Vec<String>,

    /// Signal sent after each rotation tick.
    pub reopen_signal: ReopenSignal,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            command: "nginx".to_string(),
            args: Vec::new(),
            log_paths: Vec::new(),
            reopen_signal: ReopenSignal::Usr1,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9091".to_string(),
        }
    }
}
