//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (frequency, retention, port)
//! - Validate addresses before anything binds them
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SidecarConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

use crate::config::schema::SidecarConfig;

/// Minimum rotation frequency in seconds.
pub const MIN_ROTATION_FREQUENCY_SECS: u64 = 60;

/// A single semantic configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("log rotation frequency must be at least 1 minute")]
    RotationFrequencyTooShort,

    #[error("log rotation keep count must be at least 1")]
    RotationKeepTooSmall,

    #[error("invalid ip address: {0}")]
    InvalidIp(String),

    #[error("invalid port: {0}")]
    InvalidPort(u16),

    #[error("process command must not be empty")]
    EmptyCommand,

    #[error("invalid metrics address: {0}")]
    InvalidMetricsAddress(String),
}

/// Validate `config`, collecting every error.
pub fn validate_config(config: &SidecarConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.rotation.frequency_secs < MIN_ROTATION_FREQUENCY_SECS {
        errors.push(ValidationError::RotationFrequencyTooShort);
    }

    if config.rotation.keep < 1 {
        errors.push(ValidationError::RotationKeepTooSmall);
    }

    if config.admin.ip.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidIp(config.admin.ip.clone()));
    }

    if config.admin.port == 0 {
        errors.push(ValidationError::InvalidPort(config.admin.port));
    }

    if config.process.command.trim().is_empty() {
        errors.push(ValidationError::EmptyCommand);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
