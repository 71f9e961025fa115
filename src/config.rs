//! # Configuration Management
//!
//! Centralized configuration for the protocol core.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides (`CM_PROTOCOL_*`)
//!
//! ## Security Considerations
//! - Decode limits bound every length field read from the wire before any
//!   allocation or slicing happens
//! - The handshake gate is enforced by default so nothing but the encryption
//!   handshake is accepted on a fresh connection

use crate::core::steam_id::Universe;
use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Max accepted frame size (16 MB)
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Max accepted protobuf header body (64 KB)
pub const MAX_PROTO_HEADER_LEN: usize = 64 * 1024;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProtocolConfig {
    /// Connection-level behavior
    #[serde(default)]
    pub client: ClientConfig,

    /// Bounds applied while classifying frames
    #[serde(default)]
    pub limits: DecodeLimits,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProtocolConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(universe) = std::env::var("CM_PROTOCOL_UNIVERSE") {
            config.client.default_universe = parse_universe(&universe)?;
        }

        if let Ok(enforce) = std::env::var("CM_PROTOCOL_ENFORCE_HANDSHAKE") {
            if let Ok(val) = enforce.parse::<bool>() {
                config.client.enforce_handshake_gate = val;
            }
        }

        if let Ok(size) = std::env::var("CM_PROTOCOL_MAX_MESSAGE_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.limits.max_message_size = val;
            }
        }

        if let Ok(len) = std::env::var("CM_PROTOCOL_MAX_PROTO_HEADER_LEN") {
            if let Ok(val) = len.parse::<usize>() {
                config.limits.max_proto_header_len = val;
            }
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.client.validate());
        errors.extend(self.limits.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn parse_universe(value: &str) -> Result<Universe> {
    match value.to_ascii_lowercase().as_str() {
        "public" => Ok(Universe::Public),
        "beta" => Ok(Universe::Beta),
        "internal" => Ok(Universe::Internal),
        "dev" => Ok(Universe::Dev),
        other => Err(ProtocolError::ConfigError(format!(
            "Unknown universe: '{other}' (expected public, beta, internal or dev)"
        ))),
    }
}

/// Connection-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Universe assumed when reading legacy `STEAM_X:Y:Z` text
    pub default_universe: Universe,

    /// Drop non-handshake traffic until the encryption handshake completes
    pub enforce_handshake_gate: bool,

    /// Merge `ClientServerList` bodies into the server directory
    pub track_server_list: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_universe: Universe::Public,
            enforce_handshake_gate: true,
            track_server_list: true,
        }
    }
}

impl ClientConfig {
    /// Validate client configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if matches!(
            self.default_universe,
            Universe::Invalid | Universe::Max
        ) {
            errors.push(format!(
                "Default universe must be a real universe, got {:?}",
                self.default_universe
            ));
        }

        if !self.enforce_handshake_gate {
            errors.push(
                "WARNING: Handshake gate is disabled - not recommended for production".to_string(),
            );
        }

        errors
    }
}

/// Bounds applied while classifying frames
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DecodeLimits {
    /// Largest frame accepted, in bytes
    pub max_message_size: usize,

    /// Largest protobuf header body accepted, in bytes
    pub max_proto_header_len: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            max_proto_header_len: MAX_PROTO_HEADER_LEN,
        }
    }
}

impl DecodeLimits {
    /// Limits with no restrictions (use with caution).
    pub const fn unlimited() -> Self {
        Self {
            max_message_size: usize::MAX,
            max_proto_header_len: usize::MAX,
        }
    }

    /// Validate decode limits
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_message_size < crate::core::header::EXTENDED_HDR_SIZE {
            errors.push(format!(
                "Max message size too small: {} bytes (minimum: {} bytes)",
                self.max_message_size,
                crate::core::header::EXTENDED_HDR_SIZE
            ));
        }

        if self.max_proto_header_len == 0 {
            errors.push("Max protobuf header length cannot be 0".to_string());
        } else if self.max_proto_header_len > self.max_message_size {
            errors.push(
                "Max protobuf header length cannot be larger than max message size".to_string(),
            );
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("cm-protocol"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universe_names_parse() {
        assert_eq!(parse_universe("PUBLIC").unwrap(), Universe::Public);
        assert_eq!(parse_universe("dev").unwrap(), Universe::Dev);
        assert!(parse_universe("max").is_err());
    }

    #[test]
    fn unlimited_limits_validate() {
        assert!(DecodeLimits::unlimited().validate().is_empty());
    }
}
