// ============================================
// File: crates/stls-client/src/config.rs
// ============================================
//! # Client Configuration
//!
//! ## Creation Reason
//! Provides configuration management for the stls client, loaded from
//! TOML and overridden by command-line flags.
//!
//! ## Configuration Sections
//! - `connection`: Server host/port and socket timeouts
//! - `protocol`: Outbound frame layout, inbound frame size limit
//! - `output`: Extension appended to the output file name
//! - `logging`: Log level
//!
//! ## Example Configuration
//! ```toml
//! [connection]
//! host = "localhost"
//! port = 8087
//! read_timeout_secs = 30
//!
//! [protocol]
//! frame_layout = "legacy"
//!
//! [output]
//! extension = "png"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Every section is optional; missing values take the defaults below
//! - No timeout is configured by default, matching the blocking model
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use stls_core::protocol::{FrameLayout, MAX_PAYLOAD_LEN};

use crate::error::{ClientError, Result};

/// Smallest accepted `protocol.max_frame_len`.
pub const MIN_FRAME_LEN: usize = 1024;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

// ============================================
// ClientConfig
// ============================================

/// Main client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Where to connect.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Wire protocol options.
    #[serde(default)]
    pub protocol: ProtocolConfig,

    /// Output file naming.
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::config_load(&path_str, e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ClientError::config_load(&path_str, e.to_string()))?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads configuration from a string (useful for testing).
    ///
    /// # Errors
    /// Returns error if the string cannot be parsed or validated.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ClientError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        self.connection.validate()?;
        self.protocol.validate()?;
        self.output.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Serializes configuration to TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// `host:port` of the server.
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.connection.host, self.connection.port)
    }
}

// ============================================
// ConnectionConfig
// ============================================

/// Connection configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Server host name or address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Server TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connect timeout in seconds. Unset blocks until the OS gives up.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    /// Per-read timeout in seconds. Unset blocks indefinitely.
    #[serde(default)]
    pub read_timeout_secs: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8087
}

impl ConnectionConfig {
    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ClientError::config_invalid("connection.host", "cannot be empty"));
        }
        if self.port == 0 {
            return Err(ClientError::config_invalid("connection.port", "cannot be 0"));
        }
        if self.connect_timeout_secs == Some(0) {
            return Err(ClientError::config_invalid(
                "connection.connect_timeout_secs",
                "must be greater than 0",
            ));
        }
        if self.read_timeout_secs == Some(0) {
            return Err(ClientError::config_invalid(
                "connection.read_timeout_secs",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Connect timeout, if configured.
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    /// Read timeout, if configured.
    #[must_use]
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_secs: None,
            read_timeout_secs: None,
        }
    }
}

// ============================================
// ProtocolConfig
// ============================================

/// Protocol configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Header layout for outbound handshake messages.
    #[serde(default)]
    pub frame_layout: FrameLayout,

    /// Largest inbound payload accepted.
    #[serde(default = "default_max_frame_len")]
    pub max_frame_len: usize,
}

fn default_max_frame_len() -> usize {
    MAX_PAYLOAD_LEN
}

impl ProtocolConfig {
    fn validate(&self) -> Result<()> {
        if !(MIN_FRAME_LEN..=MAX_PAYLOAD_LEN).contains(&self.max_frame_len) {
            return Err(ClientError::config_invalid(
                "protocol.max_frame_len",
                format!("must be between {MIN_FRAME_LEN} and {MAX_PAYLOAD_LEN}"),
            ));
        }
        Ok(())
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            frame_layout: FrameLayout::default(),
            max_frame_len: default_max_frame_len(),
        }
    }
}

// ============================================
// OutputConfig
// ============================================

/// Output configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Appended to the output name as `<name>.<extension>`; empty for none.
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    "png".to_string()
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if self.extension.contains(['/', '\\']) {
            return Err(ClientError::config_invalid(
                "output.extension",
                "cannot contain path separators",
            ));
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.level.as_str()) {
            return Err(ClientError::config_invalid(
                "logging.level",
                format!("must be one of {}", LOG_LEVELS.join(", ")),
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server_addr(), "localhost:8087");
        assert_eq!(config.protocol.frame_layout, FrameLayout::Canonical);
        assert_eq!(config.output.extension, "png");
        assert!(config.connection.read_timeout().is_none());
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
            [connection]
            host = "10.0.0.5"
            port = 9000
            connect_timeout_secs = 5
            read_timeout_secs = 30

            [protocol]
            frame_layout = "legacy"
            max_frame_len = 65536

            [output]
            extension = "jpg"

            [logging]
            level = "debug"
        "#;

        let config = ClientConfig::from_str(toml).unwrap();
        assert_eq!(config.server_addr(), "10.0.0.5:9000");
        assert_eq!(config.connection.read_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.protocol.frame_layout, FrameLayout::Legacy);
        assert_eq!(config.protocol.max_frame_len, 65536);
        assert_eq!(config.output.extension, "jpg");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = ClientConfig::from_str("[connection]\nport = 9100\n").unwrap();
        assert_eq!(config.connection.host, "localhost");
        assert_eq!(config.connection.port, 9100);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_values() {
        let err = ClientConfig::from_str("[connection]\nport = 0\n").unwrap_err();
        assert!(err.to_string().contains("connection.port"));

        let err = ClientConfig::from_str("[connection]\nread_timeout_secs = 0\n").unwrap_err();
        assert!(err.is_config_error());

        assert!(ClientConfig::from_str("[protocol]\nmax_frame_len = 10\n").is_err());
        assert!(ClientConfig::from_str("[protocol]\nframe_layout = \"sideways\"\n").is_err());
        assert!(ClientConfig::from_str("[output]\nextension = \"a/b\"\n").is_err());
        assert!(ClientConfig::from_str("[logging]\nlevel = \"loud\"\n").is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = ClientConfig::default();
        config.connection.read_timeout_secs = Some(12);
        config.protocol.frame_layout = FrameLayout::Legacy;

        let parsed = ClientConfig::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed.connection.read_timeout_secs, Some(12));
        assert_eq!(parsed.protocol.frame_layout, FrameLayout::Legacy);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[connection]\nhost = \"example.org\"").unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.connection.host, "example.org");

        let missing = ClientConfig::load("/nonexistent/stls/client.toml").unwrap_err();
        assert!(matches!(missing, ClientError::ConfigLoad { .. }));
    }
}
