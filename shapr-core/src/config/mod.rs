//! Runtime settings with a clear supersedence chain.
//!
//! Values are resolved in the following order (highest priority wins):
//!
//! 1. **Environment variables** (`SHAPR_*`)
//! 2. **Config file** (`shapr.toml`)
//! 3. **Defaults**

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Complete runtime settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaprSettings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

/// Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listening address
    /// Env: SHAPR_HOST
    /// Default: "127.0.0.1"
    pub host: String,

    /// Listening port
    /// Env: SHAPR_PORT
    /// Default: 8080
    pub port: u16,

    /// Maximum request body size in bytes
    /// Env: SHAPR_MAX_BODY_BYTES
    /// Default: 2097152 (2 MiB)
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080, max_body_bytes: 2 * 1024 * 1024 }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level filter: error, warn, info, debug, trace
    /// Env: SHAPR_LOG_LEVEL
    /// Default: "info"
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl ShaprSettings {
    /// Load with the full supersedence chain, reading `shapr.toml` when it
    /// exists.
    pub fn load() -> Result<Self> {
        Self::load_from("shapr.toml")
    }

    /// Load from a specific file (skipped when absent), then apply
    /// environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut settings = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };
        settings.apply_env();
        Ok(settings)
    }

    fn apply_env(&mut self) {
        if let Ok(host) = env::var("SHAPR_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("SHAPR_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(max) = env::var("SHAPR_MAX_BODY_BYTES") {
            if let Ok(max) = max.parse() {
                self.server.max_body_bytes = max;
            }
        }
        if let Ok(level) = env::var("SHAPR_LOG_LEVEL") {
            self.logging.level = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = ShaprSettings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn toml_overrides_defaults() {
        let settings: ShaprSettings = toml::from_str(
            r#"
            [server]
            port = 3000

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(settings.server.port, 3000);
        // Unset keys keep their defaults
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = ShaprSettings::load_from("definitely-not-here.toml").unwrap();
        assert_eq!(settings.server.port, 8080);
    }
}
