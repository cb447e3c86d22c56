//! Session configuration, loaded from an optional JSON file.

use crate::error::{Error, Result};
use crate::safety;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for an opened panel. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// How long the reader blocks per poll before checking for shutdown.
    pub read_timeout_ms: i32,
    /// Size of the inbound report buffer.
    pub read_buffer_len: usize,
    /// Brightness percent applied right after init.
    pub brightness: Option<u8>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 250,
            read_buffer_len: 64,
            brightness: None,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.read_timeout_ms <= 0 {
            return Err(Error::Config(format!(
                "read_timeout_ms must be positive, got {}",
                self.read_timeout_ms
            )));
        }
        if self.read_buffer_len == 0 {
            return Err(Error::Config("read_buffer_len must be nonzero".into()));
        }
        if let Some(percent) = self.brightness {
            safety::validate_brightness(percent as u32)?;
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(SessionConfig::load(None).unwrap(), config);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = SessionConfig::from_json(r#"{"brightness": 60}"#).unwrap();
        assert_eq!(config.brightness, Some(60));
        assert_eq!(config.read_timeout_ms, 250);
        assert_eq!(config.read_buffer_len, 64);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(SessionConfig::from_json(r#"{"brightness": 150}"#).is_err());
        assert!(SessionConfig::from_json(r#"{"read_buffer_len": 0}"#).is_err());
        assert!(SessionConfig::from_json(r#"{"read_timeout_ms": 0}"#).is_err());
        assert!(SessionConfig::from_json(r#"{"bogus": true}"#).is_err());
        assert!(SessionConfig::from_json("not json").is_err());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let result = SessionConfig::load(Some(Path::new("/nonexistent/mystrix.json")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
