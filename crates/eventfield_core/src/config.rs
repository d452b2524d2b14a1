//! # Source Configuration
//!
//! Parameters an event source is constructed from. Loaded once at startup
//! from TOML:
//!
//! ```toml
//! dt = 0.1              # time per frame
//! duration = 10.0       # support window of one event
//! cutoff_distance = 50  # sampling cutoff
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EventError, EventResult};

/// Default time per frame.
pub const DEFAULT_DT: f32 = 10.0;

/// Default event support window.
pub const DEFAULT_DURATION: f32 = 10.0;

/// Default sampling cutoff distance.
pub const DEFAULT_CUTOFF_DISTANCE: f32 = 100.0;

/// Parameters shared by every event source.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventSourceConfig {
    /// Time per frame.
    pub dt: f32,
    /// Temporal support of one event.
    pub duration: f32,
    /// Distance beyond which events do not contribute to a voxel.
    pub cutoff_distance: f32,
}

impl Default for EventSourceConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            duration: DEFAULT_DURATION,
            cutoff_distance: DEFAULT_CUTOFF_DISTANCE,
        }
    }
}

impl EventSourceConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidConfig`] if the document does not parse
    /// or fails [`validate`](Self::validate).
    pub fn from_toml_str(source: &str) -> EventResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| EventError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidConfig`] if the file cannot be read, or
    /// for any error of [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> EventResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            EventError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Rejects values the frame model cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> EventResult<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(EventError::InvalidConfig(format!(
                "dt must be finite and > 0, got {}",
                self.dt
            )));
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(EventError::InvalidConfig(format!(
                "duration must be finite and >= 0, got {}",
                self.duration
            )));
        }
        if self.cutoff_distance.is_nan() || self.cutoff_distance < 0.0 {
            return Err(EventError::InvalidConfig(format!(
                "cutoff_distance must be >= 0, got {}",
                self.cutoff_distance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_missing_keys() {
        let config = EventSourceConfig::from_toml_str("dt = 0.5").unwrap();
        assert_eq!(config.dt, 0.5);
        assert_eq!(config.duration, DEFAULT_DURATION);
        assert_eq!(config.cutoff_distance, DEFAULT_CUTOFF_DISTANCE);
    }

    #[test]
    fn test_full_document() {
        let config =
            EventSourceConfig::from_toml_str("dt = 2.0\nduration = 3.0\ncutoff_distance = 50.0\n")
                .unwrap();
        assert_eq!(
            config,
            EventSourceConfig { dt: 2.0, duration: 3.0, cutoff_distance: 50.0 }
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        for doc in ["dt = 0.0", "dt = -1.0", "duration = -2.0", "cutoff_distance = -1.0"] {
            let err = EventSourceConfig::from_toml_str(doc).unwrap_err();
            assert!(matches!(err, EventError::InvalidConfig(_)), "{doc}");
        }
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(EventSourceConfig::from_toml_str("dtt = 1.0").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = EventSourceConfig::load("/nonexistent/eventfield.toml").unwrap_err();
        assert!(matches!(err, EventError::InvalidConfig(_)));
    }
}
