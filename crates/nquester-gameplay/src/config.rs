//! Session configuration.
//!
//! Tunables for the event timer, the victory target, the RNG seed and the
//! signal queue. Configuration can be loaded from and saved to a TOML file;
//! a missing or broken file falls back to defaults.

use crate::content::TARGET_USERS;
use crate::random_event::DEFAULT_EVENT_INTERVAL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{info, warn};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "nquester.toml";

/// Session configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds between random events
    pub event_interval_secs: f64,
    /// Currency needed for victory; also the display ceiling
    pub target_users: i64,
    /// RNG seed (None = random)
    pub rng_seed: Option<u64>,
    /// Capacity of the signal queue
    pub signal_capacity: usize,
    /// Enable the random event timer
    pub events_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            event_interval_secs: DEFAULT_EVENT_INTERVAL,
            target_users: TARGET_USERS,
            rng_seed: None,
            signal_capacity: 1024,
            events_enabled: true,
        }
    }
}

impl SessionConfig {
    /// Sets the RNG seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Sets the event interval.
    #[must_use]
    pub const fn with_event_interval(mut self, seconds: f64) -> Self {
        self.event_interval_secs = seconds;
        self
    }

    /// Enables or disables random events.
    #[must_use]
    pub const fn with_events(mut self, enabled: bool) -> Self {
        self.events_enabled = enabled;
        self
    }

    /// Loads configuration from a file, falling back to defaults.
    #[must_use]
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str::<Self>(&contents) {
                    Ok(mut config) => {
                        config.validate();
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Saves configuration to a file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamps values to sensible ranges.
    pub fn validate(&mut self) {
        if !self.event_interval_secs.is_finite() {
            self.event_interval_secs = DEFAULT_EVENT_INTERVAL;
        }
        self.event_interval_secs = self.event_interval_secs.clamp(1.0, 3600.0);
        self.target_users = self.target_users.max(1);
        self.signal_capacity = self.signal_capacity.clamp(16, 65_536);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert!((config.event_interval_secs - 60.0).abs() < f64::EPSILON);
        assert_eq!(config.target_users, 10_000);
        assert_eq!(config.rng_seed, None);
        assert!(config.events_enabled);
    }

    #[test]
    fn test_config_validation() {
        let mut config = SessionConfig {
            event_interval_secs: 0.0,
            target_users: -5,
            signal_capacity: 1,
            ..SessionConfig::default()
        };
        config.validate();

        assert!((config.event_interval_secs - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.target_users, 1);
        assert_eq!(config.signal_capacity, 16);

        config.event_interval_secs = f64::NAN;
        config.validate();
        assert!((config.event_interval_secs - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join(CONFIG_FILE);

        let config = SessionConfig::default()
            .with_seed(12345)
            .with_event_interval(30.0)
            .with_events(false);
        config.save_to(&config_path).expect("Failed to save config");

        let loaded = SessionConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = SessionConfig::load_from("/nonexistent/path/nquester.toml");
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_config_load_broken_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&config_path, "event_interval_secs = \"soon\"").expect("write should succeed");

        let config = SessionConfig::load_from(&config_path);
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&config_path, "rng_seed = 7\n").expect("write should succeed");

        let config = SessionConfig::load_from(&config_path);
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.target_users, 10_000);
    }
}
