//! Settings resolution for bytebridge.
//!
//! Implements hierarchical settings resolution:
//! 1. Built-in defaults
//! 2. Settings file (JSON, passed with `--config`)
//! 3. Environment variables
//! 4. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};

/// Default relay tick period in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;

/// Complete bytebridge settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub relay: RelaySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Relay engine settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RelaySettings {
    /// Period between relay ticks.
    pub tick_interval_ms: u64,
    /// Ceiling on bytes held per endpoint while the destination is not
    /// write-ready. `None` keeps everything.
    pub max_buffered_bytes: Option<usize>,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            max_buffered_bytes: None,
        }
    }
}

impl RelaySettings {
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Load settings: defaults, then the optional file, then environment overrides.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let mut settings = match path {
        Some(path) => {
            let settings = load_settings_file(path)?;
            debug!(path = %path.display(), "Loaded settings file");
            settings
        }
        None => Settings::default(),
    };
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    validate(&settings)?;
    debug!(?settings, "Resolved settings");
    Ok(settings)
}

/// Reject settings the relay cannot run with.
pub fn validate(settings: &Settings) -> Result<()> {
    if settings.relay.tick_interval_ms == 0 {
        return Err(Error::Config(
            "tick interval must be at least 1 ms".to_string(),
        ));
    }
    if settings.relay.max_buffered_bytes == Some(0) {
        return Err(Error::Config(
            "max buffered bytes must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn load_settings_file(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read settings file {}: {}",
            path.display(),
            e
        ))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse settings file {}: {}",
            path.display(),
            e
        ))
    })
}

fn apply_env_overrides(
    settings: &mut Settings,
    var: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(val) = var("BYTEBRIDGE_TICK_MS") {
        settings.relay.tick_interval_ms = val
            .parse()
            .map_err(|_| Error::Config(format!("BYTEBRIDGE_TICK_MS is not a number: {val}")))?;
    }
    if let Some(val) = var("BYTEBRIDGE_MAX_BUFFER") {
        settings.relay.max_buffered_bytes = Some(val.parse().map_err(|_| {
            Error::Config(format!("BYTEBRIDGE_MAX_BUFFER is not a number: {val}"))
        })?);
    }
    if let Some(val) = var("BYTEBRIDGE_LOG_LEVEL") {
        settings.logging.level = val;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_tick_is_50ms() {
        let settings = Settings::default();
        assert_eq!(settings.relay.tick_interval(), Duration::from_millis(50));
        assert_eq!(settings.relay.max_buffered_bytes, None);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn settings_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"relay": {{"tick_interval_ms": 20, "max_buffered_bytes": 4096}}}}"#
        )
        .unwrap();

        let settings = load_settings_file(file.path()).unwrap();
        assert_eq!(settings.relay.tick_interval_ms, 20);
        assert_eq!(settings.relay.max_buffered_bytes, Some(4096));
        assert_eq!(settings.logging, LoggingSettings::default());
    }

    #[test]
    fn malformed_settings_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load_settings_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn load_settings_reads_file_and_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"logging": {{"json": true}}}}"#).unwrap();

        let settings = load_settings(Some(file.path())).unwrap();
        assert!(settings.logging.json);

        let mut zero_tick = tempfile::NamedTempFile::new().unwrap();
        write!(zero_tick, r#"{{"relay": {{"tick_interval_ms": 0}}}}"#).unwrap();
        let err = load_settings(Some(zero_tick.path())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_settings_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings(Some(&dir.path().join("absent.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read settings file"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut settings = Settings::default();
        apply_env_overrides(
            &mut settings,
            env(&[
                ("BYTEBRIDGE_TICK_MS", "10"),
                ("BYTEBRIDGE_MAX_BUFFER", "1024"),
                ("BYTEBRIDGE_LOG_LEVEL", "debug"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.relay.tick_interval_ms, 10);
        assert_eq!(settings.relay.max_buffered_bytes, Some(1024));
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn non_numeric_env_override_is_rejected() {
        let mut settings = Settings::default();
        let err = apply_env_overrides(&mut settings, env(&[("BYTEBRIDGE_TICK_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn zero_tick_is_invalid() {
        let mut settings = Settings::default();
        settings.relay.tick_interval_ms = 0;
        assert!(validate(&settings).is_err());
    }

    #[test]
    fn zero_buffer_ceiling_is_invalid() {
        let mut settings = Settings::default();
        settings.relay.max_buffered_bytes = Some(0);
        assert!(validate(&settings).is_err());
    }
}
