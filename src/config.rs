use crate::defaults;
use crate::error::VoicereqError;
use crate::request::options::RequestOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub transport: TransportConfig,
    pub driver: DriverConfig,
    pub logging: LoggingConfig,
}

/// Audio session configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Immediate instead of deferred activation for audio requests.
    pub activate_immediately: bool,
}

/// Transport tuning copied into every request's options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    pub timeout_ms: u64,
    pub params: BTreeMap<String, String>,
}

/// Request driver configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DriverConfig {
    pub command_capacity: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            activate_immediately: defaults::ACTIVATE_IMMEDIATELY,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: defaults::TIMEOUT_MS,
            params: BTreeMap::new(),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            command_capacity: defaults::COMMAND_CAPACITY,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only a missing file falls back to defaults; invalid TOML is an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Save configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOICEREQ_ACTIVATE_IMMEDIATELY → audio.activate_immediately
    /// - VOICEREQ_TIMEOUT_MS → transport.timeout_ms
    /// - VOICEREQ_LOG → logging.level
    ///
    /// Empty or unparsable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var(defaults::ENV_ACTIVATE_IMMEDIATELY)
            && let Some(flag) = parse_flag(&value)
        {
            self.audio.activate_immediately = flag;
        }

        if let Ok(value) = std::env::var(defaults::ENV_TIMEOUT_MS)
            && let Ok(timeout_ms) = value.trim().parse::<u64>()
        {
            self.transport.timeout_ms = timeout_ms;
        }

        if let Ok(level) = std::env::var(defaults::ENV_LOG)
            && !level.is_empty()
        {
            self.logging.level = level;
        }

        self
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), VoicereqError> {
        if self.transport.timeout_ms == 0 {
            return Err(VoicereqError::ConfigInvalidValue {
                key: "transport.timeout_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.driver.command_capacity == 0 {
            return Err(VoicereqError::ConfigInvalidValue {
                key: "driver.command_capacity".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Options for a new request, with a fresh id and the configured tuning.
    pub fn request_options(&self) -> RequestOptions {
        let mut options = RequestOptions::new().with_timeout_ms(self.transport.timeout_ms);
        options.params = self.transport.params.clone();
        options
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voicereq/config.toml on Linux, or `None` when the
    /// platform has no config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("voicereq").join("config.toml"))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_voicereq_env() {
        remove_env(defaults::ENV_ACTIVATE_IMMEDIATELY);
        remove_env(defaults::ENV_TIMEOUT_MS);
        remove_env(defaults::ENV_LOG);
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert!(!config.audio.activate_immediately);
        assert_eq!(config.transport.timeout_ms, 10_000);
        assert!(config.transport.params.is_empty());
        assert_eq!(config.driver.command_capacity, 64);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [audio]
            activate_immediately = true

            [transport]
            timeout_ms = 2500
            params = { locale = "en_US" }

            [driver]
            command_capacity = 8

            [logging]
            level = "voicereq=debug"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert!(config.audio.activate_immediately);
        assert_eq!(config.transport.timeout_ms, 2500);
        assert_eq!(
            config.transport.params.get("locale").map(String::as_str),
            Some("en_US")
        );
        assert_eq!(config.driver.command_capacity, 8);
        assert_eq!(config.logging.level, "voicereq=debug");
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[transport]\ntimeout_ms = 500\n")
            .unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.transport.timeout_ms, 500);
        assert!(!config.audio.activate_immediately);
        assert_eq!(config.driver.command_capacity, 64);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[audio\nbroken").unwrap();

        assert!(Config::load(temp_file.path()).is_err());
        assert!(Config::load_or_default(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.audio.activate_immediately = true;
        config
            .transport
            .params
            .insert("tag".to_string(), "kitchen".to_string());
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_env_override_activation() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_voicereq_env();
        set_env(defaults::ENV_ACTIVATE_IMMEDIATELY, "yes");

        let config = Config::default().with_env_overrides();
        assert!(config.audio.activate_immediately);

        clear_voicereq_env();
    }

    #[test]
    fn test_env_override_all() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_voicereq_env();
        set_env(defaults::ENV_ACTIVATE_IMMEDIATELY, "1");
        set_env(defaults::ENV_TIMEOUT_MS, "750");
        set_env(defaults::ENV_LOG, "debug");

        let config = Config::default().with_env_overrides();
        assert!(config.audio.activate_immediately);
        assert_eq!(config.transport.timeout_ms, 750);
        assert_eq!(config.logging.level, "debug");

        clear_voicereq_env();
    }

    #[test]
    fn test_env_override_invalid_values_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_voicereq_env();
        set_env(defaults::ENV_ACTIVATE_IMMEDIATELY, "maybe");
        set_env(defaults::ENV_TIMEOUT_MS, "soon");
        set_env(defaults::ENV_LOG, "");

        let config = Config::default().with_env_overrides();
        assert_eq!(config, Config::default());

        clear_voicereq_env();
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.transport.timeout_ms = 0;
        match config.validate() {
            Err(VoicereqError::ConfigInvalidValue { key, .. }) => {
                assert_eq!(key, "transport.timeout_ms")
            }
            other => panic!("Expected ConfigInvalidValue, got {:?}", other),
        }

        config.transport.timeout_ms = 1;
        config.driver.command_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_options_from_config() {
        let mut config = Config::default();
        config.transport.timeout_ms = 1234;
        config
            .transport
            .params
            .insert("locale".to_string(), "de_DE".to_string());

        let options = config.request_options();
        assert_eq!(options.timeout_ms, 1234);
        assert_eq!(options.params.get("locale").map(String::as_str), Some("de_DE"));
        assert!(options.text.is_none());
    }

    #[test]
    fn test_default_path_is_xdg_compliant() {
        if let Some(path) = Config::default_path() {
            assert!(path.ends_with("voicereq/config.toml"), "got {}", path.display());
        }
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag(""), None);
    }
}
