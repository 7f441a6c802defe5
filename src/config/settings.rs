//! Capture and reporting preferences with XDG Base Directory compliance.
//!
//! Settings live in a JSON file under the XDG config home. Missing fields
//! fall back to their defaults, so older files keep loading.

use std::{
    env::var,
    fs::{create_dir_all, read_to_string, write},
    io::Error as StdError,
    path::PathBuf,
};

use {
    parking_lot::{RwLock, RwLockReadGuard},
    serde::{Deserialize, Serialize},
    serde_json::{Error as SerdeJsonError, from_str, to_string_pretty},
    thiserror::Error,
    tracing::debug,
};

use crate::capture::{
    aggregator::{CaptureConfig, DEFAULT_HISTORY_LIMIT},
    reporter::{DEFAULT_REPORT_ENDPOINT, ReportContext, default_client_info},
};

/// Error type for settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to read or write settings file.
    #[error("IO error: {0}")]
    IoError(#[from] StdError),
    /// Failed to serialize or deserialize settings.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] SerdeJsonError),
    /// Invalid settings value.
    #[error("Invalid settings value: {reason}")]
    InvalidValue { reason: String },
}

/// Serializable capture settings with default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Number of uncaught exceptions kept in the recent history.
    pub history_limit: usize,
    /// Whether uncaught exceptions are reported.
    pub reporting_enabled: bool,
    /// Endpoint label reports are addressed to.
    pub report_endpoint: String,
    /// Maximum number of reports waiting for delivery.
    pub report_queue_capacity: usize,
    /// Client identification override (None = derived from the build).
    pub client_info: Option<String>,
    /// Address of the page hosting the calculator.
    pub page_url: Option<String>,
    /// Log filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            reporting_enabled: true,
            report_endpoint: DEFAULT_REPORT_ENDPOINT.to_string(),
            report_queue_capacity: 64,
            client_info: None,
            page_url: None,
            log_filter: "info".to_string(),
        }
    }
}

impl CaptureSettings {
    /// Checks that all values are usable.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidValue` for a zero history limit or a
    /// zero queue capacity.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.history_limit == 0 {
            return Err(SettingsError::InvalidValue {
                reason: "history_limit must be at least 1".to_string(),
            });
        }
        if self.report_queue_capacity == 0 {
            return Err(SettingsError::InvalidValue {
                reason: "report_queue_capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Runtime aggregator configuration for these settings.
    #[must_use]
    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            history_limit: self.history_limit,
            reporting_enabled: self.reporting_enabled,
            context: ReportContext {
                client_info: self.client_info.clone().unwrap_or_else(default_client_info),
                url: self.page_url.clone(),
            },
        }
    }
}

/// Handles loading, saving, and validation of capture settings.
#[derive(Debug)]
pub struct SettingsManager {
    /// Thread-safe settings storage.
    settings: RwLock<CaptureSettings>,
    /// Path to the configuration file on disk.
    config_path: PathBuf,
}

impl SettingsManager {
    /// Creates a new settings manager with default config path.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if settings cannot be loaded from disk or are
    /// invalid.
    pub fn new() -> Result<Self, SettingsError> {
        Self::with_config_path(get_config_path())
    }

    /// Creates a new settings manager with a custom config path.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Custom path for the settings file
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if settings cannot be loaded from disk or are
    /// invalid.
    pub fn with_config_path(config_path: PathBuf) -> Result<Self, SettingsError> {
        if let Some(parent) = config_path.parent() {
            create_dir_all(parent)?;
        }

        let settings: CaptureSettings = if config_path.exists() {
            debug!("Loading settings from existing file: {:?}", config_path);
            let contents = read_to_string(&config_path)?;
            from_str(&contents)?
        } else {
            debug!("Using default settings, no file at {:?}", config_path);
            CaptureSettings::default()
        };
        settings.validate()?;

        Ok(SettingsManager {
            settings: RwLock::new(settings),
            config_path,
        })
    }

    /// Gets the current settings.
    pub fn get_settings(&self) -> RwLockReadGuard<'_, CaptureSettings> {
        self.settings.read()
    }

    /// Gets the configuration file path.
    pub fn get_config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Validates, applies and saves new settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the settings are invalid or cannot be saved
    /// to disk. Invalid settings are not applied.
    pub fn update_settings(&self, new_settings: CaptureSettings) -> Result<(), SettingsError> {
        new_settings.validate()?;
        *self.settings.write() = new_settings;
        self.save_settings()
    }

    fn save_settings(&self) -> Result<(), SettingsError> {
        debug!("Saving settings to file: {:?}", self.config_path);
        let contents = to_string_pretty(&*self.settings.read())?;
        write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Path of the settings file under the XDG config home.
#[must_use]
pub fn get_config_path() -> PathBuf {
    let mut config_dir = get_xdg_config_home();
    config_dir.push("calcguard");
    config_dir.push("settings.json");
    config_dir
}

/// Uses `XDG_CONFIG_HOME` if set, otherwise $HOME/.config
fn get_xdg_config_home() -> PathBuf {
    if let Ok(config_home) = var("XDG_CONFIG_HOME")
        && !config_home.is_empty()
    {
        return PathBuf::from(config_home);
    }

    if let Ok(home) = var("HOME") {
        let mut path = PathBuf::from(home);
        path.push(".config");
        return path;
    }

    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use std::fs::{read_to_string, write};

    use tempfile::tempdir;

    use crate::config::settings::{CaptureSettings, SettingsError, SettingsManager};

    #[test]
    fn test_capture_settings_default() {
        let settings = CaptureSettings::default();
        assert_eq!(settings.history_limit, 10);
        assert!(settings.reporting_enabled);
        assert_eq!(settings.report_endpoint, "/api/errors");
        assert_eq!(settings.log_filter, "info");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        write(&path, r#"{ "history_limit": 4, "page_url": "http://localhost/" }"#).unwrap();

        let manager = SettingsManager::with_config_path(path).unwrap();
        let settings = manager.get_settings();
        assert_eq!(settings.history_limit, 4);
        assert_eq!(settings.page_url.as_deref(), Some("http://localhost/"));
        assert!(settings.reporting_enabled);

        let config = settings.capture_config();
        assert_eq!(config.history_limit, 4);
        assert_eq!(config.context.url.as_deref(), Some("http://localhost/"));
        assert!(config.context.client_info.starts_with("calcguard/"));
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        write(&path, r#"{ "history_limit": 0 }"#).unwrap();

        let error = SettingsManager::with_config_path(path).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid settings value: history_limit must be at least 1"
        );
    }

    #[test]
    fn test_update_settings_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let manager = SettingsManager::with_config_path(path.clone()).unwrap();
        assert!(!path.exists());

        let updated = CaptureSettings {
            reporting_enabled: false,
            client_info: Some("kiosk".to_string()),
            ..CaptureSettings::default()
        };
        manager.update_settings(updated.clone()).unwrap();

        let reloaded = SettingsManager::with_config_path(path.clone()).unwrap();
        assert_eq!(*reloaded.get_settings(), updated);
        assert!(read_to_string(&path).unwrap().contains("\"kiosk\""));
    }

    #[test]
    fn test_invalid_update_is_not_applied() {
        let dir = tempdir().unwrap();
        let manager = SettingsManager::with_config_path(dir.path().join("settings.json")).unwrap();

        let result = manager.update_settings(CaptureSettings {
            report_queue_capacity: 0,
            ..CaptureSettings::default()
        });

        assert!(matches!(result, Err(SettingsError::InvalidValue { .. })));
        assert_eq!(manager.get_settings().report_queue_capacity, 64);
    }
}
