//! Capture settings and their persistent storage.
//!
//! This module provides settings management with XDG Base Directory
//! compliance.

pub mod settings;

pub use settings::{CaptureSettings, SettingsError, SettingsManager, get_config_path};
