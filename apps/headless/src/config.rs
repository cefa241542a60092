//! Runner configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kodi_core::{AppParams, Settings};
use serde::Deserialize;

/// Runner configuration loaded from YAML with environment overrides.
///
/// Core settings sit at the top level next to the startup options:
///
/// ```yaml
/// standalone: true
/// user_data: /var/lib/kodi
/// screensaver:
///   time_minutes: 5
/// power:
///   shutdown_time_minutes: 30
/// ```
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct HeadlessConfig {
    /// User data folder.
    /// Override: `KODI_USER_DATA`
    pub user_data: Option<PathBuf>,

    /// Keep user data next to the executable.
    pub portable: bool,

    /// The process owns the machine and may power it down.
    pub standalone: bool,

    /// Register an emulated CEC adapter.
    pub emulate_cec: bool,

    /// Start in fullscreen mode.
    pub start_fullscreen: bool,

    #[serde(flatten)]
    pub settings: Settings,
}

impl HeadlessConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_yaml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("KODI_SKIN") {
            if !val.trim().is_empty() {
                self.settings.skin.skin = val;
            }
        }

        if let Ok(val) = std::env::var("KODI_SCREENSAVER_MINUTES") {
            if let Ok(minutes) = val.parse() {
                self.settings.screensaver.time_minutes = minutes;
            }
        }

        if let Ok(val) = std::env::var("KODI_SHUTDOWN_MINUTES") {
            if let Ok(minutes) = val.parse() {
                self.settings.power.shutdown_time_minutes = minutes;
            }
        }

        if let Ok(val) = std::env::var("KODI_FRAME_INTERVAL_MS") {
            if let Ok(interval) = val.parse() {
                self.settings.frame.interval_ms = interval;
            }
        }

        // Note: KODI_USER_DATA is handled by clap via #[arg(env = ...)] in main.rs
    }

    /// Startup parameters for the core.
    pub fn to_params(&self, playlist: Vec<String>, test_mode: bool) -> AppParams {
        AppParams {
            portable: self.portable,
            standalone: self.standalone,
            start_fullscreen: self.start_fullscreen,
            test_mode,
            emulate_cec: self.emulate_cec,
            playlist,
            user_data: self.user_data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_sections_sit_at_top_level() {
        let config = HeadlessConfig::from_yaml(
            "standalone: true\nscreensaver:\n  time_minutes: 7\npower:\n  shutdown_time_minutes: 30\n",
        )
        .unwrap();
        assert!(config.standalone);
        assert_eq!(config.settings.screensaver.time_minutes, 7);
        assert_eq!(config.settings.power.shutdown_time_minutes, 30);
        assert_eq!(config.settings.skin.skin, Settings::default().skin.skin);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = HeadlessConfig::from_yaml("{}").unwrap();
        assert!(!config.portable);
        assert!(config.settings.validate().is_ok());
    }

    #[test]
    fn params_carry_startup_options() {
        let config = HeadlessConfig {
            emulate_cec: true,
            user_data: Some(PathBuf::from("/tmp/kodi")),
            ..HeadlessConfig::default()
        };
        let params = config.to_params(vec!["/music/a.mp3".into()], true);
        assert!(params.emulate_cec);
        assert!(params.test_mode);
        assert_eq!(params.playlist.len(), 1);
        assert_eq!(params.user_data, Some(PathBuf::from("/tmp/kodi")));
    }
}
