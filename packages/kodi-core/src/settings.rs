//! Application settings and startup parameters.
//!
//! [`Settings`] holds the user-facing configuration the core consults at
//! runtime (screensaver, power saving, skin, playback). [`AppParams`] holds the
//! one-shot startup parameters handed to the service stages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SKIN, SCREENSAVER_DIM};

/// Action taken when the idle shutdown timer fires or `Shutdown` is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownState {
    #[default]
    Quit,
    Powerdown,
    Suspend,
    Hibernate,
    Minimize,
}

/// Screensaver behaviour.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ScreensaverSettings {
    /// Screensaver add-on id. Empty disables the screensaver.
    pub mode: String,

    /// Idle minutes before the screensaver starts (0 disables it).
    pub time_minutes: u32,

    /// Keep the screensaver off while audio plays.
    pub disable_for_audio: bool,

    /// Dim instead of the configured screensaver while video is paused.
    pub use_dim_on_pause: bool,

    /// Show the music visualisation instead of the screensaver while audio plays.
    pub use_music_visualisation: bool,
}

impl Default for ScreensaverSettings {
    fn default() -> Self {
        Self {
            mode: SCREENSAVER_DIM.to_string(),
            time_minutes: 3,
            disable_for_audio: true,
            use_dim_on_pause: true,
            use_music_visualisation: false,
        }
    }
}

/// Display power saving and shutdown behaviour.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PowerSettings {
    /// Idle minutes before the display is powered off (0 disables DPMS).
    pub displays_off_minutes: u32,

    /// Action used for `Shutdown`.
    pub shutdown_state: ShutdownState,

    /// Idle minutes before the shutdown action runs (0 disables it).
    pub shutdown_time_minutes: u32,
}

/// Skin selection.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SkinSettings {
    /// Skin to load at startup.
    pub skin: String,

    /// Window to show after the skin loads.
    pub startup_window: i32,
}

impl Default for SkinSettings {
    fn default() -> Self {
        Self {
            skin: DEFAULT_SKIN.to_string(),
            startup_window: crate::gui::window_ids::WINDOW_HOME,
        }
    }
}

/// Playback behaviour.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Volume at startup (0.0 - 1.0).
    pub initial_volume: f32,

    /// Seek distance of small steps (seconds).
    pub seek_step_secs: u32,

    /// Seek distance of big steps (seconds).
    pub big_seek_step_secs: u32,

    /// Switch to the fullscreen window when video starts.
    pub switch_to_fullscreen: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            initial_volume: 1.0,
            seek_step_secs: 30,
            big_seek_step_secs: 600,
            switch_to_fullscreen: true,
        }
    }
}

/// Main loop pacing.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct FrameSettings {
    /// Sleep between frames (milliseconds).
    pub interval_ms: u64,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self { interval_ms: 16 }
    }
}

/// Runtime configuration of the application core.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub screensaver: ScreensaverSettings,
    pub power: PowerSettings,
    pub skin: SkinSettings,
    pub playback: PlaybackSettings,
    pub frame: FrameSettings,
}

impl Settings {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.playback.initial_volume) {
            return Err("playback.initial_volume must be within 0.0..=1.0".to_string());
        }
        if self.playback.seek_step_secs == 0 || self.playback.big_seek_step_secs == 0 {
            return Err("seek steps must be >= 1 second".to_string());
        }
        if self.skin.skin.trim().is_empty() {
            return Err("skin.skin must not be empty".to_string());
        }
        if self.frame.interval_ms > 1000 {
            return Err("frame.interval_ms must be <= 1000".to_string());
        }
        Ok(())
    }
}

/// Startup parameters.
#[derive(Debug, Clone, Default)]
pub struct AppParams {
    /// Keep user data next to the executable.
    pub portable: bool,

    /// The application owns the machine and may power it down.
    pub standalone: bool,

    /// Start in fullscreen mode.
    pub start_fullscreen: bool,

    /// Test mode: no real power transitions.
    pub test_mode: bool,

    /// Register an emulated CEC adapter.
    pub emulate_cec: bool,

    /// Items to play right after startup.
    pub playlist: Vec<String>,

    /// Overrides the user data folder.
    pub user_data: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.skin.skin, DEFAULT_SKIN);
        assert_eq!(settings.power.shutdown_state, ShutdownState::Quit);
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"power":{"shutdown_state":"suspend"}}"#).unwrap();
        assert_eq!(settings.power.shutdown_state, ShutdownState::Suspend);
        assert_eq!(settings.screensaver.time_minutes, 3);
    }

    #[test]
    fn rejects_out_of_range_volume() {
        let mut settings = Settings::default();
        settings.playback.initial_volume = 1.5;
        assert!(settings.validate().is_err());
    }
}
