//! Announcements emitted by the application core.
//!
//! This module provides:
//! - [`EventEmitter`] trait for subsystems to announce state changes
//! - [`BroadcastEventBridge`] fanning announcements out to subscribers
//! - Announcement types per domain (player, GUI, system, application, lifecycle)

mod bridge;
mod emitter;

pub use bridge::BroadcastEventBridge;
pub use emitter::{EventEmitter, LoggingEventEmitter, NoopEventEmitter};

use serde::Serialize;

/// Announcements delivered to subscribers.
///
/// Each category has its own inner event type with specific variants.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "category", rename_all = "camelCase")]
pub enum Announcement {
    /// Playback state changes.
    Player(PlayerEvent),

    /// Screensaver and display power changes.
    Gui(GuiEvent),

    /// Process-level transitions (quit, sleep).
    System(SystemEvent),

    /// Application-wide settings changes (volume).
    Application(ApplicationEvent),

    /// Service stage transitions.
    Lifecycle(LifecycleEvent),
}

/// Playback state announcements.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerEvent {
    /// Playback of an item started.
    OnPlay {
        /// Path of the item being played.
        item: String,
        /// Name of the player handling the item.
        player: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// Playback paused.
    OnPause {
        /// Path of the paused item.
        item: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// Playback resumed after a pause.
    OnResume {
        /// Path of the resumed item.
        item: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// Playback stopped.
    OnStop {
        /// Path of the stopped item.
        item: String,
        /// True when the item played to its end.
        ended: bool,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// Playback position changed by a seek.
    OnSeek {
        /// Path of the item.
        item: String,
        /// New position in milliseconds.
        #[serde(rename = "positionMs")]
        position_ms: u64,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

/// Screensaver and display power announcements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GuiEvent {
    /// The screensaver became active.
    OnScreensaverActivated,
    /// The screensaver was dismissed.
    OnScreensaverDeactivated {
        /// True when the wake was triggered by a power-off key.
        #[serde(rename = "shuttingDown")]
        shutting_down: bool,
    },
    /// Display power saving engaged.
    OnDpmsActivated,
    /// Display power saving released.
    OnDpmsDeactivated,
}

/// Process-level announcements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SystemEvent {
    /// The application is quitting with the given exit code.
    OnQuit {
        /// Process exit code.
        #[serde(rename = "exitCode")]
        exit_code: i32,
    },
    /// The system is about to suspend or hibernate.
    OnSleep,
    /// The system is about to reboot.
    OnRestart,
}

/// Application-wide announcements.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ApplicationEvent {
    /// Volume or mute changed.
    OnVolumeChanged {
        /// Volume between 0.0 and 1.0.
        volume: f32,
        /// Mute state.
        muted: bool,
    },
}

/// Service stage transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LifecycleEvent {
    /// A service stage finished constructing its subsystems.
    StageInitialized {
        /// Stage number (1..=3).
        stage: u8,
    },
    /// A service stage released its subsystems.
    StageDeinitialized {
        /// Stage number (1..=3).
        stage: u8,
    },
}
