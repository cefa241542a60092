//! Players and player selection.
//!
//! This module provides:
//! - [`Player`], the interface the application drives playback through
//! - [`DummyPlayer`], a player with a simulated clock
//! - [`PlayerCoreFactory`], rule-based player selection configured from XML
//! - [`stack`], resolution of multi-part (`stack://`) items

mod dummy;
mod factory;
pub mod stack;

pub use dummy::DummyPlayer;
pub use factory::{PlayerConfig, PlayerCoreFactory, PlayerCreator, PlayerRule};

use thiserror::Error;

use crate::media::MediaItem;

/// Errors from player selection and playback.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("No player can handle {0}")]
    NoPlayerFor(String),

    #[error("Unknown player {0}")]
    UnknownPlayer(String),

    #[error("Failed to open {path}: {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("Invalid player configuration: {0}")]
    InvalidConfig(String),
}

/// A media player driven by the application on the owning thread.
pub trait Player: Send {
    fn name(&self) -> &str;

    /// Starts playback of `item` at its start offset.
    fn open_file(&mut self, item: &MediaItem) -> Result<(), PlayerError>;

    fn close_file(&mut self);

    fn is_playing(&self) -> bool;

    fn is_paused(&self) -> bool;

    /// Toggles pause.
    fn pause(&mut self);

    fn has_video(&self) -> bool;

    fn has_audio(&self) -> bool;

    fn seek_time(&mut self, position_ms: u64);

    /// Current position in milliseconds.
    fn time_ms(&self) -> u64;

    fn total_time_ms(&self) -> Option<u64>;

    /// True once playback reached the end of the item.
    fn is_finished(&self) -> bool;
}
