//! Kodi Core - the application core of a media center.
//!
//! This crate holds the message-passing and application-state orchestration
//! layer: a cross-thread command bus, the application state machine and the
//! staged service lifecycle. Rendering, codecs and OS power APIs are consumed
//! through narrow traits with headless implementations.
//!
//! # Architecture
//!
//! - [`messaging`]: Two-queue command bus drained by the owning thread
//! - [`application`]: Playback, screensaver/DPMS, skin and the main loop
//! - [`services`]: Subsystems and the three-stage [`ServiceManager`]
//! - [`playlist`]: Playlists and the playlist player
//! - [`player`]: Player selection and the player trait
//! - [`gui`]: Window manager, display and skin collaborators
//! - [`jobs`]: Background job runtime and the library scanner
//! - [`events`]: Announcements and their delivery
//! - [`bootstrap`] and [`context`]: Wiring and ownership of one running core
//!
//! # Threading
//!
//! The thread that calls [`bootstrap`](bootstrap::bootstrap) owns the
//! messenger and must run the main loop. Any other thread talks to the core
//! by posting or sending messages.

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod bootstrap;
pub mod constants;
pub mod context;
pub mod error;
pub mod events;
pub mod gui;
pub mod jobs;
pub mod media;
pub mod messaging;
pub mod player;
pub mod playlist;
pub mod services;
pub mod settings;
pub mod utils;

// Re-export commonly used types at the crate root
pub use application::{Application, Collaborators, ExitCode, FrameMoveGuard};
pub use bootstrap::{bootstrap, bootstrap_with, resolve_user_data, BootstrapOverrides};
pub use context::ApplicationContext;
pub use error::{ErrorCode, KodiError, KodiResult};
pub use events::{Announcement, BroadcastEventBridge, EventEmitter, LoggingEventEmitter};
pub use media::{MediaItem, MediaKind};
pub use messaging::{
    AppCommand, ApplicationMessenger, Command, MessageTarget, QueueKind, TargetKind,
    ThreadMessage,
};
pub use playlist::{PlaylistId, PlaylistPlayer, RepeatMode};
pub use services::{ServiceHandles, ServiceManager};
pub use settings::{AppParams, Settings, ShutdownState};
