//! Cross-thread messaging.
//!
//! This module provides:
//! - [`ApplicationMessenger`], the two-queue command bus drained by the owning thread
//! - [`Command`], the closed command space with band-preserving numeric codes
//! - [`ThreadMessage`] and its [`Payload`] with explicit ownership
//! - [`MessageTarget`], implemented by every receiver

mod command;
mod completion;
mod helpers;
mod message;
mod messenger;
mod target;

pub use command::{
    AppCommand, Command, CommandBand, GuiCommand, PlaylistCommand, QueueKind, TargetKind,
};
pub use completion::Completion;
pub use message::{
    MessageCallback, OwnedPayload, Payload, ReplySlot, ReplyValue, ThreadMessage,
};
pub use messenger::ApplicationMessenger;
pub use target::MessageTarget;
