//! Messages and their payloads.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::command::Command;
use super::completion::Completion;
use crate::gui::{Action, GuiMessage};
use crate::media::MediaItem;

/// Closure executed on the owning thread by [`Command::Callback`].
pub type MessageCallback = Box<dyn FnOnce() + Send + 'static>;

/// Data handed over to the handler, which consumes it.
pub enum OwnedPayload {
    Item(MediaItem),
    Items(Vec<MediaItem>),
    Action(Action),
    GuiMessage(GuiMessage),
    Indices(Vec<usize>),
    Callback(MessageCallback),
}

impl fmt::Debug for OwnedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item(item) => f.debug_tuple("Item").field(item).finish(),
            Self::Items(items) => f.debug_tuple("Items").field(&items.len()).finish(),
            Self::Action(action) => f.debug_tuple("Action").field(action).finish(),
            Self::GuiMessage(msg) => f.debug_tuple("GuiMessage").field(msg).finish(),
            Self::Indices(indices) => f.debug_tuple("Indices").field(indices).finish(),
            Self::Callback(_) => f.write_str("Callback"),
        }
    }
}

/// Value written into a [`ReplySlot`] by a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Items(Vec<MediaItem>),
}

/// Out-parameter owned by the sender and written by the handler.
///
/// The sender keeps a clone and reads it after the blocking send returns.
/// A slot nobody wrote stays empty.
#[derive(Clone, Default)]
pub struct ReplySlot {
    value: Arc<Mutex<Option<ReplyValue>>>,
}

impl ReplySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: ReplyValue) {
        *self.value.lock() = Some(value);
    }

    pub fn take(&self) -> Option<ReplyValue> {
        self.value.lock().take()
    }

    pub fn is_set(&self) -> bool {
        self.value.lock().is_some()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self.value.lock() {
            Some(ReplyValue::Bool(value)) => Some(value),
            _ => None,
        }
    }

    pub fn take_items(&self) -> Option<Vec<MediaItem>> {
        let mut value = self.value.lock();
        match value.take() {
            Some(ReplyValue::Items(items)) => Some(items),
            other => {
                *value = other;
                None
            }
        }
    }
}

impl fmt::Debug for ReplySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReplySlot").field(&*self.value.lock()).finish()
    }
}

/// Message payload with explicit ownership.
#[derive(Debug, Default)]
pub enum Payload {
    #[default]
    Empty,
    /// Consumed by the handler.
    Owned(OwnedPayload),
    /// Written by the handler, read by the sender.
    Reply(ReplySlot),
}

/// A command plus its arguments, queued for the owning thread.
#[derive(Debug)]
pub struct ThreadMessage {
    pub command: Command,
    pub param1: i32,
    pub param2: i32,
    pub string_param: String,
    pub string_params: Vec<String>,
    pub payload: Payload,
    completion: Option<Completion>,
}

impl ThreadMessage {
    pub fn new(command: impl Into<Command>) -> Self {
        Self {
            command: command.into(),
            param1: 0,
            param2: 0,
            string_param: String::new(),
            string_params: Vec::new(),
            payload: Payload::Empty,
            completion: None,
        }
    }

    /// Creates a [`Command::Callback`] message running `callback` on the owning thread.
    pub fn callback(callback: impl FnOnce() + Send + 'static) -> Self {
        Self::new(Command::Callback).with_owned(OwnedPayload::Callback(Box::new(callback)))
    }

    pub fn with_param1(mut self, param1: i32) -> Self {
        self.param1 = param1;
        self
    }

    pub fn with_params(mut self, param1: i32, param2: i32) -> Self {
        self.param1 = param1;
        self.param2 = param2;
        self
    }

    pub fn with_string(mut self, value: impl Into<String>) -> Self {
        self.string_param = value.into();
        self
    }

    pub fn with_strings(mut self, values: Vec<String>) -> Self {
        self.string_params = values;
        self
    }

    pub fn with_owned(mut self, payload: OwnedPayload) -> Self {
        self.payload = Payload::Owned(payload);
        self
    }

    pub fn with_item(self, item: MediaItem) -> Self {
        self.with_owned(OwnedPayload::Item(item))
    }

    pub fn with_items(self, items: Vec<MediaItem>) -> Self {
        self.with_owned(OwnedPayload::Items(items))
    }

    pub fn with_action(self, action: Action) -> Self {
        self.with_owned(OwnedPayload::Action(action))
    }

    pub fn with_reply(mut self, slot: ReplySlot) -> Self {
        self.payload = Payload::Reply(slot);
        self
    }

    pub fn code(&self) -> u32 {
        self.command.code()
    }

    /// Moves the owned payload out, leaving the message empty.
    pub fn take_owned(&mut self) -> Option<OwnedPayload> {
        match std::mem::take(&mut self.payload) {
            Payload::Owned(owned) => Some(owned),
            other => {
                self.payload = other;
                None
            }
        }
    }

    pub fn take_item(&mut self) -> Option<MediaItem> {
        match self.take_owned()? {
            OwnedPayload::Item(item) => Some(item),
            other => self.restore(other),
        }
    }

    pub fn take_items(&mut self) -> Option<Vec<MediaItem>> {
        match self.take_owned()? {
            OwnedPayload::Items(items) => Some(items),
            other => self.restore(other),
        }
    }

    pub fn take_action(&mut self) -> Option<Action> {
        match self.take_owned()? {
            OwnedPayload::Action(action) => Some(action),
            other => self.restore(other),
        }
    }

    pub fn take_gui_message(&mut self) -> Option<GuiMessage> {
        match self.take_owned()? {
            OwnedPayload::GuiMessage(msg) => Some(msg),
            other => self.restore(other),
        }
    }

    pub fn take_indices(&mut self) -> Option<Vec<usize>> {
        match self.take_owned()? {
            OwnedPayload::Indices(indices) => Some(indices),
            other => self.restore(other),
        }
    }

    /// Reply slot of the message, if the sender attached one.
    pub fn reply(&self) -> Option<&ReplySlot> {
        match &self.payload {
            Payload::Reply(slot) => Some(slot),
            _ => None,
        }
    }

    /// Stores the handler's result for a blocking sender. No-op for posts.
    pub fn set_result(&self, result: i32) {
        if let Some(completion) = &self.completion {
            completion.set_result(result);
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.completion.is_some()
    }

    pub(crate) fn attach_completion(&mut self) -> Completion {
        self.completion.get_or_insert_with(Completion::new).clone()
    }

    pub(crate) fn completion(&self) -> Option<Completion> {
        self.completion.clone()
    }

    fn restore<T>(&mut self, payload: OwnedPayload) -> Option<T> {
        self.payload = Payload::Owned(payload);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::command::{AppCommand, PlaylistCommand};

    #[test]
    fn taking_the_wrong_payload_keeps_it() {
        let mut msg =
            ThreadMessage::new(AppCommand::MediaPlay).with_item(MediaItem::new("/a.mp3"));

        assert!(msg.take_items().is_none());
        let item = msg.take_item().expect("item should still be present");
        assert_eq!(item.path, "/a.mp3");
        assert!(matches!(msg.payload, Payload::Empty));
    }

    #[test]
    fn reply_slot_is_shared_with_sender() {
        let slot = ReplySlot::new();
        let msg = ThreadMessage::new(PlaylistCommand::GetItems).with_reply(slot.clone());

        msg.reply()
            .expect("reply slot")
            .set(ReplyValue::Items(vec![MediaItem::new("/b.flac")]));

        let items = slot.take_items().expect("items written");
        assert_eq!(items.len(), 1);
        assert!(!slot.is_set());
    }

    #[test]
    fn take_items_leaves_other_replies() {
        let slot = ReplySlot::new();
        slot.set(ReplyValue::Bool(true));
        assert!(slot.take_items().is_none());
        assert_eq!(slot.as_bool(), Some(true));
    }

    #[test]
    fn set_result_without_completion_is_ignored() {
        let mut msg = ThreadMessage::new(AppCommand::Quit);
        msg.set_result(5);
        assert!(!msg.is_blocking());

        let completion = msg.attach_completion();
        msg.set_result(5);
        assert_eq!(completion.result(), 5);
    }
}
