//! Typed wrappers over [`ApplicationMessenger`] for common commands.

use super::command::{AppCommand, GuiCommand, PlaylistCommand};
use super::message::{OwnedPayload, ReplySlot, ThreadMessage};
use super::messenger::ApplicationMessenger;
use crate::gui::{Action, GuiMessage};
use crate::media::MediaItem;
use crate::playlist::PlaylistId;

impl ApplicationMessenger {
    /// Plays a single item, discarding the current playlist.
    pub fn media_play(&self, item: MediaItem) {
        self.post(ThreadMessage::new(AppCommand::MediaPlay).with_item(item));
    }

    /// Replaces the matching playlist with `items` and starts at `start`.
    pub fn media_play_list(&self, items: Vec<MediaItem>, start: usize) {
        self.post(
            ThreadMessage::new(AppCommand::MediaPlay)
                .with_param1(start as i32)
                .with_items(items),
        );
    }

    pub fn media_stop(&self) {
        self.post(ThreadMessage::new(AppCommand::MediaStop));
    }

    /// Toggles pause on the active player.
    pub fn media_pause(&self) {
        self.post(ThreadMessage::new(AppCommand::MediaPause));
    }

    /// Starts the current playlist at `index`, or at its current song for `None`.
    pub fn playlist_play(&self, index: Option<usize>) {
        let index = index.map_or(-1, |i| i as i32);
        self.post(ThreadMessage::new(PlaylistCommand::Play).with_param1(index));
    }

    pub fn playlist_next(&self) {
        self.post(ThreadMessage::new(PlaylistCommand::Next));
    }

    pub fn playlist_previous(&self) {
        self.post(ThreadMessage::new(PlaylistCommand::Previous));
    }

    /// Returns the items of a playlist. Blocks unless called on the owning thread.
    pub fn playlist_items(&self, playlist: PlaylistId) -> Vec<MediaItem> {
        let slot = ReplySlot::new();
        self.send(
            ThreadMessage::new(PlaylistCommand::GetItems)
                .with_param1(playlist as i32)
                .with_reply(slot.clone()),
        );
        slot.take_items().unwrap_or_default()
    }

    pub fn activate_window(&self, window_id: i32, params: Vec<String>) {
        self.post(
            ThreadMessage::new(GuiCommand::ActivateWindow)
                .with_param1(window_id)
                .with_strings(params),
        );
    }

    pub fn send_action(&self, action: Action) {
        self.post(ThreadMessage::new(AppCommand::SendAction).with_action(action));
    }

    pub fn send_gui_message(&self, message: GuiMessage) {
        self.post(
            ThreadMessage::new(GuiCommand::GuiMessage).with_owned(OwnedPayload::GuiMessage(message)),
        );
    }

    /// Opens a modal dialog and waits for the value it was closed with.
    pub fn show_dialog(&self, window_id: i32, params: Vec<String>) -> i32 {
        self.send(
            ThreadMessage::new(GuiCommand::DialogOpen)
                .with_param1(window_id)
                .with_strings(params),
        )
    }

    pub fn script_output(&self, text: impl Into<String>) {
        self.post(ThreadMessage::new(GuiCommand::ScriptOutput).with_string(text));
    }

    pub fn quit(&self) {
        self.post(ThreadMessage::new(AppCommand::Quit));
    }

    /// Runs the configured shutdown action.
    pub fn shutdown(&self) {
        self.post(ThreadMessage::new(AppCommand::Shutdown));
    }

    pub fn suspend(&self) {
        self.post(ThreadMessage::new(AppCommand::Suspend));
    }

    pub fn hibernate(&self) {
        self.post(ThreadMessage::new(AppCommand::Hibernate));
    }

    pub fn restart(&self) {
        self.post(ThreadMessage::new(AppCommand::Restart));
    }

    /// Toggles the CEC device state and returns the new state.
    ///
    /// Returns false when no CEC adapter is present.
    pub fn cec_toggle_state(&self) -> bool {
        let slot = ReplySlot::new();
        self.send(ThreadMessage::new(AppCommand::CecToggleState).with_reply(slot.clone()));
        slot.as_bool().unwrap_or(false)
    }

    pub fn execute_builtin(&self, command: impl Into<String>) {
        self.post(ThreadMessage::new(AppCommand::ExecuteBuiltIn).with_string(command));
    }

    pub fn splash_message(&self, text: impl Into<String>) {
        self.post(ThreadMessage::new(AppCommand::SplashMessage).with_string(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{Command, QueueKind};

    #[test]
    fn wrappers_queue_expected_commands() {
        let messenger = ApplicationMessenger::new();
        messenger.quit();
        messenger.playlist_next();
        messenger.script_output("hello");

        assert_eq!(messenger.queue_len(QueueKind::General), 2);
        assert_eq!(messenger.queue_len(QueueKind::Window), 1);
        assert_eq!(Command::from(AppCommand::Quit).code(), 300);
    }
}
