//! GUI collaborators consumed by the application core.
//!
//! The widget tree and rendering are outside the core; it talks to them
//! through [`WindowManager`], [`DisplayPower`], [`OsScreensaver`],
//! [`WindowingSystem`] and [`SkinLoader`]. Headless implementations let the
//! core run without a display.

mod action;
mod display;
mod headless;
mod skin;

pub use action::{Action, ActionId, ActionListener};
pub use display::{DisplayPower, HeadlessDisplay, OsScreensaver, WindowingSystem};
pub use headless::HeadlessWindowManager;
pub use skin::{DirectorySkinLoader, SkinError, SkinLoader};

use std::sync::Arc;

use crate::messaging::{Command, GuiCommand, MessageTarget, TargetKind, ThreadMessage};

/// Well-known window identifiers.
pub mod window_ids {
    pub const WINDOW_INVALID: i32 = 9999;
    pub const WINDOW_HOME: i32 = 10000;
    pub const WINDOW_PROGRAMS: i32 = 10001;
    pub const WINDOW_PICTURES: i32 = 10002;
    pub const WINDOW_SETTINGS: i32 = 10004;
    pub const WINDOW_VIDEOS: i32 = 10025;
    pub const WINDOW_LOGIN_SCREEN: i32 = 10029;
    pub const WINDOW_MUSIC: i32 = 10502;
    pub const WINDOW_DIALOG_YES_NO: i32 = 10100;
    pub const WINDOW_DIALOG_PROGRESS: i32 = 10101;
    pub const WINDOW_DIALOG_SELECT: i32 = 12000;
    pub const WINDOW_DIALOG_OK: i32 = 12002;
    pub const WINDOW_FULLSCREEN_VIDEO: i32 = 12005;
    pub const WINDOW_VISUALISATION: i32 = 12006;
    pub const WINDOW_SLIDESHOW: i32 = 12007;
    pub const WINDOW_SCREENSAVER: i32 = 12900;

    /// True for identifiers in the dialog ranges.
    pub fn is_dialog(window_id: i32) -> bool {
        (10100..=10199).contains(&window_id) || (12000..=12004).contains(&window_id)
    }

    /// Resolves a window by numeric id or lowercase name.
    pub fn from_name(name: &str) -> Option<i32> {
        if let Ok(id) = name.trim().parse::<i32>() {
            return Some(id);
        }
        let id = match name.trim().to_ascii_lowercase().as_str() {
            "home" => WINDOW_HOME,
            "programs" => WINDOW_PROGRAMS,
            "pictures" => WINDOW_PICTURES,
            "settings" => WINDOW_SETTINGS,
            "videos" => WINDOW_VIDEOS,
            "music" => WINDOW_MUSIC,
            "loginscreen" => WINDOW_LOGIN_SCREEN,
            "yesnodialog" => WINDOW_DIALOG_YES_NO,
            "progressdialog" => WINDOW_DIALOG_PROGRESS,
            "selectdialog" => WINDOW_DIALOG_SELECT,
            "okdialog" => WINDOW_DIALOG_OK,
            "fullscreenvideo" => WINDOW_FULLSCREEN_VIDEO,
            "visualisation" => WINDOW_VISUALISATION,
            "slideshow" => WINDOW_SLIDESHOW,
            "screensaver" => WINDOW_SCREENSAVER,
            _ => return None,
        };
        Some(id)
    }
}

/// Kind of a GUI message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuiMessageKind {
    WindowInit,
    WindowDeinit,
    Refresh,
    Notify,
    PlaybackStarted,
    PlaybackStopped,
    PlaybackEnded,
    PlaylistChanged,
    PlaylistPlayerStopped,
}

/// Message delivered to windows and controls.
#[derive(Debug, Clone, PartialEq)]
pub struct GuiMessage {
    pub kind: GuiMessageKind,
    pub sender_id: i32,
    pub control_id: i32,
    pub param1: i32,
    pub param2: i32,
    pub label: String,
}

impl GuiMessage {
    pub fn new(kind: GuiMessageKind, sender_id: i32, control_id: i32) -> Self {
        Self {
            kind,
            sender_id,
            control_id,
            param1: 0,
            param2: 0,
            label: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Window stack and dialog management.
///
/// Called only on the owning thread.
pub trait WindowManager: Send + Sync {
    fn activate_window(&self, window_id: i32, params: &[String]);

    /// Returns to the window shown before the active one.
    fn previous_window(&self);

    /// Opens a modal dialog and returns the value it closed with.
    fn open_dialog(&self, window_id: i32, params: &[String]) -> i32;

    /// Closes a dialog. Returns false if it was not open.
    fn close_dialog(&self, window_id: i32, force: bool) -> bool;

    fn send_message(&self, message: &GuiMessage) -> bool;

    /// Offers an action to the active window. Returns true if consumed.
    fn on_action(&self, action: &Action) -> bool;

    fn active_window(&self) -> i32;

    fn is_window_active(&self, window_id: i32) -> bool;

    fn has_modal_dialog(&self) -> bool;

    /// Most recently opened dialog still open.
    fn top_dialog(&self) -> Option<i32>;

    fn script_output(&self, text: &str);

    fn show_splash(&self, text: &str);

    fn render(&self);
}

/// Routes window-manager commands from the messenger to a [`WindowManager`].
pub struct WindowManagerTarget {
    window_manager: Arc<dyn WindowManager>,
}

impl WindowManagerTarget {
    pub fn new(window_manager: Arc<dyn WindowManager>) -> Self {
        Self { window_manager }
    }
}

impl MessageTarget for WindowManagerTarget {
    fn target(&self) -> TargetKind {
        TargetKind::WindowManager
    }

    fn on_application_message(&self, message: &mut ThreadMessage) {
        let Command::Gui(command) = message.command else {
            log::warn!("[WindowManager] Unexpected command {}", message.command);
            return;
        };

        match command {
            GuiCommand::DialogOpen => {
                let result = self
                    .window_manager
                    .open_dialog(message.param1, &message.string_params);
                message.set_result(result);
            }
            GuiCommand::ActivateWindow => {
                self.window_manager
                    .activate_window(message.param1, &message.string_params);
            }
            GuiCommand::CloseDialog => {
                let closed = self
                    .window_manager
                    .close_dialog(message.param1, message.param2 != 0);
                message.set_result(i32::from(closed));
            }
            GuiCommand::GuiMessage => match message.take_gui_message() {
                Some(gui_message) => {
                    let handled = self.window_manager.send_message(&gui_message);
                    message.set_result(i32::from(handled));
                }
                None => log::warn!("[WindowManager] GUI message command without a message"),
            },
            GuiCommand::ScriptOutput => {
                self.window_manager.script_output(&message.string_param);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::window_ids::*;
    use super::*;
    use crate::messaging::ApplicationMessenger;

    #[test]
    fn window_names_resolve() {
        assert_eq!(from_name("Home"), Some(WINDOW_HOME));
        assert_eq!(from_name("12005"), Some(WINDOW_FULLSCREEN_VIDEO));
        assert_eq!(from_name("nowhere"), None);
        assert!(is_dialog(WINDOW_DIALOG_OK));
        assert!(!is_dialog(WINDOW_VIDEOS));
    }

    #[test]
    fn target_forwards_gui_commands() {
        let wm = Arc::new(HeadlessWindowManager::new());
        wm.set_dialog_result(WINDOW_DIALOG_YES_NO, 1);
        let target: Arc<dyn MessageTarget> = Arc::new(WindowManagerTarget::new(wm.clone()));
        let messenger = ApplicationMessenger::new();
        messenger.set_owning_thread();
        messenger.register_receiver(&target);

        messenger.activate_window(WINDOW_VIDEOS, vec![]);
        messenger.script_output("line");
        messenger.process_messages();
        messenger.process_window_messages();

        assert_eq!(wm.active_window(), WINDOW_VIDEOS);
        assert_eq!(wm.script_lines(), vec!["line".to_string()]);
        assert_eq!(messenger.show_dialog(WINDOW_DIALOG_YES_NO, vec![]), 1);
    }
}
