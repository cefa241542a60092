use std::collections::HashMap;

use parking_lot::Mutex;

use super::window_ids::{is_dialog, WINDOW_HOME};
use super::{Action, GuiMessage, WindowManager};

#[derive(Default)]
struct HeadlessState {
    history: Vec<i32>,
    dialogs: Vec<i32>,
    dialog_results: HashMap<i32, i32>,
    messages: Vec<GuiMessage>,
    script_lines: Vec<String>,
    splash: Option<String>,
    rendered_frames: u64,
}

/// Window manager without a display.
///
/// Keeps a window history and the set of open dialogs so the application's
/// window-dependent decisions behave as with a real GUI. Modal dialogs close
/// immediately with a preset result.
pub struct HeadlessWindowManager {
    state: Mutex<HeadlessState>,
}

impl HeadlessWindowManager {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HeadlessState {
                history: vec![WINDOW_HOME],
                ..HeadlessState::default()
            }),
        }
    }

    /// Sets the value returned when `window_id` is opened as a modal dialog.
    pub fn set_dialog_result(&self, window_id: i32, result: i32) {
        self.state.lock().dialog_results.insert(window_id, result);
    }

    pub fn open_dialogs(&self) -> Vec<i32> {
        self.state.lock().dialogs.clone()
    }

    pub fn messages(&self) -> Vec<GuiMessage> {
        self.state.lock().messages.clone()
    }

    pub fn script_lines(&self) -> Vec<String> {
        self.state.lock().script_lines.clone()
    }

    pub fn splash_text(&self) -> Option<String> {
        self.state.lock().splash.clone()
    }

    pub fn rendered_frames(&self) -> u64 {
        self.state.lock().rendered_frames
    }
}

impl Default for HeadlessWindowManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowManager for HeadlessWindowManager {
    fn activate_window(&self, window_id: i32, params: &[String]) {
        let mut state = self.state.lock();
        if is_dialog(window_id) {
            if !state.dialogs.contains(&window_id) {
                state.dialogs.push(window_id);
            }
        } else if state.history.last() != Some(&window_id) {
            state.history.push(window_id);
        }
        log::debug!(
            "[WindowManager] Activated window {} (params: {:?})",
            window_id,
            params
        );
    }

    fn previous_window(&self) {
        let mut state = self.state.lock();
        if state.history.len() > 1 {
            state.history.pop();
        }
    }

    fn open_dialog(&self, window_id: i32, params: &[String]) -> i32 {
        let result = self
            .state
            .lock()
            .dialog_results
            .get(&window_id)
            .copied()
            .unwrap_or(0);
        log::debug!(
            "[WindowManager] Modal dialog {} (params: {:?}) closed with {}",
            window_id,
            params,
            result
        );
        result
    }

    fn close_dialog(&self, window_id: i32, _force: bool) -> bool {
        let mut state = self.state.lock();
        let before = state.dialogs.len();
        state.dialogs.retain(|id| *id != window_id);
        before != state.dialogs.len()
    }

    fn send_message(&self, message: &GuiMessage) -> bool {
        self.state.lock().messages.push(message.clone());
        true
    }

    fn on_action(&self, action: &Action) -> bool {
        log::trace!("[WindowManager] Unhandled action {:?}", action.id);
        false
    }

    fn active_window(&self) -> i32 {
        self.state.lock().history.last().copied().unwrap_or(WINDOW_HOME)
    }

    fn is_window_active(&self, window_id: i32) -> bool {
        let state = self.state.lock();
        state.history.last() == Some(&window_id) || state.dialogs.contains(&window_id)
    }

    fn has_modal_dialog(&self) -> bool {
        !self.state.lock().dialogs.is_empty()
    }

    fn top_dialog(&self) -> Option<i32> {
        self.state.lock().dialogs.last().copied()
    }

    fn script_output(&self, text: &str) {
        log::info!("[Script] {}", text);
        self.state.lock().script_lines.push(text.to_string());
    }

    fn show_splash(&self, text: &str) {
        self.state.lock().splash = Some(text.to_string());
    }

    fn render(&self) {
        self.state.lock().rendered_frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gui::window_ids::*;

    #[test]
    fn history_and_dialogs() {
        let wm = HeadlessWindowManager::new();
        assert_eq!(wm.active_window(), WINDOW_HOME);

        wm.activate_window(WINDOW_VIDEOS, &[]);
        wm.activate_window(WINDOW_DIALOG_OK, &[]);
        assert_eq!(wm.active_window(), WINDOW_VIDEOS);
        assert!(wm.has_modal_dialog());
        assert!(wm.is_window_active(WINDOW_DIALOG_OK));

        assert!(wm.close_dialog(WINDOW_DIALOG_OK, false));
        assert!(!wm.close_dialog(WINDOW_DIALOG_OK, false));

        wm.previous_window();
        assert_eq!(wm.active_window(), WINDOW_HOME);
        wm.previous_window();
        assert_eq!(wm.active_window(), WINDOW_HOME);
    }
}
