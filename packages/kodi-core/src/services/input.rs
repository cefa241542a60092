//! Input translation: OS events to actions via a key map.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;

use crate::constants::KEYMAP_FILE;
use crate::error::{KodiError, KodiResult};
use crate::gui::{Action, ActionId};

/// Event delivered by the windowing system or a remote.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A key press, by lowercase key name.
    Key(String),
    /// An already translated action (remotes, JSON-RPC).
    Action(Action),
    /// Pointer movement. Counts as user activity only.
    MouseMove { x: i32, y: i32 },
    /// The window system asked the application to quit.
    Quit,
}

const DEFAULT_KEYMAP: &[(&str, ActionId)] = &[
    ("left", ActionId::MoveLeft),
    ("right", ActionId::MoveRight),
    ("up", ActionId::MoveUp),
    ("down", ActionId::MoveDown),
    ("enter", ActionId::SelectItem),
    ("return", ActionId::SelectItem),
    ("escape", ActionId::PreviousMenu),
    ("backspace", ActionId::PreviousMenu),
    ("c", ActionId::ContextMenu),
    ("i", ActionId::ShowInfo),
    ("tab", ActionId::ShowGui),
    ("p", ActionId::Play),
    ("space", ActionId::PlayPause),
    ("x", ActionId::Stop),
    ("period", ActionId::NextItem),
    ("comma", ActionId::PrevItem),
    ("f", ActionId::StepForward),
    ("r", ActionId::StepBack),
    ("pageup", ActionId::BigStepForward),
    ("pagedown", ActionId::BigStepBack),
    ("plus", ActionId::VolumeUp),
    ("minus", ActionId::VolumeDown),
    ("f8", ActionId::Mute),
    ("backslash", ActionId::ToggleFullscreen),
    ("s", ActionId::PowerOff),
];

/// Maps key names to actions.
pub struct InputManager {
    keymap: RwLock<HashMap<String, ActionId>>,
}

impl InputManager {
    pub fn with_defaults() -> Self {
        let keymap = DEFAULT_KEYMAP
            .iter()
            .map(|(key, action)| (key.to_string(), *action))
            .collect();
        Self {
            keymap: RwLock::new(keymap),
        }
    }

    /// Default key map overlaid with the profile's `keymap.json`, if present.
    pub fn load(profile_folder: &Path) -> KodiResult<Self> {
        let manager = Self::with_defaults();
        let path = profile_folder.join(KEYMAP_FILE);
        if path.is_file() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| KodiError::Configuration(format!("{}: {}", path.display(), e)))?;
            let overrides: HashMap<String, ActionId> = serde_json::from_str(&content)
                .map_err(|e| KodiError::Configuration(format!("{}: {}", path.display(), e)))?;
            log::info!(
                "[Input] {} key binding(s) from {}",
                overrides.len(),
                path.display()
            );
            manager.extend(overrides);
        }
        Ok(manager)
    }

    pub fn extend(&self, bindings: HashMap<String, ActionId>) {
        let mut keymap = self.keymap.write();
        for (key, action) in bindings {
            keymap.insert(key.to_ascii_lowercase(), action);
        }
    }

    /// Translates an event. Events that are not actions yield `None`.
    pub fn translate(&self, event: &InputEvent) -> Option<Action> {
        match event {
            InputEvent::Key(key) => {
                let action = self.keymap.read().get(&key.to_ascii_lowercase()).copied();
                if action.is_none() {
                    log::trace!("[Input] Unbound key {}", key);
                }
                action.map(Action::new)
            }
            InputEvent::Action(action) => Some(action.clone()),
            InputEvent::MouseMove { .. } | InputEvent::Quit => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_translate_case_insensitively() {
        let input = InputManager::with_defaults();
        assert_eq!(
            input.translate(&InputEvent::Key("Space".into())),
            Some(Action::new(ActionId::PlayPause))
        );
        assert_eq!(input.translate(&InputEvent::Key("q".into())), None);
        assert_eq!(input.translate(&InputEvent::MouseMove { x: 1, y: 2 }), None);
    }

    #[test]
    fn profile_keymap_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(KEYMAP_FILE),
            r#"{"space": "pause", "q": "stop"}"#,
        )
        .unwrap();
        let input = InputManager::load(dir.path()).unwrap();

        assert_eq!(
            input.translate(&InputEvent::Key("space".into())).map(|a| a.id),
            Some(ActionId::Pause)
        );
        assert_eq!(
            input.translate(&InputEvent::Key("q".into())).map(|a| a.id),
            Some(ActionId::Stop)
        );
    }

    #[test]
    fn malformed_keymap_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(KEYMAP_FILE), "[").unwrap();
        assert!(matches!(
            InputManager::load(dir.path()),
            Err(KodiError::Configuration(_))
        ));
    }
}
