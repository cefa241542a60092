//! Input actions and action listeners.

use serde::{Deserialize, Serialize};

/// Identifier of an input action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionId {
    Noop,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    SelectItem,
    PreviousMenu,
    ContextMenu,
    ShowInfo,
    ShowGui,
    Play,
    Pause,
    PlayPause,
    Stop,
    NextItem,
    PrevItem,
    StepForward,
    StepBack,
    BigStepForward,
    BigStepBack,
    VolumeUp,
    VolumeDown,
    Mute,
    ToggleFullscreen,
    PowerOff,
}

impl ActionId {
    /// Actions that only make sense while something is playing.
    pub fn is_playback_control(self) -> bool {
        matches!(
            self,
            Self::Play
                | Self::Pause
                | Self::PlayPause
                | Self::Stop
                | Self::NextItem
                | Self::PrevItem
                | Self::StepForward
                | Self::StepBack
                | Self::BigStepForward
                | Self::BigStepBack
        )
    }
}

/// An action with its analog amount (1.0 for plain key presses).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub amount: f32,
}

impl Action {
    pub fn new(id: ActionId) -> Self {
        Self { id, amount: 1.0 }
    }

    pub fn with_amount(mut self, amount: f32) -> Self {
        self.amount = amount;
        self
    }
}

/// Gets the first look at every action before built-in handling.
///
/// Returning true consumes the action.
pub trait ActionListener: Send + Sync {
    fn on_action(&self, action: &Action) -> bool;
}
