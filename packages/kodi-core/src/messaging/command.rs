//! Closed command space.
//!
//! Every command belongs to exactly one receiver ([`TargetKind`]) and one queue
//! ([`QueueKind`]). Numeric codes keep the historical bands so logs and script
//! bindings stay comparable: 100s script/dialog, 200s media/playlist, 300s
//! power, 400s misc, 500s network.

use std::fmt;

/// Receiver a command is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Application,
    PlaylistPlayer,
    WindowManager,
}

/// Queue a command is appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    /// Drained by the owning loop's `process()` step.
    General,
    /// Drained during the GUI part of the frame.
    Window,
}

/// Numeric band of a command code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandBand {
    ScriptDialog,
    Media,
    Power,
    Misc,
    Network,
}

impl CommandBand {
    /// Band of a numeric code, if it falls inside one.
    pub fn of(code: u32) -> Option<Self> {
        match code / 100 {
            1 => Some(Self::ScriptDialog),
            2 => Some(Self::Media),
            3 => Some(Self::Power),
            4 => Some(Self::Misc),
            5 => Some(Self::Network),
            _ => None,
        }
    }
}

/// Commands handled by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppCommand {
    // script / dialog band
    ExecuteScript,
    ExecuteBuiltIn,
    SendAction,
    SplashMessage,

    // media band
    MediaPlay,
    MediaStop,
    MediaPause,
    MediaUnpause,
    MediaPauseIfPlaying,
    MediaRestart,
    MediaSeekTime,
    PlayFile,
    PlaybackEnded,
    SwitchToFullscreen,
    SetVolume,
    ToggleMute,

    // power band
    Quit,
    Shutdown,
    Powerdown,
    Suspend,
    Hibernate,
    Restart,
    Reset,
    RestartApp,
    InhibitIdleShutdown,
    InhibitScreensaver,
    ActivateScreensaver,
    ResetScreensaver,
    Minimize,
    ToggleFullscreen,

    // misc band
    LoadProfile,
    ReloadSkin,
    StartAndroidActivity,
    CecToggleState,
    CecActivateSource,
    CecStandby,

    // network band
    NetworkMessage,
}

impl AppCommand {
    pub fn code(self) -> u32 {
        match self {
            Self::ExecuteScript => 100,
            Self::ExecuteBuiltIn => 101,
            Self::SendAction => 106,
            Self::SplashMessage => 108,

            Self::MediaPlay => 200,
            Self::MediaStop => 201,
            Self::MediaPause => 202,
            Self::MediaUnpause => 203,
            Self::MediaPauseIfPlaying => 204,
            Self::MediaRestart => 205,
            Self::MediaSeekTime => 206,
            Self::PlayFile => 207,
            Self::PlaybackEnded => 208,
            Self::SwitchToFullscreen => 209,
            Self::SetVolume => 221,
            Self::ToggleMute => 222,

            Self::Quit => 300,
            Self::Shutdown => 301,
            Self::Powerdown => 302,
            Self::Suspend => 303,
            Self::Hibernate => 304,
            Self::Restart => 305,
            Self::Reset => 306,
            Self::RestartApp => 307,
            Self::InhibitIdleShutdown => 308,
            Self::InhibitScreensaver => 309,
            Self::ActivateScreensaver => 310,
            Self::ResetScreensaver => 311,
            Self::Minimize => 312,
            Self::ToggleFullscreen => 313,

            Self::LoadProfile => 400,
            Self::ReloadSkin => 401,
            Self::StartAndroidActivity => 402,
            Self::CecToggleState => 403,
            Self::CecActivateSource => 404,
            Self::CecStandby => 405,

            Self::NetworkMessage => 500,
        }
    }
}

/// Commands handled by the playlist player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaylistCommand {
    Next,
    Previous,
    Play,
    Add,
    Insert,
    Remove,
    Swap,
    Clear,
    Shuffle,
    Repeat,
    GetItems,
}

impl PlaylistCommand {
    pub fn code(self) -> u32 {
        match self {
            Self::Next => 210,
            Self::Previous => 211,
            Self::Play => 212,
            Self::Add => 213,
            Self::Insert => 214,
            Self::Remove => 215,
            Self::Swap => 216,
            Self::Clear => 217,
            Self::Shuffle => 218,
            Self::Repeat => 219,
            Self::GetItems => 220,
        }
    }
}

/// Commands handled by the window manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuiCommand {
    /// Opens a modal dialog and waits for its result.
    DialogOpen,
    ActivateWindow,
    CloseDialog,
    GuiMessage,
    ScriptOutput,
}

impl GuiCommand {
    pub fn code(self) -> u32 {
        match self {
            Self::DialogOpen => 102,
            Self::ActivateWindow => 103,
            Self::CloseDialog => 104,
            Self::GuiMessage => 105,
            Self::ScriptOutput => 107,
        }
    }
}

/// A command carried by a [`ThreadMessage`](super::ThreadMessage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    App(AppCommand),
    Playlist(PlaylistCommand),
    Gui(GuiCommand),
    /// Runs the closure in the message payload on the owning thread.
    Callback,
}

impl Command {
    /// Numeric code within the historical bands.
    pub fn code(self) -> u32 {
        match self {
            Self::App(cmd) => cmd.code(),
            Self::Playlist(cmd) => cmd.code(),
            Self::Gui(cmd) => cmd.code(),
            Self::Callback => 406,
        }
    }

    pub fn band(self) -> CommandBand {
        // every code above is inside 100..600
        CommandBand::of(self.code()).unwrap_or(CommandBand::Misc)
    }

    /// Receiver of the command. Callbacks have none.
    pub fn target(self) -> Option<TargetKind> {
        match self {
            Self::App(_) => Some(TargetKind::Application),
            Self::Playlist(_) => Some(TargetKind::PlaylistPlayer),
            Self::Gui(_) => Some(TargetKind::WindowManager),
            Self::Callback => None,
        }
    }

    pub fn queue(self) -> QueueKind {
        match self {
            Self::Gui(GuiCommand::DialogOpen | GuiCommand::ScriptOutput) => QueueKind::Window,
            _ => QueueKind::General,
        }
    }
}

impl From<AppCommand> for Command {
    fn from(cmd: AppCommand) -> Self {
        Self::App(cmd)
    }
}

impl From<PlaylistCommand> for Command {
    fn from(cmd: PlaylistCommand) -> Self {
        Self::Playlist(cmd)
    }
}

impl From<GuiCommand> for Command {
    fn from(cmd: GuiCommand) -> Self {
        Self::Gui(cmd)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::App(cmd) => write!(f, "{cmd:?}({})", self.code()),
            Self::Playlist(cmd) => write!(f, "Playlist{cmd:?}({})", self.code()),
            Self::Gui(cmd) => write!(f, "{cmd:?}({})", self.code()),
            Self::Callback => write!(f, "Callback({})", self.code()),
        }
    }
}
