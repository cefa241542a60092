//! Built-in commands: `Name` or `Name(arg1, arg2)`, names case-insensitive.

use std::path::PathBuf;

use super::Application;
use crate::error::{KodiError, KodiResult};
use crate::gui::window_ids;
use crate::gui::ActionId;
use crate::media::MediaItem;
use crate::messaging::{AppCommand, ThreadMessage};
use crate::playlist::RepeatMode;
use crate::utils::parse_xml_bool;

/// A parsed built-in command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltIn {
    /// Lowercase command name.
    pub name: String,
    pub args: Vec<String>,
}

/// Splits `Name(a, "b, c")` into its lowercase name and arguments.
///
/// Double quotes group an argument containing commas. Returns `None` for an
/// empty name or unbalanced parentheses.
pub fn parse_builtin(command: &str) -> Option<BuiltIn> {
    let command = command.trim();
    let (name, rest) = match command.find('(') {
        Some(open) => {
            let inner = command[open + 1..].strip_suffix(')')?;
            (&command[..open], Some(inner))
        }
        None => (command, None),
    };
    let name = name.trim();
    if name.is_empty() || name.contains(')') {
        return None;
    }

    let mut args = Vec::new();
    if let Some(inner) = rest.filter(|inner| !inner.trim().is_empty()) {
        let mut current = String::new();
        let mut quoted = false;
        for c in inner.chars() {
            match c {
                '"' => quoted = !quoted,
                ',' if !quoted => args.push(std::mem::take(&mut current).trim().to_string()),
                _ => current.push(c),
            }
        }
        args.push(current.trim().to_string());
    }

    Some(BuiltIn {
        name: name.to_ascii_lowercase(),
        args,
    })
}

fn flag(args: &[String]) -> Option<bool> {
    match args.first() {
        None => Some(true),
        Some(value) => parse_xml_bool(value),
    }
}

impl Application {
    /// Runs a built-in command on the owning thread.
    pub fn execute_builtin(&self, command: &str) -> KodiResult<()> {
        let builtin = parse_builtin(command)
            .ok_or_else(|| KodiError::Script(format!("malformed built-in {:?}", command)))?;
        log::debug!("[Application] Built-in {} {:?}", builtin.name, builtin.args);
        let args = builtin.args.as_slice();
        let post = |cmd: AppCommand| self.messenger.post(ThreadMessage::new(cmd));

        match builtin.name.as_str() {
            "quit" => post(AppCommand::Quit),
            "shutdown" => post(AppCommand::Shutdown),
            "powerdown" => post(AppCommand::Powerdown),
            "suspend" => post(AppCommand::Suspend),
            "hibernate" => post(AppCommand::Hibernate),
            "reboot" | "restart" => post(AppCommand::Restart),
            "restartapp" => post(AppCommand::RestartApp),
            "minimize" => post(AppCommand::Minimize),
            "togglefullscreen" => post(AppCommand::ToggleFullscreen),
            "activatescreensaver" => self.activate_screensaver(),
            "toggledpms" => {
                self.toggle_dpms(true);
            }
            "inhibitidleshutdown" => {
                let inhibit = flag(args).ok_or_else(|| bad_args(&builtin))?;
                self.set_inhibit_idle_shutdown(inhibit);
            }
            "inhibitscreensaver" => {
                let inhibit = flag(args).ok_or_else(|| bad_args(&builtin))?;
                self.set_inhibit_screensaver(inhibit);
            }
            "reloadskin" => self.reload_skin()?,
            "activatewindow" => {
                let (window, params) = args.split_first().ok_or_else(|| bad_args(&builtin))?;
                let window_id = window_ids::from_name(window)
                    .ok_or_else(|| KodiError::Script(format!("unknown window {}", window)))?;
                self.gui.window_manager.activate_window(window_id, params);
            }
            "dialog.close" => {
                let window = args.first().ok_or_else(|| bad_args(&builtin))?;
                let force = args.get(1).and_then(|v| parse_xml_bool(v)).unwrap_or(false);
                if window.eq_ignore_ascii_case("all") {
                    while let Some(top) = self.gui.window_manager.top_dialog() {
                        if !self.gui.window_manager.close_dialog(top, force) {
                            break;
                        }
                    }
                } else {
                    let window_id = window_ids::from_name(window)
                        .ok_or_else(|| KodiError::Script(format!("unknown window {}", window)))?;
                    self.gui.window_manager.close_dialog(window_id, force);
                }
            }
            "playmedia" => {
                let path = args.first().ok_or_else(|| bad_args(&builtin))?;
                self.messenger.media_play(MediaItem::new(path.as_str()));
            }
            "playercontrol" => {
                let control = args.first().ok_or_else(|| bad_args(&builtin))?;
                self.player_control(control)?;
            }
            "setvolume" => {
                let percent: f32 = args
                    .first()
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| bad_args(&builtin))?;
                self.set_volume(percent / 100.0);
            }
            "mute" => self.toggle_mute(),
            "runscript" => {
                let (script, script_args) =
                    args.split_first().ok_or_else(|| bad_args(&builtin))?;
                let scripts = self.require_service("scripts", |s| &s.scripts)?;
                scripts.execute(script, script_args.to_vec())?;
            }
            "cectogglestate" => post(AppCommand::CecToggleState),
            "cecactivatesource" => post(AppCommand::CecActivateSource),
            "cecstandby" => post(AppCommand::CecStandby),
            "loadprofile" => {
                let name = args.first().ok_or_else(|| bad_args(&builtin))?;
                let profiles = self.require_service("profiles", |s| &s.profiles)?;
                let index = profiles
                    .find(name)
                    .ok_or_else(|| KodiError::Profile(format!("no profile named {}", name)))?;
                self.messenger
                    .post(ThreadMessage::new(AppCommand::LoadProfile).with_param1(index as i32));
            }
            "updatelibrary" => {
                let library = self.require_service("library", |s| &s.library)?;
                let sources = args.iter().skip(1).map(PathBuf::from).collect();
                library.start_scan(sources)?;
            }
            _ => {
                return Err(KodiError::Script(format!(
                    "unknown built-in {}",
                    builtin.name
                )))
            }
        }
        Ok(())
    }

    fn player_control(&self, control: &str) -> KodiResult<()> {
        let control = control.to_ascii_lowercase();
        let playlist_player = self.service(|s| &s.playlist_player);
        let current = playlist_player
            .as_ref()
            .and_then(|p| p.current_playlist().map(|id| (p, id)));

        match control.as_str() {
            "play" => {
                self.on_action(&crate::gui::Action::new(ActionId::PlayPause));
            }
            "stop" => self.stop_playing(false),
            "next" => self.messenger.playlist_next(),
            "previous" => self.messenger.playlist_previous(),
            "random" => {
                if let Some((player, id)) = current {
                    player.set_shuffle(id, !player.is_shuffled(id));
                }
            }
            "repeatall" | "repeatone" | "repeatoff" => {
                let mode = match control.as_str() {
                    "repeatall" => RepeatMode::All,
                    "repeatone" => RepeatMode::One,
                    _ => RepeatMode::Off,
                };
                if let Some((player, id)) = current {
                    player.set_repeat(id, mode);
                }
            }
            other => return Err(KodiError::Script(format!("unknown player control {}", other))),
        }
        Ok(())
    }
}

fn bad_args(builtin: &BuiltIn) -> KodiError {
    KodiError::Script(format!(
        "invalid arguments for {}: {:?}",
        builtin.name, builtin.args
    ))
}
