//! Application command dispatch.

use super::{Application, ExitCode};
use crate::events::SystemEvent;
use crate::messaging::{
    AppCommand, Command, MessageTarget, ReplyValue, TargetKind, ThreadMessage,
};
use crate::services::NetworkMessage;
use crate::settings::ShutdownState;

impl MessageTarget for Application {
    fn target(&self) -> TargetKind {
        TargetKind::Application
    }

    fn on_application_message(&self, message: &mut ThreadMessage) {
        let Command::App(command) = message.command else {
            log::warn!("[Application] Unexpected command {}", message.command);
            return;
        };
        log::trace!("[Application] Handling {}", message.command);

        match command {
            AppCommand::Quit
            | AppCommand::Shutdown
            | AppCommand::Powerdown
            | AppCommand::Suspend
            | AppCommand::Hibernate
            | AppCommand::Restart
            | AppCommand::Reset
            | AppCommand::RestartApp
            | AppCommand::InhibitIdleShutdown
            | AppCommand::InhibitScreensaver
            | AppCommand::ActivateScreensaver
            | AppCommand::ResetScreensaver
            | AppCommand::Minimize
            | AppCommand::ToggleFullscreen => self.handle_power(command, message),

            AppCommand::MediaPlay
            | AppCommand::MediaStop
            | AppCommand::MediaPause
            | AppCommand::MediaUnpause
            | AppCommand::MediaPauseIfPlaying
            | AppCommand::MediaRestart
            | AppCommand::MediaSeekTime
            | AppCommand::PlayFile
            | AppCommand::PlaybackEnded
            | AppCommand::SwitchToFullscreen
            | AppCommand::SetVolume
            | AppCommand::ToggleMute => self.handle_media(command, message),

            AppCommand::ExecuteScript
            | AppCommand::ExecuteBuiltIn
            | AppCommand::SendAction
            | AppCommand::SplashMessage
            | AppCommand::LoadProfile
            | AppCommand::ReloadSkin
            | AppCommand::StartAndroidActivity
            | AppCommand::CecToggleState
            | AppCommand::CecActivateSource
            | AppCommand::CecStandby
            | AppCommand::NetworkMessage => self.handle_misc(command, message),
        }
    }
}

impl Application {
    /// True unless the PVR manager vetoes powering the system down.
    fn power_allowed(&self, command: AppCommand) -> bool {
        let allowed = self
            .service(|s| &s.pvr)
            .map_or(true, |pvr| pvr.can_system_powerdown());
        if !allowed {
            log::debug!("[Application] {:?} vetoed by PVR", command);
        }
        allowed
    }

    fn handle_power(&self, command: AppCommand, message: &mut ThreadMessage) {
        let power = self.service(|s| &s.power);

        match command {
            AppCommand::Quit => self.stop(ExitCode::Quit),
            AppCommand::Shutdown => {
                let next = match self.settings.read().power.shutdown_state {
                    ShutdownState::Quit => AppCommand::Quit,
                    ShutdownState::Powerdown => AppCommand::Powerdown,
                    ShutdownState::Suspend => AppCommand::Suspend,
                    ShutdownState::Hibernate => AppCommand::Hibernate,
                    ShutdownState::Minimize => AppCommand::Minimize,
                };
                self.messenger.post(ThreadMessage::new(next));
            }
            AppCommand::Powerdown => {
                if self.power_allowed(command) && power.is_some_and(|p| p.powerdown()) {
                    self.stop(ExitCode::Powerdown);
                }
            }
            AppCommand::Suspend | AppCommand::Hibernate => {
                if !self.power_allowed(command) {
                    return;
                }
                let Some(power) = power else { return };
                self.emitter.emit_system(SystemEvent::OnSleep);
                let done = if command == AppCommand::Suspend {
                    power.suspend()
                } else {
                    power.hibernate()
                };
                if !done {
                    log::warn!("[Application] {:?} refused by the power backend", command);
                }
            }
            AppCommand::Restart => {
                if self.power_allowed(command) && power.as_ref().is_some_and(|p| p.can_reboot()) {
                    self.emitter.emit_system(SystemEvent::OnRestart);
                    self.stop(ExitCode::Reboot);
                    if let Some(power) = power {
                        power.reboot();
                    }
                }
            }
            AppCommand::Reset => {
                self.stop(ExitCode::Reboot);
                if let Some(power) = power {
                    power.reboot();
                }
            }
            AppCommand::RestartApp => self.stop(ExitCode::RestartApp),
            AppCommand::InhibitIdleShutdown => self.set_inhibit_idle_shutdown(message.param1 != 0),
            AppCommand::InhibitScreensaver => self.set_inhibit_screensaver(message.param1 != 0),
            AppCommand::ActivateScreensaver => self.activate_screensaver(),
            AppCommand::ResetScreensaver => self.reset_idle_timers(),
            AppCommand::Minimize => self.gui.windowing.minimize(),
            AppCommand::ToggleFullscreen => {
                let fullscreen = self.gui.windowing.toggle_fullscreen();
                message.set_result(i32::from(fullscreen));
            }
            _ => {}
        }
    }

    fn handle_media(&self, command: AppCommand, message: &mut ThreadMessage) {
        match command {
            AppCommand::MediaPlay => {
                let played = self.media_play(message);
                message.set_result(i32::from(played));
            }
            AppCommand::PlayFile => {
                let Some(item) = message.take_item() else {
                    log::warn!("[Application] PlayFile without an item");
                    message.set_result(0);
                    return;
                };
                let path = item.path.clone();
                match self.play_file(item, message.param2 == 1) {
                    Ok(()) => message.set_result(1),
                    Err(e) => {
                        log::warn!("[Application] Failed to play {}: {}", path, e);
                        message.set_result(0);
                    }
                }
            }
            AppCommand::MediaStop => self.stop_playing(false),
            AppCommand::MediaPause => self.toggle_pause(),
            AppCommand::MediaUnpause => self.unpause(),
            AppCommand::MediaPauseIfPlaying => self.pause_if_playing(),
            AppCommand::MediaRestart => {
                if let Err(e) = self.restart() {
                    log::warn!("[Application] Restart failed: {}", e);
                }
            }
            AppCommand::MediaSeekTime => self.seek_time(message.param1.max(0) as u64),
            AppCommand::PlaybackEnded => self.on_playback_ended(),
            AppCommand::SwitchToFullscreen => {
                let switched = self.switch_to_fullscreen();
                message.set_result(i32::from(switched));
            }
            AppCommand::SetVolume => self.set_volume(message.param1 as f32 / 100.0),
            AppCommand::ToggleMute => self.toggle_mute(),
            _ => {}
        }
    }

    /// Plays an item list, a single item, or the current playlist.
    fn media_play(&self, message: &mut ThreadMessage) -> bool {
        let index = usize::try_from(message.param1).ok();

        if let Some(items) = message.take_items() {
            let Some(playlist_player) = self.service(|s| &s.playlist_player) else {
                return false;
            };
            if items.is_empty() {
                return false;
            }
            playlist_player.replace_and_select(items);
            return playlist_player.play(index);
        }

        if let Some(item) = message.take_item() {
            return match self.play_file(item, false) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("[Application] MediaPlay failed: {}", e);
                    false
                }
            };
        }

        self.service(|s| &s.playlist_player)
            .is_some_and(|p| p.play(index))
    }

    fn handle_misc(&self, command: AppCommand, message: &mut ThreadMessage) {
        match command {
            AppCommand::ExecuteScript => {
                let result = self
                    .require_service("scripts", |s| &s.scripts)
                    .and_then(|scripts| {
                        scripts.execute(&message.string_param, message.string_params.clone())
                    });
                match result {
                    Ok(_) => message.set_result(1),
                    Err(e) => {
                        log::warn!("[Application] {}", e);
                        message.set_result(0);
                    }
                }
            }
            AppCommand::ExecuteBuiltIn => match self.execute_builtin(&message.string_param) {
                Ok(()) => message.set_result(1),
                Err(e) => {
                    log::warn!("[Application] {}", e);
                    message.set_result(0);
                }
            },
            AppCommand::SendAction => {
                let handled = message
                    .take_action()
                    .is_some_and(|action| self.on_action(&action));
                message.set_result(i32::from(handled));
            }
            AppCommand::SplashMessage => self.gui.window_manager.show_splash(&message.string_param),
            AppCommand::LoadProfile => self.load_profile(message.param1),
            AppCommand::ReloadSkin => {
                if let Err(e) = self.reload_skin() {
                    log::error!("[Application] {}", e);
                }
            }
            AppCommand::StartAndroidActivity => {
                log::warn!(
                    "[Application] Android activities are not supported ({})",
                    message.string_param
                );
            }
            AppCommand::CecToggleState => {
                if let Some(cec) = self.service(|s| &s.peripherals).and_then(|p| p.cec()) {
                    let on = cec.toggle_device_state();
                    if let Some(reply) = message.reply() {
                        reply.set(ReplyValue::Bool(on));
                    }
                    message.set_result(i32::from(on));
                }
            }
            AppCommand::CecActivateSource => {
                if let Some(cec) = self.service(|s| &s.peripherals).and_then(|p| p.cec()) {
                    cec.activate_source();
                }
            }
            AppCommand::CecStandby => {
                if let Some(cec) = self.service(|s| &s.peripherals).and_then(|p| p.cec()) {
                    cec.standby();
                }
            }
            AppCommand::NetworkMessage => match NetworkMessage::from_param(message.param1) {
                Some(request) => {
                    if let Some(network) = self.service(|s| &s.network) {
                        network.handle_message(request);
                    }
                }
                None => log::warn!("[Application] Unknown network message {}", message.param1),
            },
            _ => {}
        }
    }

    fn load_profile(&self, index: i32) {
        let Some(profiles) = self.service(|s| &s.profiles) else {
            return;
        };
        let Ok(index) = usize::try_from(index) else {
            log::warn!("[Application] Invalid profile index {}", index);
            return;
        };
        match profiles.load_profile(index) {
            Ok(profile) => {
                log::info!("[Application] Switched to profile {}", profile.name);
                if let Err(e) = self.reload_skin() {
                    log::error!("[Application] {}", e);
                }
            }
            Err(e) => log::warn!("[Application] {}", e),
        }
    }
}
