//! Playback control: opening items, pause, seek, volume and end-of-item handling.

use std::path::Path;

use super::{Application, StackState};
use crate::constants::{VOLUME_MAXIMUM, VOLUME_MINIMUM};
use crate::error::{KodiError, KodiResult};
use crate::events::{ApplicationEvent, PlayerEvent};
use crate::gui::window_ids::{WINDOW_FULLSCREEN_VIDEO, WINDOW_VISUALISATION};
use crate::gui::{GuiMessage, GuiMessageKind};
use crate::media::{MediaItem, MediaKind};
use crate::player::stack;
use crate::playlist::formats;
use crate::utils::now_millis;

impl Application {
    /// Plays `item`.
    ///
    /// Items that do not come from the playlist player make it forget its
    /// current playlist. Playlist files are expanded and played from the
    /// start. Stacks play part by part from the part holding the resume
    /// offset.
    pub fn play_file(&self, item: MediaItem, from_playlist: bool) -> KodiResult<()> {
        if !from_playlist {
            if let Some(playlist_player) = self.service(|s| &s.playlist_player) {
                playlist_player.reset();
            }
        }

        if item.is_playlist() {
            return self.play_playlist_file(&item);
        }

        let (to_open, stack_state) = match stack::parse_stack(&item.path) {
            Some(parts) => {
                // Durations beyond the last part are ignored.
                let known = item.part_durations_ms.len().min(parts.len());
                let (part, offset) =
                    stack::resolve_offset(&item.part_durations_ms[..known], item.start_offset_ms);
                let part_item = stack_part(&parts[part], offset);
                let state = StackState {
                    item: item.clone(),
                    parts,
                    current_part: part,
                };
                (part_item, Some(state))
            }
            None => (item.clone(), None),
        };

        let factory = self.require_service("player_core_factory", |s| &s.player_core_factory)?;
        let mut player = factory.create_player_for(&to_open)?;

        // The current item keeps playing if the new one cannot be opened.
        player.open_file(&to_open)?;
        self.close_player();
        let player_name = player.name().to_string();
        let is_video = to_open.is_video();
        *self.player.lock() = Some(player);

        {
            let mut state = self.state.lock();
            state.current_item = Some(item.clone());
            state.stack = stack_state;
            state.end_reported = false;
        }

        log::info!("[Application] Playing {} with {}", item.path, player_name);
        self.emitter.emit_player(PlayerEvent::OnPlay {
            item: item.path.clone(),
            player: player_name,
            timestamp: now_millis(),
        });
        self.gui
            .window_manager
            .send_message(&GuiMessage::new(GuiMessageKind::PlaybackStarted, 0, 0).with_label(&item.path));
        self.wake_screensaver(false);
        self.reset_idle_timers();

        if is_video && self.settings.read().playback.switch_to_fullscreen {
            self.switch_to_fullscreen();
        }
        Ok(())
    }

    fn play_playlist_file(&self, item: &MediaItem) -> KodiResult<()> {
        let items = formats::load_playlist(Path::new(&item.path))?;
        if items.is_empty() {
            return Err(KodiError::Playlist(format!("{} is empty", item.path)));
        }
        let playlist_player = self.require_service("playlist_player", |s| &s.playlist_player)?;
        playlist_player.replace_and_select(items);
        if playlist_player.play(None) {
            Ok(())
        } else {
            Err(KodiError::Player(format!("nothing playable in {}", item.path)))
        }
    }

    fn close_player(&self) {
        if let Some(mut player) = self.player.lock().take() {
            player.close_file();
        }
    }

    /// Stops playback. `ended` is true when the item played to its end.
    pub fn stop_playing(&self, ended: bool) {
        let Some(mut player) = self.player.lock().take() else {
            return;
        };
        player.close_file();
        drop(player);

        let item = {
            let mut state = self.state.lock();
            state.stack = None;
            state.end_reported = false;
            state.current_item.take()
        };
        let path = item.map(|i| i.path).unwrap_or_default();
        log::info!("[Application] Stopped {}", path);
        self.emitter.emit_player(PlayerEvent::OnStop {
            item: path,
            ended,
            timestamp: now_millis(),
        });

        let wm = &self.gui.window_manager;
        wm.send_message(&GuiMessage::new(GuiMessageKind::PlaybackStopped, 0, 0));
        let active = wm.active_window();
        if active == WINDOW_FULLSCREEN_VIDEO || active == WINDOW_VISUALISATION {
            wm.previous_window();
        }
    }

    /// Handles the end of the current item: the next stack part, else the
    /// next playlist entry.
    pub fn on_playback_ended(&self) {
        if self.play_next_stack_part() {
            return;
        }

        let from_playlist = self
            .service(|s| &s.playlist_player)
            .filter(|p| p.current_playlist().is_some());
        self.stop_playing(true);

        match from_playlist {
            Some(playlist_player) => {
                playlist_player.on_playback_ended();
            }
            None => {
                self.gui
                    .window_manager
                    .send_message(&GuiMessage::new(GuiMessageKind::PlaybackEnded, 0, 0));
            }
        }
    }

    fn play_next_stack_part(&self) -> bool {
        let next = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let Some(stack) = state.stack.as_mut() else {
                return false;
            };
            if stack.current_part + 1 >= stack.parts.len() {
                return false;
            }
            stack.current_part += 1;
            state.end_reported = false;
            stack_part(&stack.parts[stack.current_part], 0)
        };

        let mut player = self.player.lock();
        let Some(player) = player.as_mut() else {
            return false;
        };
        player.close_file();
        match player.open_file(&next) {
            Ok(()) => {
                log::info!("[Application] Continuing with stack part {}", next.path);
                true
            }
            Err(e) => {
                log::warn!("[Application] Stack part failed: {}", e);
                false
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.player.lock().as_ref().is_some_and(|p| p.is_playing())
    }

    pub fn is_paused(&self) -> bool {
        self.player.lock().as_ref().is_some_and(|p| p.is_paused())
    }

    pub fn is_playing_video(&self) -> bool {
        self.player
            .lock()
            .as_ref()
            .is_some_and(|p| p.is_playing() && p.has_video())
    }

    pub fn is_playing_audio(&self) -> bool {
        self.player
            .lock()
            .as_ref()
            .is_some_and(|p| p.is_playing() && !p.has_video() && p.has_audio())
    }

    pub fn current_item(&self) -> Option<MediaItem> {
        self.state.lock().current_item.clone()
    }

    /// Index of the playing part of a stacked item.
    pub fn current_stack_part(&self) -> Option<usize> {
        self.state.lock().stack.as_ref().map(|s| s.current_part)
    }

    /// Playback position in milliseconds, counted across stack parts.
    pub fn time_ms(&self) -> u64 {
        let in_part = self.player.lock().as_ref().map_or(0, |p| p.time_ms());
        let state = self.state.lock();
        match state.stack.as_ref() {
            Some(stack) => {
                let before: u64 = stack
                    .item
                    .part_durations_ms
                    .iter()
                    .take(stack.current_part)
                    .sum();
                before + in_part
            }
            None => in_part,
        }
    }

    /// Toggles pause.
    pub fn toggle_pause(&self) {
        let paused = {
            let mut player = self.player.lock();
            let Some(player) = player.as_mut().filter(|p| p.is_playing()) else {
                return;
            };
            player.pause();
            player.is_paused()
        };
        let item = self.current_path();
        let timestamp = now_millis();
        if paused {
            self.emitter.emit_player(PlayerEvent::OnPause { item, timestamp });
        } else {
            self.emitter.emit_player(PlayerEvent::OnResume { item, timestamp });
        }
    }

    pub fn pause_if_playing(&self) {
        if self.is_playing() && !self.is_paused() {
            self.toggle_pause();
        }
    }

    pub fn unpause(&self) {
        if self.is_paused() {
            self.toggle_pause();
        }
    }

    /// Reopens the current item at the current position.
    pub fn restart(&self) -> KodiResult<()> {
        let Some(item) = self.current_item() else {
            return Ok(());
        };
        let position = self.time_ms();
        let from_playlist = self
            .service(|s| &s.playlist_player)
            .is_some_and(|p| p.current_playlist().is_some());
        self.play_file(item.with_start_offset(position), from_playlist)
    }

    /// Seeks to `position_ms` within the current item.
    pub fn seek_time(&self, position_ms: u64) {
        {
            let mut player = self.player.lock();
            let Some(player) = player.as_mut().filter(|p| p.is_playing()) else {
                return;
            };
            player.seek_time(position_ms);
        }
        self.emitter.emit_player(PlayerEvent::OnSeek {
            item: self.current_path(),
            position_ms,
            timestamp: now_millis(),
        });
    }

    /// Seeks by `delta_secs` from the current position.
    pub fn seek_relative(&self, delta_secs: i64) {
        let current = self.player.lock().as_ref().map_or(0, |p| p.time_ms()) as i64;
        let target = (current + delta_secs * 1000).max(0) as u64;
        self.seek_time(target);
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    pub fn is_muted(&self) -> bool {
        self.state.lock().muted
    }

    /// Sets the volume (0.0 - 1.0). Changing the volume unmutes.
    pub fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(VOLUME_MINIMUM, VOLUME_MAXIMUM);
        {
            let mut state = self.state.lock();
            state.volume = volume;
            state.muted = false;
        }
        self.announce_volume();
    }

    pub fn toggle_mute(&self) {
        {
            let mut state = self.state.lock();
            state.muted = !state.muted;
        }
        self.announce_volume();
    }

    fn announce_volume(&self) {
        let (volume, muted) = {
            let state = self.state.lock();
            (state.volume, state.muted)
        };
        self.emitter
            .emit_application(ApplicationEvent::OnVolumeChanged { volume, muted });
    }

    /// Shows the fullscreen video or visualisation window for the current item.
    pub fn switch_to_fullscreen(&self) -> bool {
        let window = if self.is_playing_video() {
            WINDOW_FULLSCREEN_VIDEO
        } else if self.is_playing_audio() {
            WINDOW_VISUALISATION
        } else {
            return false;
        };
        let wm = &self.gui.window_manager;
        if wm.active_window() != window {
            wm.activate_window(window, &[]);
        }
        true
    }

    fn current_path(&self) -> String {
        self.state
            .lock()
            .current_item
            .as_ref()
            .map(|i| i.path.clone())
            .unwrap_or_default()
    }
}

fn stack_part(path: &str, offset_ms: u64) -> MediaItem {
    MediaItem::new(path)
        .with_kind(MediaKind::Video)
        .with_start_offset(offset_ms)
}
