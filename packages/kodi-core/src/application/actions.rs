//! Action handling.

use std::time::Instant;

use super::Application;
use crate::constants::{VOLUME_MAXIMUM, VOLUME_MINIMUM, VOLUME_STEPS};
use crate::gui::{Action, ActionId};
use crate::services::InputEvent;

impl Application {
    /// Handles an action. Returns true if something consumed it.
    ///
    /// Registered listeners see the action first. Playback actions only
    /// apply while something plays; everything not handled here goes to the
    /// active window.
    pub fn on_action(&self, action: &Action) -> bool {
        let listeners = self.action_listeners.read().clone();
        if listeners.iter().any(|listener| listener.on_action(action)) {
            return true;
        }

        if action.id.is_playback_control() && self.is_playing() && self.on_playback_action(action) {
            return true;
        }

        match action.id {
            ActionId::VolumeUp | ActionId::VolumeDown => {
                let step = (VOLUME_MAXIMUM - VOLUME_MINIMUM) / VOLUME_STEPS as f32 * action.amount;
                let delta = if action.id == ActionId::VolumeUp { step } else { -step };
                self.set_volume(self.volume() + delta);
                true
            }
            ActionId::Mute => {
                self.toggle_mute();
                true
            }
            ActionId::ToggleFullscreen => {
                self.gui.windowing.toggle_fullscreen();
                true
            }
            ActionId::PowerOff => {
                self.messenger.shutdown();
                true
            }
            _ => self.gui.window_manager.on_action(action),
        }
    }

    fn on_playback_action(&self, action: &Action) -> bool {
        let (small, big) = {
            let settings = self.settings.read();
            (
                i64::from(settings.playback.seek_step_secs),
                i64::from(settings.playback.big_seek_step_secs),
            )
        };

        match action.id {
            ActionId::PlayPause => self.toggle_pause(),
            ActionId::Pause => self.pause_if_playing(),
            ActionId::Play => self.unpause(),
            ActionId::Stop => self.stop_playing(false),
            ActionId::NextItem | ActionId::PrevItem => {
                let Some(playlist_player) = self
                    .service(|s| &s.playlist_player)
                    .filter(|p| p.current_playlist().is_some())
                else {
                    return false;
                };
                if action.id == ActionId::NextItem {
                    playlist_player.play_next(1, false);
                } else {
                    playlist_player.play_previous();
                }
            }
            ActionId::StepForward => self.seek_relative(small),
            ActionId::StepBack => self.seek_relative(-small),
            ActionId::BigStepForward => self.seek_relative(big),
            ActionId::BigStepBack => self.seek_relative(-big),
            _ => return false,
        }
        true
    }

    /// Handles the OS events queued since the last frame.
    ///
    /// Every event counts as user activity. An event that only woke the
    /// screensaver or display is not translated any further.
    pub(super) fn process_input_events(&self, now: Instant) {
        let events: Vec<InputEvent> = self.pending_events.lock().drain(..).collect();
        if events.is_empty() {
            return;
        }

        let input = self.service(|s| &s.input);
        for event in events {
            if event == InputEvent::Quit {
                self.messenger.quit();
                continue;
            }

            let action = match &event {
                InputEvent::Action(action) => Some(action.clone()),
                _ => input.as_ref().and_then(|input| input.translate(&event)),
            };
            let power_off = action.as_ref().is_some_and(|a| a.id == ActionId::PowerOff);

            self.screensaver.lock().reset_timer(now);
            self.state.lock().shutdown_idle_since = now;
            if self.wake_screensaver(power_off) {
                continue;
            }

            if let Some(action) = action {
                self.on_action(&action);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::fixture;
    use super::*;
    use crate::gui::ActionListener;
    use crate::messaging::QueueKind;
    use crate::settings::Settings;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct Swallow(AtomicU32);

    impl ActionListener for Swallow {
        fn on_action(&self, action: &Action) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            action.id == ActionId::Mute
        }
    }

    #[test]
    fn listeners_see_actions_first() {
        let f = fixture(Settings::default());
        let listener = Arc::new(Swallow(AtomicU32::new(0)));
        f.app.register_action_listener(listener.clone());

        assert!(f.app.on_action(&Action::new(ActionId::Mute)));
        assert!(!f.app.is_muted());
        assert_eq!(listener.0.load(Ordering::SeqCst), 1);

        let as_dyn: Arc<dyn ActionListener> = listener.clone();
        f.app.unregister_action_listener(&as_dyn);
        f.app.on_action(&Action::new(ActionId::Mute));
        assert!(f.app.is_muted());
        assert_eq!(listener.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn volume_steps() {
        let mut settings = Settings::default();
        settings.playback.initial_volume = 0.5;
        let f = fixture(settings);

        f.app.on_action(&Action::new(ActionId::VolumeUp));
        let step = (VOLUME_MAXIMUM - VOLUME_MINIMUM) / VOLUME_STEPS as f32;
        assert!((f.app.volume() - (0.5 + step)).abs() < 1e-6);

        f.app.on_action(&Action::new(ActionId::VolumeDown).with_amount(100.0));
        assert_eq!(f.app.volume(), VOLUME_MINIMUM);
    }

    #[test]
    fn power_off_posts_shutdown() {
        let f = fixture(Settings::default());
        assert!(f.app.on_action(&Action::new(ActionId::PowerOff)));
        assert_eq!(f.messenger.queue_len(QueueKind::General), 1);
    }

    #[test]
    fn playback_actions_without_playback_go_to_window() {
        let f = fixture(Settings::default());
        assert!(!f.app.on_action(&Action::new(ActionId::PlayPause)));
    }

    #[test]
    fn input_wakes_screensaver_without_acting() {
        let f = fixture(Settings::default());
        f.app.activate_screensaver();
        assert!(f.app.is_screensaver_active());

        f.app
            .queue_input_event(InputEvent::Action(Action::new(ActionId::Mute)));
        f.app.process_input_events(Instant::now());

        assert!(!f.app.is_screensaver_active());
        assert!(!f.app.is_muted());
        assert_eq!(f.app.pending_input_events(), 0);
    }

    #[test]
    fn quit_event_posts_quit() {
        let f = fixture(Settings::default());
        f.app.queue_input_event(InputEvent::Quit);
        f.app.process_input_events(Instant::now());
        assert_eq!(f.messenger.queue_len(QueueKind::General), 1);
    }
}
