//! The main loop.

use std::time::{Duration, Instant};

use super::{Application, ExitCode};
use crate::constants::{MAX_FRAME_TIME_MS, PROCESS_SLOW_INTERVAL_MS};
use crate::messaging::{AppCommand, ThreadMessage};

impl Application {
    /// Moves one frame.
    ///
    /// `process_events` handles queued input and watches the player for the
    /// end of the item. `process_gui` opens the external-call window, drains
    /// the window queue, renders and runs the screensaver policy.
    pub fn frame_move(&self, process_events: bool, process_gui: bool) -> Duration {
        let now = Instant::now();
        let frame_time = {
            let mut state = self.state.lock();
            let elapsed = state
                .last_frame
                .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
            state.last_frame = Some(now);
            elapsed.min(Duration::from_millis(MAX_FRAME_TIME_MS))
        };

        if process_events {
            self.process_input_events(now);
            self.check_playback_end();
        }

        if process_gui {
            let video = self.is_rendering_video();
            let mut frame = self.frame_guard.lock();
            if let Some(window) = self.frame_guard.yield_window(&mut frame, video) {
                log::trace!("[Application] External-call window of {:?}", window);
            }
            self.messenger.process_window_messages();
            self.gui.window_manager.render();
            drop(frame);

            self.check_screensaver(now);
        }
        frame_time
    }

    fn is_rendering_video(&self) -> bool {
        self.player
            .lock()
            .as_ref()
            .is_some_and(|p| p.is_playing() && p.has_video() && !p.is_paused())
    }

    /// Reports the end of the current item once.
    fn check_playback_end(&self) {
        let finished = self.player.lock().as_ref().is_some_and(|p| p.is_finished());
        if !finished {
            return;
        }
        let first_report = {
            let mut state = self.state.lock();
            !std::mem::replace(&mut state.end_reported, true)
        };
        if first_report {
            self.messenger
                .post(ThreadMessage::new(AppCommand::PlaybackEnded));
        }
    }

    fn check_screensaver(&self, now: Instant) {
        let settings = self.settings();
        let check = self.idle_check(&settings);
        let request = self.screensaver.lock().check(now, &check);
        self.apply_window_request(request);
    }

    /// Drains the general queue and runs the slow housekeeping when due.
    pub fn process(&self) -> usize {
        let processed = self.messenger.process_messages();

        let now = Instant::now();
        let due = {
            let mut state = self.state.lock();
            let due = state.last_process_slow.map_or(true, |last| {
                now.saturating_duration_since(last) >= Duration::from_millis(PROCESS_SLOW_INTERVAL_MS)
            });
            if due {
                state.last_process_slow = Some(now);
            }
            due
        };
        if due {
            self.process_slow(now);
        }
        processed
    }

    /// Housekeeping that does not need to run every frame.
    pub fn process_slow(&self, now: Instant) {
        self.check_shutdown(now);
    }

    /// Posts `Shutdown` once the system has been idle long enough.
    ///
    /// Playback, a library scan, the inhibit flag or a PVR veto keep the
    /// system busy and restart the idle timer. Returns true if shutdown was
    /// requested.
    pub fn check_shutdown(&self, now: Instant) -> bool {
        let minutes = self.settings.read().power.shutdown_time_minutes;
        if minutes == 0 || self.is_stopping() {
            return false;
        }

        let scanning = self
            .service(|s| &s.library)
            .is_some_and(|library| library.is_scanning());
        let vetoed = self
            .service(|s| &s.pvr)
            .is_some_and(|pvr| !pvr.can_system_powerdown());
        let busy = self.is_playing() || scanning || vetoed;

        let mut state = self.state.lock();
        if busy || state.inhibit_idle_shutdown {
            state.shutdown_idle_since = now;
            return false;
        }
        let idle = now.saturating_duration_since(state.shutdown_idle_since);
        if idle < Duration::from_secs(u64::from(minutes) * 60) {
            return false;
        }
        // restart the timer so a refused shutdown is retried after another full period
        state.shutdown_idle_since = now;
        drop(state);

        log::info!("[Application] Idle for {} minute(s), shutting down", minutes);
        self.messenger.post(ThreadMessage::new(AppCommand::Shutdown));
        true
    }

    /// Runs frames until stopped, or until `max_frames` frames ran.
    ///
    /// Must be called on the messenger's owning thread.
    pub fn run(&self, max_frames: Option<u64>) -> ExitCode {
        log::info!("[Application] Main loop started");
        let mut frames = 0u64;
        while !self.is_stopping() {
            if max_frames.is_some_and(|max| frames >= max) {
                break;
            }
            self.frame_move(true, true);
            self.process();
            frames += 1;

            let interval = self.settings.read().frame.interval_ms;
            if interval > 0 && !self.is_stopping() {
                std::thread::sleep(Duration::from_millis(interval));
            }
        }
        log::info!("[Application] Main loop exited after {} frame(s)", frames);
        self.exit_code()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::fixture;
    use super::*;
    use crate::messaging::QueueKind;
    use crate::settings::Settings;

    fn with_idle_shutdown(minutes: u32) -> Settings {
        let mut settings = Settings::default();
        settings.power.shutdown_time_minutes = minutes;
        settings.frame.interval_ms = 0;
        settings
    }

    #[test]
    fn idle_shutdown_fires_after_timeout() {
        let f = fixture(with_idle_shutdown(1));
        let start = Instant::now();
        f.app.reset_idle_timers();

        assert!(!f.app.check_shutdown(start));
        assert!(f.app.check_shutdown(start + Duration::from_secs(61)));
        assert_eq!(f.messenger.queue_len(QueueKind::General), 1);
    }

    #[test]
    fn inhibited_idle_shutdown_resets_timer() {
        let f = fixture(with_idle_shutdown(1));
        let start = Instant::now();
        f.app.set_inhibit_idle_shutdown(true);
        assert!(!f.app.check_shutdown(start + Duration::from_secs(120)));

        f.app.set_inhibit_idle_shutdown(false);
        assert!(!f.app.check_shutdown(start + Duration::from_secs(150)));
        assert!(f.app.check_shutdown(start + Duration::from_secs(181)));
    }

    #[test]
    fn disabled_idle_shutdown_never_fires() {
        let f = fixture(with_idle_shutdown(0));
        assert!(!f.app.check_shutdown(Instant::now() + Duration::from_secs(3600)));
    }

    #[test]
    fn run_honours_frame_limit_and_quit() {
        let f = fixture(with_idle_shutdown(0));
        assert_eq!(f.app.run(Some(3)), ExitCode::Quit);
        assert!(f.window_manager.rendered_frames() >= 3);

        f.messenger.post(ThreadMessage::new(AppCommand::Powerdown));
        f.messenger.quit();
        assert_eq!(f.app.run(None), ExitCode::Quit);
        assert!(f.app.is_stopping());
    }

    #[test]
    fn window_messages_drain_during_frame() {
        let f = fixture(with_idle_shutdown(0));
        f.messenger.script_output("hello");
        f.app.frame_move(false, true);
        assert_eq!(f.window_manager.script_lines(), vec!["hello".to_string()]);
        assert_eq!(f.messenger.queue_len(QueueKind::Window), 0);
    }
}
