//! Screensaver and display power (DPMS) arbitration.
//!
//! Display power saving has priority over the screensaver: when both timers
//! have elapsed only DPMS engages, and engaging it dismisses a running
//! screensaver. Input wakes both, except DPMS that was switched on manually.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::constants::{SCREENSAVER_BLACK, SCREENSAVER_DIM};
use crate::events::{EventEmitter, GuiEvent};
use crate::gui::{DisplayPower, OsScreensaver};
use crate::settings::ScreensaverSettings;

/// Window change the application should make after a screensaver transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRequest {
    ShowScreensaver,
    ShowVisualisation,
    CloseScreensaver,
}

/// Inputs of one idle check, gathered by the application each frame.
#[derive(Debug, Clone, Copy)]
pub struct IdleCheck<'a> {
    /// Something keeps the user engaged (unpaused video, inhibit flag).
    pub have_idle_activity: bool,
    pub settings: &'a ScreensaverSettings,
    /// Idle minutes before DPMS engages (0 disables it).
    pub dpms_minutes: u32,
    pub audio_playing: bool,
    /// Use the dim screensaver regardless of the configured mode.
    pub force_dim: bool,
}

/// Outcome of a wake request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WakeResult {
    /// The triggering input only woke the display and should not be acted on.
    pub consumed: bool,
    pub window: Option<WindowRequest>,
}

pub struct ScreensaverController {
    display: Arc<dyn DisplayPower>,
    os_screensaver: Arc<dyn OsScreensaver>,
    emitter: Arc<dyn EventEmitter>,
    idle_since: Instant,
    screensaver_active: bool,
    active_mode: Option<String>,
    dpms_active: bool,
    dpms_manual: bool,
    os_inhibited: bool,
}

fn opens_window(mode: &str) -> bool {
    !(mode.is_empty() || mode == SCREENSAVER_DIM || mode == SCREENSAVER_BLACK)
}

fn minutes(value: u32) -> Duration {
    Duration::from_secs(u64::from(value) * 60)
}

impl ScreensaverController {
    pub fn new(
        display: Arc<dyn DisplayPower>,
        os_screensaver: Arc<dyn OsScreensaver>,
        emitter: Arc<dyn EventEmitter>,
        now: Instant,
    ) -> Self {
        Self {
            display,
            os_screensaver,
            emitter,
            idle_since: now,
            screensaver_active: false,
            active_mode: None,
            dpms_active: false,
            dpms_manual: false,
            os_inhibited: false,
        }
    }

    pub fn is_screensaver_active(&self) -> bool {
        self.screensaver_active
    }

    /// Mode of the running screensaver.
    pub fn active_mode(&self) -> Option<&str> {
        self.active_mode.as_deref()
    }

    pub fn is_dpms_active(&self) -> bool {
        self.dpms_active
    }

    pub fn is_dpms_manual(&self) -> bool {
        self.dpms_manual
    }

    pub fn idle_since(&self) -> Instant {
        self.idle_since
    }

    pub fn idle_elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.idle_since)
    }

    pub fn reset_timer(&mut self, now: Instant) {
        self.idle_since = now;
    }

    /// Runs the per-frame idle policy.
    pub fn check(&mut self, now: Instant, check: &IdleCheck<'_>) -> Option<WindowRequest> {
        if check.have_idle_activity != self.os_inhibited {
            if check.have_idle_activity {
                self.os_screensaver.inhibit();
            } else {
                self.os_screensaver.uninhibit();
            }
            self.os_inhibited = check.have_idle_activity;
        }

        if check.have_idle_activity {
            self.idle_since = now;
            if self.screensaver_active {
                return self.wake_screensaver(false);
            }
            return None;
        }

        let elapsed = self.idle_elapsed(now);
        let maybe_dpms =
            !self.dpms_active && check.dpms_minutes > 0 && self.display.is_supported();
        let maybe_screensaver = !self.screensaver_active && check.settings.time_minutes > 0;

        if maybe_dpms && elapsed >= minutes(check.dpms_minutes) {
            self.toggle_dpms(false);
            if self.screensaver_active {
                return self.wake_screensaver(false);
            }
            return None;
        }
        if maybe_screensaver && elapsed >= minutes(check.settings.time_minutes) {
            return self.activate(now, check);
        }
        None
    }

    /// Starts the screensaver now.
    ///
    /// While audio plays with the visualisation preferred, the visualisation
    /// is shown instead and the screensaver stays inactive.
    pub fn activate(&mut self, now: Instant, check: &IdleCheck<'_>) -> Option<WindowRequest> {
        if check.audio_playing && check.settings.use_music_visualisation {
            self.idle_since = now;
            log::debug!("[Screensaver] Showing visualisation instead");
            return Some(WindowRequest::ShowVisualisation);
        }

        let mode = if check.force_dim {
            SCREENSAVER_DIM.to_string()
        } else {
            check.settings.mode.clone()
        };
        log::info!("[Screensaver] Activated ({})", mode);
        self.screensaver_active = true;
        let request = opens_window(&mode).then_some(WindowRequest::ShowScreensaver);
        self.active_mode = Some(mode);
        self.emitter.emit_gui(GuiEvent::OnScreensaverActivated);
        request
    }

    /// Wakes DPMS and the screensaver after user input.
    pub fn wake(&mut self, now: Instant, power_off_key: bool) -> WakeResult {
        if self.dpms_manual {
            return WakeResult::default();
        }

        if self.dpms_active && self.toggle_dpms(false) {
            self.idle_since = now;
            if !self.screensaver_active {
                return WakeResult {
                    consumed: true,
                    window: None,
                };
            }
        }

        if self.screensaver_active {
            return WakeResult {
                consumed: true,
                window: self.wake_screensaver(power_off_key),
            };
        }
        WakeResult::default()
    }

    /// Switches display power saving.
    ///
    /// Automatic requests never switch off power saving that was turned on
    /// manually. Returns false if the display refused or nothing changed.
    pub fn toggle_dpms(&mut self, manual: bool) -> bool {
        if !manual && self.dpms_manual {
            return false;
        }
        if self.dpms_active {
            if !self.display.disable_power_saving() {
                return false;
            }
            self.dpms_active = false;
            self.dpms_manual = false;
            log::info!("[Screensaver] DPMS off");
            self.emitter.emit_gui(GuiEvent::OnDpmsDeactivated);
        } else {
            if !self.display.enable_power_saving() {
                return false;
            }
            self.dpms_active = true;
            self.dpms_manual = manual;
            log::info!("[Screensaver] DPMS on{}", if manual { " (manual)" } else { "" });
            self.emitter.emit_gui(GuiEvent::OnDpmsActivated);
        }
        true
    }

    fn wake_screensaver(&mut self, power_off_key: bool) -> Option<WindowRequest> {
        self.screensaver_active = false;
        let mode = self.active_mode.take().unwrap_or_default();
        log::info!("[Screensaver] Deactivated");
        self.emitter.emit_gui(GuiEvent::OnScreensaverDeactivated {
            shutting_down: power_off_key,
        });
        opens_window(&mode).then_some(WindowRequest::CloseScreensaver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ApplicationEvent, LifecycleEvent, PlayerEvent, SystemEvent};
    use crate::gui::HeadlessDisplay;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct GuiRecorder(Mutex<Vec<GuiEvent>>);

    impl EventEmitter for GuiRecorder {
        fn emit_player(&self, _event: PlayerEvent) {}
        fn emit_gui(&self, event: GuiEvent) {
            self.0.lock().push(event);
        }
        fn emit_system(&self, _event: SystemEvent) {}
        fn emit_application(&self, _event: ApplicationEvent) {}
        fn emit_lifecycle(&self, _event: LifecycleEvent) {}
    }

    fn settings(mode: &str, time_minutes: u32) -> ScreensaverSettings {
        ScreensaverSettings {
            mode: mode.to_string(),
            time_minutes,
            ..ScreensaverSettings::default()
        }
    }

    fn idle<'a>(settings: &'a ScreensaverSettings, dpms_minutes: u32) -> IdleCheck<'a> {
        IdleCheck {
            have_idle_activity: false,
            settings,
            dpms_minutes,
            audio_playing: false,
            force_dim: false,
        }
    }

    fn controller(
        dpms: bool,
        start: Instant,
    ) -> (ScreensaverController, Arc<HeadlessDisplay>, Arc<GuiRecorder>) {
        let display = Arc::new(HeadlessDisplay::new(dpms));
        let recorder = Arc::new(GuiRecorder::default());
        let controller =
            ScreensaverController::new(display.clone(), display.clone(), recorder.clone(), start);
        (controller, display, recorder)
    }

    #[test]
    fn screensaver_starts_after_timeout() {
        let start = Instant::now();
        let (mut ss, _display, recorder) = controller(false, start);
        let settings = settings("screensaver.rsxs.solarwinds", 3);

        assert_eq!(ss.check(start + minutes(2), &idle(&settings, 0)), None);
        assert_eq!(
            ss.check(start + minutes(3), &idle(&settings, 0)),
            Some(WindowRequest::ShowScreensaver)
        );
        assert!(ss.is_screensaver_active());
        assert_eq!(*recorder.0.lock(), vec![GuiEvent::OnScreensaverActivated]);

        // no second activation while active
        assert_eq!(ss.check(start + minutes(4), &idle(&settings, 0)), None);
    }

    #[test]
    fn dim_and_black_do_not_open_a_window() {
        let start = Instant::now();
        for mode in [SCREENSAVER_DIM, SCREENSAVER_BLACK, ""] {
            let (mut ss, _display, _recorder) = controller(false, start);
            let settings = settings(mode, 1);
            assert_eq!(ss.check(start + minutes(1), &idle(&settings, 0)), None);
            assert!(ss.is_screensaver_active());
        }
    }

    #[test]
    fn dpms_has_priority_and_wakes_screensaver() {
        let start = Instant::now();
        let (mut ss, display, recorder) = controller(true, start);
        let settings = settings("screensaver.rsxs.solarwinds", 1);

        ss.check(start + minutes(1), &idle(&settings, 2));
        assert!(ss.is_screensaver_active());

        assert_eq!(
            ss.check(start + minutes(2), &idle(&settings, 2)),
            Some(WindowRequest::CloseScreensaver)
        );
        assert!(ss.is_dpms_active());
        assert!(!ss.is_screensaver_active());
        assert!(display.is_power_saving());
        assert_eq!(
            *recorder.0.lock(),
            vec![
                GuiEvent::OnScreensaverActivated,
                GuiEvent::OnDpmsActivated,
                GuiEvent::OnScreensaverDeactivated {
                    shutting_down: false
                },
            ]
        );
    }

    #[test]
    fn idle_activity_resets_the_timer() {
        let start = Instant::now();
        let (mut ss, display, _recorder) = controller(false, start);
        let settings = settings(SCREENSAVER_DIM, 3);
        let mut busy = idle(&settings, 0);
        busy.have_idle_activity = true;

        let later = start + minutes(5);
        assert_eq!(ss.check(later, &busy), None);
        assert_eq!(ss.idle_since(), later);
        assert!(display.is_inhibited());
        assert!(!ss.is_screensaver_active());

        ss.check(later + minutes(1), &idle(&settings, 0));
        assert!(!display.is_inhibited());
        assert!(!ss.is_screensaver_active());
    }

    #[test]
    fn idle_activity_wakes_active_screensaver() {
        let start = Instant::now();
        let (mut ss, _display, _recorder) = controller(false, start);
        let settings = settings("screensaver.rsxs.solarwinds", 1);
        ss.check(start + minutes(1), &idle(&settings, 0));

        let mut busy = idle(&settings, 0);
        busy.have_idle_activity = true;
        assert_eq!(
            ss.check(start + minutes(2), &busy),
            Some(WindowRequest::CloseScreensaver)
        );
        assert!(!ss.is_screensaver_active());
    }

    #[test]
    fn manual_dpms_survives_input() {
        let start = Instant::now();
        let (mut ss, display, _recorder) = controller(true, start);
        assert!(ss.toggle_dpms(true));

        assert_eq!(ss.wake(start, false), WakeResult::default());
        assert!(display.is_power_saving());

        assert!(ss.toggle_dpms(true));
        assert!(!ss.is_dpms_active());
    }

    #[test]
    fn waking_from_dpms_only_wakes_active_screensaver() {
        let start = Instant::now();
        let (mut ss, _display, recorder) = controller(true, start);
        let settings = settings(SCREENSAVER_DIM, 0);
        ss.check(start + minutes(1), &idle(&settings, 1));
        assert!(ss.is_dpms_active());

        let woke = ss.wake(start + minutes(2), false);
        assert!(woke.consumed);
        assert!(!ss.is_dpms_active());
        assert_eq!(ss.idle_since(), start + minutes(2));
        assert!(!recorder
            .0
            .lock()
            .iter()
            .any(|e| matches!(e, GuiEvent::OnScreensaverDeactivated { .. })));
    }

    #[test]
    fn visualisation_replaces_screensaver_for_audio() {
        let start = Instant::now();
        let (mut ss, _display, _recorder) = controller(false, start);
        let mut settings = settings("screensaver.rsxs.solarwinds", 1);
        settings.use_music_visualisation = true;
        let mut check = idle(&settings, 0);
        check.audio_playing = true;

        assert_eq!(
            ss.check(start + minutes(1), &check),
            Some(WindowRequest::ShowVisualisation)
        );
        assert!(!ss.is_screensaver_active());
    }

    #[test]
    fn forced_dim_overrides_mode() {
        let start = Instant::now();
        let (mut ss, _display, _recorder) = controller(false, start);
        let settings = settings("screensaver.rsxs.solarwinds", 1);
        let mut check = idle(&settings, 0);
        check.force_dim = true;

        assert_eq!(ss.check(start + minutes(1), &check), None);
        assert_eq!(ss.active_mode(), Some(SCREENSAVER_DIM));

        let woke = ss.wake(start + minutes(2), true);
        assert_eq!(woke.window, None);
        assert!(woke.consumed);
    }
}
