//! The application state machine.
//!
//! [`Application`] is the receiver of every application command. It owns the
//! playback, volume, screensaver and skin state and drives the main loop.
//! All of its mutating entry points run on the owning thread: either from
//! the loop itself or from message handlers dispatched by the messenger.
//!
//! Handlers may be re-entered. A handler that asks the playlist player to
//! play something gets a `PlayFile` message dispatched back into the
//! application before it returns. State locks are therefore only held for
//! short scopes and never across messenger, playlist or window-manager calls.

mod actions;
mod builtins;
mod dispatch;
mod event_loop;
mod external_calls;
mod playback;
mod screensaver;

pub use builtins::{parse_builtin, BuiltIn};
pub use external_calls::FrameMoveGuard;
pub use screensaver::{IdleCheck, ScreensaverController, WakeResult, WindowRequest};

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use crate::constants::DEFAULT_SKIN;
use crate::error::{KodiError, KodiResult};
use crate::events::{EventEmitter, SystemEvent};
use crate::gui::window_ids::WINDOW_INVALID;
use crate::gui::{
    ActionListener, DirectorySkinLoader, DisplayPower, HeadlessDisplay, HeadlessWindowManager,
    OsScreensaver, SkinLoader, WindowManager, WindowingSystem,
};
use crate::media::MediaItem;
use crate::messaging::ApplicationMessenger;
use crate::player::Player;
use crate::services::{InputEvent, ServiceHandles};
use crate::settings::{AppParams, Settings};

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Quit = 0,
    Powerdown = 64,
    RestartApp = 65,
    Reboot = 66,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    fn from_code(code: i32) -> Self {
        match code {
            64 => Self::Powerdown,
            65 => Self::RestartApp,
            66 => Self::Reboot,
            _ => Self::Quit,
        }
    }
}

/// GUI-side collaborators of the application.
#[derive(Clone)]
pub struct Collaborators {
    pub window_manager: Arc<dyn WindowManager>,
    pub display: Arc<dyn DisplayPower>,
    pub os_screensaver: Arc<dyn OsScreensaver>,
    pub windowing: Arc<dyn WindowingSystem>,
    pub skin_loader: Arc<dyn SkinLoader>,
}

impl Collaborators {
    /// Collaborators for running without a display. Skins are looked up in
    /// `addons_dir`.
    pub fn headless(addons_dir: &Path) -> Self {
        let display = Arc::new(HeadlessDisplay::new(true));
        Self {
            window_manager: Arc::new(HeadlessWindowManager::new()),
            display: display.clone(),
            os_screensaver: display.clone(),
            windowing: display,
            skin_loader: Arc::new(DirectorySkinLoader::new(addons_dir)),
        }
    }
}

/// Multi-part item being played part by part.
#[derive(Debug, Clone)]
struct StackState {
    item: MediaItem,
    parts: Vec<String>,
    current_part: usize,
}

struct AppState {
    current_item: Option<MediaItem>,
    stack: Option<StackState>,
    end_reported: bool,
    volume: f32,
    muted: bool,
    skin_loaded: bool,
    active_skin: Option<String>,
    inhibit_idle_shutdown: bool,
    inhibit_screensaver: bool,
    shutdown_idle_since: Instant,
    last_process_slow: Option<Instant>,
    last_frame: Option<Instant>,
}

pub struct Application {
    messenger: Arc<ApplicationMessenger>,
    emitter: Arc<dyn EventEmitter>,
    settings: RwLock<Settings>,
    params: AppParams,
    gui: Collaborators,
    services: RwLock<Option<ServiceHandles>>,
    state: Mutex<AppState>,
    player: Mutex<Option<Box<dyn Player>>>,
    screensaver: Mutex<ScreensaverController>,
    pending_events: Mutex<VecDeque<InputEvent>>,
    action_listeners: RwLock<Vec<Arc<dyn ActionListener>>>,
    frame_guard: Arc<FrameMoveGuard>,
    stopping: AtomicBool,
    exit_code: AtomicI32,
}

impl Application {
    pub fn new(
        messenger: Arc<ApplicationMessenger>,
        emitter: Arc<dyn EventEmitter>,
        settings: Settings,
        params: AppParams,
        gui: Collaborators,
    ) -> Self {
        let now = Instant::now();
        let volume = settings.playback.initial_volume;
        let screensaver = ScreensaverController::new(
            Arc::clone(&gui.display),
            Arc::clone(&gui.os_screensaver),
            Arc::clone(&emitter),
            now,
        );
        Self {
            messenger,
            emitter,
            settings: RwLock::new(settings),
            params,
            gui,
            services: RwLock::new(None),
            state: Mutex::new(AppState {
                current_item: None,
                stack: None,
                end_reported: false,
                volume,
                muted: false,
                skin_loaded: false,
                active_skin: None,
                inhibit_idle_shutdown: false,
                inhibit_screensaver: false,
                shutdown_idle_since: now,
                last_process_slow: None,
                last_frame: None,
            }),
            player: Mutex::new(None),
            screensaver: Mutex::new(screensaver),
            pending_events: Mutex::new(VecDeque::new()),
            action_listeners: RwLock::new(Vec::new()),
            frame_guard: Arc::new(FrameMoveGuard::new()),
            stopping: AtomicBool::new(false),
            exit_code: AtomicI32::new(ExitCode::Quit.code()),
        }
    }

    pub fn messenger(&self) -> &Arc<ApplicationMessenger> {
        &self.messenger
    }

    pub fn params(&self) -> &AppParams {
        &self.params
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Applies `f` to the live settings.
    pub fn update_settings(&self, f: impl FnOnce(&mut Settings)) {
        f(&mut self.settings.write());
    }

    pub fn window_manager(&self) -> &Arc<dyn WindowManager> {
        &self.gui.window_manager
    }

    pub fn frame_guard(&self) -> &Arc<FrameMoveGuard> {
        &self.frame_guard
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Services
    // ─────────────────────────────────────────────────────────────────────────

    /// Hands the live services to the application.
    pub fn attach_services(&self, handles: ServiceHandles) {
        handles
            .scripts
            .set_frame_guard(Some(Arc::clone(&self.frame_guard)));
        *self.services.write() = Some(handles);
    }

    /// Gives the services back. Must happen before they are torn down.
    pub fn detach_services(&self) {
        if let Some(handles) = self.services.write().take() {
            handles.scripts.set_frame_guard(None);
        }
    }

    pub fn has_services(&self) -> bool {
        self.services.read().is_some()
    }

    fn service<T: ?Sized>(&self, pick: impl FnOnce(&ServiceHandles) -> &Arc<T>) -> Option<Arc<T>> {
        self.services.read().as_ref().map(|s| Arc::clone(pick(s)))
    }

    fn require_service<T: ?Sized>(
        &self,
        name: &'static str,
        pick: impl FnOnce(&ServiceHandles) -> &Arc<T>,
    ) -> KodiResult<Arc<T>> {
        self.service(pick).ok_or(KodiError::ServiceUnavailable {
            service: name,
            required: 3,
            current: 0,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Asks the main loop to exit with `code`.
    pub fn stop(&self, code: ExitCode) {
        self.exit_code.store(code.code(), Ordering::SeqCst);
        if !self.stopping.swap(true, Ordering::SeqCst) {
            log::info!("[Application] Stopping with exit code {}", code.code());
            self.emitter.emit_system(SystemEvent::OnQuit {
                exit_code: code.code(),
            });
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from_code(self.exit_code.load(Ordering::SeqCst))
    }

    /// Releases playback and GUI resources once the loop has exited.
    pub fn cleanup(&self) {
        self.stop_playing(false);
        self.unload_skin();
        self.action_listeners.write().clear();
        self.pending_events.lock().clear();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Skin
    // ─────────────────────────────────────────────────────────────────────────

    /// Loads `skin_id`, falling back to the default skin.
    ///
    /// Fails only when the default skin cannot be loaded either.
    pub fn load_skin(&self, skin_id: &str) -> KodiResult<()> {
        let loader = &self.gui.skin_loader;
        let loaded = match loader.load(skin_id) {
            Ok(()) => skin_id.to_string(),
            Err(e) if skin_id != DEFAULT_SKIN => {
                log::warn!("[Application] {}, falling back to {}", e, DEFAULT_SKIN);
                loader
                    .load(DEFAULT_SKIN)
                    .map_err(|e| KodiError::Skin(e.to_string()))?;
                DEFAULT_SKIN.to_string()
            }
            Err(e) => return Err(KodiError::Skin(e.to_string())),
        };

        let mut state = self.state.lock();
        state.skin_loaded = true;
        state.active_skin = Some(loaded);
        Ok(())
    }

    pub fn unload_skin(&self) {
        let was_loaded = {
            let mut state = self.state.lock();
            state.active_skin = None;
            std::mem::replace(&mut state.skin_loaded, false)
        };
        if was_loaded {
            self.gui.skin_loader.unload();
        }
    }

    /// Reloads the configured skin and returns to the window that was active.
    pub fn reload_skin(&self) -> KodiResult<()> {
        let previous = self.gui.window_manager.active_window();
        let skin = self.settings.read().skin.skin.clone();
        self.unload_skin();
        self.load_skin(&skin)?;
        if previous != WINDOW_INVALID {
            self.gui.window_manager.activate_window(previous, &[]);
        }
        log::info!("[Application] Skin reloaded");
        Ok(())
    }

    pub fn is_skin_loaded(&self) -> bool {
        self.state.lock().skin_loaded
    }

    pub fn active_skin(&self) -> Option<String> {
        self.state.lock().active_skin.clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Input
    // ─────────────────────────────────────────────────────────────────────────

    /// Queues an OS event for the next frame. Callable from any thread.
    pub fn queue_input_event(&self, event: InputEvent) {
        self.pending_events.lock().push_back(event);
    }

    pub fn pending_input_events(&self) -> usize {
        self.pending_events.lock().len()
    }

    pub fn register_action_listener(&self, listener: Arc<dyn ActionListener>) {
        self.action_listeners.write().push(listener);
    }

    pub fn unregister_action_listener(&self, listener: &Arc<dyn ActionListener>) {
        self.action_listeners
            .write()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Screensaver and idle state
    // ─────────────────────────────────────────────────────────────────────────

    pub fn is_screensaver_active(&self) -> bool {
        self.screensaver.lock().is_screensaver_active()
    }

    pub fn is_dpms_active(&self) -> bool {
        self.screensaver.lock().is_dpms_active()
    }

    pub fn set_inhibit_idle_shutdown(&self, inhibit: bool) {
        self.state.lock().inhibit_idle_shutdown = inhibit;
    }

    pub fn is_idle_shutdown_inhibited(&self) -> bool {
        self.state.lock().inhibit_idle_shutdown
    }

    pub fn set_inhibit_screensaver(&self, inhibit: bool) {
        self.state.lock().inhibit_screensaver = inhibit;
        if inhibit {
            self.wake_screensaver(false);
        }
    }

    pub fn is_screensaver_inhibited(&self) -> bool {
        self.state.lock().inhibit_screensaver
    }

    /// Restarts the screensaver and idle-shutdown timers.
    pub fn reset_idle_timers(&self) {
        let now = Instant::now();
        self.screensaver.lock().reset_timer(now);
        self.state.lock().shutdown_idle_since = now;
    }

    /// Starts the screensaver regardless of the idle timer.
    pub fn activate_screensaver(&self) {
        let settings = self.settings();
        let check = self.idle_check(&settings);
        let request = self.screensaver.lock().activate(Instant::now(), &check);
        self.apply_window_request(request);
    }

    /// Wakes DPMS and the screensaver. Returns true if the input that caused
    /// the wake should be swallowed.
    pub fn wake_screensaver(&self, power_off_key: bool) -> bool {
        let woke = self.screensaver.lock().wake(Instant::now(), power_off_key);
        self.apply_window_request(woke.window);
        woke.consumed
    }

    pub fn toggle_dpms(&self, manual: bool) -> bool {
        self.screensaver.lock().toggle_dpms(manual)
    }

    fn idle_check<'a>(&self, settings: &'a Settings) -> IdleCheck<'a> {
        let (playing_video, playing_audio, paused) = {
            let player = self.player.lock();
            match player.as_ref() {
                Some(p) if p.is_playing() => (p.has_video(), !p.has_video() && p.has_audio(), p.is_paused()),
                _ => (false, false, false),
            }
        };
        let inhibited = self.state.lock().inhibit_screensaver;
        let audio_keeps_awake = playing_audio && settings.screensaver.disable_for_audio;
        let scanning = self
            .service(|s| &s.pvr)
            .is_some_and(|pvr| pvr.is_channel_scan_running());

        IdleCheck {
            have_idle_activity: inhibited || (playing_video && !paused) || audio_keeps_awake,
            settings: &settings.screensaver,
            dpms_minutes: settings.power.displays_off_minutes,
            audio_playing: playing_audio && !paused,
            force_dim: self.gui.window_manager.has_modal_dialog()
                || (playing_video && paused && settings.screensaver.use_dim_on_pause)
                || scanning,
        }
    }

    fn apply_window_request(&self, request: Option<WindowRequest>) {
        use crate::gui::window_ids::{WINDOW_SCREENSAVER, WINDOW_VISUALISATION};

        let wm = &self.gui.window_manager;
        match request {
            Some(WindowRequest::ShowScreensaver) => wm.activate_window(WINDOW_SCREENSAVER, &[]),
            Some(WindowRequest::ShowVisualisation) => {
                if !wm.is_window_active(WINDOW_VISUALISATION) {
                    wm.activate_window(WINDOW_VISUALISATION, &[]);
                }
            }
            Some(WindowRequest::CloseScreensaver) => {
                if wm.is_window_active(WINDOW_SCREENSAVER) {
                    wm.previous_window();
                }
            }
            None => {}
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::events::NoopEventEmitter;
    use crate::gui::{HeadlessDisplay, HeadlessWindowManager, WindowManagerTarget};
    use crate::messaging::MessageTarget;

    pub struct Fixture {
        pub app: Arc<Application>,
        pub messenger: Arc<ApplicationMessenger>,
        pub window_manager: Arc<HeadlessWindowManager>,
        pub display: Arc<HeadlessDisplay>,
        // The messenger only holds weak references.
        _window_target: Arc<dyn MessageTarget>,
    }

    /// An application without services, owned by the calling thread.
    pub fn fixture(settings: Settings) -> Fixture {
        let messenger = Arc::new(ApplicationMessenger::new());
        messenger.set_owning_thread();
        let window_manager = Arc::new(HeadlessWindowManager::new());
        let display = Arc::new(HeadlessDisplay::new(true));
        let gui = Collaborators {
            window_manager: window_manager.clone(),
            display: display.clone(),
            os_screensaver: display.clone(),
            windowing: display.clone(),
            skin_loader: Arc::new(DirectorySkinLoader::new("/nonexistent")),
        };
        let app = Arc::new(Application::new(
            Arc::clone(&messenger),
            Arc::new(NoopEventEmitter),
            settings,
            AppParams::default(),
            gui,
        ));
        let target: Arc<dyn MessageTarget> = app.clone();
        messenger.register_receiver(&target);
        let window_target: Arc<dyn MessageTarget> =
            Arc::new(WindowManagerTarget::new(window_manager.clone()));
        messenger.register_receiver(&window_target);
        Fixture {
            app,
            messenger,
            window_manager,
            display,
            _window_target: window_target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::fixture;
    use super::*;

    #[test]
    fn skin_falls_back_to_default() {
        let f = fixture(Settings::default());
        f.app.load_skin("skin.missing").unwrap();
        assert_eq!(f.app.active_skin().as_deref(), Some(DEFAULT_SKIN));
        assert!(f.app.is_skin_loaded());

        f.app.unload_skin();
        assert!(!f.app.is_skin_loaded());
    }

    #[test]
    fn reload_skin_returns_to_previous_window() {
        use crate::gui::window_ids::WINDOW_VIDEOS;

        let f = fixture(Settings::default());
        f.app.load_skin(DEFAULT_SKIN).unwrap();
        f.window_manager.activate_window(WINDOW_VIDEOS, &[]);

        f.app.reload_skin().unwrap();
        assert!(f.app.is_skin_loaded());
        assert_eq!(f.window_manager.active_window(), WINDOW_VIDEOS);
    }

    #[test]
    fn stop_records_exit_code_once() {
        let f = fixture(Settings::default());
        assert!(!f.app.is_stopping());
        f.app.stop(ExitCode::Reboot);
        assert!(f.app.is_stopping());
        assert_eq!(f.app.exit_code(), ExitCode::Reboot);
        assert_eq!(f.app.exit_code().code(), 66);
    }

    #[test]
    fn inhibiting_screensaver_wakes_it() {
        let f = fixture(Settings::default());
        f.app.activate_screensaver();
        assert!(f.app.is_screensaver_active());

        f.app.set_inhibit_screensaver(true);
        assert!(!f.app.is_screensaver_active());
    }

    #[test]
    fn audio_counts_as_activity_when_disabled_for_audio() {
        use crate::player::DummyPlayer;

        let mut settings = Settings::default();
        settings.screensaver.disable_for_audio = true;
        settings.screensaver.use_music_visualisation = true;
        let f = fixture(settings.clone());

        let mut player = DummyPlayer::new("dummy", false);
        player.open_file(&MediaItem::new("/music/song.mp3")).unwrap();
        player.pause();
        *f.app.player.lock() = Some(Box::new(player));
        assert!(f.app.idle_check(&settings).have_idle_activity);

        settings.screensaver.disable_for_audio = false;
        assert!(!f.app.idle_check(&settings).have_idle_activity);
    }
}
