//! Application end-to-end tests
//!
//! Bootstraps a complete headless core in a temporary user data folder and
//! drives it the way a host would: from the main loop and from other threads.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use kodi_core::application::{IdleCheck, ScreensaverController};
use kodi_core::events::{
    ApplicationEvent, GuiEvent, LifecycleEvent, NoopEventEmitter, PlayerEvent, SystemEvent,
};
use kodi_core::gui::HeadlessDisplay;
use kodi_core::services::network::NetworkError;
use kodi_core::services::IpDetector;
use kodi_core::settings::ScreensaverSettings;
use kodi_core::{
    bootstrap_with, AppCommand, AppParams, Announcement, ApplicationContext, BootstrapOverrides,
    EventEmitter, ExitCode, MediaItem, MediaKind, Settings, ThreadMessage,
};
use parking_lot::Mutex;
use tempfile::TempDir;

// ===== Test Helpers =====

struct FixedIp;

impl IpDetector for FixedIp {
    fn detect(&self) -> Result<String, NetworkError> {
        Ok("10.0.0.5".to_string())
    }
}

#[derive(Default)]
struct Lifecycle {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl EventEmitter for Lifecycle {
    fn emit_player(&self, _event: PlayerEvent) {}
    fn emit_gui(&self, _event: GuiEvent) {}
    fn emit_system(&self, _event: SystemEvent) {}
    fn emit_application(&self, _event: ApplicationEvent) {}
    fn emit_lifecycle(&self, event: LifecycleEvent) {
        self.events.lock().push(event);
    }
}

fn quiet_settings() -> Settings {
    let mut settings = Settings::default();
    settings.frame.interval_ms = 0;
    settings
}

fn start(lifecycle: Option<Arc<Lifecycle>>) -> (ApplicationContext, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let params = AppParams {
        user_data: Some(dir.path().to_path_buf()),
        ..AppParams::default()
    };
    let overrides = BootstrapOverrides {
        ip_detector: Some(Arc::new(FixedIp)),
        external_emitter: lifecycle.map(|l| l as Arc<dyn EventEmitter>),
        ..BootstrapOverrides::default()
    };
    let ctx = bootstrap_with(quiet_settings(), params, overrides).unwrap();
    (ctx, dir)
}

// ===== Lifecycle =====

#[test]
fn test_stages_start_in_order_and_stop_in_reverse() {
    let lifecycle = Arc::new(Lifecycle::default());
    let (mut ctx, _dir) = start(Some(Arc::clone(&lifecycle)));
    assert_eq!(ctx.services().init_level(), 3);

    ctx.shutdown();
    ctx.shutdown();

    let events = lifecycle.events.lock().clone();
    assert_eq!(
        events,
        vec![
            LifecycleEvent::StageInitialized { stage: 1 },
            LifecycleEvent::StageInitialized { stage: 2 },
            LifecycleEvent::StageInitialized { stage: 3 },
            LifecycleEvent::StageDeinitialized { stage: 3 },
            LifecycleEvent::StageDeinitialized { stage: 2 },
            LifecycleEvent::StageDeinitialized { stage: 1 },
        ]
    );
}

// ===== Playback =====

#[test]
fn test_play_request_from_another_thread() {
    let (ctx, _dir) = start(None);
    let mut announcements = ctx.subscribe();

    let messenger = Arc::clone(ctx.messenger());
    thread::spawn(move || messenger.media_play(MediaItem::new("/music/song.mp3")))
        .join()
        .unwrap();

    ctx.run(Some(1));
    let app = ctx.application();
    assert!(app.is_playing());
    assert!(app.is_playing_audio());
    assert_eq!(app.current_item().unwrap().path, "/music/song.mp3");

    let mut saw_play = false;
    while let Ok(announcement) = announcements.try_recv() {
        if let Announcement::Player(PlayerEvent::OnPlay { item, .. }) = announcement {
            assert_eq!(item, "/music/song.mp3");
            saw_play = true;
        }
    }
    assert!(saw_play);
}

#[test]
fn test_playlist_from_command_line_starts_first_item() {
    let dir = tempfile::tempdir().unwrap();
    let params = AppParams {
        user_data: Some(dir.path().to_path_buf()),
        playlist: vec!["/music/a.mp3".into(), "/music/b.mp3".into()],
        ..AppParams::default()
    };
    let overrides = BootstrapOverrides {
        ip_detector: Some(Arc::new(FixedIp)),
        ..BootstrapOverrides::default()
    };
    let ctx = bootstrap_with(quiet_settings(), params, overrides).unwrap();

    ctx.run(Some(1));
    assert_eq!(
        ctx.application().current_item().map(|i| i.path),
        Some("/music/a.mp3".to_string())
    );
}

#[test]
fn test_failed_open_keeps_current_item() {
    let (ctx, _dir) = start(None);
    let mut announcements = ctx.subscribe();
    let app = ctx.application();

    app.play_file(MediaItem::new("/m/a.mkv"), false).unwrap();
    let blank = MediaItem::new("   ").with_kind(MediaKind::Video);
    assert!(app.play_file(blank, false).is_err());

    assert!(app.is_playing());
    assert_eq!(app.current_item().map(|i| i.path), Some("/m/a.mkv".to_string()));

    app.stop_playing(false);
    assert!(!app.is_playing());
    assert!(app.current_item().is_none());

    let mut stopped = Vec::new();
    while let Ok(announcement) = announcements.try_recv() {
        if let Announcement::Player(PlayerEvent::OnStop { item, .. }) = announcement {
            stopped.push(item);
        }
    }
    assert_eq!(stopped, vec!["/m/a.mkv".to_string()]);
}

#[test]
fn test_stack_ignores_durations_beyond_its_parts() {
    let (ctx, _dir) = start(None);
    let item = MediaItem::new("stack:///m/cd1.avi , /m/cd2.avi")
        .with_part_durations(vec![1_000, 1_000, 1_000])
        .with_start_offset(2_500);

    let messenger = Arc::clone(ctx.messenger());
    let sender = thread::spawn(move || {
        messenger.send(ThreadMessage::new(AppCommand::MediaPlay).with_item(item))
    });
    let deadline = Instant::now() + Duration::from_secs(5);
    while !sender.is_finished() && Instant::now() < deadline {
        ctx.run(Some(1));
    }
    assert_eq!(sender.join().unwrap(), 1);

    let app = ctx.application();
    assert!(app.is_playing_video());
    assert_eq!(app.current_stack_part(), Some(1));
}

#[test]
fn test_stack_continues_with_next_part() {
    let (ctx, _dir) = start(None);
    let app = ctx.application();
    let item = MediaItem::new("stack:///m/cd1.avi , /m/cd2.avi")
        .with_part_durations(vec![1_000, 1_000]);

    app.play_file(item, false).unwrap();
    assert_eq!(app.current_stack_part(), Some(0));

    app.on_playback_ended();
    assert_eq!(app.current_stack_part(), Some(1));
    assert!(app.is_playing());

    app.on_playback_ended();
    assert!(!app.is_playing());
    assert_eq!(app.current_stack_part(), None);
}

// ===== Exit =====

#[test]
fn test_restart_app_builtin_sets_exit_code() {
    let (mut ctx, _dir) = start(None);
    ctx.messenger()
        .post(ThreadMessage::new(AppCommand::ExecuteBuiltIn).with_string("RestartApp"));

    assert_eq!(ctx.run(Some(10)), ExitCode::RestartApp);
    assert_eq!(ctx.shutdown(), ExitCode::RestartApp);
    assert_eq!(ExitCode::RestartApp.code(), 65);
}

#[test]
fn test_quit_from_other_thread_ends_loop() {
    let (ctx, _dir) = start(None);
    let messenger = Arc::clone(ctx.messenger());
    let quitter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        messenger.quit();
    });

    let exit = ctx.run(None);
    quitter.join().unwrap();
    assert_eq!(exit, ExitCode::Quit);
    assert!(ctx.application().is_stopping());
}

// ===== Idle timer =====

#[test]
fn test_activity_resets_idle_timer() {
    let display = Arc::new(HeadlessDisplay::new(true));
    let start = Instant::now();
    let mut controller = ScreensaverController::new(
        display.clone(),
        display.clone(),
        Arc::new(NoopEventEmitter),
        start,
    );
    let settings = ScreensaverSettings {
        time_minutes: 1,
        ..ScreensaverSettings::default()
    };
    let idle = IdleCheck {
        have_idle_activity: false,
        settings: &settings,
        dpms_minutes: 0,
        audio_playing: false,
        force_dim: false,
    };
    let busy = IdleCheck {
        have_idle_activity: true,
        ..idle
    };

    controller.check(start + Duration::from_secs(30), &idle);
    controller.check(start + Duration::from_secs(50), &busy);
    assert_eq!(controller.idle_since(), start + Duration::from_secs(50));

    controller.check(start + Duration::from_secs(100), &idle);
    assert!(!controller.is_screensaver_active());

    controller.check(start + Duration::from_secs(111), &idle);
    assert!(controller.is_screensaver_active());
}
