//! Application bootstrap and dependency wiring.
//!
//! This module is the composition root: the one place where the messenger,
//! the staged services and the application are created and wired together.
//! Every dependency relationship of a running core is visible here.

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::{Application, Collaborators};
use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::context::ApplicationContext;
use crate::error::{KodiError, KodiResult};
use crate::events::{BroadcastEventBridge, EventEmitter};
use crate::gui::WindowManagerTarget;
use crate::media::MediaItem;
use crate::messaging::{ApplicationMessenger, MessageTarget};
use crate::services::{IpDetector, PowerBackend, ProfileManager, ServiceManager};
use crate::settings::{AppParams, Settings};

/// Replaceable pieces of the wiring.
///
/// Everything left `None` gets the headless default.
#[derive(Clone, Default)]
pub struct BootstrapOverrides {
    /// GUI collaborators. Defaults to [`Collaborators::headless`] with skins
    /// looked up in the profile's add-on folder.
    pub collaborators: Option<Collaborators>,
    pub ip_detector: Option<Arc<dyn IpDetector>>,
    pub power_backend: Option<Arc<dyn PowerBackend>>,
    /// Receives every announcement in addition to the broadcast channel.
    pub external_emitter: Option<Arc<dyn EventEmitter>>,
}

/// Resolves the user data folder.
///
/// An explicit folder wins. Portable installs keep it next to the
/// executable, everything else under `$HOME/.kodi/userdata`.
pub fn resolve_user_data(params: &AppParams) -> KodiResult<PathBuf> {
    if let Some(folder) = &params.user_data {
        return Ok(folder.clone());
    }
    if params.portable {
        let exe = std::env::current_exe().map_err(|e| {
            KodiError::Configuration(format!("Failed to locate executable: {}", e))
        })?;
        let dir = exe
            .parent()
            .ok_or_else(|| KodiError::Configuration("Executable has no parent folder".into()))?;
        return Ok(dir.join("portable_data"));
    }
    let home = std::env::var_os("HOME")
        .ok_or_else(|| KodiError::Configuration("HOME is not set and no user data folder given".into()))?;
    Ok(PathBuf::from(home).join(".kodi").join("userdata"))
}

/// Bootstraps a core with headless collaborators.
///
/// See [`bootstrap_with`].
pub fn bootstrap(settings: Settings, params: AppParams) -> KodiResult<ApplicationContext> {
    bootstrap_with(settings, params, BootstrapOverrides::default())
}

/// Bootstraps a core with the given overrides.
///
/// The calling thread becomes the messenger's owning thread and must be the
/// one that later runs the main loop. The wiring order matters:
///
/// 1. Configuration validation and the user data folder
/// 2. Messenger and announcement bridge
/// 3. Stage one (scripts, playlist player, network, jobs)
/// 4. Profiles and stage two in the current profile
/// 5. Application, registered as a receiver together with the window manager
/// 6. Skin (fatal if even the default skin fails)
/// 7. Stage three, then the services are handed to the application
/// 8. Startup window and the items from the command line
///
/// # Errors
///
/// Fails on invalid settings, an unusable user data folder, a failing
/// service stage or an unloadable skin. Everything already built is torn
/// down again before the error is returned.
pub fn bootstrap_with(
    settings: Settings,
    params: AppParams,
    overrides: BootstrapOverrides,
) -> KodiResult<ApplicationContext> {
    settings.validate().map_err(KodiError::Configuration)?;
    let user_data = resolve_user_data(&params)?;
    log::info!("[Bootstrap] User data in {}", user_data.display());

    // Messaging and announcements
    let messenger = Arc::new(ApplicationMessenger::new());
    messenger.set_owning_thread();

    let event_bridge = Arc::new(BroadcastEventBridge::new(EVENT_CHANNEL_CAPACITY));
    if let Some(external) = overrides.external_emitter {
        event_bridge.set_external_emitter(external);
    }
    let emitter = Arc::clone(&event_bridge) as Arc<dyn EventEmitter>;

    // Stage one
    let mut services = ServiceManager::new(Arc::clone(&messenger), Arc::clone(&emitter));
    if let Some(detector) = overrides.ip_detector {
        services = services.with_ip_detector(detector);
    }
    if let Some(backend) = overrides.power_backend {
        services = services.with_power_backend(backend);
    }
    services.init_stage_one()?;

    // Profiles and stage two
    std::fs::create_dir_all(&user_data).map_err(|e| {
        KodiError::Construction(format!(
            "Failed to create user data folder {}: {}",
            user_data.display(),
            e
        ))
    })?;
    let profiles = Arc::new(ProfileManager::load(&user_data)?);
    let profile_folder = profiles.profile_folder();
    services.init_stage_two(&params, &profile_folder)?;

    // Application and receivers
    let gui = overrides
        .collaborators
        .unwrap_or_else(|| Collaborators::headless(&profile_folder.join("addons")));
    let application = Arc::new(Application::new(
        Arc::clone(&messenger),
        Arc::clone(&emitter),
        settings.clone(),
        params.clone(),
        gui.clone(),
    ));
    let app_receiver = Arc::clone(&application) as Arc<dyn MessageTarget>;
    messenger.register_receiver(&app_receiver);

    let window_receiver: Arc<dyn MessageTarget> =
        Arc::new(WindowManagerTarget::new(Arc::clone(&gui.window_manager)));
    messenger.register_receiver(&window_receiver);

    // Skin
    application.load_skin(&settings.skin.skin)?;

    // Stage three
    services.init_stage_three(profiles)?;
    application.attach_services(services.handles()?);

    // Startup window and command line items
    gui.window_manager
        .activate_window(settings.skin.startup_window, &[]);
    if params.start_fullscreen {
        gui.windowing.toggle_fullscreen();
    }
    if !params.playlist.is_empty() {
        let items = params
            .playlist
            .iter()
            .map(|path| MediaItem::new(path.as_str()))
            .collect();
        log::info!("[Bootstrap] Queueing {} item(s) from the command line", params.playlist.len());
        messenger.media_play_list(items, 0);
    }

    log::info!("[Bootstrap] Core ready");
    Ok(ApplicationContext::new(
        messenger,
        services,
        application,
        event_bridge,
        vec![window_receiver],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::QueueKind;

    fn params_in(dir: &std::path::Path) -> AppParams {
        AppParams {
            user_data: Some(dir.to_path_buf()),
            ..AppParams::default()
        }
    }

    #[test]
    fn explicit_user_data_wins() {
        let params = AppParams {
            portable: true,
            user_data: Some(PathBuf::from("/srv/kodi")),
            ..AppParams::default()
        };
        assert_eq!(resolve_user_data(&params).unwrap(), PathBuf::from("/srv/kodi"));
    }

    #[test]
    fn bootstrap_brings_up_all_stages() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = bootstrap(Settings::default(), params_in(dir.path())).unwrap();

        assert_eq!(ctx.services().init_level(), 3);
        assert!(ctx.application().has_services());
        assert!(ctx.application().is_skin_loaded());
        assert!(dir.path().join("addons").is_dir());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.playback.initial_volume = 3.0;
        assert!(matches!(
            bootstrap(settings, params_in(dir.path())),
            Err(KodiError::Configuration(_))
        ));
    }

    #[test]
    fn command_line_items_are_queued() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = params_in(dir.path());
        params.playlist = vec!["/music/a.mp3".into(), "/music/b.mp3".into()];
        let ctx = bootstrap(Settings::default(), params).unwrap();
        assert_eq!(ctx.messenger().queue_len(QueueKind::General), 1);
    }

    #[test]
    fn shutdown_tears_everything_down() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = bootstrap(Settings::default(), params_in(dir.path())).unwrap();
        ctx.application().stop(crate::application::ExitCode::Reboot);

        assert_eq!(ctx.shutdown(), crate::application::ExitCode::Reboot);
        assert_eq!(ctx.services().init_level(), 0);
        assert!(!ctx.application().has_services());
        assert!(ctx.messenger().is_stopping());
        assert!(!ctx.application().is_skin_loaded());
    }
}
