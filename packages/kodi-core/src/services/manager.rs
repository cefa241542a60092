//! Staged construction and teardown of the long-lived subsystems.
//!
//! Subsystems are built in three stages. A stage only receives handles from
//! its own or earlier stages, so dependencies always point downwards. Teardown
//! runs the stages in reverse, and dropping the manager tears down whatever is
//! still live, so a failed startup can unwind from any point.
//!
//! | Stage | Needs                     | Builds                                              |
//! |-------|---------------------------|-----------------------------------------------------|
//! | 1     | nothing                   | scripts, playlist player, network, jobs             |
//! | 2     | parameters, profile path  | add-ons, VFS cache, extensions, PVR, peripherals, input, power, library |
//! | 3     | profiles, live GUI        | context menu, games, player core factory            |

use std::path::Path;
use std::sync::Arc;

use super::addons::{AddonManager, VfsAddonCache};
use super::context_menu::ContextMenuManager;
use super::file_extensions::FileExtensionProvider;
use super::games::GameServices;
use super::input::InputManager;
use super::network::{IpDetector, LocalIpDetector, NetworkService};
use super::peripherals::Peripherals;
use super::power::{LoggingPowerBackend, PowerBackend, PowerManager};
use super::profiles::ProfileManager;
use super::pvr::PvrManager;
use super::scripts::ScriptInvocationManager;
use crate::error::{KodiError, KodiResult};
use crate::events::{EventEmitter, LifecycleEvent};
use crate::jobs::{JobManager, LibraryScanner};
use crate::messaging::{ApplicationMessenger, MessageTarget};
use crate::player::PlayerCoreFactory;
use crate::playlist::PlaylistPlayer;
use crate::settings::AppParams;

/// Subsystems without dependencies on parameters or the GUI.
pub struct StageOne {
    pub scripts: Arc<ScriptInvocationManager>,
    pub playlist_player: Arc<PlaylistPlayer>,
    pub network: Arc<NetworkService>,
    pub jobs: Arc<JobManager>,
}

/// Subsystems needing startup parameters and the profile folder.
pub struct StageTwo {
    pub addons: Arc<AddonManager>,
    pub vfs_addons: Arc<VfsAddonCache>,
    pub file_extensions: Arc<FileExtensionProvider>,
    pub pvr: Arc<PvrManager>,
    pub peripherals: Arc<Peripherals>,
    pub input: Arc<InputManager>,
    pub power: Arc<PowerManager>,
    pub library: Arc<LibraryScanner>,
}

/// Subsystems needing profiles and a live window manager.
pub struct StageThree {
    pub context_menu: Arc<ContextMenuManager>,
    pub games: Arc<GameServices>,
    pub player_core_factory: Arc<PlayerCoreFactory>,
    pub profiles: Arc<ProfileManager>,
}

/// Snapshot of every service handle, taken once all stages are live.
///
/// Handed to the application so it never reaches into the manager while
/// running. Must be given back (dropped) before teardown.
#[derive(Clone)]
pub struct ServiceHandles {
    pub scripts: Arc<ScriptInvocationManager>,
    pub playlist_player: Arc<PlaylistPlayer>,
    pub network: Arc<NetworkService>,
    pub jobs: Arc<JobManager>,
    pub addons: Arc<AddonManager>,
    pub vfs_addons: Arc<VfsAddonCache>,
    pub file_extensions: Arc<FileExtensionProvider>,
    pub pvr: Arc<PvrManager>,
    pub peripherals: Arc<Peripherals>,
    pub input: Arc<InputManager>,
    pub power: Arc<PowerManager>,
    pub library: Arc<LibraryScanner>,
    pub context_menu: Arc<ContextMenuManager>,
    pub games: Arc<GameServices>,
    pub player_core_factory: Arc<PlayerCoreFactory>,
    pub profiles: Arc<ProfileManager>,
}

macro_rules! stage_accessor {
    ($name:ident, $stage:ident, $level:expr, $ty:ty) => {
        pub fn $name(&self) -> KodiResult<Arc<$ty>> {
            self.$stage
                .as_ref()
                .map(|stage| Arc::clone(&stage.$name))
                .ok_or_else(|| self.unavailable(stringify!($name), $level))
        }
    };
}

pub struct ServiceManager {
    messenger: Arc<ApplicationMessenger>,
    emitter: Arc<dyn EventEmitter>,
    ip_detector: Arc<dyn IpDetector>,
    power_backend: Option<Arc<dyn PowerBackend>>,
    init_level: u8,
    stage_one: Option<StageOne>,
    stage_two: Option<StageTwo>,
    stage_three: Option<StageThree>,
}

impl ServiceManager {
    pub fn new(messenger: Arc<ApplicationMessenger>, emitter: Arc<dyn EventEmitter>) -> Self {
        Self {
            messenger,
            emitter,
            ip_detector: LocalIpDetector::arc(),
            power_backend: None,
            init_level: 0,
            stage_one: None,
            stage_two: None,
            stage_three: None,
        }
    }

    pub fn with_ip_detector(mut self, detector: Arc<dyn IpDetector>) -> Self {
        self.ip_detector = detector;
        self
    }

    /// Uses `backend` instead of the logging backend chosen from the
    /// startup parameters.
    pub fn with_power_backend(mut self, backend: Arc<dyn PowerBackend>) -> Self {
        self.power_backend = Some(backend);
        self
    }

    /// How many stages are live (0..=3).
    pub fn init_level(&self) -> u8 {
        self.init_level
    }

    fn require_level(&self, requested: u8) -> KodiResult<()> {
        if self.init_level + 1 != requested {
            return Err(KodiError::StageOrder {
                requested,
                current: self.init_level,
            });
        }
        Ok(())
    }

    fn unavailable(&self, service: &'static str, required: u8) -> KodiError {
        KodiError::ServiceUnavailable {
            service,
            required,
            current: self.init_level,
        }
    }

    fn stage_initialized(&mut self, stage: u8) {
        self.init_level = stage;
        log::info!("[Services] Stage {} initialized", stage);
        self.emitter
            .emit_lifecycle(LifecycleEvent::StageInitialized { stage });
    }

    fn stage_deinitialized(&mut self, stage: u8) {
        self.init_level = stage - 1;
        log::info!("[Services] Stage {} deinitialized", stage);
        self.emitter
            .emit_lifecycle(LifecycleEvent::StageDeinitialized { stage });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Initialization
    // ─────────────────────────────────────────────────────────────────────────

    pub fn init_stage_one(&mut self) -> KodiResult<()> {
        self.require_level(1)?;

        let jobs = Arc::new(JobManager::new().map_err(|e| {
            KodiError::Construction(format!("Failed to start job runtime: {}", e))
        })?);
        let scripts = Arc::new(ScriptInvocationManager::new(
            Arc::clone(&jobs),
            Arc::clone(&self.messenger),
        ));
        let playlist_player = Arc::new(PlaylistPlayer::new(Arc::clone(&self.messenger)));
        let receiver: Arc<dyn MessageTarget> = playlist_player.clone();
        self.messenger.register_receiver(&receiver);

        let network = Arc::new(NetworkService::new(Arc::clone(&self.ip_detector)));
        network.start_services();

        self.stage_one = Some(StageOne {
            scripts,
            playlist_player,
            network,
            jobs,
        });
        self.stage_initialized(1);
        Ok(())
    }

    /// Builds the stage-two subsystems.
    ///
    /// Fails if the profile folder cannot be created or the add-on folder
    /// cannot be read.
    pub fn init_stage_two(&mut self, params: &AppParams, profile_folder: &Path) -> KodiResult<()> {
        self.require_level(2)?;
        let Some(stage_one) = self.stage_one.as_ref() else {
            return Err(self.unavailable("stage_one", 1));
        };

        std::fs::create_dir_all(profile_folder).map_err(|e| {
            KodiError::Construction(format!(
                "Failed to create profile folder {}: {}",
                profile_folder.display(),
                e
            ))
        })?;

        let addons = Arc::new(
            AddonManager::load(&profile_folder.join("addons"))
                .map_err(|e| KodiError::Construction(e.to_string()))?,
        );
        let vfs_addons = Arc::new(VfsAddonCache::new(&addons));
        let file_extensions = Arc::new(FileExtensionProvider::new(Arc::clone(&addons)));

        let pvr = Arc::new(PvrManager::new());
        pvr.start();

        let peripherals = Arc::new(Peripherals::new(params.emulate_cec));
        let input = Arc::new(InputManager::load(profile_folder).map_err(|e| {
            KodiError::Construction(format!("Failed to load key map: {}", e))
        })?);

        let backend = self
            .power_backend
            .clone()
            .unwrap_or_else(|| Arc::new(LoggingPowerBackend::new(params.standalone)));
        let power = Arc::new(PowerManager::new(backend));

        let library = Arc::new(LibraryScanner::new(
            Arc::clone(&stage_one.jobs),
            Arc::clone(&file_extensions),
            Arc::clone(&self.messenger),
        ));

        self.stage_two = Some(StageTwo {
            addons,
            vfs_addons,
            file_extensions,
            pvr,
            peripherals,
            input,
            power,
            library,
        });
        self.stage_initialized(2);
        Ok(())
    }

    /// Builds the stage-three subsystems.
    ///
    /// The player core factory reads `playercorefactory.xml` from the current
    /// profile; a malformed file fails the stage.
    pub fn init_stage_three(&mut self, profiles: Arc<ProfileManager>) -> KodiResult<()> {
        self.require_level(3)?;
        let Some(stage_two) = self.stage_two.as_ref() else {
            return Err(self.unavailable("stage_two", 2));
        };

        let context_menu = Arc::new(ContextMenuManager::new(Arc::clone(&stage_two.addons)));
        let games = Arc::new(GameServices::new(Arc::clone(&stage_two.addons)));
        let player_core_factory = Arc::new(
            PlayerCoreFactory::load(&profiles.profile_folder())
                .map_err(|e| KodiError::Construction(e.to_string()))?,
        );

        self.stage_three = Some(StageThree {
            context_menu,
            games,
            player_core_factory,
            profiles,
        });
        self.stage_initialized(3);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Teardown
    // ─────────────────────────────────────────────────────────────────────────

    pub fn deinit_stage_three(&mut self) {
        let Some(stage) = self.stage_three.take() else {
            return;
        };
        let StageThree {
            context_menu,
            games,
            player_core_factory,
            profiles,
        } = stage;
        drop(player_core_factory);
        drop(games);
        drop(context_menu);
        drop(profiles);
        self.stage_deinitialized(3);
    }

    /// Tears down stage two, and stage three first if it is still live.
    pub fn deinit_stage_two(&mut self) {
        self.deinit_stage_three();
        let Some(stage) = self.stage_two.take() else {
            return;
        };
        let StageTwo {
            addons,
            vfs_addons,
            file_extensions,
            pvr,
            peripherals,
            input,
            power,
            library,
        } = stage;
        library.stop_scanning();
        pvr.stop();
        peripherals.detach_all();
        drop(library);
        drop(power);
        drop(input);
        drop(peripherals);
        drop(pvr);
        drop(file_extensions);
        drop(vfs_addons);
        drop(addons);
        self.stage_deinitialized(2);
    }

    /// Tears down stage one, and any later stage first.
    pub fn deinit_stage_one(&mut self) {
        self.deinit_stage_two();
        let Some(stage) = self.stage_one.take() else {
            return;
        };
        let StageOne {
            scripts,
            playlist_player,
            network,
            jobs,
        } = stage;
        scripts.stop_all();
        jobs.shutdown();
        network.stop_services();
        playlist_player.reset();
        self.messenger
            .unregister_receiver(crate::messaging::TargetKind::PlaylistPlayer);
        drop(network);
        drop(playlist_player);
        drop(scripts);
        drop(jobs);
        self.stage_deinitialized(1);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    stage_accessor!(scripts, stage_one, 1, ScriptInvocationManager);
    stage_accessor!(playlist_player, stage_one, 1, PlaylistPlayer);
    stage_accessor!(network, stage_one, 1, NetworkService);
    stage_accessor!(jobs, stage_one, 1, JobManager);

    stage_accessor!(addons, stage_two, 2, AddonManager);
    stage_accessor!(vfs_addons, stage_two, 2, VfsAddonCache);
    stage_accessor!(file_extensions, stage_two, 2, FileExtensionProvider);
    stage_accessor!(pvr, stage_two, 2, PvrManager);
    stage_accessor!(peripherals, stage_two, 2, Peripherals);
    stage_accessor!(input, stage_two, 2, InputManager);
    stage_accessor!(power, stage_two, 2, PowerManager);
    stage_accessor!(library, stage_two, 2, LibraryScanner);

    stage_accessor!(context_menu, stage_three, 3, ContextMenuManager);
    stage_accessor!(games, stage_three, 3, GameServices);
    stage_accessor!(player_core_factory, stage_three, 3, PlayerCoreFactory);
    stage_accessor!(profiles, stage_three, 3, ProfileManager);

    /// Clones every handle. Requires all three stages.
    pub fn handles(&self) -> KodiResult<ServiceHandles> {
        let (Some(one), Some(two), Some(three)) =
            (&self.stage_one, &self.stage_two, &self.stage_three)
        else {
            return Err(self.unavailable("handles", 3));
        };
        Ok(ServiceHandles {
            scripts: Arc::clone(&one.scripts),
            playlist_player: Arc::clone(&one.playlist_player),
            network: Arc::clone(&one.network),
            jobs: Arc::clone(&one.jobs),
            addons: Arc::clone(&two.addons),
            vfs_addons: Arc::clone(&two.vfs_addons),
            file_extensions: Arc::clone(&two.file_extensions),
            pvr: Arc::clone(&two.pvr),
            peripherals: Arc::clone(&two.peripherals),
            input: Arc::clone(&two.input),
            power: Arc::clone(&two.power),
            library: Arc::clone(&two.library),
            context_menu: Arc::clone(&three.context_menu),
            games: Arc::clone(&three.games),
            player_core_factory: Arc::clone(&three.player_core_factory),
            profiles: Arc::clone(&three.profiles),
        })
    }
}

impl Drop for ServiceManager {
    fn drop(&mut self) {
        if self.init_level > 0 {
            log::debug!("[Services] Tearing down from level {}", self.init_level);
        }
        self.deinit_stage_three();
        self.deinit_stage_two();
        self.deinit_stage_one();
    }
}
