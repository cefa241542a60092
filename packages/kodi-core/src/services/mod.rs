//! Long-lived subsystems and their staged lifecycle.
//!
//! [`ServiceManager`] constructs the subsystems in three stages and tears them
//! down in reverse. The application receives a [`ServiceHandles`] snapshot
//! once every stage is live.

pub mod addons;
mod context_menu;
mod file_extensions;
mod games;
pub mod input;
mod manager;
pub mod network;
mod peripherals;
pub mod power;
mod profiles;
mod pvr;
pub mod scripts;

pub use addons::{AddonManager, AddonManifest, AddonType, VfsAddonCache};
pub use context_menu::{ContextMenuItem, ContextMenuManager};
pub use file_extensions::FileExtensionProvider;
pub use games::GameServices;
pub use input::{InputEvent, InputManager};
pub use manager::{ServiceHandles, ServiceManager, StageOne, StageThree, StageTwo};
pub use network::{IpDetector, LocalIpDetector, NetworkMessage, NetworkService};
pub use peripherals::{CecAdapter, Peripherals};
pub use power::{LoggingPowerBackend, PowerAction, PowerBackend, PowerManager};
pub use profiles::{Profile, ProfileManager};
pub use pvr::PvrManager;
pub use scripts::{ScriptInvocation, ScriptInvocationHandler, ScriptInvocationManager};
