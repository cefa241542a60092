//! Game services: the installed emulator (game client) add-ons.

use std::sync::Arc;

use super::addons::{AddonManager, AddonManifest, AddonType};
use crate::utils;

pub struct GameServices {
    addons: Arc<AddonManager>,
}

impl GameServices {
    pub fn new(addons: Arc<AddonManager>) -> Self {
        Self { addons }
    }

    pub fn game_clients(&self) -> Vec<AddonManifest> {
        self.addons.enabled_of_type(AddonType::Game)
    }

    /// Game clients able to open `path`, by extension.
    pub fn clients_for(&self, path: &str) -> Vec<AddonManifest> {
        let Some(ext) = utils::extension(path) else {
            return Vec::new();
        };
        self.game_clients()
            .into_iter()
            .filter(|client| client.handles_extension(&ext))
            .collect()
    }

    pub fn is_game(&self, path: &str) -> bool {
        !self.clients_for(path).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::addons::test_support::write_addon;

    #[test]
    fn roms_match_client_extensions() {
        let dir = tempfile::tempdir().unwrap();
        write_addon(dir.path(), "game.libretro.snes", "game", r#","extensions":["sfc","smc"]"#);
        let games = GameServices::new(Arc::new(AddonManager::load(dir.path()).unwrap()));

        assert!(games.is_game("/roms/Mario.SFC"));
        assert!(!games.is_game("/music/a.mp3"));
        assert_eq!(games.game_clients().len(), 1);
    }
}
