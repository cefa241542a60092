use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::constants::{ADDON_MANIFEST_FILE, DEFAULT_SKIN};

#[derive(Debug, Error)]
pub enum SkinError {
    #[error("Skin {0} is not installed")]
    NotInstalled(String),

    #[error("Skin {id} failed to load: {reason}")]
    LoadFailed { id: String, reason: String },
}

/// Loads and unloads skins. Called on the owning thread.
pub trait SkinLoader: Send + Sync {
    fn load(&self, skin_id: &str) -> Result<(), SkinError>;

    fn unload(&self);
}

/// Loads skins installed as add-on directories.
///
/// The default skin ships with the application and always loads.
pub struct DirectorySkinLoader {
    addons_dir: PathBuf,
}

impl DirectorySkinLoader {
    pub fn new(addons_dir: impl Into<PathBuf>) -> Self {
        Self {
            addons_dir: addons_dir.into(),
        }
    }

    fn manifest_path(&self, skin_id: &str) -> PathBuf {
        self.addons_dir.join(skin_id).join(ADDON_MANIFEST_FILE)
    }

    pub fn addons_dir(&self) -> &Path {
        &self.addons_dir
    }
}

impl SkinLoader for DirectorySkinLoader {
    fn load(&self, skin_id: &str) -> Result<(), SkinError> {
        if skin_id == DEFAULT_SKIN {
            log::info!("[Skin] Loaded built-in skin {}", skin_id);
            return Ok(());
        }
        if !skin_id.starts_with("skin.") {
            return Err(SkinError::LoadFailed {
                id: skin_id.to_string(),
                reason: "not a skin add-on".to_string(),
            });
        }
        let manifest = self.manifest_path(skin_id);
        if !manifest.is_file() {
            return Err(SkinError::NotInstalled(skin_id.to_string()));
        }
        log::info!("[Skin] Loaded {} from {}", skin_id, manifest.display());
        Ok(())
    }

    fn unload(&self) {
        log::debug!("[Skin] Unloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_skin_always_loads() {
        let loader = DirectorySkinLoader::new("/nonexistent");
        assert!(loader.load(DEFAULT_SKIN).is_ok());
        assert!(matches!(
            loader.load("skin.aeon"),
            Err(SkinError::NotInstalled(_))
        ));
        assert!(matches!(
            loader.load("script.radio"),
            Err(SkinError::LoadFailed { .. })
        ));
    }

    #[test]
    fn installed_skin_loads() {
        let dir = tempfile::tempdir().unwrap();
        let skin_dir = dir.path().join("skin.aeon");
        std::fs::create_dir_all(&skin_dir).unwrap();
        std::fs::write(skin_dir.join(ADDON_MANIFEST_FILE), "{}").unwrap();

        let loader = DirectorySkinLoader::new(dir.path());
        assert!(loader.load("skin.aeon").is_ok());
    }
}
