//! Add-on registry and the VFS add-on cache.
//!
//! Add-ons are directories under the add-ons folder, each carrying an
//! `addon.json` manifest. Only the manifest is interpreted here; add-on code
//! is never loaded by the core.

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::ADDON_MANIFEST_FILE;

#[derive(Debug, Error)]
pub enum AddonError {
    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Invalid manifest {path}: {reason}")]
    InvalidManifest { path: String, reason: String },

    #[error("Add-on {0} is not installed")]
    NotFound(String),
}

/// Extension point an add-on provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddonType {
    Skin,
    Vfs,
    Script,
    ContextItem,
    Game,
    Pvr,
    Screensaver,
    AudioDecoder,
    ImageDecoder,
    #[serde(other)]
    Other,
}

/// Parsed `addon.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub addon_type: AddonType,

    /// File extensions handled (decoders, VFS add-ons, script handlers).
    #[serde(default)]
    pub extensions: Vec<String>,

    /// URL protocols handled (VFS add-ons).
    #[serde(default)]
    pub protocols: Vec<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Context menu label (context item add-ons).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl AddonManifest {
    /// Reads and validates a manifest file.
    pub fn from_file(path: &Path) -> Result<Self, AddonError> {
        let content = std::fs::read_to_string(path).map_err(|e| AddonError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let manifest: Self =
            serde_json::from_str(&content).map_err(|e| AddonError::InvalidManifest {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        if manifest.id.trim().is_empty() {
            return Err(AddonError::InvalidManifest {
                path: path.display().to_string(),
                reason: "empty id".to_string(),
            });
        }
        Ok(manifest)
    }

    /// True if the manifest lists `ext` (with or without the leading dot).
    pub fn handles_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        self.extensions
            .iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Installed add-ons, keyed by id.
pub struct AddonManager {
    addons_dir: PathBuf,
    addons: DashMap<String, AddonManifest>,
}

impl AddonManager {
    /// Scans `addons_dir`, creating it if missing.
    ///
    /// An unreadable directory is an error. Individual malformed manifests are
    /// skipped with a warning.
    pub fn load(addons_dir: &Path) -> Result<Self, AddonError> {
        let io_err = |e: std::io::Error| AddonError::Io {
            path: addons_dir.display().to_string(),
            reason: e.to_string(),
        };

        std::fs::create_dir_all(addons_dir).map_err(io_err)?;
        let manager = Self {
            addons_dir: addons_dir.to_path_buf(),
            addons: DashMap::new(),
        };

        for entry in std::fs::read_dir(addons_dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let manifest_path = entry.path().join(ADDON_MANIFEST_FILE);
            if !manifest_path.is_file() {
                continue;
            }
            match AddonManifest::from_file(&manifest_path) {
                Ok(manifest) => manager.register(manifest),
                Err(e) => log::warn!("[Addons] Skipping add-on: {}", e),
            }
        }

        log::info!(
            "[Addons] {} add-on(s) installed in {}",
            manager.addons.len(),
            addons_dir.display()
        );
        Ok(manager)
    }

    pub fn addons_dir(&self) -> &Path {
        &self.addons_dir
    }

    /// Adds or replaces an add-on.
    pub fn register(&self, manifest: AddonManifest) {
        log::debug!("[Addons] Registered {} {}", manifest.id, manifest.version);
        self.addons.insert(manifest.id.clone(), manifest);
    }

    pub fn get(&self, id: &str) -> Result<AddonManifest, AddonError> {
        self.addons
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AddonError::NotFound(id.to_string()))
    }

    pub fn is_installed(&self, id: &str) -> bool {
        self.addons.contains_key(id)
    }

    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), AddonError> {
        let mut entry = self
            .addons
            .get_mut(id)
            .ok_or_else(|| AddonError::NotFound(id.to_string()))?;
        entry.enabled = enabled;
        Ok(())
    }

    /// Enabled add-ons of one type, sorted by id.
    pub fn enabled_of_type(&self, addon_type: AddonType) -> Vec<AddonManifest> {
        let mut found: Vec<AddonManifest> = self
            .addons
            .iter()
            .filter(|entry| entry.enabled && entry.addon_type == addon_type)
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }

    pub fn len(&self) -> usize {
        self.addons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addons.is_empty()
    }
}

/// Snapshot of enabled VFS add-ons.
///
/// Refreshed explicitly after the add-on set changes.
pub struct VfsAddonCache {
    instances: RwLock<Vec<AddonManifest>>,
}

impl VfsAddonCache {
    pub fn new(addons: &AddonManager) -> Self {
        let cache = Self {
            instances: RwLock::new(Vec::new()),
        };
        cache.refresh(addons);
        cache
    }

    pub fn refresh(&self, addons: &AddonManager) {
        let instances = addons.enabled_of_type(AddonType::Vfs);
        log::debug!("[VfsAddons] {} VFS add-on(s) active", instances.len());
        *self.instances.write() = instances;
    }

    pub fn addon_instances(&self) -> Vec<AddonManifest> {
        self.instances.read().clone()
    }

    /// VFS add-on serving a URL protocol.
    pub fn find_for_protocol(&self, protocol: &str) -> Option<AddonManifest> {
        self.instances
            .read()
            .iter()
            .find(|addon| addon.protocols.iter().any(|p| p.eq_ignore_ascii_case(protocol)))
            .cloned()
    }

    /// Extensions VFS add-ons can open as archives or containers.
    pub fn extensions(&self) -> Vec<String> {
        self.instances
            .read()
            .iter()
            .flat_map(|addon| addon.extensions.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Writes an add-on directory with a manifest.
    pub fn write_addon(dir: &Path, id: &str, addon_type: &str, extra: &str) {
        let addon_dir = dir.join(id);
        std::fs::create_dir_all(&addon_dir).unwrap();
        let manifest = format!(
            r#"{{"id":"{id}","name":"{id}","version":"1.0.0","type":"{addon_type}"{extra}}}"#
        );
        std::fs::write(addon_dir.join(ADDON_MANIFEST_FILE), manifest).unwrap();
    }
}
