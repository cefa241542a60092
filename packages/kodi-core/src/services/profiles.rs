//! User profiles.
//!
//! The master profile lives in the user data folder itself; further profiles
//! are subfolders of `<user data>/profiles`.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::{KodiError, KodiResult};

const MASTER_PROFILE: &str = "Master user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub folder: PathBuf,
}

pub struct ProfileManager {
    user_data: PathBuf,
    profiles: RwLock<Vec<Profile>>,
    current: RwLock<usize>,
}

impl ProfileManager {
    /// Discovers the profiles under `user_data`.
    pub fn load(user_data: &Path) -> KodiResult<Self> {
        let mut profiles = vec![Profile {
            name: MASTER_PROFILE.to_string(),
            folder: user_data.to_path_buf(),
        }];

        let profiles_dir = user_data.join("profiles");
        if profiles_dir.is_dir() {
            let entries = std::fs::read_dir(&profiles_dir)
                .map_err(|e| KodiError::Profile(format!("{}: {}", profiles_dir.display(), e)))?;
            let mut extra: Vec<Profile> = entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_dir())
                .map(|entry| Profile {
                    name: entry.file_name().to_string_lossy().to_string(),
                    folder: entry.path(),
                })
                .collect();
            extra.sort_by(|a, b| a.name.cmp(&b.name));
            profiles.extend(extra);
        }

        log::info!("[Profiles] {} profile(s)", profiles.len());
        Ok(Self {
            user_data: user_data.to_path_buf(),
            profiles: RwLock::new(profiles),
            current: RwLock::new(0),
        })
    }

    pub fn profiles(&self) -> Vec<Profile> {
        self.profiles.read().clone()
    }

    pub fn current_index(&self) -> usize {
        *self.current.read()
    }

    pub fn current(&self) -> Profile {
        let profiles = self.profiles.read();
        profiles[self.current_index().min(profiles.len() - 1)].clone()
    }

    pub fn profile_folder(&self) -> PathBuf {
        self.current().folder
    }

    /// Creates a profile folder and registers it. Returns its index.
    pub fn add_profile(&self, name: &str) -> KodiResult<usize> {
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(KodiError::Profile(format!("invalid profile name {:?}", name)));
        }
        let folder = self.user_data.join("profiles").join(name);
        std::fs::create_dir_all(&folder)
            .map_err(|e| KodiError::Profile(format!("{}: {}", folder.display(), e)))?;

        let mut profiles = self.profiles.write();
        if let Some(index) = profiles.iter().position(|p| p.name == name) {
            return Ok(index);
        }
        profiles.push(Profile {
            name: name.to_string(),
            folder,
        });
        Ok(profiles.len() - 1)
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.profiles
            .read()
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Makes the profile at `index` current.
    pub fn load_profile(&self, index: usize) -> KodiResult<Profile> {
        let profile = self
            .profiles
            .read()
            .get(index)
            .cloned()
            .ok_or_else(|| KodiError::Profile(format!("no profile at index {}", index)))?;
        *self.current.write() = index;
        log::info!("[Profiles] Loaded profile {}", profile.name);
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_and_switches_profiles() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("profiles").join("kids")).unwrap();
        let profiles = ProfileManager::load(dir.path()).unwrap();

        assert_eq!(profiles.profiles().len(), 2);
        assert_eq!(profiles.current().name, MASTER_PROFILE);

        let index = profiles.find("Kids").unwrap();
        let kids = profiles.load_profile(index).unwrap();
        assert_eq!(profiles.profile_folder(), kids.folder);
        assert!(profiles.load_profile(9).is_err());
    }

    #[test]
    fn add_profile_creates_folder() {
        let dir = tempfile::tempdir().unwrap();
        let profiles = ProfileManager::load(dir.path()).unwrap();
        let index = profiles.add_profile("guest").unwrap();
        assert_eq!(index, 1);
        assert_eq!(profiles.add_profile("guest").unwrap(), 1);
        assert!(dir.path().join("profiles").join("guest").is_dir());
        assert!(profiles.add_profile("../x").is_err());
    }
}
