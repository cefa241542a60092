//! Known media extensions, extended by decoder and VFS add-ons.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::addons::{AddonManager, AddonType};
use crate::media::{
    MediaKind, DEFAULT_AUDIO_EXTENSIONS, DEFAULT_PICTURE_EXTENSIONS, DEFAULT_VIDEO_EXTENSIONS,
};

/// Answers "which files can be played" for library scans and file browsing.
pub struct FileExtensionProvider {
    addons: Arc<AddonManager>,
}

impl FileExtensionProvider {
    pub fn new(addons: Arc<AddonManager>) -> Self {
        Self { addons }
    }

    pub fn audio_extensions(&self) -> Vec<String> {
        self.merge(DEFAULT_AUDIO_EXTENSIONS, &[AddonType::AudioDecoder, AddonType::Vfs])
    }

    pub fn video_extensions(&self) -> Vec<String> {
        self.merge(DEFAULT_VIDEO_EXTENSIONS, &[AddonType::Vfs])
    }

    pub fn picture_extensions(&self) -> Vec<String> {
        self.merge(DEFAULT_PICTURE_EXTENSIONS, &[AddonType::ImageDecoder])
    }

    /// Classifies an extension, consulting decoder add-ons for unknown ones.
    pub fn kind_of(&self, ext: &str) -> MediaKind {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        if let Some(kind) = MediaKind::from_extension(&ext) {
            return kind;
        }
        let handled_by = |addon_type| {
            self.addons
                .enabled_of_type(addon_type)
                .iter()
                .any(|addon| addon.handles_extension(&ext))
        };
        if handled_by(AddonType::AudioDecoder) {
            MediaKind::Audio
        } else if handled_by(AddonType::ImageDecoder) {
            MediaKind::Picture
        } else {
            MediaKind::Unknown
        }
    }

    fn merge(&self, defaults: &[&str], addon_types: &[AddonType]) -> Vec<String> {
        let mut all: BTreeSet<String> = defaults.iter().map(|e| e.to_string()).collect();
        for addon_type in addon_types {
            for addon in self.addons.enabled_of_type(*addon_type) {
                all.extend(
                    addon
                        .extensions
                        .iter()
                        .map(|e| e.trim_start_matches('.').to_ascii_lowercase()),
                );
            }
        }
        all.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::addons::test_support::write_addon;

    #[test]
    fn decoder_addons_extend_known_extensions() {
        let dir = tempfile::tempdir().unwrap();
        write_addon(
            dir.path(),
            "audiodecoder.modplug",
            "audio_decoder",
            r#","extensions":[".MOD",".xm"]"#,
        );
        let addons = Arc::new(AddonManager::load(dir.path()).unwrap());
        let provider = FileExtensionProvider::new(addons);

        assert!(provider.audio_extensions().contains(&"mod".to_string()));
        assert_eq!(provider.kind_of(".xm"), MediaKind::Audio);
        assert_eq!(provider.kind_of("mkv"), MediaKind::Video);
        assert_eq!(provider.kind_of("xyz"), MediaKind::Unknown);
    }
}
