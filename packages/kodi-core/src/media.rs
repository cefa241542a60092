//! Media items passed between the messenger, playlists and players.

use serde::{Deserialize, Serialize};

use crate::constants::STACK_PROTOCOL;
use crate::utils;

/// Audio extensions recognised without any add-on.
pub const DEFAULT_AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "oga", "opus", "wav", "m4a", "aac", "wma", "ape", "wv", "mka", "aif",
    "aiff", "dsf", "dff",
];

/// Video extensions recognised without any add-on.
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "m4v", "avi", "mov", "wmv", "mpg", "mpeg", "ts", "m2ts", "webm", "ogv", "flv",
    "iso", "vob", "divx", "3gp",
];

/// Picture extensions recognised without any add-on.
pub const DEFAULT_PICTURE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff", "heic"];

/// Playlist file extensions.
pub const PLAYLIST_EXTENSIONS: &[&str] = &["m3u", "m3u8", "wpl"];

/// Broad media classification of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
    Picture,
    Playlist,
    #[default]
    Unknown,
}

impl MediaKind {
    /// Classifies a path by its extension.
    ///
    /// Internet streams without a recognised extension are treated as audio.
    pub fn from_path(path: &str) -> Self {
        if path.starts_with(STACK_PROTOCOL) {
            return Self::Video;
        }
        match utils::extension(path) {
            Some(ext) => Self::from_extension(&ext).unwrap_or_else(|| {
                if utils::is_internet_stream(path) {
                    Self::Audio
                } else {
                    Self::Unknown
                }
            }),
            None if utils::is_internet_stream(path) => Self::Audio,
            None => Self::Unknown,
        }
    }

    /// Classifies a lowercase extension against the built-in lists.
    pub fn from_extension(ext: &str) -> Option<Self> {
        if DEFAULT_AUDIO_EXTENSIONS.contains(&ext) {
            Some(Self::Audio)
        } else if DEFAULT_VIDEO_EXTENSIONS.contains(&ext) {
            Some(Self::Video)
        } else if DEFAULT_PICTURE_EXTENSIONS.contains(&ext) {
            Some(Self::Picture)
        } else if PLAYLIST_EXTENSIONS.contains(&ext) {
            Some(Self::Playlist)
        } else {
            None
        }
    }
}

/// A playable (or listable) item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Location of the item (filesystem path or URL).
    pub path: String,
    /// Display label.
    pub label: String,
    /// Media classification.
    pub kind: MediaKind,
    /// Resume offset in milliseconds.
    #[serde(default)]
    pub start_offset_ms: u64,
    /// Known total duration in milliseconds.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Durations of the parts of a stacked item, in order.
    #[serde(default)]
    pub part_durations_ms: Vec<u64>,
}

impl MediaItem {
    /// Creates an item, classifying it from its path.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let label = path
            .rsplit(['/', '\\'])
            .find(|segment| !segment.is_empty())
            .unwrap_or(&path)
            .to_string();
        Self {
            kind: MediaKind::from_path(&path),
            path,
            label,
            start_offset_ms: 0,
            duration_ms: None,
            part_durations_ms: Vec::new(),
        }
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Overrides the media classification.
    pub fn with_kind(mut self, kind: MediaKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the resume offset.
    pub fn with_start_offset(mut self, offset_ms: u64) -> Self {
        self.start_offset_ms = offset_ms;
        self
    }

    /// Sets the known duration.
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the part durations of a stacked item.
    pub fn with_part_durations(mut self, durations_ms: Vec<u64>) -> Self {
        self.part_durations_ms = durations_ms;
        self
    }

    pub fn is_audio(&self) -> bool {
        self.kind == MediaKind::Audio
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    pub fn is_picture(&self) -> bool {
        self.kind == MediaKind::Picture
    }

    pub fn is_playlist(&self) -> bool {
        self.kind == MediaKind::Playlist
    }

    /// True for `stack://` items made of several parts.
    pub fn is_stack(&self) -> bool {
        self.path.starts_with(STACK_PROTOCOL)
    }

    pub fn is_internet_stream(&self) -> bool {
        utils::is_internet_stream(&self.path)
    }

    /// Lowercase extension of the item path.
    pub fn extension(&self) -> Option<String> {
        utils::extension(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_from_extension() {
        assert!(MediaItem::new("/music/song.FLAC").is_audio());
        assert!(MediaItem::new("/movies/film.mkv").is_video());
        assert!(MediaItem::new("/photos/beach.jpg").is_picture());
        assert!(MediaItem::new("/lists/party.m3u").is_playlist());
        assert_eq!(MediaItem::new("/docs/readme.txt").kind, MediaKind::Unknown);
    }

    #[test]
    fn streams_without_extension_are_audio() {
        assert!(MediaItem::new("http://radio.example/live").is_audio());
    }

    #[test]
    fn label_defaults_to_file_name() {
        let item = MediaItem::new("/movies/Film (2020)/film.mkv");
        assert_eq!(item.label, "film.mkv");
        assert_eq!(item.with_label("Film").label, "Film");
    }

    #[test]
    fn stack_items_are_video() {
        let item = MediaItem::new("stack:///m/cd1.avi , /m/cd2.avi");
        assert!(item.is_stack());
        assert!(item.is_video());
    }
}
