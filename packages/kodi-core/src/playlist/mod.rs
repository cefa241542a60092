//! Playlists and the playlist player.

pub mod formats;
mod player;

pub use player::PlaylistPlayer;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::media::MediaItem;

/// The three playlists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistId {
    Music = 0,
    Video = 1,
    Picture = 2,
}

impl PlaylistId {
    pub const ALL: [PlaylistId; 3] = [Self::Music, Self::Video, Self::Picture];

    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::Music),
            1 => Some(Self::Video),
            2 => Some(Self::Picture),
            _ => None,
        }
    }

    /// Playlist an item list belongs on: video if any item is video.
    pub fn for_items(items: &[MediaItem]) -> Self {
        if items.iter().any(MediaItem::is_video) {
            Self::Video
        } else if !items.is_empty() && items.iter().all(MediaItem::is_picture) {
            Self::Picture
        } else {
            Self::Music
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Repeat behaviour of a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    One,
    All,
}

impl RepeatMode {
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::Off),
            1 => Some(Self::One),
            2 => Some(Self::All),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    item: MediaItem,
    /// Position before shuffling.
    original: usize,
}

/// An ordered list of items in play order.
///
/// Shuffling reorders the entries in place and remembers their insertion
/// order so unshuffling restores it.
#[derive(Debug, Clone)]
pub struct PlayList {
    id: PlaylistId,
    entries: Vec<Entry>,
    shuffled: bool,
    next_original: usize,
}

impl PlayList {
    pub fn new(id: PlaylistId) -> Self {
        Self {
            id,
            entries: Vec::new(),
            shuffled: false,
            next_original: 0,
        }
    }

    pub fn id(&self) -> PlaylistId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MediaItem> {
        self.entries.get(index).map(|entry| &entry.item)
    }

    pub fn items(&self) -> Vec<MediaItem> {
        self.entries.iter().map(|entry| entry.item.clone()).collect()
    }

    pub fn add(&mut self, item: MediaItem) {
        let original = self.take_original();
        self.entries.push(Entry { item, original });
    }

    /// Inserts at `index`, clamped to the end.
    pub fn insert(&mut self, index: usize, item: MediaItem) {
        let original = self.take_original();
        let index = index.min(self.entries.len());
        self.entries.insert(index, Entry { item, original });
    }

    pub fn remove(&mut self, index: usize) -> Option<MediaItem> {
        (index < self.entries.len()).then(|| self.entries.remove(index).item)
    }

    pub fn swap(&mut self, a: usize, b: usize) -> bool {
        if a >= self.entries.len() || b >= self.entries.len() {
            return false;
        }
        self.entries.swap(a, b);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.shuffled = false;
        self.next_original = 0;
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    /// Shuffles the entries from `from` onwards.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, from: usize, rng: &mut R) {
        if from < self.entries.len() {
            self.entries[from..].shuffle(rng);
        }
        self.shuffled = true;
    }

    /// Restores insertion order.
    pub fn unshuffle(&mut self) {
        self.entries.sort_by_key(|entry| entry.original);
        self.shuffled = false;
    }

    /// Index of the entry holding `path`.
    pub fn find(&self, path: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.item.path == path)
    }

    fn take_original(&mut self) -> usize {
        let original = self.next_original;
        self.next_original += 1;
        original
    }
}
